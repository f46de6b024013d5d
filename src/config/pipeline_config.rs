// ==========================================
// 核电机组状态时序系统 - 流水线运行参数
// ==========================================
// 职责: 已解析的显式配置，逐个传入各组件
// 红线: 不使用进程级全局状态
// ==========================================

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 上游日报默认根地址
pub const DEFAULT_REPORT_BASE_URL: &str =
    "https://www.nrc.gov/reading-rm/doc-collections/event-status/reactor-status";

// ==========================================
// FetchConfig - 日报抓取
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub delay_secs: f64, // 相邻日期之间的节流间隔
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REPORT_BASE_URL.to_string(),
            timeout_secs: 60,
            delay_secs: 2.0,
            user_agent: concat!("reactor-status-ts/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_secs.max(0.0))
    }
}

// ==========================================
// ForecastConfig - 预测
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub horizon_days: u32,            // 预测步长（最后观测日之后）
    pub interval_width: f64,          // 预测区间宽度（0.8 = 80%）
    pub changepoint_prior_scale: f64, // 趋势变点正则强度（越大越灵活）
    pub n_changepoints: usize,
    pub yearly_fourier_order: usize,
    pub monthly_period_days: f64,
    pub monthly_fourier_order: usize,
    pub outage_window_days: u32,      // 零功率日向后延伸的窗口上界
    pub concurrency: usize,           // 并行训练的机组数
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_days: 30,
            interval_width: 0.8,
            changepoint_prior_scale: 0.5,
            n_changepoints: 25,
            yearly_fourier_order: 10,
            monthly_period_days: 30.5,
            monthly_fourier_order: 5,
            outage_window_days: 5,
            concurrency: 4,
        }
    }
}

// ==========================================
// DetectionConfig - 疑似停堆检测
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub threshold: f64,   // 预测 - 实际 ≥ threshold 视为疑似停堆（百分点）
    pub offset_days: i64, // 预测目标日 = 最近状态日 + offset_days
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: 5.0,
            offset_days: 1,
        }
    }
}

// ==========================================
// PipelineConfig - 汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub fetch: FetchConfig,
    pub forecast: ForecastConfig,
    pub detection: DetectionConfig,
    pub artifact_root: String, // 图表产物根目录（文件系统发布器）
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            forecast: ForecastConfig::default(),
            detection: DetectionConfig::default(),
            artifact_root: Self::default_artifact_root(),
        }
    }
}

impl PipelineConfig {
    /// 默认产物目录: <数据目录>/reactor-status-ts/artifacts
    pub fn default_artifact_root() -> String {
        dirs::data_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join("reactor-status-ts")
            .join("artifacts")
            .to_string_lossy()
            .to_string()
    }
}
