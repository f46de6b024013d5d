// ==========================================
// 核电机组状态时序系统 - 运行参数读取 Trait
// ==========================================
// 职责: 定义流水线所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::pipeline_config::{DetectionConfig, FetchConfig, ForecastConfig, PipelineConfig};
use async_trait::async_trait;
use std::error::Error;

pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// PipelineConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取，缺省回落到默认值）
#[async_trait]
pub trait PipelineConfigReader: Send + Sync {
    // ===== 日报抓取 =====

    /// 获取抓取参数
    ///
    /// # 默认值
    /// - base_url: 监管机构日报目录
    /// - timeout_secs: 60
    /// - delay_secs: 2.0
    async fn get_fetch_config(&self) -> ConfigResult<FetchConfig>;

    // ===== 预测 =====

    /// 获取预测参数
    ///
    /// # 默认值
    /// - horizon_days: 30
    /// - interval_width: 0.8
    /// - changepoint_prior_scale: 0.5
    /// - outage_window_days: 5
    async fn get_forecast_config(&self) -> ConfigResult<ForecastConfig>;

    // ===== 检测 =====

    /// 获取疑似停堆检测参数
    ///
    /// # 默认值
    /// - threshold: 5.0
    /// - offset_days: 1
    async fn get_detection_config(&self) -> ConfigResult<DetectionConfig>;

    /// 获取图表产物根目录
    async fn get_artifact_root(&self) -> ConfigResult<String>;

    /// 一次性解析完整配置
    async fn load_pipeline_config(&self) -> ConfigResult<PipelineConfig> {
        Ok(PipelineConfig {
            fetch: self.get_fetch_config().await?,
            forecast: self.get_forecast_config().await?,
            detection: self.get_detection_config().await?,
            artifact_root: self.get_artifact_root().await?,
        })
    }
}
