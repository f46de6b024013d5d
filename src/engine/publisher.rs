// ==========================================
// 核电机组状态时序系统 - 图表产物发布
// ==========================================
// 职责: 预测图表数据（CSV）→ 持久地址
// 约定: 发布失败由调用方记录日志，不影响已落库的预测值
// ==========================================

use crate::domain::forecast::ForecastPoint;
use crate::engine::error::{PublishError, PublishResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

// ==========================================
// ArtifactPublisher Trait
// ==========================================
// 实现者: FsArtifactPublisher（本地目录），对象存储等由外部实现
#[async_trait]
pub trait ArtifactPublisher: Send + Sync {
    /// 发布产物
    ///
    /// # 参数
    /// - target_path: 相对路径（如 forecasts/Ginna_forecast.csv）
    /// - blob: 产物内容
    ///
    /// # 返回
    /// - Ok(String): 产物地址
    async fn publish(&self, target_path: &str, blob: Vec<u8>) -> PublishResult<String>;
}

/// 机组预测图表的目标路径
///
/// 机组名来自上游 HTML，字母数字与 `.` `-` 以外的字符（含空格、路径分隔符）替换为下划线
pub fn chart_path(unit_name: &str) -> String {
    let stem: String = unit_name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    format!("forecasts/{}_forecast.csv", stem)
}

/// 渲染图表数据: 历史实际值 + 拟合 / 预测值及区间
///
/// 列: date, actual, yhat, yhat_lower, yhat_upper（预测段 actual 为空）
pub fn render_chart_csv(
    history: &[(NaiveDate, i32)],
    fitted: &[ForecastPoint],
    horizon: &[ForecastPoint],
) -> PublishResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["date", "actual", "yhat", "yhat_lower", "yhat_upper"])
        .map_err(|e| PublishError::Render(e.to_string()))?;

    let actual_rows = history.iter().zip(fitted).map(|((date, actual), p)| {
        (*date, Some(*actual), p)
    });
    let horizon_rows = horizon.iter().map(|p| (p.date, None, p));

    for (date, actual, point) in actual_rows.chain(horizon_rows) {
        writer
            .write_record([
                date.format("%Y-%m-%d").to_string(),
                actual.map(|a| a.to_string()).unwrap_or_default(),
                format!("{:.3}", point.yhat),
                format!("{:.3}", point.yhat_lower),
                format!("{:.3}", point.yhat_upper),
            ])
            .map_err(|e| PublishError::Render(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| PublishError::Render(e.to_string()))
}

// ==========================================
// FsArtifactPublisher - 本地目录发布
// ==========================================
#[derive(Debug, Clone)]
pub struct FsArtifactPublisher {
    root: PathBuf,
}

impl FsArtifactPublisher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ArtifactPublisher for FsArtifactPublisher {
    async fn publish(&self, target_path: &str, blob: Vec<u8>) -> PublishResult<String> {
        let relative = Path::new(target_path);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(PublishError::InvalidPath(target_path.to_string()));
        }
        let path = self.root.join(relative);
        let io_err = |source| PublishError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tokio::fs::write(&path, blob).await.map_err(io_err)?;

        debug!(path = %path.display(), "图表产物已写入");
        Ok(format!("file://{}", path.display()))
    }
}
