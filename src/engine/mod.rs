// ==========================================
// 核电机组状态时序系统 - 引擎层
// ==========================================
// 职责: 预测 / 疑似停堆检测 / 图表发布 / 每日流水线
// 红线: Engine 不拼 SQL，数据访问全部经 Repository
// ==========================================

pub mod daily_pipeline;
pub mod error;
pub mod forecaster;
pub mod outage_detector;
pub mod publisher;

// 重导出核心引擎
pub use daily_pipeline::{DailyPipeline, DailyRun, DailyRunReport, UnitRunResult};
pub use error::{
    DetectionError, DetectionResult, ForecastError, ForecastResult, PublishError, PublishResult,
};
pub use forecaster::{fit_history, normal_quantile, ForecastRun, Forecaster, UnitForecast};
pub use outage_detector::{outage_description, DetectionOutcome, MissingInput, OutageDetector};
pub use publisher::{chart_path, render_chart_csv, ArtifactPublisher, FsArtifactPublisher};
