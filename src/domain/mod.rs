// ==========================================
// 核电机组状态时序系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、采集结果模型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod forecast;
pub mod ingest;
pub mod reactor;
pub mod types;

// 重导出核心类型
pub use forecast::{CandidateOutage, ForecastPoint, ForecastRecord};
pub use ingest::{
    DatabaseStats, DateIngestReport, DateOutcome, RowOutcome, RowResult, SeedReport, StatusSample,
};
pub use reactor::{NewStatus, RawStatusRow, ReactorUnit, StatusRecord, UNIT_NAME_MAX_LEN};
pub use types::{Region, TableLayout};
