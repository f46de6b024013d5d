// ==========================================
// 核电机组状态时序系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + reqwest + nalgebra
// 流程: 日报采集 → 机组名归一化 → 状态落库 → 功率预测 → 疑似停堆检测
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 预测 / 检测 / 每日流水线
pub mod engine;

// 采集层 - 日报抓取与解析
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 只读查询
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Region, TableLayout};

// 领域实体
pub use domain::{
    CandidateOutage, DateOutcome, ForecastPoint, ForecastRecord, ReactorUnit, SeedReport,
    StatusRecord,
};

// 采集
pub use importer::{
    DateRangePlan, HttpReportFetcher, RegionClassifier, ReportImporter, ReportImporterImpl,
    TableExtractor, UnitNormalizer,
};

// 引擎
pub use engine::{DailyPipeline, DailyRun, Forecaster, FsArtifactPublisher, OutageDetector};

// 配置 / 仓储 / API
pub use api::ReactorQueryApi;
pub use config::{ConfigManager, PipelineConfig, PipelineConfigReader};
pub use repository::Repositories;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "核电机组状态时序系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
