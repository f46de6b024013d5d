// ==========================================
// 核电机组状态时序系统 - 采集层
// ==========================================
// 职责: 上游日报 → 规范化日状态
// 流程: 日期调度 → 抓取 → 表格抽取 → 机组名归一化 / 区域分类 → 落库
// ==========================================

// 模块声明
pub mod date_scheduler;
pub mod error;
pub mod region_classifier;
pub mod report_fetcher;
pub mod report_importer_impl;
pub mod report_importer_trait;
pub mod status_writer;
pub mod table_extractor;
pub mod unit_normalizer;

// 重导出核心类型
pub use date_scheduler::{parse_resume_date, DateRangePlan, DryRunListing};
pub use error::{IngestError, IngestResult};
pub use region_classifier::{RegionClassifier, RegionMatch, PLANT_REGIONS};
pub use report_fetcher::{report_url, FetchOutcome, HttpReportFetcher, ReportFetcher};
pub use report_importer_impl::ReportImporterImpl;
pub use status_writer::StatusWriter;
pub use table_extractor::{TableExtraction, TableExtractor};
pub use unit_normalizer::{NormalizedName, UnitNormalizer, SPECIAL_CASE_RULES, SUBSTRING_RULES};

// 重导出 Trait 接口
pub use report_importer_trait::ReportImporter;
