// ==========================================
// 核电机组状态时序系统 - 配置层
// ==========================================
// 职责: 系统配置管理（存储默认值 → config_kv → 命令行覆写）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod pipeline_config;
pub mod pipeline_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use pipeline_config::{
    DetectionConfig, FetchConfig, ForecastConfig, PipelineConfig, DEFAULT_REPORT_BASE_URL,
};
pub use pipeline_config_trait::{ConfigResult, PipelineConfigReader};
