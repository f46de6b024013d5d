// ==========================================
// 核电机组状态时序系统 - API 层
// ==========================================
// 职责: 只读查询接口（按日机组状态 / 单机组详情 / 待复核停堆）
// 说明: 返回 serde 可序列化的视图对象，由外部服务层直接输出
// ==========================================

pub mod error;
pub mod reactor_query_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use reactor_query_api::{OutageView, ReactorQueryApi, UnitDetailView, UnitStatusView};
