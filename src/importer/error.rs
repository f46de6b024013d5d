// ==========================================
// 核电机组状态时序系统 - 采集模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 抓取失败对单个日期是非致命的，由调用方落为 DateOutcome::FetchFailed
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// 采集模块错误类型
#[derive(Error, Debug)]
pub enum IngestError {
    // ===== 抓取相关错误 =====
    #[error("抓取超时: {url}")]
    FetchTimeout { url: String },

    #[error("上游返回非成功状态 (status={status}): {url}")]
    HttpStatus { status: u16, url: String },

    #[error("网络错误: {0}")]
    Network(String),

    #[error("HTTP 客户端初始化失败: {0}")]
    ClientBuild(String),

    // ===== 参数错误 =====
    #[error("无效日期范围: {0}")]
    InvalidDateRange(String),

    #[error("日期格式错误: 期望 YYYYMMDD，实际 {0}")]
    DateFormat(String),

    // ===== 数据库错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for IngestError {
    fn from(err: rusqlite::Error) -> Self {
        IngestError::Repository(err.into())
    }
}

/// Result 类型别名
pub type IngestResult<T> = Result<T, IngestError>;
