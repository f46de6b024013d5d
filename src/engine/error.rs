// ==========================================
// 核电机组状态时序系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 缺少前置数据（无历史 / 未登记机组）显式报错，只中止该机组
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// 预测错误
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("机组无历史数据: {unit}")]
    NoHistory { unit: String },

    #[error("机组不存在: {0}")]
    UnknownReactor(String),

    #[error("预测参数无效: {0}")]
    InvalidConfig(String),

    #[error("模型求解失败: {0}")]
    Model(String),

    #[error("预测任务异常退出: {0}")]
    Task(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<rusqlite::Error> for ForecastError {
    fn from(err: rusqlite::Error) -> Self {
        ForecastError::Repository(err.into())
    }
}

pub type ForecastResult<T> = Result<T, ForecastError>;

/// 疑似停堆检测错误
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("机组不存在: {0}")]
    UnknownReactor(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<rusqlite::Error> for DetectionError {
    fn from(err: rusqlite::Error) -> Self {
        DetectionError::Repository(err.into())
    }
}

pub type DetectionResult<T> = Result<T, DetectionError>;

/// 发布错误（图表产物）
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("产物写入失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("图表渲染失败: {0}")]
    Render(String),

    #[error("产物路径越出发布目录: {0}")]
    InvalidPath(String),
}

pub type PublishResult<T> = Result<T, PublishError>;
