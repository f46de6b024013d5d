// ==========================================
// 核电机组状态时序系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约束: 唯一键 + get-or-create / ON CONFLICT 保证幂等，不依赖应用锁
// ==========================================

pub mod error;
pub mod forecast_repo;
pub mod outage_repo;
pub mod reactor_repo;
pub mod status_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use forecast_repo::ForecastRepository;
pub use outage_repo::OutageRepository;
pub use reactor_repo::ReactorRepository;
pub use status_repo::StatusRepository;

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

// ==========================================
// Repositories - 共享同一连接的仓储集合
// ==========================================
#[derive(Clone)]
pub struct Repositories {
    pub reactors: ReactorRepository,
    pub statuses: StatusRepository,
    pub forecasts: ForecastRepository,
    pub outages: OutageRepository,
}

impl Repositories {
    /// 打开数据库（含建表）并创建全部仓储
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_shared_connection(db_path)?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            reactors: ReactorRepository::from_connection(conn.clone()),
            statuses: StatusRepository::from_connection(conn.clone()),
            forecasts: ForecastRepository::from_connection(conn.clone()),
            outages: OutageRepository::from_connection(conn),
        }
    }
}
