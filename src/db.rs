// ==========================================
// 核电机组状态时序系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 统一建表入口，所有仓储共享同一份 schema
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 默认数据库路径
///
/// 优先读取环境变量 REACTOR_STATUS_DB_PATH，否则落在用户数据目录下
pub fn default_db_path() -> String {
    if let Ok(path) = std::env::var("REACTOR_STATUS_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    match dirs::data_dir() {
        Some(data_dir) => {
            let dir = data_dir.join("reactor-status-ts");
            // 目录创建失败时由后续 open 报错
            std::fs::create_dir_all(&dir).ok();
            dir.join("reactor_status.db").to_string_lossy().to_string()
        }
        None => "./reactor_status.db".to_string(),
    }
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开连接、建表，并包装为仓储共享的 `Arc<Mutex<Connection>>`
pub fn open_shared_connection(db_path: &str) -> rusqlite::Result<Arc<Mutex<Connection>>> {
    let conn = open_sqlite_connection(db_path)?;
    init_schema(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// 建表（幂等）
///
/// 表结构:
/// - reactor: 机组身份（根实体，名称唯一）
/// - reactor_status: (report_date, reactor_id) 唯一的日状态
/// - reactor_forecast: (reactor_id, target_date) 唯一的预测点
/// - candidate_outage: (reactor_id, date_detected) 唯一的疑似停堆
/// - config_kv: 运行参数（scope_id='global'）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS reactor (
            reactor_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE CHECK (length(name) <= 30),
            region TEXT NOT NULL CHECK (region IN ('I', 'II', 'III', 'IV')),
            latitude REAL,
            longitude REAL
        );

        CREATE TABLE IF NOT EXISTS reactor_status (
            status_id INTEGER PRIMARY KEY AUTOINCREMENT,
            reactor_id INTEGER NOT NULL REFERENCES reactor(reactor_id) ON DELETE CASCADE,
            report_date TEXT NOT NULL,
            power INTEGER NOT NULL,
            down_date TEXT,
            reason TEXT,
            changed INTEGER NOT NULL DEFAULT 0,
            scrams INTEGER,
            UNIQUE (report_date, reactor_id)
        );

        CREATE INDEX IF NOT EXISTS idx_reactor_status_reactor_date
            ON reactor_status(reactor_id, report_date);

        CREATE TABLE IF NOT EXISTS reactor_forecast (
            forecast_id INTEGER PRIMARY KEY AUTOINCREMENT,
            reactor_id INTEGER NOT NULL REFERENCES reactor(reactor_id) ON DELETE CASCADE,
            target_date TEXT NOT NULL,
            yhat REAL NOT NULL,
            yhat_lower REAL NOT NULL,
            yhat_upper REAL NOT NULL,
            artifact_url TEXT,
            generated_at TEXT NOT NULL,
            UNIQUE (reactor_id, target_date)
        );

        CREATE TABLE IF NOT EXISTS candidate_outage (
            outage_id INTEGER PRIMARY KEY AUTOINCREMENT,
            reactor_id INTEGER NOT NULL REFERENCES reactor(reactor_id) ON DELETE CASCADE,
            date_detected TEXT NOT NULL,
            description TEXT NOT NULL,
            auto_detected INTEGER NOT NULL DEFAULT 1,
            confirmed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (reactor_id, date_detected)
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_schema_version_absent_on_empty_db() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }
}
