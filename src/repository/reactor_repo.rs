// ==========================================
// 核电机组状态时序系统 - 机组身份仓储
// ==========================================
// 职责: 管理 reactor 表（根实体）
// 语义: 按名称 get-or-create；重新分类时允许修正区域；永不删除
// ==========================================

use crate::domain::reactor::ReactorUnit;
use crate::domain::types::Region;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = "reactor_id, name, region, latitude, longitude";

#[derive(Clone)]
pub struct ReactorRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReactorRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<ReactorUnit> {
        let region_text: String = row.get(2)?;
        let region = region_text.parse::<Region>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                e.into(),
            )
        })?;
        Ok(ReactorUnit {
            unit_id: row.get(0)?,
            name: row.get(1)?,
            region,
            latitude: row.get(3)?,
            longitude: row.get(4)?,
        })
    }

    /// 按名称获取或创建机组
    ///
    /// # 返回
    /// - (ReactorUnit, true): 新建
    /// - (ReactorUnit, false): 已存在（区域与本次分类不同时被修正）
    pub fn get_or_create(&self, name: &str, region: Region) -> RepositoryResult<(ReactorUnit, bool)> {
        let conn = self.get_conn()?;

        let inserted = conn.execute(
            "INSERT INTO reactor (name, region) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
            params![name, region.as_str()],
        )?;

        if inserted == 0 {
            conn.execute(
                "UPDATE reactor SET region = ?2 WHERE name = ?1 AND region <> ?2",
                params![name, region.as_str()],
            )?;
        }

        let unit = conn.query_row(
            &format!("SELECT {} FROM reactor WHERE name = ?1", SELECT_COLUMNS),
            params![name],
            Self::map_row,
        )?;

        Ok((unit, inserted > 0))
    }

    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<ReactorUnit>> {
        let conn = self.get_conn()?;
        let unit = conn
            .query_row(
                &format!("SELECT {} FROM reactor WHERE name = ?1", SELECT_COLUMNS),
                params![name],
                Self::map_row,
            )
            .optional()?;
        Ok(unit)
    }

    pub fn find_by_id(&self, unit_id: i64) -> RepositoryResult<Option<ReactorUnit>> {
        let conn = self.get_conn()?;
        let unit = conn
            .query_row(
                &format!("SELECT {} FROM reactor WHERE reactor_id = ?1", SELECT_COLUMNS),
                params![unit_id],
                Self::map_row,
            )
            .optional()?;
        Ok(unit)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<ReactorUnit>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM reactor ORDER BY name ASC",
            SELECT_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 指定日期有状态记录的机组
    pub fn list_with_status_on(&self, report_date: NaiveDate) -> RepositoryResult<Vec<ReactorUnit>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT r.reactor_id, r.name, r.region, r.latitude, r.longitude
            FROM reactor r
            JOIN reactor_status s ON s.reactor_id = r.reactor_id
            WHERE s.report_date = ?1
            ORDER BY r.name ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![report_date], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 维护地理坐标（地图展示用）
    pub fn set_coordinates(&self, name: &str, latitude: f64, longitude: f64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE reactor SET latitude = ?2, longitude = ?3 WHERE name = ?1",
            params![name, latitude, longitude],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "reactor".to_string(),
                id: name.to_string(),
            });
        }
        Ok(())
    }
}
