// ==========================================
// 核电机组状态时序系统 - 机组日状态仓储
// ==========================================
// 职责: 管理 reactor_status 表
// 约束: (report_date, reactor_id) 唯一；写入为 insert-if-absent（首次写入为准）
// ==========================================

use crate::domain::ingest::StatusSample;
use crate::domain::reactor::StatusRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = "reactor_id, report_date, power, down_date, reason, changed, scrams";

#[derive(Clone)]
pub struct StatusRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StatusRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<StatusRecord> {
        Ok(StatusRecord {
            unit_id: row.get(0)?,
            report_date: row.get(1)?,
            power: row.get(2)?,
            down_date: row.get(3)?,
            reason: row.get(4)?,
            changed: row.get(5)?,
            scrams: row.get(6)?,
        })
    }

    /// 写入日状态（已存在则保持原值）
    ///
    /// # 返回
    /// - true: 新建
    /// - false: (report_date, reactor_id) 已存在，未改动
    pub fn insert_if_absent(&self, record: &StatusRecord) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            INSERT INTO reactor_status (
                reactor_id, report_date, power, down_date, reason, changed, scrams
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(report_date, reactor_id) DO NOTHING
            "#,
            params![
                record.unit_id,
                record.report_date,
                record.power,
                record.down_date,
                record.reason,
                record.changed,
                record.scrams,
            ],
        )?;
        Ok(affected > 0)
    }

    pub fn find(&self, unit_id: i64, report_date: NaiveDate) -> RepositoryResult<Option<StatusRecord>> {
        let conn = self.get_conn()?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM reactor_status WHERE reactor_id = ?1 AND report_date = ?2",
                    SELECT_COLUMNS
                ),
                params![unit_id, report_date],
                Self::map_row,
            )
            .optional()?;
        Ok(record)
    }

    /// 机组最近一条状态
    pub fn latest_for_unit(&self, unit_id: i64) -> RepositoryResult<Option<StatusRecord>> {
        let conn = self.get_conn()?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM reactor_status WHERE reactor_id = ?1 ORDER BY report_date DESC LIMIT 1",
                    SELECT_COLUMNS
                ),
                params![unit_id],
                Self::map_row,
            )
            .optional()?;
        Ok(record)
    }

    /// 机组全部历史 (日期, 功率)，按日期升序
    pub fn history_for_unit(&self, unit_id: i64) -> RepositoryResult<Vec<(NaiveDate, i32)>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT report_date, power FROM reactor_status WHERE reactor_id = ?1 ORDER BY report_date ASC",
        )?;
        let rows = stmt
            .query_map(params![unit_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 按机组 + 日期区间（闭区间）过滤
    pub fn list_by_unit_and_range(
        &self,
        unit_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<StatusRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM reactor_status
            WHERE reactor_id = ?1 AND report_date BETWEEN ?2 AND ?3
            ORDER BY report_date ASC
            "#,
            SELECT_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![unit_id, from, to], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn list_by_date(&self, report_date: NaiveDate) -> RepositoryResult<Vec<StatusRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM reactor_status WHERE report_date = ?1 ORDER BY reactor_id ASC",
            SELECT_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![report_date], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 全库报告日期范围 (min, max)
    pub fn date_bounds(&self) -> RepositoryResult<(Option<NaiveDate>, Option<NaiveDate>)> {
        let conn = self.get_conn()?;
        let bounds = conn.query_row(
            "SELECT MIN(report_date), MAX(report_date) FROM reactor_status",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(bounds)
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM reactor_status", [], |row| row.get(0))?;
        Ok(n)
    }

    pub fn distinct_unit_count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row(
            "SELECT COUNT(DISTINCT reactor_id) FROM reactor_status",
            [],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// 指定日期的样例状态（统计展示用）
    pub fn sample_on(&self, report_date: NaiveDate, limit: usize) -> RepositoryResult<Vec<StatusSample>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT r.name, s.power, s.reason
            FROM reactor_status s
            JOIN reactor r ON r.reactor_id = s.reactor_id
            WHERE s.report_date = ?1
            ORDER BY r.name ASC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt
            .query_map(params![report_date, limit as i64], |row| {
                Ok(StatusSample {
                    unit_name: row.get(0)?,
                    power: row.get(1)?,
                    reason: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 清空全部状态记录（重新采集前使用）
    ///
    /// # 返回
    /// 删除的记录数
    pub fn clear_all(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n = conn.execute("DELETE FROM reactor_status", [])?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};
    use crate::domain::types::Region;
    use crate::repository::ReactorRepository;

    fn setup() -> (ReactorRepository, StatusRepository) {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        let shared = Arc::new(Mutex::new(conn));
        (
            ReactorRepository::from_connection(shared.clone()),
            StatusRepository::from_connection(shared),
        )
    }

    fn status(unit_id: i64, day: u32, power: i32) -> StatusRecord {
        StatusRecord {
            unit_id,
            report_date: NaiveDate::from_ymd_opt(2021, 1, day).unwrap(),
            power,
            down_date: None,
            reason: None,
            changed: false,
            scrams: None,
        }
    }

    #[test]
    fn test_first_seen_wins() {
        let (reactors, statuses) = setup();
        let (unit, _) = reactors.get_or_create("Ginna", Region::I).unwrap();

        assert!(statuses.insert_if_absent(&status(unit.unit_id, 1, 100)).unwrap());
        assert!(!statuses.insert_if_absent(&status(unit.unit_id, 1, 50)).unwrap());

        let stored = statuses.find(unit.unit_id, status(0, 1, 0).report_date).unwrap().unwrap();
        assert_eq!(stored.power, 100);
        assert_eq!(statuses.count().unwrap(), 1);
    }

    #[test]
    fn test_unknown_unit_violates_foreign_key() {
        let (_reactors, statuses) = setup();
        let err = statuses.insert_if_absent(&status(999, 1, 100)).unwrap_err();
        assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
    }

    #[test]
    fn test_history_and_bounds() {
        let (reactors, statuses) = setup();
        let (unit, _) = reactors.get_or_create("Salem 1", Region::I).unwrap();
        for (day, power) in [(3, 90), (1, 100), (2, 95)] {
            statuses.insert_if_absent(&status(unit.unit_id, day, power)).unwrap();
        }

        let history = statuses.history_for_unit(unit.unit_id).unwrap();
        let powers: Vec<i32> = history.iter().map(|(_, p)| *p).collect();
        assert_eq!(powers, vec![100, 95, 90]);

        let (min, max) = statuses.date_bounds().unwrap();
        assert_eq!(min, NaiveDate::from_ymd_opt(2021, 1, 1));
        assert_eq!(max, NaiveDate::from_ymd_opt(2021, 1, 3));

        let latest = statuses.latest_for_unit(unit.unit_id).unwrap().unwrap();
        assert_eq!(latest.power, 90);

        let ranged = statuses
            .list_by_unit_and_range(
                unit.unit_id,
                NaiveDate::from_ymd_opt(2021, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2021, 1, 3).unwrap(),
            )
            .unwrap();
        assert_eq!(ranged.len(), 2);
    }

    #[test]
    fn test_empty_bounds() {
        let (_reactors, statuses) = setup();
        assert_eq!(statuses.date_bounds().unwrap(), (None, None));
    }
}
