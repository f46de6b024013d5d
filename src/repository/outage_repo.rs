// ==========================================
// 核电机组状态时序系统 - 疑似停堆仓储
// ==========================================
// 职责: 管理 candidate_outage 表
// 语义: (reactor_id, date_detected) get-or-create；confirmed 仅由人工复核修改
// ==========================================

use crate::domain::forecast::CandidateOutage;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str =
    "outage_id, reactor_id, date_detected, description, auto_detected, confirmed";

#[derive(Clone)]
pub struct OutageRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OutageRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<CandidateOutage> {
        Ok(CandidateOutage {
            outage_id: row.get(0)?,
            unit_id: row.get(1)?,
            date_detected: row.get(2)?,
            description: row.get(3)?,
            auto_detected: row.get(4)?,
            confirmed: row.get(5)?,
        })
    }

    /// 获取或创建疑似停堆记录
    ///
    /// # 返回
    /// - (CandidateOutage, true): 新建（auto_detected=true, confirmed=false）
    /// - (CandidateOutage, false): 已存在，原记录不变
    pub fn get_or_create(
        &self,
        unit_id: i64,
        date_detected: NaiveDate,
        description: &str,
    ) -> RepositoryResult<(CandidateOutage, bool)> {
        let conn = self.get_conn()?;
        let inserted = conn.execute(
            r#"
            INSERT INTO candidate_outage (reactor_id, date_detected, description, auto_detected, confirmed)
            VALUES (?1, ?2, ?3, 1, 0)
            ON CONFLICT(reactor_id, date_detected) DO NOTHING
            "#,
            params![unit_id, date_detected, description],
        )?;

        let outage = conn.query_row(
            &format!(
                "SELECT {} FROM candidate_outage WHERE reactor_id = ?1 AND date_detected = ?2",
                SELECT_COLUMNS
            ),
            params![unit_id, date_detected],
            Self::map_row,
        )?;

        Ok((outage, inserted > 0))
    }

    pub fn find(&self, unit_id: i64, date_detected: NaiveDate) -> RepositoryResult<Option<CandidateOutage>> {
        let conn = self.get_conn()?;
        let outage = conn
            .query_row(
                &format!(
                    "SELECT {} FROM candidate_outage WHERE reactor_id = ?1 AND date_detected = ?2",
                    SELECT_COLUMNS
                ),
                params![unit_id, date_detected],
                Self::map_row,
            )
            .optional()?;
        Ok(outage)
    }

    pub fn list_by_unit(&self, unit_id: i64) -> RepositoryResult<Vec<CandidateOutage>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM candidate_outage WHERE reactor_id = ?1 ORDER BY date_detected DESC",
            SELECT_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![unit_id], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 待人工复核的疑似停堆
    pub fn list_unconfirmed(&self) -> RepositoryResult<Vec<CandidateOutage>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM candidate_outage WHERE confirmed = 0 ORDER BY date_detected DESC",
            SELECT_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 人工复核结论
    pub fn set_confirmed(&self, outage_id: i64, confirmed: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE candidate_outage SET confirmed = ?2 WHERE outage_id = ?1",
            params![outage_id, confirmed],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "candidate_outage".to_string(),
                id: outage_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM candidate_outage", [], |row| row.get(0))?;
        Ok(n)
    }
}
