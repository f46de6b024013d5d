// ==========================================
// 核电机组状态时序系统 - 预测仓储
// ==========================================
// 职责: 管理 reactor_forecast 表
// 语义: (reactor_id, target_date) 唯一，重跑覆盖（UPSERT）
// ==========================================

use crate::domain::forecast::ForecastRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str =
    "reactor_id, target_date, yhat, yhat_lower, yhat_upper, artifact_url, generated_at";

#[derive(Clone)]
pub struct ForecastRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ForecastRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<ForecastRecord> {
        Ok(ForecastRecord {
            unit_id: row.get(0)?,
            target_date: row.get(1)?,
            yhat: row.get(2)?,
            yhat_lower: row.get(3)?,
            yhat_upper: row.get(4)?,
            artifact_url: row.get(5)?,
            generated_at: row.get(6)?,
        })
    }

    /// 写入或覆盖预测
    ///
    /// 说明: 覆盖时新记录 artifact_url 为空则保留旧地址，其余字段全部替换
    pub fn upsert(&self, record: &ForecastRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO reactor_forecast (
                reactor_id, target_date, yhat, yhat_lower, yhat_upper, artifact_url, generated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(reactor_id, target_date) DO UPDATE SET
                yhat = excluded.yhat,
                yhat_lower = excluded.yhat_lower,
                yhat_upper = excluded.yhat_upper,
                artifact_url = COALESCE(excluded.artifact_url, reactor_forecast.artifact_url),
                generated_at = excluded.generated_at
            "#,
            params![
                record.unit_id,
                record.target_date,
                record.yhat,
                record.yhat_lower,
                record.yhat_upper,
                record.artifact_url,
                record.generated_at,
            ],
        )?;
        Ok(())
    }

    pub fn find(&self, unit_id: i64, target_date: NaiveDate) -> RepositoryResult<Option<ForecastRecord>> {
        let conn = self.get_conn()?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM reactor_forecast WHERE reactor_id = ?1 AND target_date = ?2",
                    SELECT_COLUMNS
                ),
                params![unit_id, target_date],
                Self::map_row,
            )
            .optional()?;
        Ok(record)
    }

    pub fn list_by_unit(&self, unit_id: i64) -> RepositoryResult<Vec<ForecastRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM reactor_forecast WHERE reactor_id = ?1 ORDER BY target_date ASC",
            SELECT_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![unit_id], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 回填图表地址（发布成功后调用）
    pub fn set_artifact_url(
        &self,
        unit_id: i64,
        target_dates: &[NaiveDate],
        url: &str,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let mut count = 0;
        for date in target_dates {
            count += conn.execute(
                "UPDATE reactor_forecast SET artifact_url = ?3 WHERE reactor_id = ?1 AND target_date = ?2",
                params![unit_id, date, url],
            )?;
        }
        Ok(count)
    }

    /// 机组预测目标日期范围 (min, max)
    pub fn date_bounds(&self, unit_id: i64) -> RepositoryResult<(Option<NaiveDate>, Option<NaiveDate>)> {
        let conn = self.get_conn()?;
        let bounds = conn.query_row(
            "SELECT MIN(target_date), MAX(target_date) FROM reactor_forecast WHERE reactor_id = ?1",
            params![unit_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(bounds)
    }
}
