// ==========================================
// 核电机组状态时序系统 - 日状态写入
// ==========================================
// 职责: 原始行 → 归一化 / 分类 → 机组 get-or-create → 日状态插入
// 幂等: (report_date, reactor_id) 已存在时保持首次写入值，计为 Skipped
// 说明: 单行失败落为 RowOutcome::Failed，不阻断同日其他行
// ==========================================

use crate::domain::ingest::{DateIngestReport, RowOutcome, RowResult};
use crate::domain::reactor::{NewStatus, RawStatusRow, StatusRecord};
use crate::domain::types::TableLayout;
use crate::importer::region_classifier::{RegionClassifier, RegionMatch};
use crate::importer::unit_normalizer::UnitNormalizer;
use crate::repository::{ReactorRepository, RepositoryResult, StatusRepository};
use chrono::NaiveDate;
use tracing::{debug, warn};

/// 变更标记字符
pub const CHANGE_MARKER: char = '*';

/// 停堆日期格式（月/日/年）
const DOWN_DATE_FORMAT: &str = "%m/%d/%Y";

// ==========================================
// 字段强制转换
// ==========================================

/// 功率: 整数解析，非数值时为 0
pub fn coerce_power(value: &str) -> i32 {
    value.trim().parse::<i32>().unwrap_or(0)
}

pub fn coerce_down_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DOWN_DATE_FORMAT).ok()
}

pub fn coerce_reason(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn coerce_changed(value: &str) -> bool {
    value.contains(CHANGE_MARKER)
}

/// 紧急停堆次数: 仅全数字时解析
pub fn coerce_scrams(value: &str) -> Option<i32> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<i32>().ok()
}

// ==========================================
// StatusWriter
// ==========================================
pub struct StatusWriter {
    reactors: ReactorRepository,
    statuses: StatusRepository,
    normalizer: UnitNormalizer,
    classifier: RegionClassifier,
}

impl StatusWriter {
    pub fn new(reactors: ReactorRepository, statuses: StatusRepository) -> Self {
        Self {
            reactors,
            statuses,
            normalizer: UnitNormalizer::new(),
            classifier: RegionClassifier::new(),
        }
    }

    /// 原始行 → 待写入状态（未关联 unit_id）
    ///
    /// 归一化后机组名为空时返回 None
    pub fn prepare(&self, row: &RawStatusRow, report_date: NaiveDate) -> Option<NewStatus> {
        let normalized = self.normalizer.normalize(&row.unit);
        if normalized.name.is_empty() {
            return None;
        }

        let region = match self.classifier.classify(&normalized.name) {
            RegionMatch::Matched { region, .. } => region,
            RegionMatch::Fallback(region) => {
                warn!(unit = %normalized.name, region = %region, "未识别电站，使用默认区域");
                region
            }
        };

        Some(NewStatus {
            unit_name: normalized.name,
            region,
            report_date,
            power: coerce_power(&row.power),
            down_date: coerce_down_date(&row.down_date),
            reason: coerce_reason(&row.reason),
            changed: coerce_changed(&row.change),
            scrams: coerce_scrams(&row.scrams),
        })
    }

    /// 写入一条待写入状态
    pub fn write(&self, status: &NewStatus) -> RepositoryResult<RowOutcome> {
        let (unit, created_unit) = self.reactors.get_or_create(&status.unit_name, status.region)?;
        if created_unit {
            debug!(unit = %unit.name, region = %unit.region, "新建机组");
        }

        let record = StatusRecord {
            unit_id: unit.unit_id,
            report_date: status.report_date,
            power: status.power,
            down_date: status.down_date,
            reason: status.reason.clone(),
            changed: status.changed,
            scrams: status.scrams,
        };

        Ok(if self.statuses.insert_if_absent(&record)? {
            RowOutcome::Created
        } else {
            RowOutcome::Skipped
        })
    }

    /// 写入一个日期的全部行
    pub fn write_rows<I>(&self, report_date: NaiveDate, layout: TableLayout, rows: I) -> DateIngestReport
    where
        I: IntoIterator<Item = RawStatusRow>,
    {
        let results = rows
            .into_iter()
            .map(|row| {
                let Some(status) = self.prepare(&row, report_date) else {
                    return RowResult {
                        raw_unit: row.unit,
                        unit_name: String::new(),
                        outcome: RowOutcome::Failed("机组名为空".to_string()),
                    };
                };

                let outcome = self.write(&status).unwrap_or_else(|e| {
                    warn!(date = %report_date, unit = %status.unit_name, error = %e, "日状态写入失败");
                    RowOutcome::Failed(e.to_string())
                });

                RowResult {
                    raw_unit: row.unit,
                    unit_name: status.unit_name,
                    outcome,
                }
            })
            .collect();

        DateIngestReport {
            report_date,
            layout,
            rows: results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};
    use crate::domain::types::Region;
    use rusqlite::Connection;
    use std::sync::{Arc, Mutex};

    fn memory_writer() -> StatusWriter {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        StatusWriter::new(
            ReactorRepository::from_connection(conn.clone()),
            StatusRepository::from_connection(conn),
        )
    }

    fn six(unit: &str, power: &str, down: &str, reason: &str, change: &str, scrams: &str) -> RawStatusRow {
        RawStatusRow::from_six([
            unit.to_string(),
            power.to_string(),
            down.to_string(),
            reason.to_string(),
            change.to_string(),
            scrams.to_string(),
        ])
    }

    #[test]
    fn test_coercion_rules() {
        assert_eq!(coerce_power(" 95 "), 95);
        assert_eq!(coerce_power("N/A"), 0);
        assert_eq!(coerce_down_date("10/14/2020"), NaiveDate::from_ymd_opt(2020, 10, 14));
        assert_eq!(coerce_down_date("2020-10-14"), None);
        assert_eq!(coerce_reason("  "), None);
        assert!(coerce_changed(" * "));
        assert!(!coerce_changed(""));
        assert_eq!(coerce_scrams("2"), Some(2));
        assert_eq!(coerce_scrams("2a"), None);
        assert_eq!(coerce_scrams("-1"), None);
    }

    #[test]
    fn test_prepare_normalizes_and_classifies() {
        let writer = memory_writer();
        let date = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
        let status = writer
            .prepare(&six("COOK 1", "0", "02/27/2021", "Refueling", "*", "0"), date)
            .unwrap();

        assert_eq!(status.unit_name, "D.C. Cook 1");
        assert_eq!(status.region, Region::III);
        assert_eq!(status.power, 0);
        assert_eq!(status.down_date, NaiveDate::from_ymd_opt(2021, 2, 27));
        assert!(status.changed);
        assert_eq!(status.scrams, Some(0));
    }

    #[test]
    fn test_write_rows_is_idempotent() {
        let writer = memory_writer();
        let date = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
        let rows = || {
            vec![
                six("Ginna", "100", "", "", "", ""),
                six("Salem 1", "0", "", "Refueling", "*", ""),
                six("   ", "100", "", "", "", ""),
            ]
        };

        let first = writer.write_rows(date, TableLayout::SixField, rows());
        assert_eq!(first.created_count(), 2);
        assert_eq!(first.failed_count(), 1);

        let second = writer.write_rows(date, TableLayout::SixField, rows());
        assert_eq!(second.created_count(), 0);
        assert_eq!(second.skipped_count(), 2);
        assert_eq!(writer.statuses.count().unwrap(), 2);
    }

    #[test]
    fn test_existing_values_not_overwritten() {
        let writer = memory_writer();
        let date = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();

        writer.write_rows(date, TableLayout::TwoField, vec![RawStatusRow::from_two("Ginna".into(), "100".into())]);
        writer.write_rows(date, TableLayout::TwoField, vec![RawStatusRow::from_two("Ginna".into(), "40".into())]);

        let unit = writer.reactors.find_by_name("Ginna").unwrap().unwrap();
        let stored = writer.statuses.find(unit.unit_id, date).unwrap().unwrap();
        assert_eq!(stored.power, 100);
    }
}
