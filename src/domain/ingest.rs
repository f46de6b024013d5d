// ==========================================
// 核电机组状态时序系统 - 采集结果模型
// ==========================================
// 职责: 逐行结果 → 逐日报告 → 整批汇总
// 说明: 逐行写库异常不被吞掉，而是落为 RowOutcome::Failed
// ==========================================

use crate::domain::types::TableLayout;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// RowOutcome - 单行写入结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowOutcome {
    Created,        // 新建
    Skipped,        // (日期, 机组) 已存在，保持首次写入值
    Failed(String), // 写入失败（不阻断同日其他行）
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowResult {
    pub raw_unit: String,
    pub unit_name: String,
    pub outcome: RowOutcome,
}

// ==========================================
// DateIngestReport - 单日采集报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateIngestReport {
    pub report_date: NaiveDate,
    pub layout: TableLayout,
    pub rows: Vec<RowResult>,
}

impl DateIngestReport {
    pub fn created_count(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Created))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Skipped))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Failed(_)))
    }

    /// 本日新建记录涉及的机组（去重，保持出现顺序）
    pub fn created_units(&self) -> Vec<String> {
        let mut units: Vec<String> = Vec::new();
        for row in &self.rows {
            if row.outcome == RowOutcome::Created && !units.contains(&row.unit_name) {
                units.push(row.unit_name.clone());
            }
        }
        units
    }

    fn count(&self, pred: impl Fn(&RowOutcome) -> bool) -> usize {
        self.rows.iter().filter(|r| pred(&r.outcome)).count()
    }
}

// ==========================================
// DateOutcome - 单日处理结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DateOutcome {
    Ingested(DateIngestReport),
    NotPublished,               // 当日无日报（404）
    NoTable,                    // 日报存在但无可识别表格
    FetchFailed { message: String }, // 超时 / 非 2xx / 网络错误
}

impl DateOutcome {
    /// 当日是否有可用数据
    pub fn has_data(&self) -> bool {
        matches!(self, DateOutcome::Ingested(r) if !r.rows.is_empty())
    }
}

// ==========================================
// SeedReport - 整批采集汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedReport {
    pub run_id: String, // 本次批量采集标识（日志关联）
    pub total_dates: usize,
    pub processed: usize,
    pub successful: usize,    // 有新建记录的日期数
    pub unchanged: usize,     // 有数据但无新建记录的日期数
    pub failed: usize,        // 无数据的日期数
    pub total_records: usize, // 新建记录总数
    pub failed_rows: usize,
    pub missing_dates: Vec<NaiveDate>,
    pub error_dates: Vec<(NaiveDate, String)>,
}

impl SeedReport {
    /// 合并单日结果
    pub fn record(&mut self, date: NaiveDate, outcome: &DateOutcome) {
        self.processed += 1;
        match outcome {
            DateOutcome::Ingested(report) if !report.rows.is_empty() => {
                let created = report.created_count();
                self.total_records += created;
                self.failed_rows += report.failed_count();
                if created > 0 {
                    self.successful += 1;
                } else {
                    self.unchanged += 1;
                }
            }
            DateOutcome::FetchFailed { message } => {
                self.failed += 1;
                self.missing_dates.push(date);
                self.error_dates.push((date, message.clone()));
            }
            _ => {
                self.failed += 1;
                self.missing_dates.push(date);
            }
        }
    }

    /// 缺失日期按月分组（键: YYYY-MM）
    pub fn missing_by_month(&self) -> BTreeMap<String, Vec<NaiveDate>> {
        let mut grouped: BTreeMap<String, Vec<NaiveDate>> = BTreeMap::new();
        for date in &self.missing_dates {
            grouped
                .entry(date.format("%Y-%m").to_string())
                .or_default()
                .push(*date);
        }
        grouped
    }
}

// ==========================================
// DatabaseStats - 库内统计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseStats {
    pub total_records: i64,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub unique_units: i64,
    pub recent_sample: Vec<StatusSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSample {
    pub unit_name: String,
    pub power: i32,
    pub reason: Option<String>,
}
