// ==========================================
// 核电机组状态时序系统 - 采集日期调度
// ==========================================
// 职责: 年份区间 → 待采集日期序列（含周末）
// 支持: 断点续采（resume_from）/ 数量上限（max_dates）/ 空跑清单
// 约束: 不超过当天
// ==========================================

use crate::importer::error::{IngestError, IngestResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 空跑清单展示的日期数量
pub const DRY_RUN_PREVIEW: usize = 20;

// ==========================================
// DateRangePlan - 采集计划
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRangePlan {
    pub start_year: i32,
    pub end_year: i32,
    pub resume_from: Option<NaiveDate>, // 丢弃此日期之前的日期
    pub max_dates: Option<usize>,
}

impl DateRangePlan {
    pub fn new(start_year: i32, end_year: i32) -> Self {
        Self {
            start_year,
            end_year,
            resume_from: None,
            max_dates: None,
        }
    }

    pub fn with_resume_from(mut self, date: Option<NaiveDate>) -> Self {
        self.resume_from = date;
        self
    }

    pub fn with_max_dates(mut self, max_dates: Option<usize>) -> Self {
        self.max_dates = max_dates;
        self
    }

    /// 展开为日期序列（升序）
    pub fn dates(&self, today: NaiveDate) -> IngestResult<Vec<NaiveDate>> {
        if self.start_year > self.end_year {
            return Err(IngestError::InvalidDateRange(format!(
                "start_year {} > end_year {}",
                self.start_year, self.end_year
            )));
        }

        let start = NaiveDate::from_ymd_opt(self.start_year, 1, 1).ok_or_else(|| {
            IngestError::InvalidDateRange(format!("start_year 越界: {}", self.start_year))
        })?;
        let year_end = NaiveDate::from_ymd_opt(self.end_year, 12, 31).ok_or_else(|| {
            IngestError::InvalidDateRange(format!("end_year 越界: {}", self.end_year))
        })?;
        let end = year_end.min(today);

        let first = match self.resume_from {
            Some(resume) => resume.max(start),
            None => start,
        };

        let dates = first
            .iter_days()
            .take_while(|d| *d <= end)
            .take(self.max_dates.unwrap_or(usize::MAX))
            .collect();
        Ok(dates)
    }
}

/// 解析续采日期（YYYYMMDD）
pub fn parse_resume_date(value: &str) -> IngestResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y%m%d")
        .map_err(|_| IngestError::DateFormat(value.to_string()))
}

// ==========================================
// DryRunListing - 空跑清单
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DryRunListing {
    pub total: usize,
    pub preview: Vec<(NaiveDate, String)>, // (日期, 星期)
}

impl DryRunListing {
    pub fn from_dates(dates: &[NaiveDate]) -> Self {
        Self {
            total: dates.len(),
            preview: dates
                .iter()
                .take(DRY_RUN_PREVIEW)
                .map(|d| (*d, d.format("%A").to_string()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_full_years_include_weekends() {
        let dates = DateRangePlan::new(2020, 2021).dates(ymd(2030, 1, 1)).unwrap();
        assert_eq!(dates.len(), 366 + 365);
        assert_eq!(dates.first(), Some(&ymd(2020, 1, 1)));
        assert_eq!(dates.last(), Some(&ymd(2021, 12, 31)));
    }

    #[test]
    fn test_capped_at_today() {
        let today = ymd(2024, 3, 5);
        let dates = DateRangePlan::new(2024, 2025).dates(today).unwrap();
        assert_eq!(dates.last(), Some(&today));
        assert_eq!(dates.len(), 31 + 29 + 5);
    }

    #[test]
    fn test_resume_and_max_dates() {
        let dates = DateRangePlan::new(2021, 2021)
            .with_resume_from(Some(ymd(2021, 6, 30)))
            .with_max_dates(Some(3))
            .dates(ymd(2030, 1, 1))
            .unwrap();
        assert_eq!(dates, vec![ymd(2021, 6, 30), ymd(2021, 7, 1), ymd(2021, 7, 2)]);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = DateRangePlan::new(2022, 2021).dates(ymd(2030, 1, 1)).unwrap_err();
        assert!(matches!(err, IngestError::InvalidDateRange(_)));
    }

    #[test]
    fn test_resume_after_end_is_empty() {
        let dates = DateRangePlan::new(2021, 2021)
            .with_resume_from(Some(ymd(2022, 1, 1)))
            .dates(ymd(2030, 1, 1))
            .unwrap();
        assert!(dates.is_empty());
    }

    #[test]
    fn test_parse_resume_date() {
        assert_eq!(parse_resume_date("20210115").unwrap(), ymd(2021, 1, 15));
        assert!(matches!(parse_resume_date("2021-01-15"), Err(IngestError::DateFormat(_))));
    }

    #[test]
    fn test_dry_run_listing_previews_first_dates() {
        let dates = DateRangePlan::new(2021, 2021).dates(ymd(2030, 1, 1)).unwrap();
        let listing = DryRunListing::from_dates(&dates);
        assert_eq!(listing.total, 365);
        assert_eq!(listing.preview.len(), DRY_RUN_PREVIEW);
        assert_eq!(listing.preview[0], (ymd(2021, 1, 1), "Friday".to_string()));
    }
}
