// ==========================================
// 核电机组状态时序系统 - 日报采集器实现
// ==========================================
// 职责: 日期调度 → 抓取 → 表格抽取 → 归一化/分类 → 落库
// 约束: 逐日顺序执行，日期之间按配置节流
// 约束: 单日失败只影响该日，由续采日期恢复整批中断
// ==========================================

use crate::config::FetchConfig;
use crate::domain::ingest::{DatabaseStats, DateOutcome, SeedReport};
use crate::importer::date_scheduler::{DateRangePlan, DryRunListing};
use crate::importer::error::IngestResult;
use crate::importer::report_fetcher::{FetchOutcome, ReportFetcher};
use crate::importer::report_importer_trait::ReportImporter;
use crate::importer::status_writer::StatusWriter;
use crate::importer::table_extractor::TableExtractor;
use crate::repository::{ReactorRepository, StatusRepository};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// 进度日志间隔（日期数）
pub const PROGRESS_EVERY: usize = 50;

/// 统计样本条数
const STATS_SAMPLE_SIZE: usize = 5;

// ==========================================
// ReportImporterImpl - 日报采集器实现
// ==========================================
pub struct ReportImporterImpl<F>
where
    F: ReportFetcher,
{
    fetcher: F,
    extractor: TableExtractor,
    writer: StatusWriter,
    statuses: StatusRepository,
    delay: Duration, // 相邻日期之间的节流间隔
}

impl<F> ReportImporterImpl<F>
where
    F: ReportFetcher,
{
    /// 创建采集器
    ///
    /// # 参数
    /// - fetcher: 日报抓取器
    /// - reactors / statuses: 共享同一连接的仓储
    /// - fetch_config: 节流间隔等抓取参数
    pub fn new(
        fetcher: F,
        reactors: ReactorRepository,
        statuses: StatusRepository,
        fetch_config: &FetchConfig,
    ) -> Self {
        Self {
            fetcher,
            extractor: TableExtractor::new(),
            writer: StatusWriter::new(reactors, statuses.clone()),
            statuses,
            delay: fetch_config.delay(),
        }
    }

    /// 覆盖节流间隔（命令行参数 / 每日触发）
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl<F> ReportImporter for ReportImporterImpl<F>
where
    F: ReportFetcher,
{
    #[instrument(skip(self), fields(date = %date))]
    async fn ingest_date(&self, date: NaiveDate) -> DateOutcome {
        let html = match self.fetcher.fetch(date).await {
            Ok(FetchOutcome::Document(html)) => html,
            Ok(FetchOutcome::NotPublished) => {
                debug!("当日未发布日报");
                return DateOutcome::NotPublished;
            }
            Err(e) => {
                warn!(error = %e, "日报抓取失败，跳过该日期");
                return DateOutcome::FetchFailed {
                    message: e.to_string(),
                };
            }
        };

        let extraction = self.extractor.extract(&html);
        let Some(layout) = extraction.layout() else {
            debug!(tables = extraction.tables_found(), "未识别到状态表格");
            return DateOutcome::NoTable;
        };

        let report = self.writer.write_rows(date, layout, extraction.rows());
        debug!(
            layout = %layout,
            rows = report.rows.len(),
            created = report.created_count(),
            skipped = report.skipped_count(),
            failed = report.failed_count(),
            "日报写入完成"
        );
        DateOutcome::Ingested(report)
    }

    async fn ingest_dates(&self, dates: &[NaiveDate]) -> Vec<(NaiveDate, DateOutcome)> {
        let mut outcomes = Vec::with_capacity(dates.len());
        for (idx, date) in dates.iter().enumerate() {
            outcomes.push((*date, self.ingest_date(*date).await));
            if idx + 1 < dates.len() && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
        outcomes
    }

    #[instrument(skip(self, plan), fields(start_year = plan.start_year, end_year = plan.end_year))]
    async fn seed(&self, plan: &DateRangePlan, today: NaiveDate) -> IngestResult<SeedReport> {
        let dates = plan.dates(today)?;
        let started = Instant::now();
        let mut report = SeedReport {
            run_id: Uuid::new_v4().to_string(),
            total_dates: dates.len(),
            ..SeedReport::default()
        };

        info!(
            run_id = %report.run_id,
            total_dates = dates.len(),
            first = ?dates.first(),
            last = ?dates.last(),
            "开始批量采集"
        );

        for (idx, date) in dates.iter().enumerate() {
            let outcome = self.ingest_date(*date).await;
            report.record(*date, &outcome);

            if (idx + 1) % PROGRESS_EVERY == 0 {
                info!(
                    processed = idx + 1,
                    total = dates.len(),
                    current = %date,
                    records_added = report.total_records,
                    elapsed_secs = started.elapsed().as_secs(),
                    "采集进度"
                );
            }

            if idx + 1 < dates.len() && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        info!(
            run_id = %report.run_id,
            processed = report.processed,
            successful = report.successful,
            unchanged = report.unchanged,
            failed = report.failed,
            records_added = report.total_records,
            failed_rows = report.failed_rows,
            "批量采集完成"
        );
        for (month, missing) in report.missing_by_month() {
            debug!(month = %month, count = missing.len(), "缺失日期");
        }

        Ok(report)
    }

    fn dry_run(&self, plan: &DateRangePlan, today: NaiveDate) -> IngestResult<DryRunListing> {
        let dates = plan.dates(today)?;
        Ok(DryRunListing::from_dates(&dates))
    }

    fn clear_existing(&self) -> IngestResult<usize> {
        let removed = self.statuses.clear_all()?;
        warn!(removed = removed, "已清空日状态记录");
        Ok(removed)
    }

    fn database_stats(&self) -> IngestResult<DatabaseStats> {
        let (min_date, max_date) = self.statuses.date_bounds()?;
        let recent_sample = match max_date {
            Some(date) => self.statuses.sample_on(date, STATS_SAMPLE_SIZE)?,
            None => Vec::new(),
        };

        Ok(DatabaseStats {
            total_records: self.statuses.count()?,
            min_date,
            max_date,
            unique_units: self.statuses.distinct_unit_count()?,
            recent_sample,
        })
    }
}
