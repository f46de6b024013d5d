// ==========================================
// 核电机组状态时序系统 - 日报采集 Trait
// ==========================================
// 职责: 定义日报采集接口（不包含实现）
// ==========================================

use crate::domain::ingest::{DatabaseStats, DateOutcome, SeedReport};
use crate::importer::date_scheduler::{DateRangePlan, DryRunListing};
use crate::importer::error::IngestResult;
use async_trait::async_trait;
use chrono::NaiveDate;

// ==========================================
// ReportImporter Trait
// ==========================================
// 实现者: ReportImporterImpl
#[async_trait]
pub trait ReportImporter: Send + Sync {
    /// 采集单个日期
    ///
    /// 抓取失败 / 无表格不返回错误，落为对应的 DateOutcome
    async fn ingest_date(&self, date: NaiveDate) -> DateOutcome;

    /// 按顺序采集一组日期（日期之间节流），返回逐日结果
    async fn ingest_dates(&self, dates: &[NaiveDate]) -> Vec<(NaiveDate, DateOutcome)>;

    /// 按计划批量采集
    ///
    /// # 参数
    /// - plan: 年份区间 + 续采日期 + 数量上限
    /// - today: 日期上界
    ///
    /// # 返回
    /// - Ok(SeedReport): 汇总（单日失败不中断批次）
    /// - Err: 计划无效
    async fn seed(&self, plan: &DateRangePlan, today: NaiveDate) -> IngestResult<SeedReport>;

    /// 空跑: 仅列出待采集日期
    fn dry_run(&self, plan: &DateRangePlan, today: NaiveDate) -> IngestResult<DryRunListing>;

    /// 清空已有日状态，返回删除条数
    fn clear_existing(&self) -> IngestResult<usize>;

    fn database_stats(&self) -> IngestResult<DatabaseStats>;
}
