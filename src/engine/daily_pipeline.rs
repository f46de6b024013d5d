// ==========================================
// 核电机组状态时序系统 - 每日触发流水线
// ==========================================
// 入口: run_once(today)，由外部定时器每日调用一次
// 流程: 最大状态日之后至今天的日期逐日采集 → 新增状态的机组逐一预测 → 检测
// 约定: 库为空或下一日期晚于今天时不做任何事
// 约定: 未发布的日期不阻塞后续日期；其后有数据的日期入库后不再重试
// ==========================================

use crate::domain::ingest::DateOutcome;
use crate::engine::error::ForecastError;
use crate::engine::forecaster::{Forecaster, UnitForecast};
use crate::engine::outage_detector::{DetectionOutcome, OutageDetector};
use crate::importer::{IngestResult, ReportImporter};
use crate::repository::StatusRepository;
use chrono::{Duration, NaiveDate};
use tracing::{info, instrument};
use uuid::Uuid;

// ==========================================
// 运行结果
// ==========================================
#[derive(Debug)]
pub enum DailyRun {
    /// 库中尚无任何状态（需先批量采集）
    EmptyStore,
    /// 下一个待采集日期尚未到来
    UpToDate { next_date: NaiveDate },
    Completed(DailyRunReport),
}

#[derive(Debug)]
pub struct DailyRunReport {
    pub run_id: String,
    pub dates: Vec<(NaiveDate, DateOutcome)>, // 本次尝试的日期（升序）
    pub units: Vec<UnitRunResult>,
}

impl DailyRunReport {
    /// 本次入库了数据的最后一个日期
    pub fn latest_ingested(&self) -> Option<NaiveDate> {
        self.dates
            .iter()
            .rev()
            .find(|(_, outcome)| outcome.has_data())
            .map(|(date, _)| *date)
    }

    pub fn forecasted_count(&self) -> usize {
        self.units.iter().filter(|u| u.forecast.is_ok()).count()
    }

    pub fn flagged_count(&self) -> usize {
        self.units
            .iter()
            .filter(|u| matches!(&u.detection, Some(Ok(o)) if o.created_outage()))
            .count()
    }
}

#[derive(Debug)]
pub struct UnitRunResult {
    pub unit_name: String,
    pub forecast: Result<UnitForecast, ForecastError>,
    pub detection: Option<Result<DetectionOutcome, String>>, // 预测失败时不检测
}

// ==========================================
// DailyPipeline
// ==========================================
pub struct DailyPipeline<I>
where
    I: ReportImporter,
{
    importer: I,
    statuses: StatusRepository,
    forecaster: Forecaster,
    detector: OutageDetector,
}

impl<I> DailyPipeline<I>
where
    I: ReportImporter,
{
    pub fn new(importer: I, statuses: StatusRepository, forecaster: Forecaster, detector: OutageDetector) -> Self {
        Self {
            importer,
            statuses,
            forecaster,
            detector,
        }
    }

    /// 下一个待采集日期（最大状态日 + 1）
    pub fn next_date(&self) -> IngestResult<Option<NaiveDate>> {
        let (_, max_date) = self.statuses.date_bounds()?;
        Ok(max_date.map(|d| d + Duration::days(1)))
    }

    #[instrument(skip(self), fields(today = %today))]
    pub async fn run_once(&self, today: NaiveDate) -> IngestResult<DailyRun> {
        let Some(next_date) = self.next_date()? else {
            info!("库中无状态记录，跳过每日任务");
            return Ok(DailyRun::EmptyStore);
        };
        if next_date > today {
            info!(next_date = %next_date, "已是最新，无需采集");
            return Ok(DailyRun::UpToDate { next_date });
        }

        let pending: Vec<NaiveDate> = next_date.iter_days().take_while(|d| *d <= today).collect();
        let dates = self.importer.ingest_dates(&pending).await;

        let mut unit_names: Vec<String> = Vec::new();
        for (_, outcome) in &dates {
            if let DateOutcome::Ingested(report) = outcome {
                for name in report.created_units() {
                    if !unit_names.contains(&name) {
                        unit_names.push(name);
                    }
                }
            }
        }
        info!(
            from = %next_date,
            to = %today,
            dates = dates.len(),
            with_data = dates.iter().filter(|(_, o)| o.has_data()).count(),
            units = unit_names.len(),
            "每日采集完成"
        );

        let forecasts = self.forecaster.forecast_units(&unit_names).await;
        let units: Vec<UnitRunResult> = forecasts
            .into_iter()
            .map(|(unit_name, forecast)| {
                let detection = forecast.is_ok().then(|| {
                    self.detector
                        .detect(&unit_name)
                        .map_err(|e| e.to_string())
                });
                UnitRunResult {
                    unit_name,
                    forecast,
                    detection,
                }
            })
            .collect();

        let report = DailyRunReport {
            run_id: Uuid::new_v4().to_string(),
            dates,
            units,
        };
        info!(
            run_id = %report.run_id,
            latest = ?report.latest_ingested(),
            forecasted = report.forecasted_count(),
            flagged = report.flagged_count(),
            "每日任务完成"
        );
        Ok(DailyRun::Completed(report))
    }
}
