use super::model::FittedModel;
use crate::config::ForecastConfig;
use crate::domain::forecast::{ForecastPoint, ForecastRecord};
use crate::domain::reactor::ReactorUnit;
use crate::engine::error::{ForecastError, ForecastResult};
use crate::engine::publisher::{chart_path, render_chart_csv, ArtifactPublisher};
use crate::repository::{ForecastRepository, ReactorRepository, Repositories, StatusRepository};
use chrono::{Duration, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

// ==========================================
// ForecastRun - 单次训练结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRun {
    pub last_observed: NaiveDate,
    pub fitted: Vec<ForecastPoint>,         // 历史段拟合值（与历史一一对应）
    pub horizon: Vec<ForecastPoint>,        // last_observed+1 ..= last_observed+horizon_days
    pub outage_window_days: Vec<NaiveDate>, // 落在换料停堆窗口内的历史日期
}

impl ForecastRun {
    pub fn point_at(&self, date: NaiveDate) -> Option<&ForecastPoint> {
        self.fitted
            .iter()
            .chain(self.horizon.iter())
            .find(|p| p.date == date)
    }

    /// 需要落库的预测点: 次日与预测期末
    pub fn persisted_points(&self) -> Vec<ForecastPoint> {
        match (self.horizon.first(), self.horizon.last()) {
            (Some(first), Some(last)) if first.date != last.date => vec![*first, *last],
            (Some(first), _) => vec![*first],
            _ => Vec::new(),
        }
    }

    pub fn is_outage_window_day(&self, date: NaiveDate) -> bool {
        self.outage_window_days.contains(&date)
    }
}

/// 训练并预测（纯计算，不访问存储）
///
/// history 须按日期升序
pub fn fit_history(history: &[(NaiveDate, i32)], config: &ForecastConfig) -> ForecastResult<ForecastRun> {
    if config.horizon_days == 0 {
        return Err(ForecastError::InvalidConfig("horizon_days 须大于 0".to_string()));
    }

    let series: Vec<(NaiveDate, f64)> = history.iter().map(|(d, p)| (*d, *p as f64)).collect();
    let model = FittedModel::fit(&series, config)?;
    let last_observed = model.last_observed();

    let fitted = series.iter().map(|(d, _)| model.predict(*d)).collect();
    let horizon = (1..=config.horizon_days as i64)
        .map(|h| model.predict(last_observed + Duration::days(h)))
        .collect();
    let outage_window_days = series
        .iter()
        .map(|(d, _)| *d)
        .filter(|d| model.design().in_outage_window(*d))
        .collect();

    Ok(ForecastRun {
        last_observed,
        fitted,
        horizon,
        outage_window_days,
    })
}

// ==========================================
// UnitForecast - 单机组预测结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitForecast {
    pub unit: ReactorUnit,
    pub run: ForecastRun,
    pub persisted: Vec<ForecastRecord>,
    pub artifact_url: Option<String>,
}

// ==========================================
// Forecaster - 预测引擎
// ==========================================
#[derive(Clone)]
pub struct Forecaster {
    reactors: ReactorRepository,
    statuses: StatusRepository,
    forecasts: ForecastRepository,
    publisher: Arc<dyn ArtifactPublisher>,
    config: ForecastConfig,
}

impl Forecaster {
    pub fn new(repos: &Repositories, publisher: Arc<dyn ArtifactPublisher>, config: ForecastConfig) -> Self {
        Self {
            reactors: repos.reactors.clone(),
            statuses: repos.statuses.clone(),
            forecasts: repos.forecasts.clone(),
            publisher,
            config,
        }
    }

    /// 预测单个机组并落库
    ///
    /// # 返回
    /// - Err(UnknownReactor): 机组未登记
    /// - Err(NoHistory): 机组无历史状态
    #[instrument(skip(self))]
    pub async fn forecast_unit(&self, unit_name: &str) -> ForecastResult<UnitForecast> {
        let unit = self
            .reactors
            .find_by_name(unit_name)?
            .ok_or_else(|| ForecastError::UnknownReactor(unit_name.to_string()))?;

        let history = self.statuses.history_for_unit(unit.unit_id)?;
        if history.is_empty() {
            return Err(ForecastError::NoHistory {
                unit: unit.name.clone(),
            });
        }

        // 模型求解为纯 CPU 计算，放到阻塞线程池
        let config = self.config.clone();
        let (history, run) = tokio::task::spawn_blocking(move || {
            fit_history(&history, &config).map(|run| (history, run))
        })
        .await
        .map_err(|e| ForecastError::Task(e.to_string()))??;

        let generated_at = Utc::now().naive_utc();
        let mut persisted: Vec<ForecastRecord> = run
            .persisted_points()
            .iter()
            .map(|p| ForecastRecord::from_point(unit.unit_id, p, generated_at))
            .collect();
        for record in &persisted {
            self.forecasts.upsert(record)?;
        }

        info!(
            unit = %unit.name,
            history = history.len(),
            last_observed = %run.last_observed,
            window_days = run.outage_window_days.len(),
            next_day_yhat = ?persisted.first().map(|r| r.yhat),
            "预测完成"
        );

        let artifact_url = self.publish_chart(&unit, &history, &run, &persisted).await;
        if let Some(url) = &artifact_url {
            for record in &mut persisted {
                record.artifact_url = Some(url.clone());
            }
        }

        Ok(UnitForecast {
            unit,
            run,
            persisted,
            artifact_url,
        })
    }

    /// 渲染并发布图表，成功后回填地址；任何失败只记录日志
    async fn publish_chart(
        &self,
        unit: &ReactorUnit,
        history: &[(NaiveDate, i32)],
        run: &ForecastRun,
        persisted: &[ForecastRecord],
    ) -> Option<String> {
        let blob = match render_chart_csv(history, &run.fitted, &run.horizon) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(unit = %unit.name, error = %e, "图表渲染失败");
                return None;
            }
        };

        let url = match self.publisher.publish(&chart_path(&unit.name), blob).await {
            Ok(url) => url,
            Err(e) => {
                warn!(unit = %unit.name, error = %e, "图表发布失败，预测值已保留");
                return None;
            }
        };

        let dates: Vec<NaiveDate> = persisted.iter().map(|r| r.target_date).collect();
        match self.forecasts.set_artifact_url(unit.unit_id, &dates, &url) {
            Ok(_) => Some(url),
            Err(e) => {
                warn!(unit = %unit.name, error = %e, "图表地址回填失败");
                None
            }
        }
    }

    /// 并行预测多个机组（并发度 = forecast.concurrency）
    ///
    /// 单个机组失败不影响其他机组
    pub async fn forecast_units(&self, unit_names: &[String]) -> Vec<(String, ForecastResult<UnitForecast>)> {
        stream::iter(unit_names.iter().cloned())
            .map(|name| async move {
                let result = self.forecast_unit(&name).await;
                if let Err(e) = &result {
                    warn!(unit = %name, error = %e, "机组预测失败");
                }
                (name, result)
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await
    }
}
