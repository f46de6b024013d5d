// ==========================================
// 核电机组状态时序系统 - 疑似停堆检测引擎
// ==========================================
// 职责: 最近观测功率 vs 预测值 → 疑似非计划停堆
// 对齐: 预测目标日 = 最近状态日 + offset_days（默认 +1）
// 判定: drop = yhat - actual ≥ threshold 时 get-or-create 疑似停堆记录
// 红线: 缺少状态或预测为正常空结果；未登记机组显式报错
// ==========================================

use crate::config::DetectionConfig;
use crate::domain::forecast::CandidateOutage;
use crate::domain::reactor::ReactorUnit;
use crate::engine::error::{DetectionError, DetectionResult};
use crate::repository::{ForecastRepository, OutageRepository, ReactorRepository, Repositories, StatusRepository};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

// ==========================================
// DetectionOutcome - 检测结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionOutcome {
    /// 缺少最近状态或对应预测
    NoData(MissingInput),
    /// 降幅未达阈值
    WithinThreshold {
        report_date: NaiveDate,
        yhat: f64,
        actual: f64,
        drop: f64,
    },
    /// 已标记疑似停堆（created=false 表示同日已存在）
    Flagged {
        outage: CandidateOutage,
        created: bool,
        drop: f64,
    },
}

impl DetectionOutcome {
    pub fn is_flagged(&self) -> bool {
        matches!(self, DetectionOutcome::Flagged { .. })
    }

    pub fn created_outage(&self) -> bool {
        matches!(self, DetectionOutcome::Flagged { created: true, .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "missing", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissingInput {
    Status,
    Forecast { target_date: NaiveDate },
}

/// 疑似停堆描述文本
pub fn outage_description(drop: f64, yhat: f64, actual: f64) -> String {
    format!("Detected {drop:.1}% drop vs forecast ({yhat:.1} → {actual:.1})")
}

// ==========================================
// OutageDetector
// ==========================================
#[derive(Clone)]
pub struct OutageDetector {
    reactors: ReactorRepository,
    statuses: StatusRepository,
    forecasts: ForecastRepository,
    outages: OutageRepository,
    config: DetectionConfig,
}

impl OutageDetector {
    pub fn new(repos: &Repositories, config: DetectionConfig) -> Self {
        Self {
            reactors: repos.reactors.clone(),
            statuses: repos.statuses.clone(),
            forecasts: repos.forecasts.clone(),
            outages: repos.outages.clone(),
            config,
        }
    }

    /// 按机组名检测
    #[instrument(skip(self))]
    pub fn detect(&self, unit_name: &str) -> DetectionResult<DetectionOutcome> {
        let unit = self
            .reactors
            .find_by_name(unit_name)?
            .ok_or_else(|| DetectionError::UnknownReactor(unit_name.to_string()))?;
        self.detect_unit(&unit)
    }

    pub fn detect_unit(&self, unit: &ReactorUnit) -> DetectionResult<DetectionOutcome> {
        let Some(status) = self.statuses.latest_for_unit(unit.unit_id)? else {
            debug!(unit = %unit.name, "无状态记录，跳过检测");
            return Ok(DetectionOutcome::NoData(MissingInput::Status));
        };

        let target_date = status.report_date + Duration::days(self.config.offset_days);
        let Some(forecast) = self.forecasts.find(unit.unit_id, target_date)? else {
            debug!(unit = %unit.name, target_date = %target_date, "无对应预测，跳过检测");
            return Ok(DetectionOutcome::NoData(MissingInput::Forecast { target_date }));
        };

        let actual = status.power as f64;
        let drop = forecast.yhat - actual;
        if drop < self.config.threshold {
            return Ok(DetectionOutcome::WithinThreshold {
                report_date: status.report_date,
                yhat: forecast.yhat,
                actual,
                drop,
            });
        }

        let description = outage_description(drop, forecast.yhat, actual);
        let (outage, created) = self
            .outages
            .get_or_create(unit.unit_id, status.report_date, &description)?;

        if created {
            warn!(
                unit = %unit.name,
                date = %status.report_date,
                yhat = forecast.yhat,
                actual = actual,
                drop = drop,
                "检测到疑似非计划停堆"
            );
        } else {
            info!(unit = %unit.name, date = %status.report_date, "疑似停堆已存在，不重复创建");
        }

        Ok(DetectionOutcome::Flagged {
            outage,
            created,
            drop,
        })
    }

    /// 批量检测，单个机组失败不影响其他机组
    pub fn detect_all(&self, unit_names: &[String]) -> Vec<(String, DetectionResult<DetectionOutcome>)> {
        unit_names
            .iter()
            .map(|name| {
                let result = self.detect(name);
                if let Err(e) = &result {
                    warn!(unit = %name, error = %e, "疑似停堆检测失败");
                }
                (name.clone(), result)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};
    use crate::domain::forecast::ForecastRecord;
    use crate::domain::reactor::StatusRecord;
    use crate::domain::types::Region;
    use rusqlite::Connection;
    use std::sync::{Arc, Mutex};

    fn ymd(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, d).unwrap()
    }

    fn setup(actual: i32, yhat: Option<f64>) -> (Repositories, OutageDetector) {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        let repos = Repositories::from_connection(Arc::new(Mutex::new(conn)));

        let (unit, _) = repos.reactors.get_or_create("Ginna", Region::I).unwrap();
        repos
            .statuses
            .insert_if_absent(&StatusRecord {
                unit_id: unit.unit_id,
                report_date: ymd(10),
                power: actual,
                down_date: None,
                reason: None,
                changed: false,
                scrams: None,
            })
            .unwrap();
        if let Some(yhat) = yhat {
            repos
                .forecasts
                .upsert(&ForecastRecord {
                    unit_id: unit.unit_id,
                    target_date: ymd(11),
                    yhat,
                    yhat_lower: yhat - 3.0,
                    yhat_upper: yhat + 3.0,
                    artifact_url: None,
                    generated_at: ymd(10).and_hms_opt(12, 0, 0).unwrap(),
                })
                .unwrap();
        }

        let detector = OutageDetector::new(&repos, DetectionConfig::default());
        (repos, detector)
    }

    #[test]
    fn test_large_drop_flagged_once() {
        let (repos, detector) = setup(70, Some(95.0));

        let first = detector.detect("Ginna").unwrap();
        let second = detector.detect("Ginna").unwrap();

        assert!(first.created_outage());
        assert!(second.is_flagged());
        assert!(!second.created_outage());
        assert_eq!(repos.outages.count().unwrap(), 1);

        let unit = repos.reactors.find_by_name("Ginna").unwrap().unwrap();
        let outage = repos.outages.find(unit.unit_id, ymd(10)).unwrap().unwrap();
        assert_eq!(outage.description, "Detected 25.0% drop vs forecast (95.0 → 70.0)");
        assert!(outage.auto_detected);
        assert!(!outage.confirmed);
    }

    #[test]
    fn test_small_drop_not_flagged() {
        let (repos, detector) = setup(92, Some(95.0));

        let outcome = detector.detect("Ginna").unwrap();

        assert!(matches!(outcome, DetectionOutcome::WithinThreshold { drop, .. } if (drop - 3.0).abs() < 1e-9));
        assert_eq!(repos.outages.count().unwrap(), 0);
    }

    #[test]
    fn test_drop_equal_to_threshold_is_flagged() {
        let (_, detector) = setup(90, Some(95.0));
        assert!(detector.detect("Ginna").unwrap().created_outage());
    }

    #[test]
    fn test_missing_forecast_is_no_data() {
        let (_, detector) = setup(70, None);
        assert_eq!(
            detector.detect("Ginna").unwrap(),
            DetectionOutcome::NoData(MissingInput::Forecast { target_date: ymd(11) })
        );
    }

    #[test]
    fn test_unknown_reactor_is_error() {
        let (_, detector) = setup(70, Some(95.0));
        let err = detector.detect("Vermont Yankee").unwrap_err();
        assert!(matches!(err, DetectionError::UnknownReactor(_)));
    }

    #[test]
    fn test_unit_without_status_is_no_data() {
        let (repos, detector) = setup(70, Some(95.0));
        repos.reactors.get_or_create("Salem 1", Region::I).unwrap();
        assert_eq!(
            detector.detect("Salem 1").unwrap(),
            DetectionOutcome::NoData(MissingInput::Status)
        );
    }
}
