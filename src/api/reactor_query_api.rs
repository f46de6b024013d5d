// ==========================================
// 核电机组状态时序系统 - 机组查询 API
// ==========================================
// 职责: 按日机组状态、单机组详情、待复核疑似停堆
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::forecast::{CandidateOutage, ForecastRecord};
use crate::domain::reactor::{ReactorUnit, StatusRecord};
use crate::domain::types::Region;
use crate::repository::{
    ForecastRepository, OutageRepository, ReactorRepository, Repositories, StatusRepository,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// 视图对象
// ==========================================

/// 某日一台机组及其当日状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitStatusView {
    pub name: String,
    pub region: Region,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub statuses: Vec<StatusRecord>,
}

/// 单机组某日详情
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDetailView {
    pub unit: ReactorUnit,
    pub date: NaiveDate,
    pub status: Option<StatusRecord>,
    pub forecast: Option<ForecastRecord>, // 目标日 = date 的预测
    pub outage: Option<CandidateOutage>,  // date 当日检测出的疑似停堆
}

/// 带机组名的疑似停堆
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutageView {
    pub unit_name: String,
    #[serde(flatten)]
    pub outage: CandidateOutage,
}

// ==========================================
// ReactorQueryApi
// ==========================================
pub struct ReactorQueryApi {
    reactors: ReactorRepository,
    statuses: StatusRepository,
    forecasts: ForecastRepository,
    outages: OutageRepository,
}

impl ReactorQueryApi {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            reactors: repos.reactors.clone(),
            statuses: repos.statuses.clone(),
            forecasts: repos.forecasts.clone(),
            outages: repos.outages.clone(),
        }
    }

    /// 指定日期有状态记录的机组（按名称排序）
    pub fn units_on(&self, date: NaiveDate) -> ApiResult<Vec<UnitStatusView>> {
        let units = self.reactors.list_with_status_on(date)?;
        let mut statuses = self.statuses.list_by_date(date)?;

        Ok(units
            .into_iter()
            .map(|unit| {
                let (own, rest): (Vec<_>, Vec<_>) =
                    statuses.drain(..).partition(|s| s.unit_id == unit.unit_id);
                statuses = rest;
                UnitStatusView {
                    name: unit.name,
                    region: unit.region,
                    latitude: unit.latitude,
                    longitude: unit.longitude,
                    statuses: own,
                }
            })
            .collect())
    }

    /// 单机组某日详情
    ///
    /// # 返回
    /// - Err(InvalidInput): 机组名为空
    /// - Err(NotFound): 机组未登记
    pub fn unit_detail(&self, name: &str, date: NaiveDate) -> ApiResult<UnitDetailView> {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidInput("机组名不能为空".to_string()));
        }

        let unit = self
            .reactors
            .find_by_name(name.trim())?
            .ok_or_else(|| ApiError::NotFound(format!("机组 {} 不存在", name.trim())))?;

        Ok(UnitDetailView {
            status: self.statuses.find(unit.unit_id, date)?,
            forecast: self.forecasts.find(unit.unit_id, date)?,
            outage: self.outages.find(unit.unit_id, date)?,
            unit,
            date,
        })
    }

    /// 单机组日期区间内的状态（含两端）
    pub fn unit_history(&self, name: &str, from: NaiveDate, to: NaiveDate) -> ApiResult<Vec<StatusRecord>> {
        if from > to {
            return Err(ApiError::InvalidInput(format!("起始日期 {} 晚于结束日期 {}", from, to)));
        }
        let unit = self
            .reactors
            .find_by_name(name)?
            .ok_or_else(|| ApiError::NotFound(format!("机组 {} 不存在", name)))?;
        Ok(self.statuses.list_by_unit_and_range(unit.unit_id, from, to)?)
    }

    /// 待人工复核的疑似停堆
    pub fn unconfirmed_outages(&self) -> ApiResult<Vec<OutageView>> {
        self.outages
            .list_unconfirmed()?
            .into_iter()
            .map(|outage| {
                let unit_name = self
                    .reactors
                    .find_by_id(outage.unit_id)?
                    .map(|u| u.name)
                    .unwrap_or_default();
                Ok(OutageView { unit_name, outage })
            })
            .collect()
    }

    /// 记录人工复核结论
    pub fn confirm_outage(&self, outage_id: i64, confirmed: bool) -> ApiResult<()> {
        Ok(self.outages.set_confirmed(outage_id, confirmed)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};
    use rusqlite::Connection;
    use std::sync::{Arc, Mutex};

    fn ymd(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, d).unwrap()
    }

    fn status(unit_id: i64, day: u32, power: i32) -> StatusRecord {
        StatusRecord {
            unit_id,
            report_date: ymd(day),
            power,
            down_date: None,
            reason: None,
            changed: false,
            scrams: None,
        }
    }

    fn setup() -> (Repositories, ReactorQueryApi) {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        let repos = Repositories::from_connection(Arc::new(Mutex::new(conn)));

        let (ginna, _) = repos.reactors.get_or_create("Ginna", Region::I).unwrap();
        let (diablo, _) = repos.reactors.get_or_create("Diablo Canyon 1", Region::IV).unwrap();
        repos.statuses.insert_if_absent(&status(ginna.unit_id, 1, 100)).unwrap();
        repos.statuses.insert_if_absent(&status(ginna.unit_id, 2, 98)).unwrap();
        repos.statuses.insert_if_absent(&status(diablo.unit_id, 2, 0)).unwrap();
        repos.reactors.set_coordinates("Ginna", 43.28, -77.31).unwrap();

        let api = ReactorQueryApi::new(&repos);
        (repos, api)
    }

    #[test]
    fn test_units_on_groups_statuses_by_unit() {
        let (_, api) = setup();

        let day2 = api.units_on(ymd(2)).unwrap();
        let names: Vec<&str> = day2.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Diablo Canyon 1", "Ginna"]);
        assert_eq!(day2[1].statuses.len(), 1);
        assert_eq!(day2[1].statuses[0].power, 98);
        assert_eq!(day2[1].latitude, Some(43.28));

        assert_eq!(api.units_on(ymd(1)).unwrap().len(), 1);
        assert!(api.units_on(ymd(3)).unwrap().is_empty());
    }

    #[test]
    fn test_unit_detail_and_errors() {
        let (_, api) = setup();

        let detail = api.unit_detail("Ginna", ymd(1)).unwrap();
        assert_eq!(detail.status.map(|s| s.power), Some(100));
        assert!(detail.forecast.is_none());
        assert!(detail.outage.is_none());

        assert!(matches!(api.unit_detail("  ", ymd(1)), Err(ApiError::InvalidInput(_))));
        assert!(matches!(api.unit_detail("Vermont Yankee", ymd(1)), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_outage_review_flow() {
        let (repos, api) = setup();
        let ginna = repos.reactors.find_by_name("Ginna").unwrap().unwrap();
        let (outage, _) = repos
            .outages
            .get_or_create(ginna.unit_id, ymd(2), "Detected 25.0% drop vs forecast (95.0 → 70.0)")
            .unwrap();

        let pending = api.unconfirmed_outages().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].unit_name, "Ginna");

        api.confirm_outage(outage.outage_id, true).unwrap();
        assert!(api.unconfirmed_outages().unwrap().is_empty());
        assert!(matches!(api.confirm_outage(9999, true), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_unit_history_rejects_reversed_range() {
        let (_, api) = setup();
        assert_eq!(api.unit_history("Ginna", ymd(1), ymd(2)).unwrap().len(), 2);
        assert!(matches!(api.unit_history("Ginna", ymd(2), ymd(1)), Err(ApiError::InvalidInput(_))));
    }
}
