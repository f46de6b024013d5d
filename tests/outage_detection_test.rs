// ==========================================
// 疑似停堆检测集成测试
// ==========================================
// 测试目标: 文件库上重复检测（含重新打开连接）不重复创建记录
// ==========================================


use chrono::NaiveDate;
use reactor_status_ts::api::ReactorQueryApi;
use reactor_status_ts::config::DetectionConfig;
use reactor_status_ts::domain::{ForecastRecord, StatusRecord};
use reactor_status_ts::engine::{DetectionOutcome, OutageDetector};
use reactor_status_ts::repository::Repositories;
use reactor_status_ts::Region;
use test_helpers::{create_test_db, open_repos, ymd};

fn seed_unit(repos: &Repositories, name: &str, region: Region, date: NaiveDate, actual: i32, yhat: f64) {
    let (unit, _) = repos.reactors.get_or_create(name, region).unwrap();
    repos
        .statuses
        .insert_if_absent(&StatusRecord {
            unit_id: unit.unit_id,
            report_date: date,
            power: actual,
            down_date: None,
            reason: None,
            changed: false,
            scrams: None,
        })
        .unwrap();
    repos
        .forecasts
        .upsert(&ForecastRecord {
            unit_id: unit.unit_id,
            target_date: date.succ_opt().unwrap(),
            yhat,
            yhat_lower: yhat - 4.0,
            yhat_upper: yhat + 4.0,
            artifact_url: None,
            generated_at: date.and_hms_opt(6, 0, 0).unwrap(),
        })
        .unwrap();
}

#[test]
fn test_detection_is_idempotent_across_connections() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let date = ymd(2024, 5, 2);
    {
        let repos = open_repos(&db_path);
        seed_unit(&repos, "Salem 1", Region::I, date, 70, 95.0);
        seed_unit(&repos, "Vogtle 3", Region::II, date, 92, 95.0);

        let detector = OutageDetector::new(&repos, DetectionConfig::default());
        let results = detector.detect_all(&["Salem 1".to_string(), "Vogtle 3".to_string()]);
        assert!(results[0].1.as_ref().unwrap().created_outage());
        assert!(matches!(
            results[1].1.as_ref().unwrap(),
            DetectionOutcome::WithinThreshold { .. }
        ));
    }

    let repos = open_repos(&db_path);
    let detector = OutageDetector::new(&repos, DetectionConfig::default());
    let again = detector.detect("Salem 1").unwrap();
    assert!(again.is_flagged());
    assert!(!again.created_outage());
    assert_eq!(repos.outages.count().unwrap(), 1);

    let api = ReactorQueryApi::new(&repos);
    let pending = api.unconfirmed_outages().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].unit_name, "Salem 1");
    assert_eq!(pending[0].outage.date_detected, date);

    let detail = api.unit_detail("Salem 1", date).unwrap();
    assert!(detail.outage.is_some());
    assert_eq!(detail.status.map(|s| s.power), Some(70));
}

#[test]
fn test_raised_threshold_suppresses_flag() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let repos = open_repos(&db_path);
    seed_unit(&repos, "Salem 1", Region::I, ymd(2024, 5, 2), 70, 95.0);

    let strict = DetectionConfig {
        threshold: 30.0,
        ..DetectionConfig::default()
    };
    let outcome = OutageDetector::new(&repos, strict).detect("Salem 1").unwrap();

    assert!(matches!(outcome, DetectionOutcome::WithinThreshold { drop, .. } if (drop - 25.0).abs() < 1e-9));
    assert_eq!(repos.outages.count().unwrap(), 0);
}
