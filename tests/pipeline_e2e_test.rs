// ==========================================
// 采集 → 预测 → 检测 端到端测试
// ==========================================
// 场景: 2021-01-01..10 单机组，前九天满功率，第十天换料停堆
// ==========================================


use pretty_assertions::assert_eq;
use reactor_status_ts::config::{DetectionConfig, FetchConfig, ForecastConfig};
use reactor_status_ts::domain::DateOutcome;
use reactor_status_ts::engine::{
    DailyPipeline, DailyRun, DetectionOutcome, Forecaster, FsArtifactPublisher, OutageDetector,
};
use reactor_status_ts::importer::{DateRangePlan, ReportImporter, ReportImporterImpl};
use reactor_status_ts::repository::Repositories;
use reactor_status_ts::{logging, Region};
use std::sync::Arc;
use std::time::Duration;
use test_helpers::{create_test_db, open_repos, single_unit_report, two_field_report, ymd, StubFetcher};

fn ten_day_fetcher() -> StubFetcher {
    (1..=10).fold(StubFetcher::new(), |fetcher, d| {
        let power = if d == 10 { 0 } else { 100 };
        fetcher.with_doc(ymd(2021, 1, d), single_unit_report("GINNA", power))
    })
}

fn importer(repos: &Repositories, fetcher: StubFetcher) -> ReportImporterImpl<StubFetcher> {
    ReportImporterImpl::new(
        fetcher,
        repos.reactors.clone(),
        repos.statuses.clone(),
        &FetchConfig::default(),
    )
    .with_delay(Duration::ZERO)
}

fn ten_day_plan() -> DateRangePlan {
    DateRangePlan::new(2021, 2021).with_max_dates(Some(10))
}

#[tokio::test]
async fn test_seed_is_idempotent_across_runs() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let repos = open_repos(&db_path);
    let importer = importer(&repos, ten_day_fetcher());
    let today = ymd(2030, 1, 1);

    let first = importer.seed(&ten_day_plan(), today).await.unwrap();
    assert_eq!(first.total_dates, 10);
    assert_eq!(first.successful, 10);
    assert_eq!(first.total_records, 10);
    assert!(first.missing_dates.is_empty());

    let second = importer.seed(&ten_day_plan(), today).await.unwrap();
    assert_eq!(second.total_records, 0);
    assert_eq!(second.unchanged, 10);

    assert_eq!(repos.statuses.count().unwrap(), 10);
    assert_eq!(repos.reactors.list_all().unwrap().len(), 1);

    let unit = repos.reactors.find_by_name("Ginna").unwrap().unwrap();
    assert_eq!(unit.region, Region::I);

    let outage_day = repos.statuses.find(unit.unit_id, ymd(2021, 1, 10)).unwrap().unwrap();
    assert_eq!(outage_day.power, 0);
    assert_eq!(outage_day.down_date, Some(ymd(2021, 1, 10)));
    assert_eq!(outage_day.reason.as_deref(), Some("Refueling outage"));
    assert!(outage_day.changed);

    let stats = importer.database_stats().unwrap();
    assert_eq!(stats.total_records, 10);
    assert_eq!(stats.min_date, Some(ymd(2021, 1, 1)));
    assert_eq!(stats.max_date, Some(ymd(2021, 1, 10)));
    assert_eq!(stats.unique_units, 1);
}

#[tokio::test]
async fn test_forecast_after_seed_treats_zero_day_as_outage_window() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let repos = open_repos(&db_path);
    importer(&repos, ten_day_fetcher())
        .seed(&ten_day_plan(), ymd(2030, 1, 1))
        .await
        .unwrap();

    let artifacts = tempfile::tempdir().unwrap();
    let forecaster = Forecaster::new(
        &repos,
        Arc::new(FsArtifactPublisher::new(artifacts.path())),
        ForecastConfig::default(),
    );
    let forecast = forecaster.forecast_unit("Ginna").await.unwrap();

    assert!(forecast.run.is_outage_window_day(ymd(2021, 1, 10)));
    assert_eq!(forecast.run.outage_window_days.len(), 1);

    let next_day = &forecast.persisted[0];
    assert_eq!(next_day.target_date, ymd(2021, 1, 11));
    assert!(next_day.yhat > 90.0, "单日停堆不应拉低次日预测: {}", next_day.yhat);
    assert_eq!(forecast.persisted[1].target_date, ymd(2021, 2, 9));
    assert!(artifacts.path().join("forecasts/Ginna_forecast.csv").exists());

    // 最近状态（停堆日）对比次日预测
    let detector = OutageDetector::new(&repos, DetectionConfig::default());
    let outcome = detector.detect("Ginna").unwrap();
    assert!(outcome.created_outage());
    assert_eq!(repos.outages.count().unwrap(), 1);
}

#[tokio::test]
async fn test_unpublished_and_broken_dates_do_not_abort_range() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let repos = open_repos(&db_path);
    let fetcher = StubFetcher::new()
        .with_doc(ymd(2021, 1, 1), two_field_report(&[("GINNA", "100"), ("DIABLO CANYON 1", "95")]))
        .with_doc(ymd(2021, 1, 2), "<html><body>Scheduled maintenance</body></html>".to_string())
        .with_doc(ymd(2021, 1, 4), two_field_report(&[("GINNA", "98")]));
    let importer = importer(&repos, fetcher);

    let plan = DateRangePlan::new(2021, 2021).with_max_dates(Some(4));
    let report = importer.seed(&plan, ymd(2030, 1, 1)).await.unwrap();

    assert_eq!(report.processed, 4);
    assert_eq!(report.successful, 2);
    assert_eq!(report.total_records, 3);
    assert_eq!(report.missing_dates, vec![ymd(2021, 1, 2), ymd(2021, 1, 3)]);

    let diablo = repos.reactors.find_by_name("Diablo Canyon 1").unwrap().unwrap();
    assert_eq!(diablo.region, Region::IV);
    let status = repos.statuses.find(diablo.unit_id, ymd(2021, 1, 1)).unwrap().unwrap();
    assert_eq!(status.power, 95);
    assert_eq!(status.down_date, None);
    assert!(!status.changed);
}

#[tokio::test]
async fn test_dry_run_and_clear_existing() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let repos = open_repos(&db_path);
    let importer = importer(&repos, ten_day_fetcher());

    let listing = importer.dry_run(&ten_day_plan(), ymd(2030, 1, 1)).unwrap();
    assert_eq!(listing.total, 10);
    assert_eq!(listing.preview[0], (ymd(2021, 1, 1), "Friday".to_string()));
    assert_eq!(repos.statuses.count().unwrap(), 0);

    importer.seed(&ten_day_plan(), ymd(2030, 1, 1)).await.unwrap();
    assert_eq!(importer.clear_existing().unwrap(), 10);
    assert_eq!(repos.statuses.count().unwrap(), 0);
    // 机组身份不随状态清空而删除
    assert_eq!(repos.reactors.list_all().unwrap().len(), 1);
}

#[tokio::test]
async fn test_daily_pipeline_picks_up_next_date() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let repos = open_repos(&db_path);
    importer(&repos, ten_day_fetcher())
        .seed(&ten_day_plan(), ymd(2030, 1, 1))
        .await
        .unwrap();

    let fetcher = ten_day_fetcher().with_doc(ymd(2021, 1, 11), single_unit_report("GINNA", 100));
    let artifacts = tempfile::tempdir().unwrap();
    let pipeline = DailyPipeline::new(
        importer(&repos, fetcher),
        repos.statuses.clone(),
        Forecaster::new(
            &repos,
            Arc::new(FsArtifactPublisher::new(artifacts.path())),
            ForecastConfig::default(),
        ),
        OutageDetector::new(&repos, DetectionConfig::default()),
    );

    let DailyRun::Completed(report) = pipeline.run_once(ymd(2021, 1, 11)).await.unwrap() else {
        panic!("expected a completed run");
    };
    assert_eq!(report.latest_ingested(), Some(ymd(2021, 1, 11)));
    assert!(matches!(&report.dates[..], [(_, DateOutcome::Ingested(r))] if r.created_count() == 1));
    assert_eq!(report.forecasted_count(), 1);
    assert!(matches!(
        &report.units[0].detection,
        Some(Ok(DetectionOutcome::WithinThreshold { .. })) | Some(Ok(DetectionOutcome::Flagged { .. }))
    ));

    let unit = repos.reactors.find_by_name("Ginna").unwrap().unwrap();
    assert!(repos.forecasts.find(unit.unit_id, ymd(2021, 1, 12)).unwrap().is_some());

    // 次日尚未到来
    assert!(matches!(
        pipeline.run_once(ymd(2021, 1, 11)).await.unwrap(),
        DailyRun::UpToDate { next_date } if next_date == ymd(2021, 1, 12)
    ));
}

#[tokio::test]
async fn test_daily_pipeline_skips_holiday_gap() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let repos = open_repos(&db_path);
    importer(&repos, ten_day_fetcher())
        .seed(&ten_day_plan(), ymd(2030, 1, 1))
        .await
        .unwrap();

    // 11 日未发布，12 日恢复
    let fetcher = ten_day_fetcher().with_doc(ymd(2021, 1, 12), single_unit_report("GINNA", 100));
    let artifacts = tempfile::tempdir().unwrap();
    let pipeline = DailyPipeline::new(
        importer(&repos, fetcher),
        repos.statuses.clone(),
        Forecaster::new(
            &repos,
            Arc::new(FsArtifactPublisher::new(artifacts.path())),
            ForecastConfig::default(),
        ),
        OutageDetector::new(&repos, DetectionConfig::default()),
    );

    for _ in 0..2 {
        pipeline.run_once(ymd(2021, 1, 13)).await.unwrap();
    }

    let unit = repos.reactors.find_by_name("Ginna").unwrap().unwrap();
    assert!(repos.statuses.find(unit.unit_id, ymd(2021, 1, 11)).unwrap().is_none());
    assert!(repos.statuses.find(unit.unit_id, ymd(2021, 1, 12)).unwrap().is_some());
    assert_eq!(repos.statuses.date_bounds().unwrap().1, Some(ymd(2021, 1, 12)));
    assert_eq!(pipeline.next_date().unwrap(), Some(ymd(2021, 1, 13)));
}
