// ==========================================
// 核电机组状态时序系统 - 命令行入口
// ==========================================
// 子命令: seed / daily / forecast / detect / stats
// 配置: 默认值 → config_kv → 命令行参数（后者覆盖前者）
// ==========================================

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use reactor_status_ts::config::{ConfigManager, PipelineConfig, PipelineConfigReader};
use reactor_status_ts::db::{default_db_path, open_shared_connection};
use reactor_status_ts::domain::DateOutcome;
use reactor_status_ts::engine::{
    DailyPipeline, DailyRun, Forecaster, FsArtifactPublisher, OutageDetector,
};
use reactor_status_ts::importer::{
    parse_resume_date, DateRangePlan, HttpReportFetcher, ReportImporter, ReportImporterImpl,
};
use reactor_status_ts::repository::Repositories;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 每日触发时相邻请求的节流间隔
const DAILY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Parser)]
#[command(name = "reactor-status-ts", version, about = "核电机组运行状态时序系统")]
struct Cli {
    /// 数据库文件路径
    #[arg(long, global = true, env = "REACTOR_STATUS_DB_PATH")]
    db: Option<String>,

    /// 输出 debug 级别日志
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// 以 JSON 行输出日志
    #[arg(long, global = true)]
    json_log: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 按年份区间批量采集日报
    Seed(SeedArgs),
    /// 采集下一个未采集日期，然后预测并检测
    Daily(DailyArgs),
    /// 训练并落库预测（未指定机组时处理全部机组）
    Forecast(UnitArgs),
    /// 疑似停堆检测（未指定机组时处理全部机组）
    Detect(DetectArgs),
    /// 库内统计
    Stats,
}

#[derive(Debug, Args)]
struct SeedArgs {
    #[arg(long, default_value_t = 1999)]
    start_year: i32,

    /// 默认为当前年份
    #[arg(long)]
    end_year: Option<i32>,

    /// 相邻日期之间的间隔（秒）
    #[arg(long)]
    delay: Option<f64>,

    /// 从该日期续采（YYYYMMDD）
    #[arg(long)]
    resume_from: Option<String>,

    #[arg(long)]
    max_dates: Option<usize>,

    /// 采集前清空已有日状态
    #[arg(long)]
    clear_existing: bool,

    /// 只列出日期，不抓取
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct DailyArgs {
    /// 视为"今天"的日期（YYYY-MM-DD），默认取本地日期
    #[arg(long)]
    today: Option<NaiveDate>,
}

#[derive(Debug, Args)]
struct UnitArgs {
    units: Vec<String>,
}

#[derive(Debug, Args)]
struct DetectArgs {
    units: Vec<String>,

    /// 覆盖检测阈值（百分点）
    #[arg(long)]
    threshold: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.json_log {
        reactor_status_ts::logging::init_json();
    } else {
        reactor_status_ts::logging::init(cli.verbose);
    }

    let db_path = cli.db.clone().unwrap_or_else(default_db_path);
    info!(db = %db_path, version = reactor_status_ts::VERSION, "启动");

    let conn = open_shared_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    let repos = Repositories::from_connection(conn.clone());
    let config = ConfigManager::from_connection(conn)
        .load_pipeline_config()
        .await
        .map_err(|e| anyhow!("配置加载失败: {}", e))?;

    let today = Local::now().date_naive();
    match cli.cmd {
        Command::Seed(args) => run_seed(args, &repos, config, today).await,
        Command::Daily(args) => run_daily(args, &repos, config, today).await,
        Command::Forecast(args) => run_forecast(args, &repos, config).await,
        Command::Detect(args) => run_detect(args, &repos, config),
        Command::Stats => run_stats(&repos, &config),
    }
}

fn build_importer(repos: &Repositories, config: &PipelineConfig) -> Result<ReportImporterImpl<HttpReportFetcher>> {
    let fetcher = HttpReportFetcher::new(&config.fetch)?;
    Ok(ReportImporterImpl::new(
        fetcher,
        repos.reactors.clone(),
        repos.statuses.clone(),
        &config.fetch,
    ))
}

fn build_forecaster(repos: &Repositories, config: &PipelineConfig) -> Forecaster {
    let publisher = Arc::new(FsArtifactPublisher::new(&config.artifact_root));
    Forecaster::new(repos, publisher, config.forecast.clone())
}

async fn run_seed(args: SeedArgs, repos: &Repositories, mut config: PipelineConfig, today: NaiveDate) -> Result<()> {
    if let Some(delay) = args.delay {
        config.fetch.delay_secs = delay;
    }
    let resume_from = args.resume_from.as_deref().map(parse_resume_date).transpose()?;
    let plan = DateRangePlan::new(args.start_year, args.end_year.unwrap_or(today.year()))
        .with_resume_from(resume_from)
        .with_max_dates(args.max_dates);

    let importer = build_importer(repos, &config)?;

    if args.dry_run {
        let listing = importer.dry_run(&plan, today)?;
        println!("共 {} 个日期，前 {} 个:", listing.total, listing.preview.len());
        for (date, weekday) in &listing.preview {
            println!("  {} ({})", date.format("%Y-%m-%d"), weekday);
        }
        return Ok(());
    }

    if args.clear_existing {
        let removed = importer.clear_existing()?;
        println!("已清空 {} 条日状态记录", removed);
    }

    let report = importer.seed(&plan, today).await?;
    println!(
        "处理 {} / {} 个日期: 成功 {}，无新增 {}，失败 {}，新增记录 {}",
        report.processed,
        report.total_dates,
        report.successful,
        report.unchanged,
        report.failed,
        report.total_records
    );
    for (month, dates) in report.missing_by_month() {
        println!("  缺失 {}: {} 天", month, dates.len());
    }

    print_stats(&importer.database_stats()?)
}

async fn run_daily(args: DailyArgs, repos: &Repositories, config: PipelineConfig, today: NaiveDate) -> Result<()> {
    let today = args.today.unwrap_or(today);
    let importer = build_importer(repos, &config)?.with_delay(DAILY_DELAY);
    let pipeline = DailyPipeline::new(
        importer,
        repos.statuses.clone(),
        build_forecaster(repos, &config),
        OutageDetector::new(repos, config.detection.clone()),
    );

    match pipeline.run_once(today).await? {
        DailyRun::EmptyStore => println!("库中无数据，请先执行 seed"),
        DailyRun::UpToDate { next_date } => println!("已是最新，下一个日期 {} 尚未到来", next_date),
        DailyRun::Completed(report) => {
            for (date, outcome) in &report.dates {
                let ingest = match outcome {
                    DateOutcome::Ingested(r) => format!("新增 {} 条", r.created_count()),
                    DateOutcome::NotPublished => "当日未发布".to_string(),
                    DateOutcome::NoTable => "未识别到表格".to_string(),
                    DateOutcome::FetchFailed { message } => format!("抓取失败: {}", message),
                };
                println!("{}: {}", date, ingest);
            }
            println!(
                "预测 {} 台，疑似停堆 {} 起",
                report.forecasted_count(),
                report.flagged_count()
            );
        }
    }
    Ok(())
}

async fn run_forecast(args: UnitArgs, repos: &Repositories, config: PipelineConfig) -> Result<()> {
    let units = resolve_units(args.units, repos)?;
    let forecaster = build_forecaster(repos, &config);

    let mut failed = 0usize;
    for (name, result) in forecaster.forecast_units(&units).await {
        match result {
            Ok(forecast) => {
                let next = forecast.persisted.first();
                println!(
                    "{}: 次日 {:.1} [{:.1}, {:.1}]",
                    name,
                    next.map(|r| r.yhat).unwrap_or_default(),
                    next.map(|r| r.yhat_lower).unwrap_or_default(),
                    next.map(|r| r.yhat_upper).unwrap_or_default()
                );
            }
            Err(e) => {
                failed += 1;
                println!("{}: 失败 ({})", name, e);
            }
        }
    }
    if failed > 0 {
        warn!(failed = failed, "部分机组预测失败");
    }
    Ok(())
}

fn run_detect(args: DetectArgs, repos: &Repositories, mut config: PipelineConfig) -> Result<()> {
    if let Some(threshold) = args.threshold {
        config.detection.threshold = threshold;
    }
    let units = resolve_units(args.units, repos)?;
    let detector = OutageDetector::new(repos, config.detection);

    for (name, result) in detector.detect_all(&units) {
        match result {
            Ok(outcome) => println!("{}: {}", name, serde_json::to_string(&outcome)?),
            Err(e) => println!("{}: 失败 ({})", name, e),
        }
    }
    Ok(())
}

fn run_stats(repos: &Repositories, config: &PipelineConfig) -> Result<()> {
    let importer = build_importer(repos, config)?;
    print_stats(&importer.database_stats()?)
}

fn print_stats(stats: &reactor_status_ts::domain::DatabaseStats) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(stats)?);
    Ok(())
}

/// 未指定机组时返回全部已登记机组
fn resolve_units(units: Vec<String>, repos: &Repositories) -> Result<Vec<String>> {
    if !units.is_empty() {
        return Ok(units);
    }
    Ok(repos.reactors.list_all()?.into_iter().map(|u| u.name).collect())
}
