// ==========================================
// 核电机组状态时序系统 - 日报抓取器
// ==========================================
// 职责: 按日期抓取一份日报 HTML
// 地址: {base_url}/{YYYY}/{YYYYMMDD}ps.html
// 约定: 404 表示当日未发布（正常结果，不是错误）
// ==========================================

use crate::config::FetchConfig;
use crate::importer::error::{IngestError, IngestResult};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use reqwest::StatusCode;
use tracing::debug;

// ==========================================
// FetchOutcome - 抓取结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Document(String),
    NotPublished,
}

// ==========================================
// ReportFetcher Trait
// ==========================================
// 实现者: HttpReportFetcher（reqwest），测试中可替换为内存桩
#[async_trait]
pub trait ReportFetcher: Send + Sync {
    async fn fetch(&self, date: NaiveDate) -> IngestResult<FetchOutcome>;
}

/// 日报文档地址
pub fn report_url(base_url: &str, date: NaiveDate) -> String {
    format!(
        "{}/{}/{}ps.html",
        base_url.trim_end_matches('/'),
        date.year(),
        date.format("%Y%m%d")
    )
}

// ==========================================
// HttpReportFetcher - HTTP 实现
// ==========================================
pub struct HttpReportFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpReportFetcher {
    /// 按抓取配置构建客户端（显式超时 + User-Agent）
    pub fn new(config: &FetchConfig) -> IngestResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| IngestError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl ReportFetcher for HttpReportFetcher {
    async fn fetch(&self, date: NaiveDate) -> IngestResult<FetchOutcome> {
        let url = report_url(&self.base_url, date);
        debug!(url = %url, "抓取日报");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                IngestError::FetchTimeout { url: url.clone() }
            } else {
                IngestError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(FetchOutcome::NotPublished);
        }
        if !status.is_success() {
            return Err(IngestError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                IngestError::FetchTimeout { url: url.clone() }
            } else {
                IngestError::Network(e.to_string())
            }
        })?;
        Ok(FetchOutcome::Document(body))
    }
}
