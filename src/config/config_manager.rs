// ==========================================
// 核电机组状态时序系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::pipeline_config::{
    DetectionConfig, FetchConfig, ForecastConfig, PipelineConfig,
};
use crate::config::pipeline_config_trait::{ConfigResult, PipelineConfigReader};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    pub const FETCH_BASE_URL: &str = "fetch.base_url";
    pub const FETCH_TIMEOUT_SECS: &str = "fetch.timeout_secs";
    pub const FETCH_DELAY_SECS: &str = "fetch.delay_secs";
    pub const FETCH_USER_AGENT: &str = "fetch.user_agent";

    pub const FORECAST_HORIZON_DAYS: &str = "forecast.horizon_days";
    pub const FORECAST_INTERVAL_WIDTH: &str = "forecast.interval_width";
    pub const FORECAST_CHANGEPOINT_PRIOR_SCALE: &str = "forecast.changepoint_prior_scale";
    pub const FORECAST_OUTAGE_WINDOW_DAYS: &str = "forecast.outage_window_days";
    pub const FORECAST_CONCURRENCY: &str = "forecast.concurrency";

    pub const DETECT_THRESHOLD: &str = "detect.threshold";
    pub const DETECT_OFFSET_DAYS: &str = "detect.offset_days";

    pub const ARTIFACT_ROOT: &str = "artifact.root";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 读取并解析配置，缺失或格式错误时回落到默认值
    ///
    /// 格式错误只记录告警，不阻断运行
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: FromStr,
    {
        match self.get_global_config_value(key)? {
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    warn!(key = key, value = %raw, "配置值格式错误，使用默认值");
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }
}

#[async_trait]
impl PipelineConfigReader for ConfigManager {
    async fn get_fetch_config(&self) -> ConfigResult<FetchConfig> {
        let d = FetchConfig::default();
        Ok(FetchConfig {
            base_url: self.get_parsed_or_default(config_keys::FETCH_BASE_URL, d.base_url)?,
            timeout_secs: self.get_parsed_or_default(config_keys::FETCH_TIMEOUT_SECS, d.timeout_secs)?,
            delay_secs: self.get_parsed_or_default(config_keys::FETCH_DELAY_SECS, d.delay_secs)?,
            user_agent: self.get_parsed_or_default(config_keys::FETCH_USER_AGENT, d.user_agent)?,
        })
    }

    async fn get_forecast_config(&self) -> ConfigResult<ForecastConfig> {
        let d = ForecastConfig::default();
        Ok(ForecastConfig {
            horizon_days: self.get_parsed_or_default(config_keys::FORECAST_HORIZON_DAYS, d.horizon_days)?,
            interval_width: self
                .get_parsed_or_default(config_keys::FORECAST_INTERVAL_WIDTH, d.interval_width)?,
            changepoint_prior_scale: self.get_parsed_or_default(
                config_keys::FORECAST_CHANGEPOINT_PRIOR_SCALE,
                d.changepoint_prior_scale,
            )?,
            outage_window_days: self
                .get_parsed_or_default(config_keys::FORECAST_OUTAGE_WINDOW_DAYS, d.outage_window_days)?,
            concurrency: self.get_parsed_or_default(config_keys::FORECAST_CONCURRENCY, d.concurrency)?,
            ..d
        })
    }

    async fn get_detection_config(&self) -> ConfigResult<DetectionConfig> {
        let d = DetectionConfig::default();
        Ok(DetectionConfig {
            threshold: self.get_parsed_or_default(config_keys::DETECT_THRESHOLD, d.threshold)?,
            offset_days: self.get_parsed_or_default(config_keys::DETECT_OFFSET_DAYS, d.offset_days)?,
        })
    }

    async fn get_artifact_root(&self) -> ConfigResult<String> {
        self.get_parsed_or_default(
            config_keys::ARTIFACT_ROOT,
            PipelineConfig::default_artifact_root(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};

    fn memory_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[tokio::test]
    async fn test_defaults_when_table_empty() {
        let manager = memory_manager();
        let config = manager.load_pipeline_config().await.unwrap();

        assert_eq!(config.fetch, FetchConfig::default());
        assert_eq!(config.forecast, ForecastConfig::default());
        assert_eq!(config.detection, DetectionConfig::default());
    }

    #[tokio::test]
    async fn test_stored_values_override_defaults() {
        let manager = memory_manager();
        manager.set_global_config_value(config_keys::DETECT_THRESHOLD, "15").unwrap();
        manager.set_global_config_value(config_keys::FETCH_DELAY_SECS, "0.5").unwrap();

        let detection = manager.get_detection_config().await.unwrap();
        assert_eq!(detection.threshold, 15.0);
        assert_eq!(detection.offset_days, 1);

        let fetch = manager.get_fetch_config().await.unwrap();
        assert_eq!(fetch.delay_secs, 0.5);
    }

    #[tokio::test]
    async fn test_malformed_value_falls_back() {
        let manager = memory_manager();
        manager
            .set_global_config_value(config_keys::FORECAST_HORIZON_DAYS, "thirty")
            .unwrap();

        let forecast = manager.get_forecast_config().await.unwrap();
        assert_eq!(forecast.horizon_days, 30);
    }

    #[test]
    fn test_snapshot_contains_written_keys() {
        let manager = memory_manager();
        manager.set_global_config_value(config_keys::ARTIFACT_ROOT, "/tmp/a").unwrap();
        let snapshot = manager.get_config_snapshot().unwrap();
        assert!(snapshot.contains("artifact.root"));
    }
}
