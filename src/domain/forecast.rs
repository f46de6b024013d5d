// ==========================================
// 核电机组状态时序系统 - 预测与疑似停堆领域模型
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// ForecastPoint - 单日预测值
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

impl ForecastPoint {
    /// 区间是否覆盖给定实际值
    pub fn covers(&self, actual: f64) -> bool {
        actual >= self.yhat_lower && actual <= self.yhat_upper
    }
}

// ==========================================
// ForecastRecord - 持久化预测
// ==========================================
// 键: (unit_id, target_date)，同键重跑覆盖而非追加
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub unit_id: i64,
    pub target_date: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
    pub artifact_url: Option<String>, // 渲染图表地址（发布失败时为空）
    pub generated_at: NaiveDateTime,
}

impl ForecastRecord {
    pub fn from_point(unit_id: i64, point: &ForecastPoint, generated_at: NaiveDateTime) -> Self {
        Self {
            unit_id,
            target_date: point.date,
            yhat: point.yhat,
            yhat_lower: point.yhat_lower,
            yhat_upper: point.yhat_upper,
            artifact_url: None,
            generated_at,
        }
    }
}

// ==========================================
// CandidateOutage - 疑似非计划停堆
// ==========================================
// 键: (unit_id, date_detected)，重复检测不重复创建
// confirmed 仅由外部人工复核流程修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateOutage {
    pub outage_id: i64,
    pub unit_id: i64,
    pub date_detected: NaiveDate,
    pub description: String,
    pub auto_detected: bool,
    pub confirmed: bool,
}
