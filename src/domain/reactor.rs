// ==========================================
// 核电机组状态时序系统 - 机组与日状态领域模型
// ==========================================
// 根实体: ReactorUnit
// 从属实体: StatusRecord（通过 unit_id 引用，不依赖可变名称）
// ==========================================

use crate::domain::types::Region;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 规范机组名长度上限（字符）
pub const UNIT_NAME_MAX_LEN: usize = 30;

// ==========================================
// ReactorUnit - 机组身份
// ==========================================
// 首次归一化出新名称时创建，永不删除；区域可被重新分类修正
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactorUnit {
    pub unit_id: i64,            // 稳定标识
    pub name: String,            // 规范名称（≤30 字符，唯一）
    pub region: Region,          // 监管区域
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

// ==========================================
// RawStatusRow - 日报表格原始行
// ==========================================
// 用途: 表格抽取 → 状态落库之间的中间产物
// 约束: 恒为六个字段，两列版式缺失字段补空串
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStatusRow {
    pub unit: String,
    pub power: String,
    pub down_date: String,
    pub reason: String,
    pub change: String,
    pub scrams: String,
}

impl RawStatusRow {
    /// 由六个单元格构造
    pub fn from_six(cells: [String; 6]) -> Self {
        let [unit, power, down_date, reason, change, scrams] = cells;
        Self {
            unit,
            power,
            down_date,
            reason,
            change,
            scrams,
        }
    }

    /// 由两个单元格构造（其余四个字段为空）
    pub fn from_two(unit: String, power: String) -> Self {
        Self {
            unit,
            power,
            down_date: String::new(),
            reason: String::new(),
            change: String::new(),
            scrams: String::new(),
        }
    }

    /// 按列顺序返回六个字段
    pub fn fields(&self) -> [&str; 6] {
        [
            &self.unit,
            &self.power,
            &self.down_date,
            &self.reason,
            &self.change,
            &self.scrams,
        ]
    }
}

// ==========================================
// StatusRecord - 机组日状态
// ==========================================
// 不变量: 每个 (unit_id, report_date) 至多一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub unit_id: i64,
    pub report_date: NaiveDate,
    pub power: i32,                   // 功率百分比（允许短时超功率 >100）
    pub down_date: Option<NaiveDate>, // 停堆开始日期
    pub reason: Option<String>,       // 停堆原因
    pub changed: bool,                // 较前一日是否变更
    pub scrams: Option<i32>,          // 紧急停堆次数
}

// ==========================================
// NewStatus - 待写入的日状态（尚未关联 unit_id）
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct NewStatus {
    pub unit_name: String,
    pub region: Region,
    pub report_date: NaiveDate,
    pub power: i32,
    pub down_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub changed: bool,
    pub scrams: Option<i32>,
}
