// ==========================================
// 核电机组状态时序系统 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 监管区域 (Region)
// ==========================================
// 序列化格式: 罗马数字 (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Region {
    #[default]
    #[serde(rename = "I")]
    I,
    #[serde(rename = "II")]
    II,
    #[serde(rename = "III")]
    III,
    #[serde(rename = "IV")]
    IV,
}

impl Region {
    /// 全部区域（声明顺序，第一个为默认区域）
    pub const ALL: [Region; 4] = [Region::I, Region::II, Region::III, Region::IV];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::I => "I",
            Region::II => "II",
            Region::III => "III",
            Region::IV => "IV",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "I" => Ok(Region::I),
            "II" => Ok(Region::II),
            "III" => Ok(Region::III),
            "IV" => Ok(Region::IV),
            other => Err(format!("未知区域代码: {}", other)),
        }
    }
}

// ==========================================
// 日报表格版式 (Table Layout)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableLayout {
    SixField, // 机组/功率/停堆日期/原因/变更标记/紧急停堆次数
    TwoField, // 早期版式: 机组/功率
}

impl TableLayout {
    /// 该版式下一行的单元格数量
    pub fn column_count(&self) -> usize {
        match self {
            TableLayout::SixField => 6,
            TableLayout::TwoField => 2,
        }
    }
}

impl fmt::Display for TableLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableLayout::SixField => write!(f, "6-column"),
            TableLayout::TwoField => write!(f, "2-column"),
        }
    }
}
