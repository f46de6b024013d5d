// ==========================================
// 核电机组状态时序系统 - 功率预测引擎
// ==========================================
// 职责: 单机组历史 (日期, 功率) → 训练 → 30 天预测 → 落库两个预测点
// 模型: 分段线性趋势 + 年周期 + 月周期（30.5 天）+ 换料停堆窗口
//       每个零功率日开启一个 0..=5 天的窗口，避免计划停堆被当作趋势突变
// 落库: 最后观测日 +1 与 +30 两点（同键覆盖）
// 红线: 无历史的机组显式报错；图表发布失败只记录日志
// ==========================================

mod core;
mod model;


pub use self::core::{fit_history, ForecastRun, Forecaster, UnitForecast};
pub use self::model::{normal_quantile, YEARLY_PERIOD_DAYS};
