// ==========================================
// 加性回归模型
// ==========================================
// y(t) = 趋势(分段线性) + 年周期 + 月周期 + 换料停堆窗口效应
// 求解: 带对角正则的最小二乘（正规方程 + Cholesky）
// 区间: 残差标准差 × 正态分位数，随预测步长放宽
// ==========================================

use crate::config::ForecastConfig;
use crate::domain::forecast::ForecastPoint;
use crate::engine::error::{ForecastError, ForecastResult};
use chrono::{Datelike, Duration, NaiveDate};
use nalgebra::{DMatrix, DVector};
use std::collections::BTreeSet;
use std::f64::consts::PI;

/// 年周期（天）
pub const YEARLY_PERIOD_DAYS: f64 = 365.25;

/// 变点只分布在历史的前 80%
const CHANGEPOINT_RANGE: f64 = 0.8;

/// 周期项 / 窗口项的先验尺度
const SEASONALITY_PRIOR_SCALE: f64 = 10.0;
const HOLIDAY_PRIOR_SCALE: f64 = 10.0;

/// 截距与基础斜率几乎不约束
const BASE_PENALTY: f64 = 1e-8;

// ==========================================
// Design - 特征构造
// ==========================================
#[derive(Debug, Clone)]
pub(super) struct Design {
    origin: NaiveDate,
    span_days: f64,
    changepoints: Vec<f64>, // 归一化时间轴上的变点位置
    changepoint_prior_scale: f64,
    yearly_order: usize,
    monthly_period: f64,
    monthly_order: usize,
    window_days: u32,
    zero_days: BTreeSet<NaiveDate>,
}

impl Design {
    pub(super) fn new(dates: &[NaiveDate], zero_days: BTreeSet<NaiveDate>, config: &ForecastConfig) -> Self {
        let origin = dates[0];
        let last = dates[dates.len() - 1];
        let span_days = ((last - origin).num_days() as f64).max(1.0);

        let hist_size = (dates.len() as f64 * CHANGEPOINT_RANGE).floor() as usize;
        let n_cp = config.n_changepoints.min(hist_size.saturating_sub(1));
        let changepoints = (1..=n_cp)
            .map(|i| {
                let idx = (i as f64 * (hist_size - 1) as f64 / n_cp as f64).round() as usize;
                (dates[idx] - origin).num_days() as f64 / span_days
            })
            .collect();

        Self {
            origin,
            span_days,
            changepoints,
            changepoint_prior_scale: config.changepoint_prior_scale,
            yearly_order: config.yearly_fourier_order,
            monthly_period: config.monthly_period_days,
            monthly_order: config.monthly_fourier_order,
            window_days: config.outage_window_days,
            zero_days,
        }
    }

    fn width(&self) -> usize {
        2 + self.changepoints.len()
            + 2 * self.yearly_order
            + 2 * self.monthly_order
            + self.window_days as usize
            + 1
    }

    /// 单日特征行
    fn row(&self, date: NaiveDate) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.width());
        let t = (date - self.origin).num_days() as f64 / self.span_days;

        row.push(1.0);
        row.push(t);
        row.extend(self.changepoints.iter().map(|s| (t - s).max(0.0)));

        let epoch_day = epoch_days(date);
        push_fourier(&mut row, epoch_day, YEARLY_PERIOD_DAYS, self.yearly_order);
        push_fourier(&mut row, epoch_day, self.monthly_period, self.monthly_order);

        row.extend((0..=self.window_days).map(|offset| {
            if self.zero_days.contains(&(date - Duration::days(offset as i64))) {
                1.0
            } else {
                0.0
            }
        }));
        row
    }

    /// 各列的正则系数（与特征行同序）
    fn penalties(&self) -> Vec<f64> {
        let cp = 1.0 / self.changepoint_prior_scale.powi(2);
        let season = 1.0 / SEASONALITY_PRIOR_SCALE.powi(2);
        let holiday = 1.0 / HOLIDAY_PRIOR_SCALE.powi(2);

        let mut penalties = vec![BASE_PENALTY, BASE_PENALTY];
        penalties.extend(std::iter::repeat(cp).take(self.changepoints.len()));
        penalties.extend(std::iter::repeat(season).take(2 * (self.yearly_order + self.monthly_order)));
        penalties.extend(std::iter::repeat(holiday).take(self.window_days as usize + 1));
        penalties
    }

    /// 日期是否落在某个零功率日开始的换料停堆窗口内
    pub(super) fn in_outage_window(&self, date: NaiveDate) -> bool {
        (0..=self.window_days as i64).any(|offset| self.zero_days.contains(&(date - Duration::days(offset))))
    }
}

/// 1970-01-01 距公元元年的天数
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn epoch_days(date: NaiveDate) -> f64 {
    (date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE) as f64
}

fn push_fourier(row: &mut Vec<f64>, day: f64, period: f64, order: usize) {
    for k in 1..=order {
        let x = 2.0 * PI * k as f64 * day / period;
        row.push(x.sin());
        row.push(x.cos());
    }
}

// ==========================================
// FittedModel - 已训练模型
// ==========================================
#[derive(Debug, Clone)]
pub(super) struct FittedModel {
    design: Design,
    beta: DVector<f64>,
    y_scale: f64,
    sigma: f64, // 归一化尺度下的残差标准差
    z: f64,
    n_history: usize,
    last_observed: NaiveDate,
}

impl FittedModel {
    /// 训练
    ///
    /// history 须按日期升序且日期唯一
    pub(super) fn fit(history: &[(NaiveDate, f64)], config: &ForecastConfig) -> ForecastResult<Self> {
        if !(config.interval_width > 0.0 && config.interval_width < 1.0) {
            return Err(ForecastError::InvalidConfig(format!(
                "interval_width 须在 (0, 1) 内: {}",
                config.interval_width
            )));
        }
        if config.changepoint_prior_scale <= 0.0 {
            return Err(ForecastError::InvalidConfig(format!(
                "changepoint_prior_scale 须为正: {}",
                config.changepoint_prior_scale
            )));
        }

        if history.is_empty() {
            return Err(ForecastError::Model("训练序列为空".to_string()));
        }

        let dates: Vec<NaiveDate> = history.iter().map(|(d, _)| *d).collect();
        let zero_days: BTreeSet<NaiveDate> = history
            .iter()
            .filter(|(_, y)| *y == 0.0)
            .map(|(d, _)| *d)
            .collect();
        let design = Design::new(&dates, zero_days, config);

        let y_scale = history
            .iter()
            .map(|(_, y)| y.abs())
            .fold(0.0_f64, f64::max);
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

        let n = history.len();
        let p = design.width();
        let flat: Vec<f64> = dates.iter().flat_map(|d| design.row(*d)).collect();
        let x = DMatrix::from_row_slice(n, p, &flat);
        let y = DVector::from_iterator(n, history.iter().map(|(_, v)| v / y_scale));

        let mut lhs = x.transpose() * &x;
        for (j, penalty) in design.penalties().into_iter().enumerate() {
            lhs[(j, j)] += penalty;
        }
        let rhs = x.transpose() * &y;
        let beta = lhs
            .cholesky()
            .ok_or_else(|| ForecastError::Model("正规方程非正定".to_string()))?
            .solve(&rhs);

        let residuals = &y - &x * &beta;
        let dof = if n > p { n - p } else { n };
        let sigma = (residuals.norm_squared() / dof as f64).sqrt();

        Ok(Self {
            design,
            beta,
            y_scale,
            sigma,
            z: normal_quantile(0.5 + config.interval_width / 2.0),
            n_history: n,
            last_observed: dates[n - 1],
        })
    }

    pub(super) fn last_observed(&self) -> NaiveDate {
        self.last_observed
    }

    pub(super) fn design(&self) -> &Design {
        &self.design
    }

    /// 预测单日（历史内为拟合值，历史外为外推值）
    pub(super) fn predict(&self, date: NaiveDate) -> ForecastPoint {
        let row = self.design.row(date);
        let yhat = row
            .iter()
            .zip(self.beta.iter())
            .map(|(x, b)| x * b)
            .sum::<f64>()
            * self.y_scale;

        let steps_ahead = (date - self.last_observed).num_days().max(0) as f64;
        let widen = (1.0 + steps_ahead / self.n_history as f64).sqrt();
        let half_width = self.z * self.sigma * self.y_scale * widen;

        ForecastPoint {
            date,
            yhat,
            yhat_lower: yhat - half_width,
            yhat_upper: yhat + half_width,
        }
    }
}

/// 标准正态分位数（Acklam 有理逼近，相对误差 < 1.15e-9）
pub fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e1,
        2.209460984245205e2,
        -2.759285104469687e2,
        1.383577518672690e2,
        -3.066479806614716e1,
        2.506628277459239,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e1,
        1.615858368580409e2,
        -1.556989798598866e2,
        6.680131188771972e1,
        -1.328068155288572e1,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-3,
        -3.223964580411365e-1,
        -2.400758277161838,
        -2.549732539343734,
        4.374664141464968,
        2.938163982698783,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-3,
        3.224671290700398e-1,
        2.445134137142996,
        3.754408661907416,
    ];
    const P_LOW: f64 = 0.02425;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}
