use crate::config::{
    DEFAULT_RISK_FREE_RATE, TRADING_DAYS_PER_YEAR, VOLATILITY_EPSILON, XIRR_DAY_BASIS,
    XIRR_LOWER_BOUND, XIRR_MAX_ITERATIONS, XIRR_TOLERANCE, XIRR_UPPER_BOUND,
};
use crate::models::analytics::{DrawdownWindow, Metrics};
use crate::models::simulation::{CashFlow, CurvePoint};
use crate::util::calendar::days_between;
use crate::util::numeric::finite_or;

/// Risk and return statistics for simulated curves.
///
/// Every metric has an explicit fallback of 0 for degenerate input (too few
/// samples, zero volatility, no drawdown) so callers only ever see finite
/// numbers.
pub struct MetricsService {
    /// Annual risk-free rate as a fraction.
    risk_free_rate: f64,
}

impl MetricsService {
    pub fn new() -> Self {
        Self::with_risk_free_rate(DEFAULT_RISK_FREE_RATE)
    }

    pub fn with_risk_free_rate(risk_free_rate: f64) -> Self {
        Self {
            risk_free_rate: finite_or(risk_free_rate, DEFAULT_RISK_FREE_RATE),
        }
    }

    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    /// All summary metrics of a curve.
    ///
    /// `cash_flows` must already end with the final withdrawal flow;
    /// `unit_returns` are the day-over-day unit price returns.
    pub fn compute(
        &self,
        curve: &[CurvePoint],
        cash_flows: &[CashFlow],
        unit_returns: &[f64],
    ) -> Metrics {
        let max_drawdown = curve.iter().map(|p| p.drawdown).fold(0.0_f64, f64::min);
        let total_return = curve
            .last()
            .map(|p| {
                if p.cost > 0.0 {
                    (p.value - p.cost) / p.cost * 100.0
                } else {
                    0.0
                }
            })
            .unwrap_or(0.0);

        Metrics {
            total_return: finite_or(total_return, 0.0),
            max_drawdown: finite_or(max_drawdown, 0.0),
            irr: finite_or(xirr(cash_flows) * 100.0, 0.0),
            volatility: volatility(unit_returns),
            sharpe: self.sharpe(unit_returns),
            sortino: self.sortino(unit_returns),
            calmar: calmar(unit_returns, max_drawdown),
            real_return: real_return(unit_returns),
        }
    }

    /// Metrics derived from the curve alone (cash flows and unit returns are
    /// rebuilt from it).
    pub fn compute_from_curve(&self, curve: &[CurvePoint]) -> Metrics {
        let flows = cash_flows_from_curve(curve);
        let returns = unit_returns_from_curve(curve);
        self.compute(curve, &flows, &returns)
    }

    /// (mean daily return × 252 − rf) / annualised volatility.
    pub fn sharpe(&self, returns: &[f64]) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }
        let vol = volatility(returns) / 100.0;
        if vol * 100.0 < VOLATILITY_EPSILON {
            return 0.0;
        }
        finite_or((mean(returns) * TRADING_DAYS_PER_YEAR - self.risk_free_rate) / vol, 0.0)
    }

    /// Like Sharpe, but only shortfalls below the daily risk-free rate count
    /// as risk.
    pub fn sortino(&self, returns: &[f64]) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }
        let daily_rf = self.risk_free_rate / TRADING_DAYS_PER_YEAR;
        let shortfall_sq: f64 = returns
            .iter()
            .map(|r| (r - daily_rf).min(0.0).powi(2))
            .sum();
        let downside = (shortfall_sq / returns.len() as f64).sqrt() * TRADING_DAYS_PER_YEAR.sqrt();
        if downside * 100.0 < VOLATILITY_EPSILON {
            return 0.0;
        }
        finite_or(
            (mean(returns) * TRADING_DAYS_PER_YEAR - self.risk_free_rate) / downside,
            0.0,
        )
    }
}

impl Default for MetricsService {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Free-standing metric functions ────────────────────────────────

/// Money-weighted annual return of dated cash flows, as a fraction.
///
/// Bisection on `[-0.99, 10.0]`, at most 60 steps, stopping early once the
/// residual NPV is below one currency unit (tightened for small flows so
/// they still resolve to a useful precision). Returns 0 for fewer than two
/// flows or when the bracket holds no sign change.
pub fn xirr(flows: &[CashFlow]) -> f64 {
    if flows.len() < 2 {
        return 0.0;
    }
    let origin = flows.iter().map(|f| f.date).min().unwrap_or(flows[0].date);
    let timed: Vec<(f64, f64)> = flows
        .iter()
        .map(|f| (days_between(origin, f.date) as f64 / XIRR_DAY_BASIS, f.amount))
        .collect();
    let npv = |rate: f64| -> f64 {
        timed
            .iter()
            .map(|(years, amount)| amount / (1.0 + rate).powf(*years))
            .sum()
    };

    let gross: f64 = flows.iter().map(|f| f.amount.abs()).sum();
    let tolerance = XIRR_TOLERANCE.min(gross * 1e-6);

    let mut lo = XIRR_LOWER_BOUND;
    let mut hi = XIRR_UPPER_BOUND;
    let npv_lo = npv(lo);
    let npv_hi = npv(hi);
    if !npv_lo.is_finite() || !npv_hi.is_finite() || npv_lo.signum() == npv_hi.signum() {
        return 0.0;
    }

    let mut mid = (lo + hi) / 2.0;
    for _ in 0..XIRR_MAX_ITERATIONS {
        mid = (lo + hi) / 2.0;
        let value = npv(mid);
        if value.abs() < tolerance {
            break;
        }
        if value.signum() == npv_lo.signum() {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    finite_or(mid, 0.0)
}

/// Sample standard deviation of daily returns × √252, in percent.
///
/// Values below [`VOLATILITY_EPSILON`] are rounding noise and reported as 0.
pub fn volatility(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let vol = finite_or(sample_std(returns) * TRADING_DAYS_PER_YEAR.sqrt() * 100.0, 0.0);
    if vol < VOLATILITY_EPSILON {
        0.0
    } else {
        vol
    }
}

/// Annualised mean return over |max drawdown| (drawdown given in percent).
pub fn calmar(returns: &[f64], max_drawdown_pct: f64) -> f64 {
    if max_drawdown_pct == 0.0 || returns.is_empty() {
        return 0.0;
    }
    let annual = mean(returns) * TRADING_DAYS_PER_YEAR;
    finite_or(annual / (max_drawdown_pct.abs() / 100.0), 0.0)
}

/// Annualised return minus half the annualised variance, in percent.
pub fn real_return(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let annual = mean(returns) * TRADING_DAYS_PER_YEAR;
    let annual_var = if returns.len() < 2 {
        0.0
    } else {
        sample_std(returns).powi(2) * TRADING_DAYS_PER_YEAR
    };
    finite_or((annual - annual_var / 2.0) * 100.0, 0.0)
}

/// Deepest peak-to-trough decline of the curve's value and its recovery.
///
/// One forward pass tracks the running peak; the trough is the point with
/// the worst decline from the peak in force at that time. Recovery is the
/// first later point whose value reaches the peak level again.
pub fn max_drawdown_window(curve: &[CurvePoint]) -> DrawdownWindow {
    if curve.is_empty() {
        return DrawdownWindow::default();
    }

    let mut peak_idx = 0;
    let mut worst = 0.0_f64;
    let mut worst_peak = 0;
    let mut worst_trough = 0;

    for (i, point) in curve.iter().enumerate() {
        let peak_value = curve[peak_idx].value;
        if point.value > peak_value {
            peak_idx = i;
            continue;
        }
        if peak_value > 0.0 {
            let dd = (point.value - peak_value) / peak_value;
            if dd < worst {
                worst = dd;
                worst_peak = peak_idx;
                worst_trough = i;
            }
        }
    }

    if worst >= 0.0 {
        return DrawdownWindow::default();
    }

    let peak = curve[worst_peak];
    let trough = curve[worst_trough];
    let recovery = curve[worst_trough + 1..]
        .iter()
        .find(|p| p.value >= peak.value)
        .map(|p| p.date);

    DrawdownWindow {
        has_drawdown: true,
        peak_date: Some(peak.date),
        trough_date: Some(trough.date),
        recovery_date: recovery,
        recovery_days: recovery.map(|d| days_between(trough.date, d)),
        peak_value: peak.value,
        trough_value: trough.value,
        depth: worst * 100.0,
    }
}

/// Rebuild the investor's cash flows from cost increments, ending with the
/// withdrawal of the final value.
pub fn cash_flows_from_curve(curve: &[CurvePoint]) -> Vec<CashFlow> {
    let mut flows = Vec::new();
    let mut prev_cost = 0.0;
    for point in curve {
        let invested = point.cost - prev_cost;
        if invested > f64::EPSILON {
            flows.push(CashFlow::new(point.date, -invested));
        }
        prev_cost = point.cost;
    }
    if let Some(last) = curve.last() {
        flows.push(CashFlow::new(last.date, last.value));
    }
    flows
}

/// Day-over-day unit price returns wherever the previous price exists.
pub fn unit_returns_from_curve(curve: &[CurvePoint]) -> Vec<f64> {
    curve
        .windows(2)
        .filter(|w| w[0].unit_nav > 0.0)
        .map(|w| w[1].unit_nav / w[0].unit_nav - 1.0)
        .collect()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}
