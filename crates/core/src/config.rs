//! Tunable constants shared by the simulator, metrics and chart engine.

use std::time::Duration;

/// Smallest contribution accepted in daily mode; lower amounts are lifted to this.
pub const MIN_DAILY_AMOUNT: f64 = 40.0;

/// Trading days per year used to annualise daily statistics.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Day count basis for XIRR discounting.
pub const XIRR_DAY_BASIS: f64 = 365.0;
pub const XIRR_LOWER_BOUND: f64 = -0.99;
pub const XIRR_UPPER_BOUND: f64 = 10.0;
pub const XIRR_MAX_ITERATIONS: usize = 60;
/// Residual NPV (in currency units) at which bisection stops early.
pub const XIRR_TOLERANCE: f64 = 1.0;

/// Annualised volatility (percent) below which a series counts as flat.
/// Unit-price bookkeeping leaves rounding noise around 1e-13.
pub const VOLATILITY_EPSILON: f64 = 1e-9;

/// Annual risk-free rate (fraction) used when the user has not set one.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Length of a chart transition.
pub const TRANSITION_DURATION_MS: f64 = 900.0;
/// Spans differing by more than this factor force a hard cut.
pub const HARD_CUT_SPAN_RATIO: f64 = 2.0;
/// Share of target timestamps that must already exist in the previous frame
/// for a soft cut.
pub const SOFT_CUT_MIN_OVERLAP: f64 = 0.9;

/// Tick count requested for the value axis.
pub const Y_TICK_COUNT: usize = 5;

/// Pause between two sequential fund-history requests.
pub const DEFAULT_FETCH_DELAY: Duration = Duration::from_millis(300);

/// Preference key holding the serialized `BacktestSettings`.
pub const SETTINGS_KEY: &str = "fund-backtest.settings";
