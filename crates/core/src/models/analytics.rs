use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Summary statistics of one simulated curve. Every field is finite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Final (value − cost) / cost, percent.
    pub total_return: f64,

    /// Deepest drawdown, percent (≤ 0).
    pub max_drawdown: f64,

    /// Money-weighted annual return (XIRR), percent.
    pub irr: f64,

    /// Annualised volatility of unit returns, percent.
    pub volatility: f64,

    pub sharpe: f64,
    pub sortino: f64,
    pub calmar: f64,

    /// Annualised return less half the annualised variance, percent.
    pub real_return: f64,
}

/// Location of the deepest drawdown and whether it was recovered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawdownWindow {
    pub has_drawdown: bool,
    pub peak_date: Option<NaiveDate>,
    pub trough_date: Option<NaiveDate>,

    /// First day the value got back to the peak level.
    pub recovery_date: Option<NaiveDate>,

    /// Calendar days from trough to recovery.
    pub recovery_days: Option<i64>,

    pub peak_value: f64,
    pub trough_value: f64,

    /// (trough − peak) / peak × 100.
    pub depth: f64,
}
