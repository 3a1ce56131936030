use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::analytics::{DrawdownWindow, Metrics};

/// State of the simulated portfolio at the end of one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurvePoint {
    pub date: NaiveDate,

    /// Market value of all holdings.
    pub value: f64,

    /// Cumulative amount invested so far.
    pub cost: f64,

    /// Price of one synthetic unit (starts at 1.0).
    pub unit_nav: f64,

    /// (value − cost) / cost × 100.
    pub return_rate: f64,

    /// Percent below the running peak value; always ≤ 0.
    pub drawdown: f64,
}

/// A dated money movement from the investor's point of view:
/// negative when money goes in, positive when it comes out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    pub date: NaiveDate,
    pub amount: f64,
}

impl CashFlow {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }
}

/// Everything one simulation run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub curve: Vec<CurvePoint>,
    pub metrics: Metrics,
    pub drawdown_window: DrawdownWindow,

    /// Contributions followed by the final "withdraw everything" flow.
    pub cash_flows: Vec<CashFlow>,

    /// Day-over-day unit price returns (fractions).
    pub unit_returns: Vec<f64>,

    /// Fund codes that actually took part, in allocation order.
    pub funds_used: Vec<String>,
}

impl SimulationResult {
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.curve.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.curve.last().map(|p| p.date)
    }

    pub fn final_point(&self) -> Option<&CurvePoint> {
        self.curve.last()
    }
}
