use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{DEFAULT_RISK_FREE_RATE, MIN_DAILY_AMOUNT};

use super::portfolio::PortfolioConfig;

/// Contribution schedule of a simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InvestmentMode {
    /// Whole initial capital on day one, nothing afterwards.
    #[default]
    LumpSum,
    /// Fixed contribution every simulated day.
    Daily,
}

impl fmt::Display for InvestmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvestmentMode::LumpSum => write!(f, "Lump sum"),
            InvestmentMode::Daily => write!(f, "Daily"),
        }
    }
}

/// Trailing analysis window, measured back from the last aligned date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeWindow {
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "3y")]
    ThreeYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "inception")]
    SinceInception,
    #[default]
    #[serde(rename = "all")]
    Unlimited,
}

impl RangeWindow {
    pub const ALL: [RangeWindow; 8] = [
        RangeWindow::OneMonth,
        RangeWindow::ThreeMonths,
        RangeWindow::SixMonths,
        RangeWindow::OneYear,
        RangeWindow::ThreeYears,
        RangeWindow::FiveYears,
        RangeWindow::SinceInception,
        RangeWindow::Unlimited,
    ];

    /// Trailing length in calendar days; `None` means no cutoff.
    pub fn days(&self) -> Option<i64> {
        match self {
            RangeWindow::OneMonth => Some(30),
            RangeWindow::ThreeMonths => Some(91),
            RangeWindow::SixMonths => Some(182),
            RangeWindow::OneYear => Some(365),
            RangeWindow::ThreeYears => Some(1095),
            RangeWindow::FiveYears => Some(1826),
            RangeWindow::SinceInception | RangeWindow::Unlimited => None,
        }
    }

    /// Stable identifier, also used to decide chart transitions.
    pub fn id(&self) -> &'static str {
        match self {
            RangeWindow::OneMonth => "1m",
            RangeWindow::ThreeMonths => "3m",
            RangeWindow::SixMonths => "6m",
            RangeWindow::OneYear => "1y",
            RangeWindow::ThreeYears => "3y",
            RangeWindow::FiveYears => "5y",
            RangeWindow::SinceInception => "inception",
            RangeWindow::Unlimited => "all",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.id() == id)
    }
}

impl fmt::Display for RangeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Which portfolio(s) the chart shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    #[default]
    Compare,
    OnlyA,
    OnlyB,
}

/// Plotted quantity: market value or cumulative return percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricMode {
    #[default]
    Value,
    Return,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScaleMode {
    #[default]
    Linear,
    Log,
}

/// Money and timing inputs of a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationParams {
    /// No fund is bought before this day.
    pub start_date: NaiveDate,

    /// Invested on the first simulated day.
    pub initial_capital: f64,

    /// Daily contribution; anything below 40 is treated as 40.
    pub daily_amount: f64,
}

impl SimulationParams {
    /// Contribution actually injected per day in daily mode.
    pub fn effective_daily_amount(&self) -> f64 {
        self.daily_amount.max(MIN_DAILY_AMOUNT)
    }
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2018, 1, 1).unwrap_or_default(),
            initial_capital: 10_000.0,
            daily_amount: 100.0,
        }
    }
}

/// Every user-adjustable parameter of the backtest tool.
///
/// Serialized as JSON into the preference store. Unknown or missing fields
/// fall back to defaults so older documents keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BacktestSettings {
    pub portfolio_a: PortfolioConfig,
    pub portfolio_b: PortfolioConfig,
    pub params: SimulationParams,
    pub mode: InvestmentMode,
    pub range: RangeWindow,
    pub view: ViewMode,
    pub metric: MetricMode,
    pub scale: ScaleMode,

    /// Annual risk-free rate as a fraction (0.02 = 2%).
    pub risk_free_rate: f64,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            portfolio_a: PortfolioConfig::new("Portfolio A"),
            portfolio_b: PortfolioConfig::new("Portfolio B"),
            params: SimulationParams::default(),
            mode: InvestmentMode::default(),
            range: RangeWindow::default(),
            view: ViewMode::default(),
            metric: MetricMode::default(),
            scale: ScaleMode::default(),
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
        }
    }
}
