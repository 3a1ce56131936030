use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One plotted day. "main" is the foreground portfolio, "sub" the
/// comparison one. A field is `None` until its series has started.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRow {
    /// Milliseconds since the epoch at UTC midnight of `date`.
    pub ts: i64,
    pub date: NaiveDate,

    pub main_value: Option<f64>,
    pub sub_value: Option<f64>,
    pub main_cost: Option<f64>,
    pub sub_cost: Option<f64>,
    pub main_drawdown: Option<f64>,
    pub sub_drawdown: Option<f64>,

    /// Percent change of the plotted value versus the previous row.
    pub main_change_pct: Option<f64>,
    pub sub_change_pct: Option<f64>,
}

impl ChartRow {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            ts: crate::util::calendar::date_to_ts(date),
            date,
            main_value: None,
            sub_value: None,
            main_cost: None,
            sub_cost: None,
            main_drawdown: None,
            sub_drawdown: None,
            main_change_pct: None,
            sub_change_pct: None,
        }
    }
}

/// A renderable chart state.
///
/// Frames are replaced wholesale; the most recent one is what is on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartFrame {
    /// Identifier of the range window the rows were computed for.
    pub range_id: String,

    pub rows: Vec<ChartRow>,

    /// First and last timestamp.
    pub x_domain: (i64, i64),

    /// Value axis bounds.
    pub y_domain: (f64, f64),

    /// Drawdown axis bounds (upper bound is 0).
    pub dd_domain: (f64, f64),

    pub y_ticks: Vec<f64>,

    /// Opacity of the comparison series, 0..=1.
    pub sub_alpha: f64,
}

impl ChartFrame {
    pub fn empty(range_id: impl Into<String>) -> Self {
        Self {
            range_id: range_id.into(),
            rows: Vec::new(),
            x_domain: (0, 0),
            y_domain: (0.0, 1.0),
            dd_domain: (-1.0, 0.0),
            y_ticks: Vec::new(),
            sub_alpha: 1.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Width of the time axis in milliseconds.
    pub fn x_span(&self) -> i64 {
        self.x_domain.1 - self.x_domain.0
    }
}
