use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One published net asset value (date → NAV).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav: f64,
}

impl NavPoint {
    pub fn new(date: NaiveDate, nav: f64) -> Self {
        Self { date, nav }
    }
}

/// Price history of a single fund.
///
/// Invariants upheld by every constructor: strictly increasing dates, no
/// duplicates, every NAV finite and positive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<NavPoint>", into = "Vec<NavPoint>")]
pub struct FundSeries {
    points: Vec<NavPoint>,
}

/// Fund code → price history.
pub type FundData = HashMap<String, FundSeries>;

impl FundSeries {
    /// Normalise raw points: sort by date, keep the last value seen for a
    /// duplicated date, drop non-finite or non-positive NAVs.
    pub fn new(mut points: Vec<NavPoint>) -> Self {
        points.retain(|p| p.nav.is_finite() && p.nav > 0.0);
        // Stable sort keeps input order within a date, so the last one wins below.
        points.sort_by_key(|p| p.date);
        let mut out: Vec<NavPoint> = Vec::with_capacity(points.len());
        for p in points {
            match out.last_mut() {
                Some(last) if last.date == p.date => *last = p,
                _ => out.push(p),
            }
        }
        Self { points: out }
    }

    pub fn points(&self) -> &[NavPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Exact NAV on `date`. Binary search (O(log n)).
    pub fn nav_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| self.points[idx].nav)
    }

    /// Last NAV published on or before `date`.
    pub fn nav_on_or_before(&self, date: NaiveDate) -> Option<f64> {
        let idx = match self.points.binary_search_by_key(&date, |p| p.date) {
            Ok(idx) => return Some(self.points[idx].nav),
            Err(idx) => idx,
        };
        idx.checked_sub(1).map(|i| self.points[i].nav)
    }
}

impl From<Vec<NavPoint>> for FundSeries {
    fn from(points: Vec<NavPoint>) -> Self {
        Self::new(points)
    }
}

impl From<FundSeries> for Vec<NavPoint> {
    fn from(series: FundSeries) -> Self {
        series.points
    }
}
