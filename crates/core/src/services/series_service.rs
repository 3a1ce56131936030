//! Calendar-day alignment of sparse, date-keyed series.

use chrono::NaiveDate;

use crate::models::chart::ChartRow;
use crate::models::fund::NavPoint;
use crate::util::calendar::{date_to_ts, days_between, iter_days};
use crate::util::numeric::is_finite_number;

/// A row keyed by calendar day that can be forward-filled.
pub trait DailyRecord: Clone {
    fn date(&self) -> NaiveDate;

    /// Same values, different day.
    fn with_date(&self, date: NaiveDate) -> Self;

    /// Overwrite fields with the defined, finite values of `hit`; fields
    /// `hit` lacks keep their current value.
    fn merge_from(&mut self, hit: &Self);
}

/// Expand an ascending series into exactly one entry per calendar day from
/// its first to its last date, carrying the last known values across gaps.
///
/// Entries that repeat a date are merged into that day in order. The first
/// output entry equals the first input entry.
pub fn fill_calendar_days<T: DailyRecord>(series: &[T]) -> Vec<T> {
    let (first, last) = match (series.first(), series.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Vec::new(),
    };
    let span = days_between(first.date(), last.date());
    if span < 0 {
        return vec![first.clone()];
    }

    let mut out: Vec<T> = Vec::with_capacity(span as usize + 1);
    let mut current = first.clone();
    let mut idx = 1;

    for (offset, day) in iter_days(first.date(), last.date()).enumerate() {
        if offset > 0 {
            current = current.with_date(day);
        }
        // Stale (out-of-order) entries can't be placed any more.
        while idx < series.len() && series[idx].date() < day {
            idx += 1;
        }
        while idx < series.len() && series[idx].date() == day {
            current.merge_from(&series[idx]);
            idx += 1;
        }
        out.push(current.clone());
    }

    out
}

fn prefer(current: &mut Option<f64>, hit: Option<f64>) {
    if is_finite_number(hit) {
        *current = hit;
    }
}

impl DailyRecord for NavPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn with_date(&self, date: NaiveDate) -> Self {
        NavPoint { date, nav: self.nav }
    }

    fn merge_from(&mut self, hit: &Self) {
        if hit.nav.is_finite() {
            self.nav = hit.nav;
        }
    }
}

impl DailyRecord for ChartRow {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn with_date(&self, date: NaiveDate) -> Self {
        ChartRow {
            ts: date_to_ts(date),
            date,
            ..*self
        }
    }

    fn merge_from(&mut self, hit: &Self) {
        prefer(&mut self.main_value, hit.main_value);
        prefer(&mut self.sub_value, hit.sub_value);
        prefer(&mut self.main_cost, hit.main_cost);
        prefer(&mut self.sub_cost, hit.sub_cost);
        prefer(&mut self.main_drawdown, hit.main_drawdown);
        prefer(&mut self.sub_drawdown, hit.sub_drawdown);
        prefer(&mut self.main_change_pct, hit.main_change_pct);
        prefer(&mut self.sub_change_pct, hit.sub_change_pct);
    }
}
