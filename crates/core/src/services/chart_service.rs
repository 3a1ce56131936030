use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::config::Y_TICK_COUNT;
use crate::models::chart::{ChartFrame, ChartRow};
use crate::models::settings::{MetricMode, RangeWindow, ScaleMode, ViewMode};
use crate::models::simulation::CurvePoint;
use crate::services::series_service::fill_calendar_days;
use crate::util::numeric::{log_ticks, nice_domain, nice_ticks};

/// View parameters a chart frame is built for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChartRequest {
    pub range: RangeWindow,
    pub view: ViewMode,
    pub metric: MetricMode,
    pub scale: ScaleMode,
}

/// Generates chart-ready frames from simulated curves.
///
/// The core computes all the numbers, the frontend only renders:
/// - Both portfolios merged onto one calendar-day axis
/// - Plotted value (market value or return %) per the metric selector
/// - Axis domains and ticks, day-over-day change fields
pub struct ChartService;

impl ChartService {
    pub fn new() -> Self {
        Self
    }

    /// Merge and build in one step.
    pub fn render(
        &self,
        a: Option<&[CurvePoint]>,
        b: Option<&[CurvePoint]>,
        request: &ChartRequest,
    ) -> ChartFrame {
        let rows = self.merge_curves(a, b, request.view, request.metric);
        self.build_frame(rows, request)
    }

    /// Merge two curves onto a common, gap-free date axis.
    ///
    /// "main" is portfolio A except in `OnlyB` view; "sub" is the other one.
    /// The sub series is kept in single views too, so it can fade out
    /// instead of disappearing.
    pub fn merge_curves(
        &self,
        a: Option<&[CurvePoint]>,
        b: Option<&[CurvePoint]>,
        view: ViewMode,
        metric: MetricMode,
    ) -> Vec<ChartRow> {
        let (main, sub) = match view {
            ViewMode::OnlyB => (b, a),
            ViewMode::Compare | ViewMode::OnlyA => (a, b),
        };

        let plotted = |p: &CurvePoint| match metric {
            MetricMode::Value => p.value,
            MetricMode::Return => p.return_rate,
        };

        let mut by_date: BTreeMap<NaiveDate, ChartRow> = BTreeMap::new();
        for p in main.unwrap_or_default() {
            let row = by_date.entry(p.date).or_insert_with(|| ChartRow::empty(p.date));
            row.main_value = Some(plotted(p));
            row.main_cost = Some(p.cost);
            row.main_drawdown = Some(p.drawdown);
        }
        for p in sub.unwrap_or_default() {
            let row = by_date.entry(p.date).or_insert_with(|| ChartRow::empty(p.date));
            row.sub_value = Some(plotted(p));
            row.sub_cost = Some(p.cost);
            row.sub_drawdown = Some(p.drawdown);
        }

        let sparse: Vec<ChartRow> = by_date.into_values().collect();
        let mut rows = fill_calendar_days(&sparse);
        recompute_change_pct(&mut rows);
        rows
    }

    /// Attach domains, ticks and the comparison opacity to merged rows.
    pub fn build_frame(&self, rows: Vec<ChartRow>, request: &ChartRequest) -> ChartFrame {
        let mut frame = ChartFrame::empty(request.range.id());
        frame.sub_alpha = if request.view == ViewMode::Compare { 1.0 } else { 0.0 };
        if rows.is_empty() {
            return frame;
        }

        let with_sub = request.view == ViewMode::Compare;
        let mut values: Vec<f64> = Vec::with_capacity(rows.len() * 4);
        let mut drawdowns: Vec<f64> = Vec::with_capacity(rows.len() * 2);
        for row in &rows {
            values.extend(row.main_value);
            drawdowns.extend(row.main_drawdown);
            if request.metric == MetricMode::Value {
                values.extend(row.main_cost);
            }
            if with_sub {
                values.extend(row.sub_value);
                drawdowns.extend(row.sub_drawdown);
                if request.metric == MetricMode::Value {
                    values.extend(row.sub_cost);
                }
            }
        }
        values.retain(|v| v.is_finite());
        drawdowns.retain(|v| v.is_finite());

        let (lo, hi) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));

        if values.is_empty() {
            frame.y_domain = (0.0, 1.0);
            frame.y_ticks = nice_ticks(0.0, 1.0, Y_TICK_COUNT);
        } else if request.scale == ScaleMode::Log && lo > 0.0 {
            frame.y_domain = (lo * 0.95, hi * 1.05);
            frame.y_ticks = log_ticks(frame.y_domain.0, frame.y_domain.1);
        } else {
            // Log scale cannot show values ≤ 0; such series stay linear.
            frame.y_domain = nice_domain(lo, hi, Y_TICK_COUNT);
            frame.y_ticks = nice_ticks(lo, hi, Y_TICK_COUNT);
        }

        let worst = drawdowns.iter().copied().fold(0.0_f64, f64::min);
        frame.dd_domain = if worst < 0.0 {
            (nice_domain(worst, 0.0, Y_TICK_COUNT).0, 0.0)
        } else {
            (-1.0, 0.0)
        };

        frame.x_domain = (rows[0].ts, rows[rows.len() - 1].ts);
        frame.rows = rows;
        frame
    }
}

impl Default for ChartService {
    fn default() -> Self {
        Self::new()
    }
}

/// Recompute day-over-day percent changes from the plotted values.
pub fn recompute_change_pct(rows: &mut [ChartRow]) {
    let mut prev_main: Option<f64> = None;
    let mut prev_sub: Option<f64> = None;
    for row in rows.iter_mut() {
        row.main_change_pct = change_pct(prev_main, row.main_value);
        row.sub_change_pct = change_pct(prev_sub, row.sub_value);
        prev_main = row.main_value;
        prev_sub = row.sub_value;
    }
}

fn change_pct(prev: Option<f64>, current: Option<f64>) -> Option<f64> {
    match (prev, current) {
        (Some(p), Some(c)) if p != 0.0 && p.is_finite() && c.is_finite() => {
            Some((c / p - 1.0) * 100.0)
        }
        _ => None,
    }
}
