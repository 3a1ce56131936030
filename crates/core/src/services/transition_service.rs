//! Smooth transitions between two computed chart frames.
//!
//! A *soft cut* interpolates row values between frames that cover the same
//! dates. A *hard cut* swaps the data immediately and only fades the
//! comparison series, because morphing across different date ranges would
//! draw values that never existed.

use std::collections::{HashMap, HashSet};

use crate::config::{HARD_CUT_SPAN_RATIO, SOFT_CUT_MIN_OVERLAP, TRANSITION_DURATION_MS};
use crate::models::chart::{ChartFrame, ChartRow};
use crate::services::chart_service::recompute_change_pct;
use crate::util::numeric::{clamp, ease_in_out_cubic, is_finite_number, lerp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutKind {
    /// Interpolate row values over shared timestamps.
    Soft,
    /// Snap to the target data; only `sub_alpha` eases.
    Hard,
}

/// The parts of a frame the cut decision looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMeta<'a> {
    pub range_id: &'a str,
    pub x_span: i64,
    pub timestamps: Vec<i64>,
}

impl<'a> FrameMeta<'a> {
    pub fn of(frame: &'a ChartFrame) -> Self {
        Self {
            range_id: &frame.range_id,
            x_span: frame.x_span(),
            timestamps: frame.rows.iter().map(|r| r.ts).collect(),
        }
    }
}

/// Hard cut when the range window changed, the time spans differ by more
/// than a factor of two, or under 90% of the target's timestamps exist in
/// the previous frame. Soft otherwise.
pub fn classify(prev: &FrameMeta, target: &FrameMeta) -> CutKind {
    if prev.range_id != target.range_id {
        return CutKind::Hard;
    }

    let (short, long) = if prev.x_span <= target.x_span {
        (prev.x_span, target.x_span)
    } else {
        (target.x_span, prev.x_span)
    };
    if short <= 0 {
        if short != long {
            return CutKind::Hard;
        }
    } else if long as f64 / short as f64 > HARD_CUT_SPAN_RATIO {
        return CutKind::Hard;
    }

    if target.timestamps.is_empty() {
        return CutKind::Hard;
    }
    let known: HashSet<i64> = prev.timestamps.iter().copied().collect();
    let shared = target.timestamps.iter().filter(|ts| known.contains(ts)).count();
    if (shared as f64) / (target.timestamps.len() as f64) < SOFT_CUT_MIN_OVERLAP {
        return CutKind::Hard;
    }

    CutKind::Soft
}

/// Frame to display `elapsed_ms` into the transition from `prev` to
/// `target`. At or past the transition duration this is exactly `target`.
pub fn next_frame(prev: &ChartFrame, target: &ChartFrame, elapsed_ms: f64) -> ChartFrame {
    let kind = classify(&FrameMeta::of(prev), &FrameMeta::of(target));
    step(prev, target, kind, elapsed_ms)
}

/// Linear progress of a transition, 0..=1.
pub fn progress(elapsed_ms: f64) -> f64 {
    if !elapsed_ms.is_finite() {
        return 1.0;
    }
    clamp(elapsed_ms / TRANSITION_DURATION_MS, 0.0, 1.0)
}

fn step(prev: &ChartFrame, target: &ChartFrame, kind: CutKind, elapsed_ms: f64) -> ChartFrame {
    let linear = progress(elapsed_ms);
    if linear >= 1.0 {
        return target.clone();
    }
    let t = ease_in_out_cubic(linear);
    let sub_alpha = clamp(lerp(prev.sub_alpha, target.sub_alpha, t), 0.0, 1.0);

    if kind == CutKind::Hard {
        return ChartFrame {
            sub_alpha,
            ..target.clone()
        };
    }

    let previous: HashMap<i64, &ChartRow> = prev.rows.iter().map(|r| (r.ts, r)).collect();
    let shared = target.rows.iter().filter(|r| previous.contains_key(&r.ts)).count();
    if shared < 2 {
        return target.clone();
    }

    let mut rows: Vec<ChartRow> = target
        .rows
        .iter()
        .map(|row| match previous.get(&row.ts) {
            Some(old) => interpolate_row(old, row, t),
            None => *row,
        })
        .collect();
    recompute_change_pct(&mut rows);

    ChartFrame {
        range_id: target.range_id.clone(),
        rows,
        x_domain: target.x_domain,
        y_domain: target.y_domain,
        dd_domain: target.dd_domain,
        y_ticks: target.y_ticks.clone(),
        sub_alpha,
    }
}

fn interpolate_row(from: &ChartRow, to: &ChartRow, t: f64) -> ChartRow {
    ChartRow {
        main_value: mix(from.main_value, to.main_value, t),
        sub_value: mix(from.sub_value, to.sub_value, t),
        main_cost: mix(from.main_cost, to.main_cost, t),
        sub_cost: mix(from.sub_cost, to.sub_cost, t),
        main_drawdown: mix(from.main_drawdown, to.main_drawdown, t),
        sub_drawdown: mix(from.sub_drawdown, to.sub_drawdown, t),
        ..*to
    }
}

fn mix(from: Option<f64>, to: Option<f64>, t: f64) -> Option<f64> {
    match (from, to) {
        (Some(a), Some(b)) if is_finite_number(from) && is_finite_number(to) => {
            Some(lerp(a, b, t))
        }
        (_, to) => to,
    }
}

/// Drives transitions for a single chart.
///
/// Owns the displayed frame. A new target cancels the running transition
/// and starts from whatever was last rendered, so two animations never
/// write the displayed frame. The caller supplies time via [`advance`]
/// from its own render loop, timer, or [`finish`] to jump to the end.
///
/// [`advance`]: ChartAnimator::advance
/// [`finish`]: ChartAnimator::finish
#[derive(Debug, Clone)]
pub struct ChartAnimator {
    displayed: ChartFrame,
    transition: Option<Transition>,
    generation: u64,
}

#[derive(Debug, Clone)]
struct Transition {
    from: ChartFrame,
    to: ChartFrame,
    kind: CutKind,
    elapsed_ms: f64,
}

impl ChartAnimator {
    pub fn new(initial: ChartFrame) -> Self {
        Self {
            displayed: initial,
            transition: None,
            generation: 0,
        }
    }

    /// Start moving towards `target`. Returns the new transition's
    /// generation number.
    ///
    /// From an empty display the target is shown at once.
    pub fn set_target(&mut self, target: ChartFrame) -> u64 {
        self.generation += 1;
        if self.displayed.is_empty() {
            self.displayed = target;
            self.transition = None;
            return self.generation;
        }
        let from = self.displayed.clone();
        let kind = classify(&FrameMeta::of(&from), &FrameMeta::of(&target));
        self.displayed = step(&from, &target, kind, 0.0);
        self.transition = Some(Transition {
            from,
            to: target,
            kind,
            elapsed_ms: 0.0,
        });
        self.generation
    }

    /// Move the running transition forward by `dt_ms` and return the frame
    /// to draw.
    pub fn advance(&mut self, dt_ms: f64) -> &ChartFrame {
        if let Some(mut tr) = self.transition.take() {
            tr.elapsed_ms += dt_ms.max(0.0);
            self.displayed = step(&tr.from, &tr.to, tr.kind, tr.elapsed_ms);
            if progress(tr.elapsed_ms) < 1.0 {
                self.transition = Some(tr);
            }
        }
        &self.displayed
    }

    /// Jump straight to the final frame.
    pub fn finish(&mut self) -> &ChartFrame {
        if let Some(tr) = self.transition.take() {
            self.displayed = tr.to;
        }
        &self.displayed
    }

    pub fn current(&self) -> &ChartFrame {
        &self.displayed
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Kind of the running transition, if any.
    pub fn cut_kind(&self) -> Option<CutKind> {
        self.transition.as_ref().map(|t| t.kind)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Default for ChartAnimator {
    fn default() -> Self {
        Self::new(ChartFrame::empty(crate::models::settings::RangeWindow::default().id()))
    }
}
