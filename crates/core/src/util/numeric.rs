//! Small numeric helpers: guards, interpolation, easing and axis ticks.

pub fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    if v < lo {
        lo
    } else if v > hi {
        hi
    } else {
        v
    }
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// `v` when finite, otherwise `fallback`.
pub fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}

pub fn is_finite_number(v: Option<f64>) -> bool {
    matches!(v, Some(x) if x.is_finite())
}

/// Cubic ease-in-out on `t ∈ [0, 1]`.
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = clamp(t, 0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Round `range` to a "nice" value of the form {1, 2, 5, 10} × 10^k.
pub fn nice_number(range: f64, round: bool) -> f64 {
    if !(range.is_finite() && range > 0.0) {
        return 1.0;
    }
    let exponent = range.log10().floor();
    let fraction = range / 10f64.powf(exponent);
    let nice = if round {
        if fraction < 1.5 {
            1.0
        } else if fraction < 3.0 {
            2.0
        } else if fraction < 7.0 {
            5.0
        } else {
            10.0
        }
    } else if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * 10f64.powf(exponent)
}

/// Domain expanded outward to nice tick boundaries.
pub fn nice_domain(min: f64, max: f64, count: usize) -> (f64, f64) {
    let (min, max) = sanitize_bounds(min, max);
    let step = tick_step(min, max, count);
    ((min / step).floor() * step, (max / step).ceil() * step)
}

/// Evenly spaced nice ticks covering `[min, max]`.
pub fn nice_ticks(min: f64, max: f64, count: usize) -> Vec<f64> {
    let (lo, hi) = nice_domain(min, max, count);
    let step = tick_step(lo, hi, count);
    let n = ((hi - lo) / step).round() as usize;
    (0..=n)
        .map(|i| {
            let v = lo + step * i as f64;
            // Trim accumulation noise such as 0.30000000000000004.
            (v / step).round() * step
        })
        .collect()
}

/// Ticks at 1-2-5 multiples of each decade inside `[min, max]` (both > 0).
pub fn log_ticks(min: f64, max: f64) -> Vec<f64> {
    if !(min > 0.0 && max > 0.0 && min.is_finite() && max.is_finite()) || min > max {
        return Vec::new();
    }
    let mut ticks = Vec::new();
    let mut decade = 10f64.powf(min.log10().floor());
    while decade <= max {
        for m in [1.0, 2.0, 5.0] {
            let v = decade * m;
            if v >= min && v <= max {
                ticks.push(v);
            }
        }
        decade *= 10.0;
    }
    ticks
}

fn tick_step(min: f64, max: f64, count: usize) -> f64 {
    let count = count.max(2);
    let range = nice_number(max - min, false);
    nice_number(range / (count - 1) as f64, true)
}

fn sanitize_bounds(min: f64, max: f64) -> (f64, f64) {
    let min = finite_or(min, 0.0);
    let max = finite_or(max, min);
    let (min, max) = if min > max { (max, min) } else { (min, max) };
    if max - min > f64::EPSILON {
        return (min, max);
    }
    // Degenerate (flat) series: pad so the line sits mid-axis.
    let pad = if min.abs() > f64::EPSILON { min.abs() * 0.05 } else { 1.0 };
    (min - pad, max + pad)
}
