use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeSet;

use crate::errors::CoreError;
use crate::models::fund::{FundData, FundSeries};
use crate::models::portfolio::PortfolioConfig;
use crate::models::settings::{InvestmentMode, RangeWindow, SimulationParams};
use crate::models::simulation::{CashFlow, CurvePoint, SimulationResult};
use crate::services::metrics_service::{max_drawdown_window, MetricsService};
use crate::services::series_service::{fill_calendar_days, DailyRecord};
use crate::util::calendar::{add_days, format_date, same_month};

/// Turns a weighted fund allocation plus NAV histories into a day-by-day
/// value / cost / drawdown curve.
///
/// The portfolio is tracked as a synthetic "unit": contributions buy new
/// units at the current unit price, so the unit price measures
/// time-weighted performance independent of cash-flow timing.
pub struct SimulationService {
    metrics_service: MetricsService,
}

/// NAV of every participating fund on one day (same order as the funds).
#[derive(Debug, Clone, PartialEq)]
struct AlignedRow {
    date: NaiveDate,
    navs: Vec<f64>,
}

impl DailyRecord for AlignedRow {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn with_date(&self, date: NaiveDate) -> Self {
        AlignedRow {
            date,
            navs: self.navs.clone(),
        }
    }

    fn merge_from(&mut self, hit: &Self) {
        for (nav, new) in self.navs.iter_mut().zip(&hit.navs) {
            if new.is_finite() && *new > 0.0 {
                *nav = *new;
            }
        }
    }
}

/// A fund that takes part in a run.
struct Participant<'a> {
    code: &'a str,
    weight: f64,
    series: &'a FundSeries,
}

impl SimulationService {
    pub fn new() -> Self {
        Self::with_metrics(MetricsService::new())
    }

    pub fn with_metrics(metrics_service: MetricsService) -> Self {
        Self { metrics_service }
    }

    /// Simulate `config` over `data`.
    ///
    /// Returns `Ok(None)` when no allocated fund has data or fewer than two
    /// aligned days remain after windowing. Errors only on invalid
    /// parameters (negative or non-finite amounts and weights).
    pub fn calculate_portfolio(
        &self,
        config: &PortfolioConfig,
        data: &FundData,
        params: &SimulationParams,
        mode: InvestmentMode,
        range: RangeWindow,
    ) -> Result<Option<SimulationResult>, CoreError> {
        validate(config, params)?;

        // 1. Funds with data; duplicate codes pool their weight.
        let mut participants: Vec<Participant> = Vec::new();
        for alloc in &config.allocations {
            let Some(series) = data.get(&alloc.code).filter(|s| !s.is_empty()) else {
                continue;
            };
            match participants.iter_mut().find(|p| p.code == alloc.code) {
                Some(p) => p.weight += alloc.weight,
                None => participants.push(Participant {
                    code: &alloc.code,
                    weight: alloc.weight,
                    series,
                }),
            }
        }
        participants.retain(|p| p.weight > 0.0);
        let total_weight: f64 = participants.iter().map(|p| p.weight).sum();
        if participants.is_empty() || total_weight <= 0.0 {
            debug!("portfolio '{}': no fund with data, nothing to simulate", config.name);
            return Ok(None);
        }
        let weights: Vec<f64> = participants.iter().map(|p| p.weight / total_weight).collect();

        // 2–5. Aligned daily price table.
        let rows = aligned_rows(&participants, params.start_date);
        let rows = apply_window(rows, range);
        if rows.len() < 2 {
            debug!(
                "portfolio '{}': {} usable day(s) after alignment, need 2",
                config.name,
                rows.len()
            );
            return Ok(None);
        }

        // 7. Walk the days.
        let (curve, mut cash_flows, unit_returns) = walk(&rows, &weights, params, mode);

        // 8. Final synthetic withdrawal for IRR.
        if let Some(last) = curve.last() {
            cash_flows.push(CashFlow::new(last.date, last.value));
        }

        // 9. Summary.
        let metrics = self.metrics_service.compute(&curve, &cash_flows, &unit_returns);
        let drawdown_window = max_drawdown_window(&curve);

        debug!(
            "portfolio '{}': {} days ({} to {}), {} fund(s), total return {:.2}%",
            config.name,
            curve.len(),
            format_date(rows[0].date),
            format_date(rows[rows.len() - 1].date),
            participants.len(),
            metrics.total_return
        );

        Ok(Some(SimulationResult {
            curve,
            metrics,
            drawdown_window,
            cash_flows,
            unit_returns,
            funds_used: participants.iter().map(|p| p.code.to_string()).collect(),
        }))
    }
}

impl Default for SimulationService {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(config: &PortfolioConfig, params: &SimulationParams) -> Result<(), CoreError> {
    if !params.initial_capital.is_finite() || params.initial_capital < 0.0 {
        return Err(CoreError::ValidationError(format!(
            "Initial capital must be a non-negative number, got {}",
            params.initial_capital
        )));
    }
    if !params.daily_amount.is_finite() {
        return Err(CoreError::ValidationError(format!(
            "Daily amount must be a finite number, got {}",
            params.daily_amount
        )));
    }
    if let Some(bad) = config
        .allocations
        .iter()
        .find(|a| !a.weight.is_finite() || a.weight < 0.0)
    {
        return Err(CoreError::ValidationError(format!(
            "Weight of fund {} must be a non-negative number, got {}",
            bad.code, bad.weight
        )));
    }
    Ok(())
}

/// One row per calendar day, starting no earlier than the latest of
/// `start_date` and every fund's first published day.
fn aligned_rows(participants: &[Participant], start_date: NaiveDate) -> Vec<AlignedRow> {
    let earliest = participants
        .iter()
        .filter_map(|p| p.series.first_date())
        .fold(start_date, NaiveDate::max);

    let dates: BTreeSet<NaiveDate> = participants
        .iter()
        .flat_map(|p| p.series.points().iter().map(|pt| pt.date))
        .filter(|d| *d >= earliest)
        .collect();

    // Carry-in: last NAV on or before the earliest admissible day.
    let mut last_known: Vec<Option<f64>> = participants
        .iter()
        .map(|p| p.series.nav_on_or_before(earliest))
        .collect();

    let mut rows = Vec::with_capacity(dates.len());
    for date in dates {
        for (slot, p) in last_known.iter_mut().zip(participants) {
            if let Some(nav) = p.series.nav_on(date) {
                *slot = Some(nav);
            }
        }
        // Skip days on which some fund has no price yet.
        let navs: Option<Vec<f64>> = last_known.iter().copied().collect();
        if let Some(navs) = navs {
            rows.push(AlignedRow { date, navs });
        }
    }

    fill_calendar_days(&rows)
}

/// Keep the trailing window, measured back from the last row.
fn apply_window(rows: Vec<AlignedRow>, range: RangeWindow) -> Vec<AlignedRow> {
    let (Some(first), Some(last), Some(days)) = (rows.first(), rows.last(), range.days()) else {
        return rows;
    };
    let cutoff = add_days(last.date, -days).max(first.date);
    rows.into_iter().filter(|r| r.date >= cutoff).collect()
}

fn walk(
    rows: &[AlignedRow],
    weights: &[f64],
    params: &SimulationParams,
    mode: InvestmentMode,
) -> (Vec<CurvePoint>, Vec<CashFlow>, Vec<f64>) {
    let mut shares = vec![0.0_f64; weights.len()];
    let mut units = 0.0_f64;
    let mut cost = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut prev_unit_nav: Option<f64> = None;

    let mut curve = Vec::with_capacity(rows.len());
    let mut cash_flows = Vec::new();
    let mut unit_returns = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let holdings = market_value(&shares, &row.navs);

        let initial = if i == 0 { params.initial_capital } else { 0.0 };
        let contribution = match mode {
            InvestmentMode::LumpSum => initial,
            InvestmentMode::Daily => initial + params.effective_daily_amount(),
        };

        if contribution > 0.0 {
            // New money buys units at the pre-contribution unit price.
            let unit_price = if units > 0.0 && holdings > 0.0 {
                holdings / units
            } else {
                prev_unit_nav.unwrap_or(1.0)
            };
            units += contribution / unit_price;
            cost += contribution;
            cash_flows.push(CashFlow::new(row.date, -contribution));
        }

        let rebalance = i > 0 && !same_month(rows[i - 1].date, row.date);
        if rebalance {
            let total = holdings + contribution;
            for ((s, w), nav) in shares.iter_mut().zip(weights).zip(&row.navs) {
                *s = total * w / nav;
            }
        } else if contribution > 0.0 {
            for ((s, w), nav) in shares.iter_mut().zip(weights).zip(&row.navs) {
                *s += contribution * w / nav;
            }
        }

        let value = market_value(&shares, &row.navs);
        let unit_nav = if units > 0.0 {
            value / units
        } else {
            prev_unit_nav.unwrap_or(1.0)
        };

        peak = peak.max(value);
        let drawdown = if peak > 0.0 && value < peak {
            (value - peak) / peak * 100.0
        } else {
            0.0
        };
        let return_rate = if cost > 0.0 {
            (value - cost) / cost * 100.0
        } else {
            0.0
        };

        if let Some(prev) = prev_unit_nav.filter(|p| *p > 0.0) {
            unit_returns.push(unit_nav / prev - 1.0);
        }
        prev_unit_nav = Some(unit_nav);

        curve.push(CurvePoint {
            date: row.date,
            value,
            cost,
            unit_nav,
            return_rate,
            drawdown,
        });
    }

    (curve, cash_flows, unit_returns)
}

fn market_value(shares: &[f64], navs: &[f64]) -> f64 {
    shares.iter().zip(navs).map(|(s, n)| s * n).sum()
}
