pub mod config;
pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;
pub mod util;

use log::{debug, info, warn};
use std::time::Duration;

use errors::CoreError;
use models::{
    analytics::{DrawdownWindow, Metrics},
    chart::ChartFrame,
    fund::{FundData, FundSeries},
    portfolio::PortfolioConfig,
    settings::{
        BacktestSettings, InvestmentMode, MetricMode, RangeWindow, ScaleMode, SimulationParams,
        ViewMode,
    },
    simulation::{CurvePoint, SimulationResult},
};
use providers::traits::FundHistorySource;
use services::{
    chart_service::{ChartRequest, ChartService},
    metrics_service::MetricsService,
    simulation_service::SimulationService,
    transition_service::ChartAnimator,
};
use storage::{manager::SettingsManager, traits::PreferenceStore};

/// Both simulations plus the chart frame built from them.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestOutput {
    /// Portfolio A, or `None` when it has too little data to simulate.
    pub a: Option<SimulationResult>,
    pub b: Option<SimulationResult>,

    /// Target frame handed to the animator.
    pub frame: ChartFrame,
}

impl BacktestOutput {
    pub fn drawdown_window_a(&self) -> Option<&DrawdownWindow> {
        self.a.as_ref().map(|r| &r.drawdown_window)
    }

    pub fn drawdown_window_b(&self) -> Option<&DrawdownWindow> {
        self.b.as_ref().map(|r| &r.drawdown_window)
    }
}

/// Outcome of a batch of fund-history fetches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchReport {
    pub loaded: Vec<String>,
    /// (code, error message) for every fund that could not be fetched.
    pub failed: Vec<(String, String)>,
}

impl FetchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Main entry point: owns the user's backtest parameters, the fund
/// histories loaded so far and the chart currently on screen.
///
/// Every parameter change is persisted through the injected
/// [`PreferenceStore`]; results are recomputed on demand with [`recompute`].
///
/// [`recompute`]: BacktestSession::recompute
#[must_use]
pub struct BacktestSession {
    settings: BacktestSettings,
    fund_data: FundData,
    store: Box<dyn PreferenceStore>,
    chart_service: ChartService,
    animator: ChartAnimator,
}

impl std::fmt::Debug for BacktestSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BacktestSession")
            .field("settings", &self.settings)
            .field("funds", &self.fund_data.len())
            .field("animating", &self.animator.is_animating())
            .finish()
    }
}

impl BacktestSession {
    /// Open a session with the settings stored in `store` (defaults when
    /// nothing usable is stored).
    pub fn new(store: Box<dyn PreferenceStore>) -> Self {
        let settings = SettingsManager::load(store.as_ref());
        Self::build(store, settings)
    }

    /// Open a session with explicit settings. Nothing is written until the
    /// first change.
    pub fn with_settings(store: Box<dyn PreferenceStore>, settings: BacktestSettings) -> Self {
        Self::build(store, settings)
    }

    // ── Pure entry points ───────────────────────────────────────────

    /// Simulate one portfolio. Stateless; identical inputs give identical
    /// results.
    pub fn compute_curve(
        config: &PortfolioConfig,
        data: &FundData,
        params: &SimulationParams,
        mode: InvestmentMode,
        range: RangeWindow,
    ) -> Result<Option<SimulationResult>, CoreError> {
        SimulationService::new().calculate_portfolio(config, data, params, mode, range)
    }

    /// Metrics of a curve with the default risk-free rate.
    #[must_use]
    pub fn compute_metrics(curve: &[CurvePoint]) -> Metrics {
        MetricsService::new().compute_from_curve(curve)
    }

    // ── Settings ────────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &BacktestSettings {
        &self.settings
    }

    pub fn set_portfolio_a(&mut self, config: PortfolioConfig) -> Result<(), CoreError> {
        validate_portfolio(&config)?;
        self.settings.portfolio_a = config;
        self.persist();
        Ok(())
    }

    pub fn set_portfolio_b(&mut self, config: PortfolioConfig) -> Result<(), CoreError> {
        validate_portfolio(&config)?;
        self.settings.portfolio_b = config;
        self.persist();
        Ok(())
    }

    /// Set the first admissible day from a `YYYY-MM-DD` string.
    pub fn set_start_date(&mut self, date: &str) -> Result<(), CoreError> {
        self.settings.params.start_date = util::calendar::parse_date(date)?;
        self.persist();
        Ok(())
    }

    pub fn set_initial_capital(&mut self, amount: f64) -> Result<(), CoreError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Initial capital must be a non-negative number, got {amount}"
            )));
        }
        self.settings.params.initial_capital = amount;
        self.persist();
        Ok(())
    }

    /// Store the daily contribution as entered; the minimum is applied when
    /// simulating.
    pub fn set_daily_amount(&mut self, amount: f64) -> Result<(), CoreError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Daily amount must be a non-negative number, got {amount}"
            )));
        }
        self.settings.params.daily_amount = amount;
        self.persist();
        Ok(())
    }

    pub fn set_mode(&mut self, mode: InvestmentMode) {
        self.settings.mode = mode;
        self.persist();
    }

    pub fn set_range(&mut self, range: RangeWindow) {
        self.settings.range = range;
        self.persist();
    }

    pub fn set_view(&mut self, view: ViewMode) {
        self.settings.view = view;
        self.persist();
    }

    pub fn set_metric(&mut self, metric: MetricMode) {
        self.settings.metric = metric;
        self.persist();
    }

    pub fn set_scale(&mut self, scale: ScaleMode) {
        self.settings.scale = scale;
        self.persist();
    }

    /// Annual risk-free rate as a fraction, between -1 and 1.
    pub fn set_risk_free_rate(&mut self, rate: f64) -> Result<(), CoreError> {
        if !rate.is_finite() || !(-1.0..=1.0).contains(&rate) {
            return Err(CoreError::ValidationError(format!(
                "Risk-free rate must be a fraction between -1 and 1, got {rate}"
            )));
        }
        self.settings.risk_free_rate = rate;
        self.persist();
        Ok(())
    }

    // ── Fund data ───────────────────────────────────────────────────

    /// Supply (or replace) the history of one fund.
    pub fn insert_fund_history(&mut self, code: impl Into<String>, series: FundSeries) {
        self.fund_data.insert(code.into().trim().to_string(), series);
    }

    pub fn remove_fund_history(&mut self, code: &str) -> bool {
        self.fund_data.remove(code).is_some()
    }

    #[must_use]
    pub fn has_fund(&self, code: &str) -> bool {
        self.fund_data.get(code).is_some_and(|s| !s.is_empty())
    }

    #[must_use]
    pub fn fund_data(&self) -> &FundData {
        &self.fund_data
    }

    /// Codes referenced by either portfolio, A's first, without duplicates.
    #[must_use]
    pub fn required_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = Vec::new();
        for code in self
            .settings
            .portfolio_a
            .codes()
            .into_iter()
            .chain(self.settings.portfolio_b.codes())
        {
            if !codes.iter().any(|c| c == code) {
                codes.push(code.to_string());
            }
        }
        codes
    }

    /// Required codes with no history loaded yet.
    #[must_use]
    pub fn missing_codes(&self) -> Vec<String> {
        self.required_codes()
            .into_iter()
            .filter(|c| !self.has_fund(c))
            .collect()
    }

    /// Fetch every missing fund history from `source`, one at a time with
    /// `delay` between requests.
    ///
    /// A failing fund is logged and reported, never fatal: the simulations
    /// simply run without it.
    pub async fn load_fund_histories(
        &mut self,
        source: &dyn FundHistorySource,
        delay: Duration,
    ) -> FetchReport {
        let mut report = FetchReport::default();
        let codes = self.missing_codes();

        for (i, code) in codes.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                pause(delay).await;
            }
            match source.fetch_fund_history(code).await {
                Ok(series) if !series.is_empty() => {
                    debug!("{}: loaded {} NAV points for {code}", source.name(), series.len());
                    self.fund_data.insert(code.clone(), series);
                    report.loaded.push(code.clone());
                }
                Ok(_) => {
                    warn!("{}: empty history for fund {code}", source.name());
                    report
                        .failed
                        .push((code.clone(), CoreError::FundUnavailable(code.clone()).to_string()));
                }
                Err(e) => {
                    warn!("{}: failed to fetch fund {code}: {e}", source.name());
                    report.failed.push((code.clone(), e.to_string()));
                }
            }
        }

        info!(
            "fund history fetch finished: {} loaded, {} failed",
            report.loaded.len(),
            report.failed.len()
        );
        report
    }

    /// [`load_fund_histories`] with the standard pause between requests.
    ///
    /// [`load_fund_histories`]: BacktestSession::load_fund_histories
    pub async fn load_fund_histories_default(
        &mut self,
        source: &dyn FundHistorySource,
    ) -> FetchReport {
        self.load_fund_histories(source, config::DEFAULT_FETCH_DELAY).await
    }

    // ── Recompute ───────────────────────────────────────────────────

    /// Run both simulations with the current settings, build the chart
    /// frame and start animating towards it.
    ///
    /// Fails only on invalid input (no usable fund code at all). A portfolio
    /// without enough data comes back as `None`.
    pub fn recompute(&mut self) -> Result<BacktestOutput, CoreError> {
        let has_valid_code = self
            .settings
            .portfolio_a
            .allocations
            .iter()
            .chain(&self.settings.portfolio_b.allocations)
            .any(|a| is_valid_code(&a.code) && a.weight > 0.0);
        if !has_valid_code {
            return Err(CoreError::ValidationError(
                "No valid fund codes supplied for either portfolio".into(),
            ));
        }

        let simulation = SimulationService::with_metrics(MetricsService::with_risk_free_rate(
            self.settings.risk_free_rate,
        ));
        let s = &self.settings;
        let a = simulation.calculate_portfolio(
            &s.portfolio_a,
            &self.fund_data,
            &s.params,
            s.mode,
            s.range,
        )?;
        let b = simulation.calculate_portfolio(
            &s.portfolio_b,
            &self.fund_data,
            &s.params,
            s.mode,
            s.range,
        )?;

        let request = ChartRequest {
            range: s.range,
            view: s.view,
            metric: s.metric,
            scale: s.scale,
        };
        let frame = self.chart_service.render(
            a.as_ref().map(|r| r.curve.as_slice()),
            b.as_ref().map(|r| r.curve.as_slice()),
            &request,
        );

        let generation = self.animator.set_target(frame.clone());
        debug!(
            "recompute #{generation}: A {}, B {}, {} chart rows, {:?} cut",
            if a.is_some() { "ok" } else { "no result" },
            if b.is_some() { "ok" } else { "no result" },
            frame.rows.len(),
            self.animator.cut_kind()
        );

        Ok(BacktestOutput { a, b, frame })
    }

    // ── Animation ───────────────────────────────────────────────────

    /// Advance the running chart transition by `dt_ms` and return the
    /// frame to draw.
    pub fn advance_animation(&mut self, dt_ms: f64) -> &ChartFrame {
        self.animator.advance(dt_ms)
    }

    /// Skip to the end of the running transition.
    pub fn finish_animation(&mut self) -> &ChartFrame {
        self.animator.finish()
    }

    #[must_use]
    pub fn current_frame(&self) -> &ChartFrame {
        self.animator.current()
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }

    #[must_use]
    pub fn animator(&self) -> &ChartAnimator {
        &self.animator
    }

    // ── Internal ────────────────────────────────────────────────────

    fn build(store: Box<dyn PreferenceStore>, settings: BacktestSettings) -> Self {
        Self {
            settings,
            fund_data: FundData::new(),
            store,
            chart_service: ChartService::new(),
            animator: ChartAnimator::default(),
        }
    }

    /// Best-effort: a failed write is logged and otherwise ignored.
    fn persist(&self) {
        if let Err(e) = SettingsManager::save(self.store.as_ref(), &self.settings) {
            warn!("failed to persist backtest settings: {e}");
        }
    }
}

fn is_valid_code(code: &str) -> bool {
    !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric())
}

fn validate_portfolio(config: &PortfolioConfig) -> Result<(), CoreError> {
    for alloc in &config.allocations {
        if !is_valid_code(&alloc.code) {
            return Err(CoreError::ValidationError(format!(
                "Invalid fund code '{}' in {}",
                alloc.code, config.name
            )));
        }
        if !alloc.weight.is_finite() || alloc.weight < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Weight of fund {} must be a non-negative number, got {}",
                alloc.code, alloc.weight
            )));
        }
    }
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
async fn pause(delay: Duration) {
    tokio::time::sleep(delay).await;
}

/// No timer without a runtime on wasm; requests run back to back there.
#[cfg(target_arch = "wasm32")]
async fn pause(_delay: Duration) {}
