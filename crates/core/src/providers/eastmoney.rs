use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::fund::{FundSeries, NavPoint};
use crate::util::calendar::ts_to_date;
use super::traits::FundHistorySource;

const BASE_URL: &str = "https://fund.eastmoney.com/pingzhongdata";
const PROVIDER: &str = "Eastmoney";
const TREND_VAR: &str = "Data_netWorthTrend";

/// Eastmoney timestamps mark midnight in China Standard Time (UTC+8).
const CST_OFFSET_MS: i64 = 8 * 3_600_000;

/// Eastmoney fund data provider for mainland-China mutual funds.
///
/// - **Free**: No API key.
/// - **Endpoint**: `/pingzhongdata/{code}.js`, a script that assigns a set
///   of `var Data_* = ...;` globals.
/// - **Data**: `Data_netWorthTrend` holds the full unit-NAV history as
///   `[{"x": <ms timestamp>, "y": <nav>, ...}, ...]`.
pub struct EastmoneyFundSource {
    client: Client,
    base_url: String,
}

impl EastmoneyFundSource {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Point the source at a different host (mirrors, tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for EastmoneyFundSource {
    fn default() -> Self {
        Self::new()
    }
}

// ── Eastmoney payload types ─────────────────────────────────────────

#[derive(Deserialize)]
struct TrendPoint {
    x: i64,
    y: Option<f64>,
}

/// Extract the NAV history from a `pingzhongdata` script body.
pub fn parse_net_worth_trend(script: &str) -> Result<FundSeries, CoreError> {
    let missing = || CoreError::Api {
        provider: PROVIDER.into(),
        message: format!("{TREND_VAR} not found in response"),
    };

    let var_at = script.find(TREND_VAR).ok_or_else(missing)?;
    let rest = &script[var_at + TREND_VAR.len()..];
    let open = rest.find('[').ok_or_else(missing)?;
    let close = rest[open..].find("];").map(|i| open + i + 1).ok_or_else(missing)?;
    let payload = &rest[open..close];

    let points: Vec<TrendPoint> = serde_json::from_str(payload).map_err(|e| CoreError::Api {
        provider: PROVIDER.into(),
        message: format!("Failed to parse {TREND_VAR}: {e}"),
    })?;

    let navs = points
        .into_iter()
        .filter_map(|p| p.y.map(|nav| NavPoint::new(ts_to_date(p.x + CST_OFFSET_MS), nav)))
        .collect();
    Ok(FundSeries::new(navs))
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl FundHistorySource for EastmoneyFundSource {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch_fund_history(&self, code: &str) -> Result<FundSeries, CoreError> {
        let code = code.trim();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::ValidationError(format!("Invalid fund code '{code}'")));
        }

        let url = format!("{}/{code}.js", self.base_url);
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let series = parse_net_worth_trend(&body)?;
        if series.is_empty() {
            return Err(CoreError::FundUnavailable(code.to_string()));
        }
        Ok(series)
    }
}
