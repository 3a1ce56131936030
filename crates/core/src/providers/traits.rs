use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::fund::FundSeries;

/// Trait abstraction for fund price-history sources.
///
/// The engine never talks to the network itself: whoever drives a
/// `BacktestSession` hands it a source, and tests hand it a mock. A source
/// may fail per fund; the session treats such a fund as unavailable.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait FundHistorySource: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    /// Full NAV history of one fund.
    async fn fetch_fund_history(&self, code: &str) -> Result<FundSeries, CoreError>;
}
