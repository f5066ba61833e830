// Market data adapters
pub mod alpaca;
pub mod synthetic;

pub use alpaca::{AlpacaClient, Credentials};
pub use synthetic::{MarketScenario, SyntheticSource};

use crate::models::{MarketSnapshot, PriceBar};
use crate::Result;

/// Injected market-data capability. The core never cares whether bars come
/// from a live API, a replayed fixture, or a synthetic generator.
#[allow(async_fn_in_trait)]
pub trait MarketData {
    /// Daily OHLCV bars for one symbol, oldest first, trimmed to roughly
    /// `lookback_days` sessions.
    async fn fetch_series(&self, symbol: &str, lookback_days: usize) -> Result<Vec<PriceBar>>;

    /// Pre-scan the universe for today's fastest movers by daily percent
    /// change, filtered by price and volume floors.
    async fn scan_fast_movers(
        &self,
        universe: &[String],
        min_price: f64,
        min_volume: f64,
        top_n: usize,
    ) -> Result<Vec<MarketSnapshot>>;
}
