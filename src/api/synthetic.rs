//! Deterministic synthetic market data.
//!
//! Satisfies [`MarketData`] without touching the network: each symbol gets a
//! seeded random walk with a scenario-specific drift. Used by the test suite
//! and by the binary's offline mode.

use super::MarketData;
use crate::models::{MarketSnapshot, PriceBar};
use crate::Result;
use chrono::{NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Market scenario shaping a symbol's synthetic series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketScenario {
    /// Steady climb with mild noise; qualifies under the default checklist
    Uptrend,
    /// Steady decline, the mirror case
    Downtrend,
    /// Drift-free chop around the base price
    Sideways,
}

impl MarketScenario {
    fn daily_drift(&self) -> f64 {
        match self {
            MarketScenario::Uptrend => 0.0025,
            MarketScenario::Downtrend => -0.0025,
            MarketScenario::Sideways => 0.0,
        }
    }
}

/// Seeded generator implementing the market-data boundary.
pub struct SyntheticSource {
    seed: u64,
    scenarios: HashMap<String, MarketScenario>,
    base_price: f64,
    base_volume: f64,
}

impl SyntheticSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            scenarios: HashMap::new(),
            base_price: 80.0,
            base_volume: 1_000_000.0,
        }
    }

    /// Assign a scenario to one symbol. Unassigned symbols get an uptrend.
    pub fn with_scenario(mut self, symbol: &str, scenario: MarketScenario) -> Self {
        self.scenarios.insert(symbol.to_string(), scenario);
        self
    }

    fn scenario_for(&self, symbol: &str) -> MarketScenario {
        self.scenarios
            .get(symbol)
            .copied()
            .unwrap_or(MarketScenario::Uptrend)
    }

    /// Generate `sessions` consecutive daily bars ending today. Identical
    /// (seed, symbol, sessions) always produce identical bars.
    pub fn generate(&self, symbol: &str, sessions: usize) -> Vec<PriceBar> {
        let mut hasher = DefaultHasher::new();
        symbol.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(self.seed ^ hasher.finish());

        let drift = self.scenario_for(symbol).daily_drift();
        let end: NaiveDate = Utc::now().date_naive();
        let start = end - chrono::Days::new(sessions.saturating_sub(1) as u64);

        let mut bars = Vec::with_capacity(sessions);
        let mut price = self.base_price;
        for i in 0..sessions {
            let noise = rng.gen_range(-0.001..0.001);
            let open = price;
            price *= 1.0 + drift + noise;

            // Volume tapers off over the series so a trailing base shows
            // the dry-up the checklist looks for
            let volume_decay = 1.0 - 0.4 * i as f64 / sessions.max(1) as f64;
            let volume = self.base_volume * volume_decay * rng.gen_range(0.95..1.05);

            bars.push(PriceBar {
                date: start + chrono::Days::new(i as u64),
                open,
                high: open.max(price) * 1.005,
                low: open.min(price) * 0.995,
                close: price,
                volume,
            });
        }
        bars
    }
}

impl MarketData for SyntheticSource {
    async fn fetch_series(&self, symbol: &str, lookback_days: usize) -> Result<Vec<PriceBar>> {
        Ok(self.generate(symbol, lookback_days))
    }

    async fn scan_fast_movers(
        &self,
        universe: &[String],
        min_price: f64,
        min_volume: f64,
        top_n: usize,
    ) -> Result<Vec<MarketSnapshot>> {
        let mut movers: Vec<MarketSnapshot> = universe
            .iter()
            .filter_map(|symbol| {
                let bar = self.generate(symbol, 30).pop()?;
                if bar.open <= 0.0 || bar.close < min_price || bar.volume < min_volume {
                    return None;
                }
                Some(MarketSnapshot {
                    symbol: symbol.clone(),
                    percent_change: (bar.close - bar.open) / bar.open,
                    volume: bar.volume,
                    close: bar.close,
                })
            })
            .collect();

        movers.sort_by(|a, b| {
            b.percent_change
                .partial_cmp(&a.percent_change)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        movers.truncate(top_n);
        Ok(movers)
    }
}
