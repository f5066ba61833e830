// Qualification strategy: configuration thresholds and the checklist
pub mod checklist;

pub use checklist::evaluate;

use crate::error::BotError;
use serde::{Deserialize, Serialize};

/// Threshold configuration consulted by the checklist and the position
/// sizer. Single source of truth: the journal's adaptive tuning overwrites
/// `rs_threshold` and `max_pct_off_high` before every ranking pass.
///
/// Percent-valued fields are in percent units (25.0 = 25%); `risk_fraction`
/// is a fraction of equity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Minimum relative strength score (0-100).
    pub rs_threshold: f64,
    /// Maximum percent below the 52-week high.
    pub max_pct_off_high: f64,
    /// Minimum percent above the 52-week low.
    pub min_pct_from_low: f64,
    /// Minimum consolidation length in sessions.
    pub min_base_length: usize,
    /// Ceiling on the 10d/50d volume ratio; quiet volume marks a base.
    pub volume_dry_up_max: f64,
    /// Fraction of equity at risk per trade.
    pub risk_fraction: f64,
    /// Stop distance in ATR multiples.
    pub stop_multiple: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            rs_threshold: 70.0,
            max_pct_off_high: 25.0,
            min_pct_from_low: 30.0,
            min_base_length: 35,
            volume_dry_up_max: 1.0,
            risk_fraction: 0.01,
            stop_multiple: 2.0,
        }
    }
}

impl StrategyConfig {
    /// Reject degenerate threshold combinations up front. Never clamps:
    /// a bad value is a caller bug, not something to paper over.
    pub fn validate(&self) -> Result<(), BotError> {
        if !(0.0..=100.0).contains(&self.rs_threshold) {
            return Err(BotError::InvalidConfig(format!(
                "rs_threshold must be within 0-100, got {}",
                self.rs_threshold
            )));
        }
        if !(0.0..=100.0).contains(&self.max_pct_off_high) {
            return Err(BotError::InvalidConfig(format!(
                "max_pct_off_high must be within 0-100, got {}",
                self.max_pct_off_high
            )));
        }
        if self.min_pct_from_low < 0.0 {
            return Err(BotError::InvalidConfig(format!(
                "min_pct_from_low must be non-negative, got {}",
                self.min_pct_from_low
            )));
        }
        if self.volume_dry_up_max <= 0.0 {
            return Err(BotError::InvalidConfig(format!(
                "volume_dry_up_max must be positive, got {}",
                self.volume_dry_up_max
            )));
        }
        if !(self.risk_fraction > 0.0 && self.risk_fraction <= 1.0) {
            return Err(BotError::InvalidConfig(format!(
                "risk_fraction must be within (0, 1], got {}",
                self.risk_fraction
            )));
        }
        if self.stop_multiple <= 0.0 {
            return Err(BotError::InvalidConfig(format!(
                "stop_multiple must be positive, got {}",
                self.stop_multiple
            )));
        }
        Ok(())
    }
}
