use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily OHLCV session for a symbol.
///
/// Series handed to the indicator engine must be strictly chronological
/// (each bar's date greater than the previous); the scanner validates this
/// before evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Indicator values derived from a single trailing price series.
///
/// Every field is `None` when the series is too short for its window.
/// Checklist rules that depend on an unavailable metric fail closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub sma50: Option<f64>,
    pub sma150: Option<f64>,
    pub sma200: Option<f64>,
    /// SMA200 evaluated a fixed number of sessions back, the reference point
    /// for the 200-day slope rule.
    pub sma200_prior: Option<f64>,
    pub ema21: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    /// Percent below the 52-week high (0 = at the high).
    pub pct_off_high: Option<f64>,
    /// Percent above the 52-week low.
    pub pct_from_low: Option<f64>,
    /// 10-day average volume divided by 50-day average volume.
    pub volume_dry_up_ratio: Option<f64>,
    pub atr: Option<f64>,
}

/// Stable identifiers for checklist rules and sizing demotions.
///
/// These are the audit-trail keys a user inspects to understand a rejection,
/// so renaming a variant is a breaking change for anyone parsing exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    TrendStack,
    Sma200Rising,
    AboveKeyAverages,
    NearHigh,
    OffLow,
    RelativeStrength,
    VolumeDryUp,
    BaseLength,
    // Sizing-stage demotions, appended after the eight checklist entries
    VolatilityUnavailable,
    MinimumLot,
    StopBelowZero,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::TrendStack => "trend_stack",
            RuleId::Sma200Rising => "sma200_rising",
            RuleId::AboveKeyAverages => "above_key_averages",
            RuleId::NearHigh => "near_high",
            RuleId::OffLow => "off_low",
            RuleId::RelativeStrength => "relative_strength",
            RuleId::VolumeDryUp => "volume_dry_up",
            RuleId::BaseLength => "base_length",
            RuleId::VolatilityUnavailable => "volatility_unavailable",
            RuleId::MinimumLot => "minimum_lot",
            RuleId::StopBelowZero => "stop_below_zero",
        }
    }
}

/// Outcome of a single checklist rule: what was measured, what it was
/// compared against, and whether it passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCheck {
    pub id: RuleId,
    /// Measured value; `None` when the underlying metric was unavailable.
    pub value: Option<f64>,
    pub threshold: f64,
    pub passed: bool,
}

/// Everything the checklist needs to evaluate one symbol.
#[derive(Debug, Clone)]
pub struct CandidateInput {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
    /// Externally scored momentum rank versus the universe, 0-100.
    pub relative_strength: f64,
    /// Sessions the symbol has spent consolidating.
    pub base_length: usize,
    pub equity: f64,
}

/// Hypothetical position for a qualifying candidate under the
/// fixed-fractional risk rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionPlan {
    pub entry_price: f64,
    pub stop_price: f64,
    pub shares: u64,
    /// shares x per-share stop distance; never exceeds equity x risk_fraction.
    pub capital_at_risk: f64,
    pub capital_deployed: f64,
}

/// Full evaluation record for one symbol, qualified or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub symbol: String,
    pub qualifies: bool,
    /// The eight checklist entries in rule order, plus at most one appended
    /// sizing demotion. Never short-circuited.
    pub reasons: Vec<RuleCheck>,
    pub snapshot: IndicatorSnapshot,
    pub position_plan: Option<PositionPlan>,
    pub rank_score: f64,
}

impl CandidateResult {
    /// The rule checks that failed, in evaluation order.
    pub fn failures(&self) -> impl Iterator<Item = &RuleCheck> {
        self.reasons.iter().filter(|check| !check.passed)
    }
}

/// A completed trade outcome captured for adaptive tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub return_pct: f64,
    pub rs_score_at_entry: f64,
    pub pct_off_high_at_entry: f64,
}

impl TradeRecord {
    pub fn is_win(&self) -> bool {
        self.return_pct > 0.0
    }
}

/// Daily snapshot returned by the fast-mover pre-scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    /// (close - open) / open for the current session.
    pub percent_change: f64,
    pub volume: f64,
    pub close: f64,
}
