// Indicator engine: pure derivations from a trailing price series
pub mod atr;
pub mod moving_average;

pub use atr::calculate_atr;
pub use moving_average::{calculate_ema, calculate_sma};

use crate::models::{IndicatorSnapshot, PriceBar};

pub const SMA_FAST: usize = 50;
pub const SMA_MID: usize = 150;
pub const SMA_SLOW: usize = 200;
pub const EMA_PERIOD: usize = 21;
pub const YEAR_SESSIONS: usize = 252;
pub const VOLUME_SHORT: usize = 10;
pub const VOLUME_LONG: usize = 50;
pub const ATR_PERIOD: usize = 14;
/// Sessions back at which SMA200 is re-evaluated for the slope rule.
pub const TREND_LOOKBACK: usize = 20;

/// Derive the full indicator snapshot for a price series.
///
/// Pure function of the input bars and the window constants above: no I/O,
/// no hidden state, identical output for identical input. Metrics whose
/// window exceeds the available history come back as `None`; callers treat
/// that as an automatic failure for any rule that depends on them.
///
/// The caller is responsible for passing a non-empty, chronologically
/// ordered series.
pub fn compute_snapshot(bars: &[PriceBar]) -> IndicatorSnapshot {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    let close = *closes.last().unwrap_or(&f64::NAN);

    // 52-week range over the trailing year, or all bars if fewer
    let year = &bars[bars.len().saturating_sub(YEAR_SESSIONS)..];
    let fifty_two_week_high = year.iter().map(|b| b.high).reduce(f64::max);
    let fifty_two_week_low = year.iter().map(|b| b.low).reduce(f64::min);

    let pct_off_high = fifty_two_week_high
        .filter(|high| *high > 0.0)
        .map(|high| (high - close) / high * 100.0);
    let pct_from_low = fifty_two_week_low
        .filter(|low| *low > 0.0)
        .map(|low| (close - low) / low * 100.0);

    let volume_dry_up_ratio = match (
        calculate_sma(&volumes, VOLUME_SHORT),
        calculate_sma(&volumes, VOLUME_LONG),
    ) {
        (Some(short), Some(long)) if long > 0.0 => Some(short / long),
        _ => None,
    };

    let sma200_prior = closes
        .len()
        .checked_sub(TREND_LOOKBACK)
        .and_then(|cut| calculate_sma(&closes[..cut], SMA_SLOW));

    IndicatorSnapshot {
        close,
        sma50: calculate_sma(&closes, SMA_FAST),
        sma150: calculate_sma(&closes, SMA_MID),
        sma200: calculate_sma(&closes, SMA_SLOW),
        sma200_prior,
        ema21: calculate_ema(&closes, EMA_PERIOD),
        fifty_two_week_high,
        fifty_two_week_low,
        pct_off_high,
        pct_from_low,
        volume_dry_up_ratio,
        atr: calculate_atr(bars, ATR_PERIOD),
    }
}
