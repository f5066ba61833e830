//! Average True Range (ATR)
//!
//! Volatility measure used to place stops. True Range is the greatest of:
//! - Current High - Current Low
//! - Abs(Current High - Previous Close)
//! - Abs(Current Low - Previous Close)
//!
//! Smoothed with Wilder's method.

use crate::models::PriceBar;

/// Calculate ATR over the trailing bars
///
/// Needs at least `period + 1` bars (true range requires a previous close).
/// Returns None if insufficient data.
pub fn calculate_atr(bars: &[PriceBar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period + 1 {
        return None;
    }

    let true_ranges: Vec<f64> = bars
        .windows(2)
        .map(|pair| {
            let prev_close = pair[0].close;
            let bar = &pair[1];
            (bar.high - bar.low)
                .max((bar.high - prev_close).abs())
                .max((bar.low - prev_close).abs())
        })
        .collect();

    // Seed with a simple average, then apply Wilder's smoothing
    let mut atr: f64 = true_ranges.iter().take(period).sum::<f64>() / period as f64;
    for tr in &true_ranges[period..] {
        atr = (atr * (period as f64 - 1.0) + tr) / period as f64;
    }

    Some(atr)
}
