//! Universe-level metadata the checklist consumes as opaque inputs:
//! percentile relative strength and estimated base lengths.
//!
//! Both are derived across the whole universe rather than per symbol, which
//! is why they live beside the scanner instead of the indicator engine.

use super::SkippedSymbol;
use crate::models::{CandidateInput, PriceBar};
use std::collections::HashMap;

/// Shortest base the estimator will report, in sessions.
pub const MIN_BASE_SESSIONS: usize = 35;

/// Score each symbol's trailing return as a percentile rank (0-100) across
/// the universe.
///
/// The trailing return looks back `window` sessions (or as far as the series
/// allows). Symbols with fewer than two closes or a non-positive baseline
/// are left out of the result; callers treat a missing score as a skip.
pub fn relative_strength_scores(
    series_by_symbol: &HashMap<String, Vec<PriceBar>>,
    window: usize,
) -> HashMap<String, f64> {
    let mut trailing_returns: Vec<(String, f64)> = series_by_symbol
        .iter()
        .filter_map(|(symbol, bars)| {
            if bars.len() < 2 {
                return None;
            }
            let lookback = window.min(bars.len() - 1);
            let baseline = bars[bars.len() - 1 - lookback].close;
            if baseline <= 0.0 {
                return None;
            }
            let latest = bars[bars.len() - 1].close;
            Some((symbol.clone(), latest / baseline - 1.0))
        })
        .collect();

    trailing_returns.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    let denominator = trailing_returns.len().saturating_sub(1).max(1) as f64;
    trailing_returns
        .into_iter()
        .enumerate()
        .map(|(index, (symbol, _))| (symbol, index as f64 / denominator * 100.0))
        .collect()
}

/// Estimate how long each symbol has been consolidating: the number of
/// sessions since the pivot high inside the trailing `lookback` window,
/// floored at [`MIN_BASE_SESSIONS`].
pub fn estimate_base_lengths(
    series_by_symbol: &HashMap<String, Vec<PriceBar>>,
    lookback: usize,
) -> HashMap<String, usize> {
    series_by_symbol
        .iter()
        .filter_map(|(symbol, bars)| {
            if bars.is_empty() {
                return None;
            }
            let window = bars.len().min(lookback);
            let recent = &bars[bars.len() - window..];

            // First occurrence of the window's high is the pivot
            let pivot_index = recent
                .iter()
                .enumerate()
                .fold((0usize, f64::MIN), |(best_i, best_h), (i, bar)| {
                    if bar.high > best_h {
                        (i, bar.high)
                    } else {
                        (best_i, best_h)
                    }
                })
                .0;

            let base_length = (window - pivot_index).max(MIN_BASE_SESSIONS);
            Some((symbol.clone(), base_length))
        })
        .collect()
}

/// Pair each fetched series with its universe metadata, producing the
/// scanner's candidate inputs.
///
/// A symbol whose series fetched fine but could not be scored (too short
/// for a trailing return, non-positive baseline) is returned as a skip with
/// a reason, mirroring how every other degradation path records itself.
pub fn assemble_candidates(
    series_by_symbol: HashMap<String, Vec<PriceBar>>,
    rs_window: usize,
    base_lookback: usize,
    equity: f64,
) -> (Vec<CandidateInput>, Vec<SkippedSymbol>) {
    let strengths = relative_strength_scores(&series_by_symbol, rs_window);
    let base_lengths = estimate_base_lengths(&series_by_symbol, base_lookback);

    let mut candidates = Vec::with_capacity(series_by_symbol.len());
    let mut skipped = Vec::new();
    for (symbol, bars) in series_by_symbol {
        match (strengths.get(&symbol), base_lengths.get(&symbol)) {
            (Some(&relative_strength), Some(&base_length)) => candidates.push(CandidateInput {
                symbol,
                bars,
                relative_strength,
                base_length,
                equity,
            }),
            _ => skipped.push(SkippedSymbol {
                symbol,
                reason: "momentum metadata could not be derived".to_string(),
            }),
        }
    }
    (candidates, skipped)
}
