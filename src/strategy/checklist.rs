use super::StrategyConfig;
use crate::models::{CandidateInput, CandidateResult, IndicatorSnapshot, RuleCheck, RuleId};

/// Run the eight-rule momentum checklist against one candidate.
///
/// Evaluation never short-circuits: every rule records a `RuleCheck` even
/// after an earlier failure, so a rejection always carries the full audit
/// trail. Rules whose metric is unavailable fail closed with `value: None`.
///
/// The returned result has no position plan; the scanner sizes qualifying
/// candidates afterwards and may still demote them.
pub fn evaluate(
    input: &CandidateInput,
    snapshot: IndicatorSnapshot,
    config: &StrategyConfig,
) -> CandidateResult {
    let close = snapshot.close;

    // 1. Trend stack: sma50 > sma150 > sma200. Recorded value is the
    //    tighter of the two gaps, so a reader sees how close the stack is.
    let stack_margin = match (snapshot.sma50, snapshot.sma150, snapshot.sma200) {
        (Some(fast), Some(mid), Some(slow)) => Some((fast - mid).min(mid - slow)),
        _ => None,
    };
    let trend_stack = gt_zero(RuleId::TrendStack, stack_margin);

    // 2. 200-day average rising versus its reading 20 sessions back
    let slope = match (snapshot.sma200, snapshot.sma200_prior) {
        (Some(now), Some(prior)) => Some(now - prior),
        _ => None,
    };
    let sma200_rising = gt_zero(RuleId::Sma200Rising, slope);

    // 3. Close at or above both key averages
    let above_margin = match (snapshot.sma50, snapshot.sma150) {
        (Some(fast), Some(mid)) => Some((close - fast).min(close - mid)),
        _ => None,
    };
    let above_key = RuleCheck {
        id: RuleId::AboveKeyAverages,
        value: above_margin,
        threshold: 0.0,
        passed: above_margin.is_some_and(|m| m >= 0.0),
    };

    // 4. Not too far below the 52-week high
    let near_high = RuleCheck {
        id: RuleId::NearHigh,
        value: snapshot.pct_off_high,
        threshold: config.max_pct_off_high,
        passed: snapshot
            .pct_off_high
            .is_some_and(|pct| pct <= config.max_pct_off_high),
    };

    // 5. Meaningfully lifted off the 52-week low
    let off_low = RuleCheck {
        id: RuleId::OffLow,
        value: snapshot.pct_from_low,
        threshold: config.min_pct_from_low,
        passed: snapshot
            .pct_from_low
            .is_some_and(|pct| pct >= config.min_pct_from_low),
    };

    // 6. Relative strength versus the universe
    let relative_strength = RuleCheck {
        id: RuleId::RelativeStrength,
        value: Some(input.relative_strength),
        threshold: config.rs_threshold,
        passed: input.relative_strength >= config.rs_threshold,
    };

    // 7. Volume drying up inside the base
    let volume_dry_up = RuleCheck {
        id: RuleId::VolumeDryUp,
        value: snapshot.volume_dry_up_ratio,
        threshold: config.volume_dry_up_max,
        passed: snapshot
            .volume_dry_up_ratio
            .is_some_and(|ratio| ratio <= config.volume_dry_up_max),
    };

    // 8. Long enough consolidation
    let base_length = RuleCheck {
        id: RuleId::BaseLength,
        value: Some(input.base_length as f64),
        threshold: config.min_base_length as f64,
        passed: input.base_length >= config.min_base_length,
    };

    let reasons = vec![
        trend_stack,
        sma200_rising,
        above_key,
        near_high,
        off_low,
        relative_strength,
        volume_dry_up,
        base_length,
    ];
    let qualifies = reasons.iter().all(|check| check.passed);
    let rank_score = rank_score(input.relative_strength, &snapshot);

    CandidateResult {
        symbol: input.symbol.clone(),
        qualifies,
        reasons,
        snapshot,
        position_plan: None,
        rank_score,
    }
}

fn gt_zero(id: RuleId, value: Option<f64>) -> RuleCheck {
    RuleCheck {
        id,
        value,
        threshold: 0.0,
        passed: value.is_some_and(|v| v > 0.0),
    }
}

/// Composite ranking score in [0, 1]: monotone up in relative strength,
/// down in distance from the high, up in lift off the low.
fn rank_score(relative_strength: f64, snapshot: &IndicatorSnapshot) -> f64 {
    let (Some(pct_off_high), Some(pct_from_low)) = (snapshot.pct_off_high, snapshot.pct_from_low)
    else {
        return 0.0;
    };

    let rs_term = (relative_strength / 100.0).clamp(0.0, 1.0);
    let high_term = (1.0 - pct_off_high / 100.0).clamp(0.0, 1.0);
    let low_term = (pct_from_low / 100.0).clamp(0.0, 1.0);

    0.5 * rs_term + 0.3 * high_term + 0.2 * low_term
}
