// Risk management: fixed-fractional position sizing off an ATR stop
use crate::models::{PositionPlan, RuleCheck, RuleId};
use crate::strategy::StrategyConfig;

/// Why a qualifying candidate could not be sized. Never fatal: the scanner
/// demotes the candidate to non-qualifying with the matching reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingRejection {
    /// ATR could not be computed from the available history.
    VolatilityUnavailable,
    /// The risk budget buys less than one share at this stop distance.
    BelowMinimumLot,
    /// The ATR stop would sit at or below zero (extreme volatility).
    StopBelowZero,
}

impl SizingRejection {
    /// The audit-trail entry appended to a demoted candidate's reasons.
    pub fn as_rule_check(&self, value: Option<f64>) -> RuleCheck {
        let id = match self {
            SizingRejection::VolatilityUnavailable => RuleId::VolatilityUnavailable,
            SizingRejection::BelowMinimumLot => RuleId::MinimumLot,
            SizingRejection::StopBelowZero => RuleId::StopBelowZero,
        };
        RuleCheck {
            id,
            value,
            threshold: match self {
                SizingRejection::BelowMinimumLot => 1.0,
                _ => 0.0,
            },
            passed: false,
        }
    }
}

/// Size a position so that at most `risk_fraction` of equity is lost if the
/// ATR stop is hit.
///
/// Shares are rounded down, so `capital_at_risk` never exceeds the risk
/// budget regardless of prices.
pub fn size(
    entry_price: f64,
    atr: Option<f64>,
    equity: f64,
    config: &StrategyConfig,
) -> Result<PositionPlan, SizingRejection> {
    let atr = match atr {
        Some(atr) if atr > 0.0 => atr,
        _ => return Err(SizingRejection::VolatilityUnavailable),
    };

    let stop_distance = atr * config.stop_multiple;
    let stop_price = entry_price - stop_distance;
    if stop_price <= 0.0 {
        return Err(SizingRejection::StopBelowZero);
    }

    let risk_capital = equity * config.risk_fraction;
    let shares = (risk_capital / stop_distance).floor();
    if shares < 1.0 {
        return Err(SizingRejection::BelowMinimumLot);
    }

    Ok(PositionPlan {
        entry_price,
        stop_price,
        shares: shares as u64,
        capital_at_risk: shares * stop_distance,
        capital_deployed: shares * entry_price,
    })
}
