//! Persistent trade journal with adaptive threshold tuning.
//!
//! Append-only ledger of trade outcomes. Every fifth recorded trade, the
//! journal recomputes the recent win rate and nudges two checklist
//! thresholds: tighter after a hot streak, looser after a cold one. The
//! tuned thresholds are pulled by the scanner before every ranking pass.

use crate::error::BotError;
use crate::models::TradeRecord;
use crate::strategy::StrategyConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;

/// Tuning rule parameters. Kept configurable rather than buried as magic
/// numbers, but the defaults are the documented behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningPolicy {
    /// Trades per tuning cycle.
    pub sample_size: usize,
    /// Win rate at or above which entries get stricter.
    pub win_rate_tighten: f64,
    /// Win rate at or below which entries get looser.
    pub win_rate_loosen: f64,
    /// Step applied to rs_threshold per adjustment.
    pub rs_step: f64,
    /// Step applied to max_pct_off_high per adjustment (percent points).
    pub off_high_step: f64,
    pub rs_floor: f64,
    pub rs_ceiling: f64,
    pub off_high_floor: f64,
    pub off_high_ceiling: f64,
}

impl Default for TuningPolicy {
    fn default() -> Self {
        Self {
            sample_size: 5,
            win_rate_tighten: 0.6,
            win_rate_loosen: 0.4,
            rs_step: 5.0,
            off_high_step: 2.0,
            rs_floor: 60.0,
            rs_ceiling: 95.0,
            off_high_floor: 15.0,
            off_high_ceiling: 40.0,
        }
    }
}

impl TuningPolicy {
    pub fn validate(&self) -> Result<(), BotError> {
        if self.sample_size == 0 {
            return Err(BotError::InvalidConfig(
                "tuning sample_size must be at least 1".to_string(),
            ));
        }
        if self.win_rate_loosen > self.win_rate_tighten {
            return Err(BotError::InvalidConfig(format!(
                "win_rate_loosen {} exceeds win_rate_tighten {}",
                self.win_rate_loosen, self.win_rate_tighten
            )));
        }
        if self.rs_floor > self.rs_ceiling || self.off_high_floor > self.off_high_ceiling {
            return Err(BotError::InvalidConfig(
                "tuning bounds are inverted".to_string(),
            ));
        }
        if self.rs_step < 0.0 || self.off_high_step < 0.0 {
            return Err(BotError::InvalidConfig(
                "tuning steps must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// The serialized journal: full trade history plus the current tuned
/// thresholds. Round-trips exactly through JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalState {
    pub trades: Vec<TradeRecord>,
    pub rs_threshold: f64,
    pub max_pct_off_high: f64,
    pub trades_since_tune: usize,
}

impl Default for JournalState {
    fn default() -> Self {
        let defaults = StrategyConfig::default();
        Self {
            trades: Vec::new(),
            rs_threshold: defaults.rs_threshold,
            max_pct_off_high: defaults.max_pct_off_high,
            trades_since_tune: 0,
        }
    }
}

pub struct TradeJournal {
    path: PathBuf,
    policy: TuningPolicy,
    state: JournalState,
}

impl TradeJournal {
    /// Open the journal at `path`, or start fresh if none exists.
    ///
    /// A missing or empty file initializes default thresholds and an empty
    /// history. A file that exists but does not parse is fatal: silently
    /// resetting would discard the tuning history the journal exists to keep.
    pub fn load_or_create(path: impl Into<PathBuf>) -> Result<Self, BotError> {
        Self::with_policy(path, TuningPolicy::default())
    }

    pub fn with_policy(path: impl Into<PathBuf>, policy: TuningPolicy) -> Result<Self, BotError> {
        policy.validate()?;
        let path = path.into();

        let state = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => JournalState::default(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| BotError::JournalCorrupt {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => JournalState::default(),
            Err(source) => {
                return Err(BotError::JournalIo {
                    path: path.clone(),
                    source,
                })
            }
        };
        validate_state(&state, &path)?;

        tracing::debug!(
            "Journal loaded: {} trades, rs_threshold={}, max_pct_off_high={}",
            state.trades.len(),
            state.rs_threshold,
            state.max_pct_off_high
        );

        Ok(Self {
            path,
            policy,
            state,
        })
    }

    /// Append a trade outcome and persist immediately.
    pub fn append(&mut self, record: TradeRecord) -> Result<(), BotError> {
        self.state.trades.push(record);
        self.state.trades_since_tune += 1;
        self.save()
    }

    /// Fire a retune if a full tuning cycle has accumulated. Returns whether
    /// thresholds were re-evaluated (they may come out unchanged when the
    /// win rate sits in the neutral band, or already at a bound).
    pub fn maybe_retune(&mut self) -> Result<bool, BotError> {
        if self.state.trades_since_tune < self.policy.sample_size {
            return Ok(false);
        }
        self.retune();
        self.state.trades_since_tune = 0;
        self.save()?;
        Ok(true)
    }

    fn retune(&mut self) {
        let recent = &self.state.trades[self.state.trades.len() - self.policy.sample_size..];
        let wins = recent.iter().filter(|trade| trade.is_win()).count();
        let win_rate = wins as f64 / recent.len() as f64;

        let policy = &self.policy;
        if win_rate >= policy.win_rate_tighten {
            // Hot streak: demand stronger momentum, closer to highs
            self.state.rs_threshold =
                (self.state.rs_threshold + policy.rs_step).min(policy.rs_ceiling);
            self.state.max_pct_off_high =
                (self.state.max_pct_off_high - policy.off_high_step).max(policy.off_high_floor);
        } else if win_rate <= policy.win_rate_loosen {
            // Cold streak: widen the funnel
            self.state.rs_threshold =
                (self.state.rs_threshold - policy.rs_step).max(policy.rs_floor);
            self.state.max_pct_off_high =
                (self.state.max_pct_off_high + policy.off_high_step).min(policy.off_high_ceiling);
        }

        tracing::info!(
            "Journal retune: win_rate={:.2} -> rs_threshold={}, max_pct_off_high={}",
            win_rate,
            self.state.rs_threshold,
            self.state.max_pct_off_high
        );
    }

    /// The currently tuned (rs_threshold, max_pct_off_high) pair.
    pub fn current_thresholds(&self) -> (f64, f64) {
        (self.state.rs_threshold, self.state.max_pct_off_high)
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.state.trades
    }

    pub fn state(&self) -> &JournalState {
        &self.state
    }

    /// Persist atomically: serialize to a sibling temp file, then rename
    /// over the target. A crash mid-save leaves the previous state intact.
    pub fn save(&self) -> Result<(), BotError> {
        let io_err = |source: io::Error| BotError::JournalIo {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let payload =
            serde_json::to_string_pretty(&self.state).map_err(|e| io_err(io::Error::from(e)))?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, payload).map_err(io_err)?;
        fs::rename(&tmp_path, &self.path).map_err(io_err)?;
        Ok(())
    }
}

/// Reject parseable-but-inconsistent state at the load boundary. Every
/// append bumps the counter alongside the trade list, so a counter that
/// outruns the recorded trades can only come from a tampered or truncated
/// file; retuning against it would slice past the history.
fn validate_state(state: &JournalState, path: &PathBuf) -> Result<(), BotError> {
    let invalid = |reason: String| BotError::JournalInvalid {
        path: path.clone(),
        reason,
    };

    if state.trades_since_tune > state.trades.len() {
        return Err(invalid(format!(
            "trades_since_tune {} exceeds the {} recorded trades",
            state.trades_since_tune,
            state.trades.len()
        )));
    }
    if !state.rs_threshold.is_finite() || !state.max_pct_off_high.is_finite() {
        return Err(invalid(format!(
            "non-finite thresholds: rs_threshold={}, max_pct_off_high={}",
            state.rs_threshold, state.max_pct_off_high
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn record(return_pct: f64) -> TradeRecord {
        TradeRecord {
            symbol: "TEST".to_string(),
            entry_date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            exit_date: NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
            return_pct,
            rs_score_at_entry: 80.0,
            pct_off_high_at_entry: 12.0,
        }
    }

    fn record_and_tune(journal: &mut TradeJournal, return_pct: f64) -> bool {
        journal.append(record(return_pct)).unwrap();
        journal.maybe_retune().unwrap()
    }

    #[test]
    fn test_missing_file_starts_with_defaults() {
        let dir = tempdir().unwrap();
        let journal = TradeJournal::load_or_create(dir.path().join("journal.json")).unwrap();
        assert_eq!(journal.current_thresholds(), (70.0, 25.0));
        assert!(journal.trades().is_empty());
    }

    #[test]
    fn test_state_round_trips_exactly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("journal.json");

        let mut journal = TradeJournal::load_or_create(&path).unwrap();
        journal.append(record(0.08)).unwrap();
        journal.append(record(-0.03)).unwrap();
        let saved = journal.state().clone();

        let reloaded = TradeJournal::load_or_create(&path).unwrap();
        assert_eq!(reloaded.state(), &saved);
    }

    #[test]
    fn test_corrupt_file_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("journal.json");
        fs::write(&path, "{ not json").unwrap();

        let result = TradeJournal::load_or_create(&path);
        assert!(matches!(result, Err(BotError::JournalCorrupt { .. })));
    }

    #[test]
    fn test_counter_ahead_of_history_is_fatal_not_a_panic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("journal.json");
        // Parseable, but the tuning counter claims trades that were never
        // recorded; retuning against this would slice past the history
        fs::write(
            &path,
            r#"{"trades":[],"rs_threshold":70.0,"max_pct_off_high":25.0,"trades_since_tune":5}"#,
        )
        .unwrap();

        let result = TradeJournal::load_or_create(&path);
        assert!(matches!(result, Err(BotError::JournalInvalid { .. })));
    }

    #[test]
    fn test_counter_within_history_loads_and_retunes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("journal.json");

        // Build a real journal mid-cycle, then reload it and finish the cycle
        {
            let mut journal = TradeJournal::load_or_create(&path).unwrap();
            for _ in 0..4 {
                record_and_tune(&mut journal, 0.1);
            }
        }

        let mut journal = TradeJournal::load_or_create(&path).unwrap();
        assert_eq!(journal.state().trades_since_tune, 4);
        assert!(record_and_tune(&mut journal, 0.1));
        assert_eq!(journal.current_thresholds(), (75.0, 23.0));
    }

    #[test]
    fn test_non_finite_thresholds_are_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("journal.json");
        // serde_json reads the oversized literal as infinity
        fs::write(
            &path,
            r#"{"trades":[],"rs_threshold":1e999,"max_pct_off_high":25.0,"trades_since_tune":0}"#,
        )
        .unwrap();

        let result = TradeJournal::load_or_create(&path);
        assert!(matches!(result, Err(BotError::JournalInvalid { .. })));
    }

    #[test]
    fn test_empty_file_treated_as_fresh() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("journal.json");
        fs::write(&path, "  \n").unwrap();

        let journal = TradeJournal::load_or_create(&path).unwrap();
        assert_eq!(journal.current_thresholds(), (70.0, 25.0));
    }

    #[test]
    fn test_hot_streak_tightens_thresholds() {
        let dir = tempdir().unwrap();
        let mut journal = TradeJournal::load_or_create(dir.path().join("j.json")).unwrap();

        // 4 wins, 1 loss over the cycle: win rate 0.8
        for &ret in &[0.1, 0.05, -0.02, 0.07, 0.04] {
            record_and_tune(&mut journal, ret);
        }
        let (rs, off_high) = journal.current_thresholds();
        assert_eq!(rs, 75.0);
        assert_eq!(off_high, 23.0);
    }

    #[test]
    fn test_cold_streak_loosens_thresholds() {
        let dir = tempdir().unwrap();
        let mut journal = TradeJournal::load_or_create(dir.path().join("j.json")).unwrap();

        for _ in 0..5 {
            record_and_tune(&mut journal, -0.05);
        }
        let (rs, off_high) = journal.current_thresholds();
        assert_eq!(rs, 65.0);
        assert_eq!(off_high, 27.0);
    }

    #[test]
    fn test_neutral_win_rate_leaves_thresholds_alone() {
        // With 5-trade cycles a 0.5 win rate is unreachable, so use a
        // 4-trade policy to land inside the neutral band
        let dir = tempdir().unwrap();
        let policy = TuningPolicy {
            sample_size: 4,
            ..Default::default()
        };
        let mut journal = TradeJournal::with_policy(dir.path().join("j.json"), policy).unwrap();

        let mut fired = false;
        for &ret in &[0.1, -0.1, 0.1, -0.1] {
            fired = record_and_tune(&mut journal, ret);
        }
        assert!(fired);
        assert_eq!(journal.current_thresholds(), (70.0, 25.0));
    }

    #[test]
    fn test_exact_boundary_win_rates_adjust() {
        // 3 of 5 wins is exactly the 0.6 tighten boundary
        let dir = tempdir().unwrap();
        let mut journal = TradeJournal::load_or_create(dir.path().join("j.json")).unwrap();
        for &ret in &[0.1, -0.1, 0.1, -0.1, 0.1] {
            record_and_tune(&mut journal, ret);
        }
        assert_eq!(journal.current_thresholds(), (75.0, 23.0));

        // 2 of 5 wins is exactly the 0.4 loosen boundary, undoing the step
        for &ret in &[0.1, -0.1, -0.1, 0.1, -0.1] {
            record_and_tune(&mut journal, ret);
        }
        assert_eq!(journal.current_thresholds(), (70.0, 25.0));
    }

    #[test]
    fn test_retune_fires_exactly_every_cycle() {
        let dir = tempdir().unwrap();
        let mut journal = TradeJournal::load_or_create(dir.path().join("j.json")).unwrap();

        let mut fired_at = Vec::new();
        for i in 1..=12 {
            if record_and_tune(&mut journal, 0.1) {
                fired_at.push(i);
            }
        }
        assert_eq!(fired_at, vec![5, 10]);
    }

    #[test]
    fn test_thresholds_clamp_at_bounds() {
        let dir = tempdir().unwrap();
        let mut journal = TradeJournal::load_or_create(dir.path().join("j.json")).unwrap();

        // 10 full winning cycles would push rs to 120 unclamped
        for _ in 0..50 {
            record_and_tune(&mut journal, 0.1);
        }
        assert_eq!(journal.current_thresholds(), (95.0, 15.0));

        // And 20 losing cycles walk back down to the floor
        for _ in 0..100 {
            record_and_tune(&mut journal, -0.1);
        }
        assert_eq!(journal.current_thresholds(), (60.0, 40.0));
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("journal.json");
        let mut journal = TradeJournal::load_or_create(&path).unwrap();
        journal.append(record(0.02)).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let dir = tempdir().unwrap();
        let policy = TuningPolicy {
            rs_floor: 90.0,
            rs_ceiling: 60.0,
            ..Default::default()
        };
        let result = TradeJournal::with_policy(dir.path().join("j.json"), policy);
        assert!(matches!(result, Err(BotError::InvalidConfig(_))));
    }
}
