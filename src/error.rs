use std::path::PathBuf;
use thiserror::Error;

/// Fatal error taxonomy for the bot core.
///
/// Per-symbol evaluation problems never surface here: insufficient history
/// shows up as unavailable metrics, and an infeasible position size demotes
/// the candidate with a recorded reason. Only configuration and journal
/// integrity failures abort a run.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The persisted journal exists but does not parse. Deliberately fatal:
    /// replaying tuned thresholds is the whole point of the journal, so we
    /// never silently fall back to defaults.
    #[error("journal at {} is corrupt", path.display())]
    JournalCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The persisted journal parses but violates its own invariants
    /// (e.g. a tuning counter with no trades behind it). Fatal at load for
    /// the same reason as [`BotError::JournalCorrupt`].
    #[error("journal at {} is inconsistent: {reason}", path.display())]
    JournalInvalid { path: PathBuf, reason: String },

    #[error("journal I/O failure at {}", path.display())]
    JournalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
