// Core modules
pub mod api;
pub mod error;
pub mod indicators;
pub mod journal;
pub mod models;
pub mod risk;
pub mod scanner;
pub mod strategy;

// Re-export commonly used types
pub use error::BotError;
pub use models::*;
pub use strategy::StrategyConfig;

// Loose error alias for the async adapter layer; the domain modules use
// precise error types from `error`.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
