//! Error types for the catcher crate

use thiserror::Error;

/// Main error type for the catcher crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("persisted Q-table at {location} is corrupt: {message}")]
    CorruptState { location: String, message: String },

    #[error("action index {index} is out of range (action set has {action_count} actions)")]
    InvalidActionIndex { index: usize, action_count: usize },

    #[error("invalid hyperparameter {name}={value}: {reason}")]
    InvalidHyperparameter {
        name: String,
        value: f64,
        reason: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("invalid state key '{key}' (expected '<int>,<int>' or 'none')")]
    InvalidStateKey { key: String },

    #[error("invalid table format '{input}'. Expected one of: {expected}")]
    ParseTableFormat { input: String, expected: String },

    #[error("training stalled: {episodes} episodes resolved after {ticks} ticks")]
    TrainingStalled { ticks: u64, episodes: usize },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}

impl Error {
    /// Whether this error signals an unreadable persisted table.
    pub fn is_corrupt_state(&self) -> bool {
        matches!(self, Error::CorruptState { .. })
    }
}
