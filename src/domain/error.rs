//! Shared error type for the aggregation and payout core.

use thiserror::Error;

/// Result type alias used throughout the core.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors surfaced by the aggregation and payout pipeline.
///
/// Per-source failures never reach this type directly: the aggregator
/// collapses them into `NoSourcesAvailable` or folds them into a
/// successfully-resolved record. Only the categories in spec §7 are
/// represented here.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Zero healthy source clients were available for a fetch.
    #[error("no sources available for {domain} key {key}")]
    NoSourcesAvailable { domain: &'static str, key: String },

    /// All selected sources failed or returned absence.
    #[error("no successful responses from {attempted} source(s) for {domain} key {key}")]
    NoSuccessfulResponses {
        domain: &'static str,
        key: String,
        attempted: usize,
    },

    /// The resolved record's quality score fell below the acceptable floor.
    #[error("resolved record quality {score:.2} is below minimum {minimum:.2}")]
    LowQualityData { score: f64, minimum: f64 },

    /// An aggregator- or router-level deadline elapsed before completion.
    #[error("operation deadline of {0:?} exceeded")]
    DeadlineExceeded(std::time::Duration),

    /// A configuration value was missing or out of bounds.
    #[error("configuration error: {0}")]
    Config(String),

    /// A persistence-layer operation failed.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// An escrow chain adapter operation failed.
    #[error("chain adapter error: {0}")]
    ChainAdapter(String),

    /// The input record failed a structural or range invariant.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// An escrow identifier failed to parse or its checksum did not verify.
    #[error("invalid escrow identifier: {0}")]
    InvalidIdentifier(String),

    /// Wraps an `std::io::Error` encountered while reading configuration.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wraps a TOML deserialization failure.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Wraps a `sqlx` driver or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CoreError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        CoreError::Config(msg.into())
    }

    pub fn persistence<S: Into<String>>(msg: S) -> Self {
        CoreError::Persistence(msg.into())
    }

    pub fn chain_adapter<S: Into<String>>(msg: S) -> Self {
        CoreError::ChainAdapter(msg.into())
    }

    pub fn invalid_record<S: Into<String>>(msg: S) -> Self {
        CoreError::InvalidRecord(msg.into())
    }

    /// Whether retrying the same operation later has a reasonable chance of
    /// succeeding (used by the DLQ and monitor to decide on re-queueing).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::NoSourcesAvailable { .. }
                | CoreError::NoSuccessfulResponses { .. }
                | CoreError::DeadlineExceeded(_)
                | CoreError::Persistence(_)
                | CoreError::ChainAdapter(_)
        )
    }
}
