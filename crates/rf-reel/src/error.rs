//! Error types for the reel widget

use thiserror::Error;

/// Reel widget errors
///
/// Only configuration can fail. Once a controller exists, every animation
/// path degrades silently instead of erroring.
#[derive(Debug, Error)]
pub enum ReelError {
    /// Symbol catalog has no entries
    #[error("Symbol catalog is empty")]
    EmptyCatalog,

    /// Catalog contains the same symbol twice
    #[error("Duplicate symbol in catalog: {0}")]
    DuplicateSymbol(String),

    /// Jackpot symbol is not part of the catalog
    #[error("Jackpot symbol not in catalog: {0}")]
    UnknownJackpotSymbol(String),

    /// Widget needs at least one reel
    #[error("Reel count must be at least 1")]
    NoReels,

    /// Strip too short to have an interior stop slot
    #[error("Too few slots per reel: {0}, need at least 3")]
    TooFewSlots(usize),

    /// One stop delay per reel is required
    #[error("Stop delay count mismatch: expected {expected}, got {actual}")]
    StopDelayCount { expected: usize, actual: usize },

    /// Stop delays must increase with reel index
    #[error("Stop delays must be strictly increasing (reel {index})")]
    StopDelaysNotIncreasing { index: usize },

    /// Timing value out of range
    #[error("Invalid timing: {0}")]
    InvalidTiming(String),

    /// Layout value out of range
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// JSON config parse error
    #[error("JSON config error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML config parse error
    #[error("YAML config error: {0}")]
    Yaml(#[from] serde_yml::Error),
}

/// Result type for reel widget operations
pub type ReelResult<T> = Result<T, ReelError>;
