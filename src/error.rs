//! Error types
//!
//! Nothing here is fatal to a run: the session logs these and carries on.

use thiserror::Error;

/// A body could not be instantiated in the collision world
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnError {
    /// Model or collision asset failed to load
    #[error("asset failed to load: {0}")]
    AssetLoad(String),
    /// The world refused another body
    #[error("collision world is full ({0} bodies)")]
    WorldFull(usize),
}

/// Key-value storage failures
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// No storage backend available (private browsing, no window)
    #[error("storage unavailable")]
    Unavailable,
    /// Backend rejected the write (quota exceeded, etc.)
    #[error("write to `{key}` rejected: {reason}")]
    WriteRejected { key: String, reason: String },
    /// Stored value did not parse
    #[error("stored value under `{key}` is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// Value could not be serialized
    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Tuning data could not be used
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning json is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tuning file could not be read: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
