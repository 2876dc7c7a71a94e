//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache layer.
///
/// A missing key is not an error: lookups return `Option` and absence is
/// reported as `None`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The underlying key-value store cannot be reached
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store rejected a command (wrong type, non-integer counter, ...)
    #[error("Store error: {0}")]
    Store(String),

    /// Raw bytes could not be coerced to the requested type
    #[error("Cannot decode value of key {key} ({raw:?}): {reason}")]
    Decode {
        key: String,
        raw: String,
        reason: String,
    },

    /// The origin fetch failed; nothing was cached
    #[error("Fetch of {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    /// Recorded inputs and outputs of an operation differ in length
    #[error("History of {operation} is out of sync: {inputs} inputs, {outputs} outputs")]
    HistoryDesync {
        operation: String,
        inputs: usize,
        outputs: usize,
    },
}

impl CacheError {
    /// Builds a `Decode` error, rendering the raw bytes lossily as text.
    pub fn decode(key: &str, raw: &[u8], reason: impl Into<String>) -> Self {
        CacheError::Decode {
            key: key.to_string(),
            raw: String::from_utf8_lossy(raw).into_owned(),
            reason: reason.into(),
        }
    }

    /// Builds a `Fetch` error for the given url.
    pub fn fetch(url: &str, reason: impl ToString) -> Self {
        CacheError::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
