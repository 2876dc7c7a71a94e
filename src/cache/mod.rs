//! Cache Module
//!
//! Instrumented storage with call history, history replay, and a TTL content
//! cache, all layered over a shared [`KeyValueStore`].

mod content;
mod instrumented;
mod replay;
mod stats;
pub mod value;


// Re-export public types
pub use content::{ContentCache, CONTENT_PREFIX, COUNT_PREFIX};
pub use instrumented::{InstrumentedStore, STORE_OPERATION};
pub use replay::{CallRecord, ReplayReport, ReplayReporter};
pub use stats::FetchStats;
pub use value::Value;

use crate::error::{CacheError, Result};
use crate::store::KeyValueStore;

// == Key Naming ==
/// Key of the list holding the recorded inputs of `operation`.
pub fn inputs_key(operation: &str) -> String {
    format!("{operation}:inputs")
}

/// Key of the list holding the recorded outputs of `operation`.
pub fn outputs_key(operation: &str) -> String {
    format!("{operation}:outputs")
}

/// Reads a counter written with `increment`. Absent counters read as zero.
pub(crate) async fn read_counter<S>(store: &S, key: &str) -> Result<u64>
where
    S: KeyValueStore + ?Sized,
{
    match store.get(key).await? {
        Some(raw) => std::str::from_utf8(&raw)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| CacheError::decode(key, &raw, "counter is not a non-negative integer")),
        None => Ok(0),
    }
}
