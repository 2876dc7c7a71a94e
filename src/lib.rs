//! Cache Ledger - an instrumented caching layer over a key-value store
//!
//! Stores scalar payloads under generated keys while counting and recording
//! every call for replay, and caches origin content under a TTL with a
//! per-url access counter.

pub mod cache;
pub mod config;
pub mod error;
pub mod origin;
pub mod store;
pub mod tasks;

pub use cache::{ContentCache, InstrumentedStore, ReplayReport, ReplayReporter, Value};
pub use config::Config;
pub use error::{CacheError, Result};
pub use origin::{FnOrigin, HttpOrigin, OriginFetch};
pub use store::{KeyValueStore, MemoryStore};
pub use tasks::spawn_cleanup_task;
