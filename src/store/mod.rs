//! Store Module
//!
//! The key-value store boundary consumed by the cache layer, plus an
//! in-process implementation with TTL expiry.

mod entry;
mod memory;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use entry::{Entry, EntryValue};
pub use memory::MemoryStore;

// == Key Value Store ==
/// Narrow key-value interface the cache layer is built on.
///
/// `increment`, `append_to_list` and `append_to_lists` must be atomic:
/// concurrent callers sharing one store never lose an increment or an
/// append, and appends to a single key keep their order.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Writes `value` under `key`, clearing any expiry.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Reads the scalar value of `key`. Absent or expired keys yield `None`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Increments the integer counter at `key` (absent == 0), returning the new value.
    async fn increment(&self, key: &str) -> Result<i64>;

    /// Appends `value` to the list at `key`, returning the new list length.
    async fn append_to_list(&self, key: &str, value: Vec<u8>) -> Result<usize>;

    /// Appends each value to its list as one atomic step.
    ///
    /// Either every append happens or none does, and no other append lands
    /// between them, so parallel lists stay index-aligned.
    async fn append_to_lists(&self, items: Vec<(String, Vec<u8>)>) -> Result<()>;

    /// Returns the list elements between `start` and `end`, both inclusive.
    ///
    /// Negative indices count from the end (`-1` is the last element).
    /// Absent keys yield an empty list.
    async fn range_of_list(&self, key: &str, start: isize, end: isize) -> Result<Vec<Vec<u8>>>;

    /// Writes `value` under `key`; the key behaves as absent once `ttl` elapses.
    async fn set_with_expiry(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Removes every key.
    async fn flush_all(&self) -> Result<()>;
}
