//! Memory Store Module
//!
//! In-process `KeyValueStore` backed by a HashMap with lazy TTL expiry.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::store::{Entry, EntryValue, KeyValueStore};

const WRONG_TYPE: &str = "WRONGTYPE operation against a key holding the wrong kind of value";

// == Memory Store ==
/// Thread-safe in-memory key-value store.
///
/// Every primitive runs under a single write lock, which makes increments
/// and list appends atomic for concurrent callers. Expired entries are
/// dropped lazily on access and in bulk by [`MemoryStore::cleanup_expired`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        before - entries.len()
    }

    // == Length ==
    /// Returns the number of entries held, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Returns the live entry for `key`, dropping it first if it has expired.
fn live_entry<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
    if entries.get(key).is_some_and(Entry::is_expired) {
        entries.remove(key);
        debug!(key, "Dropped expired entry");
    }
    entries.get_mut(key)
}

/// Resolves inclusive, possibly negative list bounds into a slice range.
fn list_bounds(len: usize, start: isize, end: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let end = if end < 0 { len + end } else { end.min(len - 1) };

    if len == 0 || start > end || start >= len {
        None
    } else {
        Some((start as usize, end as usize + 1))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), Entry::new(EntryValue::Bytes(value), None));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut entries = self.entries.write().await;
        match live_entry(&mut entries, key) {
            Some(Entry {
                value: EntryValue::Bytes(bytes),
                ..
            }) => Ok(Some(bytes.clone())),
            Some(_) => Err(CacheError::Store(WRONG_TYPE.to_string())),
            None => Ok(None),
        }
    }

    async fn increment(&self, key: &str) -> Result<i64> {
        let mut entries = self.entries.write().await;
        match live_entry(&mut entries, key) {
            Some(entry) => {
                let EntryValue::Bytes(bytes) = &mut entry.value else {
                    return Err(CacheError::Store(WRONG_TYPE.to_string()));
                };
                let current: i64 = std::str::from_utf8(bytes)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| {
                        CacheError::Store("value is not an integer or out of range".to_string())
                    })?;
                let next = current.checked_add(1).ok_or_else(|| {
                    CacheError::Store("increment would overflow".to_string())
                })?;
                *bytes = next.to_string().into_bytes();
                Ok(next)
            }
            None => {
                entries.insert(
                    key.to_string(),
                    Entry::new(EntryValue::Bytes(b"1".to_vec()), None),
                );
                Ok(1)
            }
        }
    }

    async fn append_to_list(&self, key: &str, value: Vec<u8>) -> Result<usize> {
        let mut entries = self.entries.write().await;
        match live_entry(&mut entries, key) {
            Some(Entry {
                value: EntryValue::List(items),
                ..
            }) => {
                items.push(value);
                Ok(items.len())
            }
            Some(_) => Err(CacheError::Store(WRONG_TYPE.to_string())),
            None => {
                entries.insert(key.to_string(), Entry::new(EntryValue::List(vec![value]), None));
                Ok(1)
            }
        }
    }

    async fn append_to_lists(&self, items: Vec<(String, Vec<u8>)>) -> Result<()> {
        let mut entries = self.entries.write().await;

        // Check every key first so a wrong type leaves all lists untouched
        for (key, _) in &items {
            if let Some(Entry {
                value: EntryValue::Bytes(_),
                ..
            }) = live_entry(&mut entries, key)
            {
                return Err(CacheError::Store(WRONG_TYPE.to_string()));
            }
        }

        for (key, value) in items {
            match entries.get_mut(&key) {
                Some(Entry {
                    value: EntryValue::List(list),
                    ..
                }) => list.push(value),
                _ => {
                    entries.insert(key, Entry::new(EntryValue::List(vec![value]), None));
                }
            }
        }
        Ok(())
    }

    async fn range_of_list(&self, key: &str, start: isize, end: isize) -> Result<Vec<Vec<u8>>> {
        let mut entries = self.entries.write().await;
        match live_entry(&mut entries, key) {
            Some(Entry {
                value: EntryValue::List(items),
                ..
            }) => Ok(list_bounds(items.len(), start, end)
                .map(|(from, to)| items[from..to].to_vec())
                .unwrap_or_default()),
            Some(_) => Err(CacheError::Store(WRONG_TYPE.to_string())),
            None => Ok(Vec::new()),
        }
    }

    async fn set_with_expiry(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            return Err(CacheError::Store("invalid expire time".to_string()));
        }
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry::new(EntryValue::Bytes(value), Some(ttl)),
        );
        Ok(())
    }

    async fn flush_all(&self) -> Result<()> {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        debug!(removed, "Flushed memory store");
        Ok(())
    }
}
