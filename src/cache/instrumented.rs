//! Instrumented Store Module
//!
//! Stores values under generated keys while counting calls and recording
//! every call's input and output.
//!
//! # Key layout
//! For an operation named `op`:
//! - `op` - call counter
//! - `op:inputs` - list of inputs, one per completed call
//! - `op:outputs` - list of outputs, index-aligned with `op:inputs`
//!
//! [`ReplayReporter`](crate::cache::ReplayReporter) reads the same keys.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::value::{self, DecodeResult, Value};
use crate::cache::{inputs_key, outputs_key, read_counter};
use crate::error::{CacheError, Result};
use crate::store::KeyValueStore;

/// Operation name under which `store` calls are counted and recorded.
pub const STORE_OPERATION: &str = "InstrumentedStore.store";

// == Instrumented Store ==
/// Key-value facade that counts and records calls to `store`.
#[derive(Debug)]
pub struct InstrumentedStore<S> {
    store: Arc<S>,
}

impl<S: KeyValueStore> InstrumentedStore<S> {
    // == Initialize ==
    /// Takes the shared store handle and wipes it.
    ///
    /// Destructive: every key in the store is lost, including data owned by
    /// other components sharing the handle.
    pub async fn initialize(store: Arc<S>) -> Result<Self> {
        store.flush_all().await?;
        info!("Instrumented store initialized, existing entries flushed");
        Ok(Self { store })
    }

    // == Store ==
    /// Writes `value` under a fresh random key and returns the key.
    ///
    /// Counts the call under [`STORE_OPERATION`] and records the encoded value
    /// as input and the key as output.
    pub async fn store(&self, value: impl Into<Value>) -> Result<String> {
        let raw = value.into().to_bytes();
        let store = &self.store;

        self.instrumented(STORE_OPERATION, raw.clone(), move || async move {
            let key = Uuid::new_v4().to_string();
            store.set(&key, raw).await?;
            debug!(key = %key, "Stored value");
            Ok(key)
        })
        .await
    }

    // == Get ==
    /// Reads the raw value of `key`. Absent keys yield `None`.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.get_with(key, value::identity).await
    }

    /// Reads `key` and applies `decode` to the raw bytes.
    ///
    /// A rejected decode fails with [`CacheError::Decode`]; the stored value is
    /// left as it was.
    pub async fn get_with<T, F>(&self, key: &str, decode: F) -> Result<Option<T>>
    where
        F: FnOnce(&[u8]) -> DecodeResult<T>,
    {
        let Some(raw) = self.store.get(key).await? else {
            debug!(key, "Key not found");
            return Ok(None);
        };

        decode(&raw)
            .map(Some)
            .map_err(|reason| CacheError::decode(key, &raw, reason))
    }

    /// Reads `key` as UTF-8 text.
    pub async fn get_str(&self, key: &str) -> Result<Option<String>> {
        self.get_with(key, value::to_text).await
    }

    /// Reads `key` as a base-10 integer.
    pub async fn get_int(&self, key: &str) -> Result<Option<i64>> {
        self.get_with(key, value::to_integer).await
    }

    // == Call Count ==
    /// Returns how many times `operation` has been called.
    pub async fn call_count(&self, operation: &str) -> Result<u64> {
        read_counter(self.store.as_ref(), operation).await
    }

    // == Instrumentation ==
    /// Counts the call, runs `body`, then records input and output together.
    ///
    /// The pair goes in with one atomic append, so the n-th input and the n-th
    /// output always belong to the same call even with concurrent callers. If
    /// `body` fails the call is counted but nothing is recorded.
    async fn instrumented<F, Fut>(&self, operation: &str, input: Vec<u8>, body: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        self.store.increment(operation).await?;

        let output = body().await?;

        self.store
            .append_to_lists(vec![
                (inputs_key(operation), input),
                (outputs_key(operation), output.clone().into_bytes()),
            ])
            .await?;
        Ok(output)
    }
}
