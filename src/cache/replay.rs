//! Replay Module
//!
//! Rebuilds the recorded call history of an operation as ordered
//! `input -> output` pairs.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::cache::{inputs_key, outputs_key, read_counter};
use crate::error::{CacheError, Result};
use crate::store::KeyValueStore;

// == Call Record ==
/// One recorded call: its input and the output it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRecord {
    pub input: String,
    pub output: String,
}

// == Replay Report ==
/// Ordered call history of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    /// Operation the history belongs to
    pub operation: String,
    /// Value of the operation's call counter when the history was read
    pub call_count: u64,
    /// Paired calls, oldest first
    pub calls: Vec<CallRecord>,
    /// Inputs with no matching output (left out of `calls`)
    pub unmatched_inputs: usize,
    /// Outputs with no matching input (left out of `calls`)
    pub unmatched_outputs: usize,
}

impl ReplayReport {
    /// Number of paired calls.
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// True when inputs and outputs had the same length.
    pub fn is_consistent(&self) -> bool {
        self.unmatched_inputs == 0 && self.unmatched_outputs == 0
    }

    /// One `op(input) -> output` line per paired call.
    pub fn lines(&self) -> Vec<String> {
        self.calls
            .iter()
            .map(|call| format!("{}({}) -> {}", self.operation, call.input, call.output))
            .collect()
    }

    /// The report lines preceded by a `op was called n times:` header.
    pub fn render_with_header(&self) -> String {
        let mut out = format!("{} was called {} times:", self.operation, self.call_count);
        for line in self.lines() {
            out.push('\n');
            out.push_str(&line);
        }
        out
    }
}

impl fmt::Display for ReplayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

// == Replay Reporter ==
/// Read-only view over the histories written by the instrumented store.
#[derive(Debug)]
pub struct ReplayReporter<S> {
    store: Arc<S>,
}

impl<S: KeyValueStore> ReplayReporter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    // == Replay ==
    /// Pairs the recorded inputs and outputs of `operation` positionally.
    ///
    /// The report holds `min(inputs, outputs)` calls; trailing unmatched
    /// entries are counted but not paired. An operation that was never called
    /// yields an empty report.
    pub async fn replay(&self, operation: &str) -> Result<ReplayReport> {
        let inputs = self
            .store
            .range_of_list(&inputs_key(operation), 0, -1)
            .await?;
        let outputs = self
            .store
            .range_of_list(&outputs_key(operation), 0, -1)
            .await?;
        let call_count = read_counter(self.store.as_ref(), operation).await?;

        let paired = inputs.len().min(outputs.len());
        let report = ReplayReport {
            operation: operation.to_string(),
            call_count,
            unmatched_inputs: inputs.len() - paired,
            unmatched_outputs: outputs.len() - paired,
            calls: inputs
                .iter()
                .zip(&outputs)
                .map(|(input, output)| CallRecord {
                    input: String::from_utf8_lossy(input).into_owned(),
                    output: String::from_utf8_lossy(output).into_owned(),
                })
                .collect(),
        };

        if !report.is_consistent() {
            warn!(
                operation,
                inputs = inputs.len(),
                outputs = outputs.len(),
                "Call history out of sync, unmatched entries left out of replay"
            );
        }

        Ok(report)
    }

    /// Like [`replay`](Self::replay), but fails with
    /// [`CacheError::HistoryDesync`] when inputs and outputs differ in length.
    pub async fn replay_strict(&self, operation: &str) -> Result<ReplayReport> {
        let report = self.replay(operation).await?;
        if report.is_consistent() {
            Ok(report)
        } else {
            let paired = report.len();
            Err(CacheError::HistoryDesync {
                inputs: paired + report.unmatched_inputs,
                outputs: paired + report.unmatched_outputs,
                operation: report.operation,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{InstrumentedStore, STORE_OPERATION};
    use crate::store::MemoryStore;

    async fn setup() -> (InstrumentedStore<MemoryStore>, ReplayReporter<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let cache = InstrumentedStore::initialize(store.clone()).await.unwrap();
        (cache, ReplayReporter::new(store))
    }

    #[tokio::test]
    async fn test_replay_pairs_calls_in_order() {
        let (cache, reporter) = setup().await;

        let k1 = cache.store("foo").await.unwrap();
        let k2 = cache.store("bar").await.unwrap();
        let k3 = cache.store(42).await.unwrap();

        let report = reporter.replay(STORE_OPERATION).await.unwrap();

        assert_eq!(report.call_count, 3);
        assert!(report.is_consistent());
        assert_eq!(
            report.lines(),
            vec![
                format!("InstrumentedStore.store(foo) -> {k1}"),
                format!("InstrumentedStore.store(bar) -> {k2}"),
                format!("InstrumentedStore.store(42) -> {k3}"),
            ]
        );
    }

    #[tokio::test]
    async fn test_replay_never_called_is_empty() {
        let (_cache, reporter) = setup().await;

        let report = reporter.replay("never.called").await.unwrap();

        assert!(report.is_empty());
        assert_eq!(report.call_count, 0);
        assert_eq!(report.to_string(), "");
        assert_eq!(report.render_with_header(), "never.called was called 0 times:");
    }

    #[tokio::test]
    async fn test_replay_render_with_header() {
        let (cache, reporter) = setup().await;

        let key = cache.store("x").await.unwrap();

        let report = reporter.replay(STORE_OPERATION).await.unwrap();
        assert_eq!(
            report.render_with_header(),
            format!(
                "InstrumentedStore.store was called 1 times:\nInstrumentedStore.store(x) -> {key}"
            )
        );
        assert_eq!(report.to_string(), format!("InstrumentedStore.store(x) -> {key}"));
    }

    #[tokio::test]
    async fn test_replay_truncates_desynchronized_history() {
        let store = Arc::new(MemoryStore::new());
        let reporter = ReplayReporter::new(store.clone());

        // Lists written by hand, out of step with each other
        for input in ["a", "b", "c"] {
            store
                .append_to_list(&inputs_key("op"), input.as_bytes().to_vec())
                .await
                .unwrap();
        }
        for output in ["1", "2"] {
            store
                .append_to_list(&outputs_key("op"), output.as_bytes().to_vec())
                .await
                .unwrap();
        }

        let report = reporter.replay("op").await.unwrap();
        assert_eq!(report.lines(), vec!["op(a) -> 1", "op(b) -> 2"]);
        assert_eq!(report.unmatched_inputs, 1);
        assert_eq!(report.unmatched_outputs, 0);
        assert!(!report.is_consistent());

        match reporter.replay_strict("op").await {
            Err(CacheError::HistoryDesync {
                operation,
                inputs,
                outputs,
            }) => {
                assert_eq!(operation, "op");
                assert_eq!(inputs, 3);
                assert_eq!(outputs, 2);
            }
            other => panic!("expected desync error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_replay_strict_accepts_consistent_history() {
        let (cache, reporter) = setup().await;
        cache.store("v").await.unwrap();

        let report = reporter.replay_strict(STORE_OPERATION).await.unwrap();
        assert_eq!(report.len(), 1);
    }

    #[tokio::test]
    async fn test_replay_is_read_only() {
        let (cache, reporter) = setup().await;
        cache.store("v").await.unwrap();

        reporter.replay(STORE_OPERATION).await.unwrap();
        reporter.replay(STORE_OPERATION).await.unwrap();

        assert_eq!(cache.call_count(STORE_OPERATION).await.unwrap(), 1);
        assert_eq!(reporter.replay(STORE_OPERATION).await.unwrap().len(), 1);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = ReplayReport {
            operation: "op".to_string(),
            call_count: 1,
            calls: vec![CallRecord {
                input: "in".to_string(),
                output: "out".to_string(),
            }],
            unmatched_inputs: 0,
            unmatched_outputs: 0,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["operation"], "op");
        assert_eq!(json["calls"][0]["input"], "in");
        assert_eq!(json["calls"][0]["output"], "out");
    }
}
