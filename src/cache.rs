use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

/// Memoization layer for query results, keyed by (query name, serialized
/// parameters). Purely a latency optimization for the dashboard: results
/// only become stale through re-ingestion, which calls `invalidate_all`.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<(String, String), Value>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, query: &str, params: &str) -> Option<Value> {
        let entries = self.entries.lock().ok()?;
        entries.get(&(query.to_string(), params.to_string())).cloned()
    }

    pub fn put(&self, query: &str, params: &str, value: Value) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert((query.to_string(), params.to_string()), value);
        }
    }

    /// Invalidation trigger, called after every ingestion run.
    pub fn invalidate_all(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            let evicted = entries.len();
            entries.clear();
            tracing::debug!(evicted, "query cache invalidated");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
