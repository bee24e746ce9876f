//! In-memory waiting counts per store.
//!
//! Counts live for the lifetime of the process. A store that was never posted
//! to is unknown, which is different from a store with zero people waiting.

use dashmap::DashMap;

/// Sentinel returned by [`WaitingRegistry::waiting_count`] for unknown stores.
pub const UNKNOWN_STORE: i64 = -1;

/// Waiting count of one store, as exposed by [`WaitingRegistry::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoreWaiting {
    pub store: String,
    pub waiting: u64,
    /// Whether anyone was ever posted to this store.
    pub registered: bool,
}

/// Store name → waiting count.
///
/// Increments lock the store's shard, so concurrent posts to the same store
/// never lose updates.
#[derive(Debug, Default)]
pub struct WaitingRegistry {
    counts: DashMap<String, u64>,
}

impl WaitingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count for `store`, or [`UNKNOWN_STORE`].
    pub fn waiting_count(&self, store: &str) -> i64 {
        self.counts
            .get(store)
            .map_or(UNKNOWN_STORE, |count| i64::try_from(*count).unwrap_or(i64::MAX))
    }

    /// Register one more waiting person at `store`, creating it at 1.
    pub fn post_waiting(&self, store: &str) {
        let mut count = self.counts.entry(store.to_string()).or_insert(0);
        *count += 1;
        tracing::debug!(store = %store, waiting = *count, "Waiting count incremented");
    }

    /// Number of stores with a registered waiting list.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Counts for `configured` stores in order, followed by any other
    /// registered stores sorted by name.
    pub fn snapshot(&self, configured: &[String]) -> Vec<StoreWaiting> {
        let mut result: Vec<StoreWaiting> = configured
            .iter()
            .map(|store| {
                let count = self.counts.get(store.as_str()).map(|c| *c);
                StoreWaiting {
                    store: store.clone(),
                    waiting: count.unwrap_or(0),
                    registered: count.is_some(),
                }
            })
            .collect();

        let mut extra: Vec<StoreWaiting> = self
            .counts
            .iter()
            .filter(|entry| !configured.contains(entry.key()))
            .map(|entry| StoreWaiting {
                store: entry.key().clone(),
                waiting: *entry.value(),
                registered: true,
            })
            .collect();
        extra.sort_by(|a, b| a.store.cmp(&b.store));

        result.extend(extra);
        result
    }
}
