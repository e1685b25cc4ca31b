//! Read-through cache of the catalog listing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use manualhub_core::{CatalogEntry, TableEntity, normalize_all};
use manualhub_store::{RemoteStore, StoreError};

/// How long a listing is served without going back to the store.
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(5 * 60);

#[derive(Debug)]
struct Slot {
    rows: Vec<TableEntity>,
    fetched_at: Instant,
}

/// Disposable copy of the last successful `list_entries()`.
///
/// Never a source for writes. The lock is held across the fetch, so
/// concurrent `get()` calls on a cold cache fetch once.
pub struct MetadataCache {
    store: Arc<dyn RemoteStore>,
    freshness: Duration,
    slot: Mutex<Option<Slot>>,
}

impl MetadataCache {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self::with_freshness(store, DEFAULT_FRESHNESS)
    }

    pub fn with_freshness(store: Arc<dyn RemoteStore>, freshness: Duration) -> Self {
        Self {
            store,
            freshness,
            slot: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<dyn RemoteStore> {
        &self.store
    }

    /// Raw rows, from the slot when fresh, otherwise from the store.
    ///
    /// A failed fetch leaves the slot as it was.
    pub async fn get(&self) -> Result<Vec<TableEntity>, StoreError> {
        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref() {
            if cached.fetched_at.elapsed() < self.freshness {
                tracing::debug!(rows = cached.rows.len(), "catalog served from cache");
                return Ok(cached.rows.clone());
            }
        }

        let rows = self.store.list_entries().await?;
        tracing::debug!(rows = rows.len(), "catalog fetched");
        *slot = Some(Slot {
            rows: rows.clone(),
            fetched_at: Instant::now(),
        });
        Ok(rows)
    }

    /// Normalized entries; unreadable rows are skipped.
    pub async fn get_entries(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        Ok(normalize_all(self.get().await?))
    }

    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }

    pub async fn is_fresh(&self) -> bool {
        self.slot
            .lock()
            .await
            .as_ref()
            .is_some_and(|s| s.fetched_at.elapsed() < self.freshness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manualhub_store::{InMemoryRemoteStore, StoreOperation};
    use serde_json::json;

    fn row(rk: &str, doc: &str) -> TableEntity {
        serde_json::from_value(json!({
            "PartitionKey": "arc",
            "RowKey": rk,
            "documentno": doc,
            "languagevariants": "[]",
        }))
        .unwrap()
    }

    fn setup(rows: Vec<TableEntity>) -> (Arc<InMemoryRemoteStore>, MetadataCache) {
        let store = Arc::new(InMemoryRemoteStore::with_rows(rows));
        let cache = MetadataCache::new(store.clone());
        (store, cache)
    }

    #[tokio::test(start_paused = true)]
    async fn second_get_within_window_does_not_fetch() {
        let (store, cache) = setup(vec![row("1", "A")]);
        cache.get().await.unwrap();
        tokio::time::advance(Duration::from_secs(60)).await;
        cache.get().await.unwrap();
        assert_eq!(store.call_count(StoreOperation::ListEntries), 1);
        assert!(cache.is_fresh().await);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_slot_is_refetched() {
        let (store, cache) = setup(vec![row("1", "A")]);
        cache.get().await.unwrap();
        tokio::time::advance(DEFAULT_FRESHNESS + Duration::from_millis(1)).await;
        assert!(!cache.is_fresh().await);
        cache.get().await.unwrap();
        assert_eq!(store.call_count(StoreOperation::ListEntries), 2);
    }

    #[tokio::test]
    async fn invalidate_then_get_always_fetches() {
        let (store, cache) = setup(vec![row("1", "A")]);
        for expected in 1..=3 {
            cache.invalidate().await;
            cache.get().await.unwrap();
            assert_eq!(store.call_count(StoreOperation::ListEntries), expected);
        }
    }

    #[tokio::test]
    async fn concurrent_cold_gets_fetch_once() {
        let (store, cache) = setup(vec![row("1", "A")]);
        let (a, b) = tokio::join!(cache.get(), cache.get());
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(store.call_count(StoreOperation::ListEntries), 1);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_slot_untouched() {
        let (store, cache) = setup(vec![row("1", "A")]);
        store.fail_always(StoreOperation::ListEntries, StoreError::remote(503, "busy"));

        assert_eq!(cache.get().await.unwrap_err(), StoreError::remote(503, "busy"));
        assert!(!cache.is_fresh().await);

        store.clear_faults();
        assert_eq!(cache.get().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn entries_are_normalized_and_bad_rows_skipped() {
        let bad: TableEntity =
            serde_json::from_value(json!({"RowKey": "2", "market": "{broken"})).unwrap();
        let (_store, cache) = setup(vec![row("1", "A"), bad]);
        let entries = cache.get_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].document_no, "A");
    }
}
