//! Read-through in-process cache of the member table.
//!
//! The cache is either uninitialized or holds a complete snapshot of the last
//! successful listing. A refresh swaps the whole snapshot; a failed refresh
//! leaves the previous one in place.

use crate::error::StoreReadError;
use crate::store::{sort_by_display_name, RecordStore};
use bio_roster_types::MemberRecord;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

struct Snapshot {
    /// Sorted by display name.
    records: Arc<Vec<MemberRecord>>,
    /// member id → position in `records`
    index: HashMap<String, usize>,
    refreshed_at: DateTime<Utc>,
}

impl Snapshot {
    fn build(mut records: Vec<MemberRecord>) -> Self {
        sort_by_display_name(&mut records);

        let mut index = HashMap::with_capacity(records.len());
        let mut unique = Vec::with_capacity(records.len());
        for record in records {
            if index.contains_key(&record.member_id) {
                log::warn!(
                    "[CACHE] Ignoring duplicate row {:?} for member {}",
                    record.storage_ref,
                    record.member_id
                );
                continue;
            }
            index.insert(record.member_id.clone(), unique.len());
            unique.push(record);
        }

        Self {
            records: Arc::new(unique),
            index,
            refreshed_at: Utc::now(),
        }
    }
}

pub struct MemberCache {
    store: Arc<dyn RecordStore>,
    state: RwLock<Option<Snapshot>>,
}

impl MemberCache {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            state: RwLock::new(None),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state.read().is_some()
    }

    pub fn get(&self, member_id: &str) -> Option<MemberRecord> {
        let state = self.state.read();
        let snapshot = state.as_ref()?;
        snapshot
            .index
            .get(member_id)
            .map(|&i| snapshot.records[i].clone())
    }

    /// Cached members ordered by display name; empty when uninitialized.
    pub fn all(&self) -> Vec<MemberRecord> {
        self.snapshot_records()
            .map(|records| records.as_ref().clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.state
            .read()
            .as_ref()
            .map(|s| s.records.len())
            .unwrap_or(0)
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().as_ref().map(|s| s.refreshed_at)
    }

    fn snapshot_records(&self) -> Option<Arc<Vec<MemberRecord>>> {
        self.state.read().as_ref().map(|s| s.records.clone())
    }

    /// Return the cached members, fetching from the store first when the
    /// cache is uninitialized or `force_invalidate` is set.
    pub async fn refresh(&self, force_invalidate: bool) -> Result<Vec<MemberRecord>, StoreReadError> {
        if !force_invalidate {
            if let Some(records) = self.snapshot_records() {
                log::debug!("[CACHE] Returning {} cached members", records.len());
                return Ok(records.as_ref().clone());
            }
        }

        log::info!("[CACHE] Fetching members from the store");
        let records = match self.store.list_all().await {
            Ok(records) => records,
            Err(e) => {
                log::error!(
                    "[CACHE] Refresh failed, keeping {} cached members: {}",
                    self.len(),
                    e
                );
                return Err(e);
            }
        };

        let snapshot = Snapshot::build(records);
        let records = snapshot.records.as_ref().clone();
        *self.state.write() = Some(snapshot);

        log::info!("[CACHE] Cached {} members", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mock::MockStore;

    fn seeded() -> Arc<MockStore> {
        Arc::new(
            MockStore::new()
                .with_row("u2", "bob", "builder")
                .with_row("u1", "alice", "hi"),
        )
    }

    #[tokio::test]
    async fn test_uninitialized_cache() {
        let cache = MemberCache::new(seeded());
        assert!(!cache.is_initialized());
        assert!(cache.get("u1").is_none());
        assert!(cache.all().is_empty());
        assert_eq!(cache.len(), 0);
        assert!(cache.refreshed_at().is_none());
    }

    #[tokio::test]
    async fn test_refresh_populates_sorted_snapshot() {
        let store = seeded();
        let cache = MemberCache::new(store.clone());

        let records = cache.refresh(false).await.unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
        assert!(cache.is_initialized());
        assert_eq!(cache.get("u2").unwrap().biography, "builder");
        assert_eq!(cache.all(), records);
        assert!(cache.refreshed_at().is_some());
        assert_eq!(store.lists(), 1);
    }

    #[tokio::test]
    async fn test_refresh_short_circuits_when_initialized() {
        let store = seeded();
        let cache = MemberCache::new(store.clone());
        cache.refresh(false).await.unwrap();

        store.remove("u1");
        let records = cache.refresh(false).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(store.lists(), 1);

        let records = cache.refresh(true).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(cache.get("u1").is_none());
        assert_eq!(store.lists(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let store = seeded();
        let cache = MemberCache::new(store.clone());
        let before = cache.refresh(true).await.unwrap();
        let refreshed_at = cache.refreshed_at();

        store.set_fail_list(true);
        assert!(matches!(
            cache.refresh(true).await,
            Err(StoreReadError::Transport(_))
        ));
        assert_eq!(cache.all(), before);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.refreshed_at(), refreshed_at);
    }

    #[tokio::test]
    async fn test_failed_first_refresh_leaves_cache_uninitialized() {
        let store = seeded();
        store.set_fail_list(true);
        let cache = MemberCache::new(store);

        assert!(cache.refresh(false).await.is_err());
        assert!(!cache.is_initialized());
    }

    #[test]
    fn test_snapshot_collapses_duplicate_members() {
        let snapshot = Snapshot::build(vec![
            MemberRecord::new("u1", "alice", None, "first").with_storage_ref("p1"),
            MemberRecord::new("u1", "alice", None, "second").with_storage_ref("p2"),
            MemberRecord::new("u2", "bob", None, "").with_storage_ref("p3"),
        ]);
        assert_eq!(snapshot.records.len(), 2);
        assert_eq!(snapshot.index.len(), 2);
        assert_eq!(snapshot.records[snapshot.index["u1"]].biography, "first");
    }
}
