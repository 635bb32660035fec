//! Remote tabular store holding one row per registered member.

mod notion;
mod notion_types;

#[cfg(test)]
pub mod mock;

pub use notion::NotionClient;

use crate::error::{StoreReadError, StoreWriteError};
use async_trait::async_trait;
use bio_roster_types::MemberRecord;

/// Row-level operations the sync engine needs from the remote store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new row and return its storage ref.
    async fn create(&self, record: &MemberRecord) -> Result<String, StoreWriteError>;

    /// Rewrite the biography of an existing row.
    ///
    /// `Ok(false)` means the store answered but refused the update; `Err` is
    /// reserved for transport faults.
    async fn update(&self, storage_ref: &str, biography: &str) -> Result<bool, StoreWriteError>;

    /// Every row, ordered by display name.
    async fn list_all(&self) -> Result<Vec<MemberRecord>, StoreReadError>;
}

/// Stable ascending sort on the rendered display name.
pub fn sort_by_display_name(records: &mut [MemberRecord]) {
    records.sort_by_cached_key(|r| r.display_name());
}
