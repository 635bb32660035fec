//! Insert-or-update of member biographies against the remote store.
//!
//! Every submission runs classify → write → refresh → mirror under one lock,
//! and every store listing that replaces the cache takes the same lock, so a
//! classification never sees a snapshot older than the last write.

use crate::cache::MemberCache;
use crate::error::{StoreReadError, SyncError, ValidationError};
use crate::roster::{self, RosterMirror};
use crate::store::RecordStore;
use bio_roster_types::MemberRecord;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created,
    Updated,
}

#[derive(Debug, Clone)]
pub struct BiographySubmission {
    pub member_id: String,
    pub username: String,
    pub discriminator: Option<String>,
    pub biography: String,
}

impl BiographySubmission {
    fn into_record(self) -> MemberRecord {
        MemberRecord::new(self.member_id, self.username, self.discriminator, self.biography)
    }
}

pub struct SyncEngine {
    store: Arc<dyn RecordStore>,
    cache: MemberCache,
    max_length: usize,
    mirror: Option<Arc<dyn RosterMirror>>,
    write_lock: Mutex<()>,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn RecordStore>, max_length: usize) -> Self {
        Self {
            cache: MemberCache::new(store.clone()),
            store,
            max_length,
            mirror: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Re-publish the roster text after every successful write.
    pub fn with_mirror(mut self, mirror: Arc<dyn RosterMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Read-only view of the cache. Anything that fetches from the store
    /// goes through [`SyncEngine::refresh`].
    pub fn cache(&self) -> &MemberCache {
        &self.cache
    }

    /// Populate the cache once at startup. A failure leaves the cache
    /// uninitialized; submissions still work.
    pub async fn initialize(&self) {
        match self.refresh(true).await {
            Ok(records) => log::info!("[SYNC] Loaded {} members at startup", records.len()),
            Err(e) => log::error!("[SYNC] Initial member load failed: {}", e),
        }
    }

    /// Cached members, fetching from the store when forced or when the
    /// cache is cold. Fetches are serialized with submissions.
    pub async fn refresh(&self, force_invalidate: bool) -> Result<Vec<MemberRecord>, StoreReadError> {
        if !force_invalidate && self.cache.is_initialized() {
            return self.cache.refresh(false).await;
        }
        let _guard = self.write_lock.lock().await;
        self.cache.refresh(force_invalidate).await
    }

    pub fn validate(&self, biography: &str) -> Result<(), ValidationError> {
        let length = biography.chars().count();
        if length > self.max_length {
            return Err(ValidationError::BiographyTooLong {
                length,
                max: self.max_length,
            });
        }
        Ok(())
    }

    pub async fn submit_biography(
        &self,
        submission: BiographySubmission,
    ) -> Result<SubmitOutcome, SyncError> {
        self.validate(&submission.biography)?;
        let member_id = submission.member_id.clone();

        let _guard = self.write_lock.lock().await;

        if !self.cache.is_initialized() {
            // Best effort; on failure the member is classified as new.
            let _ = self.cache.refresh(false).await;
        }

        let outcome = match self.cache.get(&member_id) {
            None => {
                let record = submission.into_record();
                log::info!(
                    "[SYNC] Adding {} ({})",
                    record.display_name(),
                    record.member_id
                );
                self.store.create(&record).await?;
                SubmitOutcome::Created
            }
            Some(existing) => {
                let Some(storage_ref) = existing.storage_ref.as_deref() else {
                    return Err(SyncError::UpdateRejected { member_id });
                };
                log::info!(
                    "[SYNC] Updating {} ({}) on row {}",
                    existing.display_name(),
                    existing.member_id,
                    storage_ref
                );
                if !self.store.update(storage_ref, &submission.biography).await? {
                    return Err(SyncError::UpdateRejected { member_id });
                }
                SubmitOutcome::Updated
            }
        };

        if let Err(e) = self.cache.refresh(true).await {
            log::warn!(
                "[SYNC] {:?} member {} but the cache could not be refreshed: {}",
                outcome,
                member_id,
                e
            );
        }

        self.publish_mirror().await;
        Ok(outcome)
    }

    /// Current roster, read through the cache.
    pub async fn roster(&self) -> Result<Vec<MemberRecord>, StoreReadError> {
        self.refresh(false).await
    }

    /// Caller holds `write_lock`, so publications land in write order.
    async fn publish_mirror(&self) {
        let Some(mirror) = &self.mirror else {
            return;
        };
        let text = roster::text_block(&roster::render(&self.cache.all()));
        if let Err(e) = mirror.publish(&text).await {
            log::warn!("[SYNC] Failed to update the roster message: {}", e);
        }
    }
}
