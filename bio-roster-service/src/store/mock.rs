//! In-memory [`RecordStore`] with call counters and failure injection.

use super::{sort_by_display_name, RecordStore};
use crate::error::{StoreReadError, StoreWriteError};
use async_trait::async_trait;
use bio_roster_types::MemberRecord;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
pub struct MockStore {
    rows: Mutex<Vec<MemberRecord>>,
    next_page: AtomicUsize,
    creates: AtomicUsize,
    updates: AtomicUsize,
    lists: AtomicUsize,
    fail_list: AtomicBool,
    fail_create: AtomicBool,
    refuse_updates: AtomicBool,
    create_delay_ms: AtomicU64,
    list_delay_ms: AtomicU64,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row as if it had been written earlier.
    pub fn with_row(self, member_id: &str, username: &str, biography: &str) -> Self {
        let page = self.next_page.fetch_add(1, Ordering::SeqCst);
        self.rows.lock().push(
            MemberRecord::new(member_id, username, None, biography)
                .with_storage_ref(format!("page-{}", page)),
        );
        self
    }

    pub fn rows(&self) -> Vec<MemberRecord> {
        self.rows.lock().clone()
    }

    /// Delete a row behind the service's back.
    pub fn remove(&self, member_id: &str) {
        self.rows.lock().retain(|r| r.member_id != member_id);
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn set_refuse_updates(&self, refuse: bool) {
        self.refuse_updates.store(refuse, Ordering::SeqCst);
    }

    pub fn set_create_delay(&self, delay: Duration) {
        self.create_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Listings read the rows first and return them after `delay`.
    pub fn set_list_delay(&self, delay: Duration) {
        self.list_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for MockStore {
    async fn create(&self, record: &MemberRecord) -> Result<String, StoreWriteError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let delay = self.create_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(StoreWriteError::Transport("mock create outage".to_string()));
        }

        let storage_ref = format!("page-{}", self.next_page.fetch_add(1, Ordering::SeqCst));
        self.rows
            .lock()
            .push(record.clone().with_storage_ref(storage_ref.clone()));
        Ok(storage_ref)
    }

    async fn update(&self, storage_ref: &str, biography: &str) -> Result<bool, StoreWriteError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.refuse_updates.load(Ordering::SeqCst) {
            return Ok(false);
        }

        let mut rows = self.rows.lock();
        match rows
            .iter_mut()
            .find(|r| r.storage_ref.as_deref() == Some(storage_ref))
        {
            Some(row) => {
                row.biography = biography.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_all(&self) -> Result<Vec<MemberRecord>, StoreReadError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(StoreReadError::Transport("mock list outage".to_string()));
        }

        let mut records = self.rows.lock().clone();
        let delay = self.list_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        sort_by_display_name(&mut records);
        Ok(records)
    }
}
