//! In-memory remote store
//!
//! Backs the unit tests and local fixtures. Behaves like the real thing:
//! ids are minted on insert, list queries are equality queries on the owner
//! field, and every remote call is counted so tests can assert coalescing.
//! Failures can be injected to exercise the retry path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{RemoteStore, StoreError};
use crate::models::{Subscription, SubscriptionDraft};

/// In-memory [`RemoteStore`] implementation
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Subscription>>,
    calls: AtomicUsize,
    /// Number of upcoming calls that should fail with `Unavailable`
    fail_next: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle, ready to hand to a sync client
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Total number of remote calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make the next `n` calls fail with `Unavailable`
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Number of records currently stored
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    fn track_call(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn insert(&self, draft: &SubscriptionDraft) -> Result<String, StoreError> {
        self.track_call()?;
        let id = Uuid::new_v4().to_string();
        let record = Subscription::from_draft(id.clone(), draft.clone());
        self.records.lock().await.insert(id.clone(), record);
        Ok(id)
    }

    async fn query_by_owner(&self, owner_id: &str) -> Result<Vec<Subscription>, StoreError> {
        self.track_call()?;
        let records = self.records.lock().await;
        let mut matches: Vec<Subscription> = records
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matches)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Subscription>, StoreError> {
        self.track_call()?;
        Ok(self.records.lock().await.get(id).cloned())
    }

    async fn replace(&self, id: &str, draft: &SubscriptionDraft) -> Result<(), StoreError> {
        self.track_call()?;
        let mut records = self.records.lock().await;
        if !records.contains_key(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        records.insert(id.to_string(), Subscription::from_draft(id, draft.clone()));
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        self.track_call()?;
        self.records.lock().await.remove(id);
        Ok(())
    }
}
