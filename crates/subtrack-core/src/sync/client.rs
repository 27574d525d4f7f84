//! Synchronization client
//!
//! The one object screens talk to. Reads go through two query caches keyed
//! by owner (lists) and by id (details); writes go straight to the remote
//! store and then mark the affected cache keys stale:
//!
//! - create  -> invalidates `list(owner)`
//! - update  -> invalidates `detail(id)` and `list(owner)`
//! - remove  -> invalidates `list(owner)` when the owner is recoverable from
//!   the cached detail, and deletes `detail(id)` outright
//!
//! A delete triggered from a list view that never fetched the detail cannot
//! recover the owner here; the list screen invalidates its own key via
//! [`SyncClient::invalidate_list`] after the delete succeeds.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::cache::{EntryState, QueryCache};
use super::SyncError;
use crate::config::DEFAULT_STALE_SECS;
use crate::models::{Subscription, SubscriptionDraft};
use crate::store::RemoteStore;

/// Client-side synchronization layer over a remote store
pub struct SyncClient {
    store: Arc<dyn RemoteStore>,
    lists: QueryCache<Vec<Subscription>>,
    details: QueryCache<Option<Subscription>>,
}

impl SyncClient {
    /// Create a client with the default 5-minute staleness window
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self::with_stale_after(store, Duration::from_secs(DEFAULT_STALE_SECS))
    }

    /// Create a client with a specific staleness window
    pub fn with_stale_after(store: Arc<dyn RemoteStore>, stale_after: Duration) -> Self {
        Self {
            store,
            lists: QueryCache::new(stale_after),
            details: QueryCache::new(stale_after),
        }
    }

    /// Fetch the subscriptions owned by `owner_id`
    ///
    /// With no owner (unauthenticated state) this returns an empty list
    /// without contacting the store or caching anything, so nothing ends up
    /// under an anonymous sentinel key.
    pub async fn fetch_list(&self, owner_id: Option<&str>) -> Result<Vec<Subscription>, SyncError> {
        let Some(owner) = owner_id.filter(|o| !o.is_empty()) else {
            debug!("no owner id; serving empty list without a remote call");
            return Ok(Vec::new());
        };

        let store = Arc::clone(&self.store);
        let owner_owned = owner.to_string();
        self.lists
            .fetch_with(owner, move || {
                let store = Arc::clone(&store);
                let owner = owner_owned.clone();
                async move { store.query_by_owner(&owner).await.map_err(SyncError::from) }
            })
            .await
    }

    /// Fetch a single subscription; `Ok(None)` when the store has no such id
    pub async fn fetch_detail(&self, id: &str) -> Result<Option<Subscription>, SyncError> {
        let store = Arc::clone(&self.store);
        let id_owned = id.to_string();
        self.details
            .fetch_with(id, move || {
                let store = Arc::clone(&store);
                let id = id_owned.clone();
                async move { store.get_by_id(&id).await.map_err(SyncError::from) }
            })
            .await
    }

    /// Create a subscription; returns the store-assigned id
    ///
    /// The owner's list key is invalidated so the next list read re-fetches.
    /// The new detail key is not proactively populated.
    pub async fn create(&self, draft: &SubscriptionDraft) -> Result<String, SyncError> {
        if draft.owner_id.trim().is_empty() {
            return Err(SyncError::MissingOwner);
        }

        let id = self.store.insert(draft).await?;
        info!(id = %id, owner = %draft.owner_id, "created subscription");
        self.lists.invalidate(&draft.owner_id).await;
        Ok(id)
    }

    /// Replace every field of an existing subscription except its id
    ///
    /// On success both the detail key and the owner's list key are
    /// invalidated. On failure no cache entry is touched; the previously
    /// cached detail stays fresh even though the remote write may have
    /// partially applied (accepted at-most-once-write gap).
    pub async fn update(&self, subscription: &Subscription) -> Result<(), SyncError> {
        let draft = subscription.draft();
        self.store.replace(&subscription.id, &draft).await?;
        info!(id = %subscription.id, "updated subscription");

        self.details.invalidate(&subscription.id).await;
        if !subscription.owner_id.is_empty() {
            self.lists.invalidate(&subscription.owner_id).await;
        }
        Ok(())
    }

    /// Delete a subscription
    ///
    /// The owner is recovered from the cached detail when one exists; its
    /// list key is then invalidated. The detail entry is deleted outright
    /// (the id no longer exists, so stale data must not be servable).
    pub async fn remove(&self, id: &str) -> Result<(), SyncError> {
        self.store.delete_by_id(id).await?;
        info!(id = %id, "deleted subscription");

        match self.details.peek(id).await.flatten() {
            Some(cached) => self.lists.invalidate(&cached.owner_id).await,
            None => {
                debug!(id = %id, "no cached detail; the initiating list view invalidates its own key")
            }
        }
        self.details.remove(id).await;
        Ok(())
    }

    /// Mark one owner's list key stale
    ///
    /// List screens call this after a delete they initiated on a record
    /// whose detail was never fetched.
    pub async fn invalidate_list(&self, owner_id: &str) {
        self.lists.invalidate(owner_id).await;
    }

    /// Mark every list key stale
    pub async fn invalidate_all_lists(&self) {
        self.lists.invalidate_all().await;
    }

    /// Mark every detail key stale
    pub async fn invalidate_all_details(&self) {
        self.details.invalidate_all().await;
    }

    /// The cached list for `owner_id`, fresh or stale, without fetching
    pub async fn cached_list(&self, owner_id: &str) -> Option<Vec<Subscription>> {
        self.lists.peek(owner_id).await
    }

    /// The cached detail for `id`, fresh or stale, without fetching
    pub async fn cached_detail(&self, id: &str) -> Option<Subscription> {
        self.details.peek(id).await.flatten()
    }

    /// Loading/freshness indicator for the list key
    pub async fn list_state(&self, owner_id: &str) -> EntryState {
        self.lists.state(owner_id).await
    }

    /// Loading/freshness indicator for the detail key
    pub async fn detail_state(&self, id: &str) -> EntryState {
        self.details.state(id).await
    }

    /// Drop every cached entry (teardown on logout)
    pub async fn clear(&self) {
        self.lists.clear().await;
        self.details.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BillingCycle;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn netflix(owner: &str) -> SubscriptionDraft {
        SubscriptionDraft::new(
            owner,
            "Netflix",
            15.99,
            "USD",
            BillingCycle::Monthly,
            date(2024, 6, 1),
        )
    }

    fn client() -> (Arc<MemoryStore>, SyncClient) {
        let store = MemoryStore::shared();
        let client = SyncClient::new(Arc::clone(&store) as Arc<dyn RemoteStore>);
        (store, client)
    }

    #[tokio::test]
    async fn test_create_then_list_contains_record() {
        let (_, client) = client();
        let draft = netflix("u1");

        let id = client.create(&draft).await.unwrap();
        let list = client.fetch_list(Some("u1")).await.unwrap();

        assert_eq!(list, vec![Subscription::from_draft(id, draft)]);
    }

    #[tokio::test]
    async fn test_create_requires_owner() {
        let (store, client) = client();
        let mut draft = netflix("u1");
        draft.owner_id = String::new();

        assert_eq!(
            client.create(&draft).await,
            Err(SyncError::MissingOwner)
        );
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_create_does_not_populate_detail() {
        let (store, client) = client();
        let id = client.create(&netflix("u1")).await.unwrap();

        assert_eq!(client.detail_state(&id).await, EntryState::Absent);
        assert!(client.cached_detail(&id).await.is_none());
        // Only the insert has hit the store
        assert_eq!(store.call_count(), 1);
    }

    #[tokio::test]
    async fn test_list_without_owner_is_empty_and_remote_free() {
        let (store, client) = client();

        assert!(client.fetch_list(None).await.unwrap().is_empty());
        assert!(client.fetch_list(Some("")).await.unwrap().is_empty());
        assert_eq!(store.call_count(), 0);
        // and nothing was cached under a sentinel key
        assert!(client.cached_list("").await.is_none());
    }

    #[tokio::test]
    async fn test_rapid_double_fetch_issues_one_query() {
        let (store, client) = client();
        client.create(&netflix("u1")).await.unwrap();
        let calls_before = store.call_count();

        let client = Arc::new(client);
        let a = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.fetch_list(Some("u1")).await })
        };
        let b = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.fetch_list(Some("u1")).await })
        };

        let list_a = a.await.unwrap().unwrap();
        let list_b = b.await.unwrap().unwrap();
        assert_eq!(list_a, list_b);
        assert_eq!(store.call_count(), calls_before + 1);
    }

    #[tokio::test]
    async fn test_update_then_detail_returns_new_fields() {
        let (store, client) = client();
        let id = client.create(&netflix("u1")).await.unwrap();

        // Populate and pin the detail cache
        let mut sub = client.fetch_detail(&id).await.unwrap().unwrap();
        assert_eq!(sub.price, 15.99);

        sub.price = 17.99;
        client.update(&sub).await.unwrap();

        let calls_before = store.call_count();
        let refetched = client.fetch_detail(&id).await.unwrap().unwrap();
        assert_eq!(refetched.price, 17.99);
        // The stale pre-update value was not served
        assert_eq!(store.call_count(), calls_before + 1);
    }

    #[tokio::test]
    async fn test_update_invalidates_owner_list() {
        let (_, client) = client();
        let id = client.create(&netflix("u1")).await.unwrap();
        client.fetch_list(Some("u1")).await.unwrap();
        assert_eq!(client.list_state("u1").await, EntryState::Fresh);

        let mut sub = client.fetch_detail(&id).await.unwrap().unwrap();
        sub.name = "Netflix Premium".to_string();
        client.update(&sub).await.unwrap();

        assert_eq!(client.list_state("u1").await, EntryState::Stale);
        let list = client.fetch_list(Some("u1")).await.unwrap();
        assert_eq!(list[0].name, "Netflix Premium");
    }

    #[tokio::test]
    async fn test_remove_then_detail_is_none() {
        let (_, client) = client();
        let id = client.create(&netflix("u1")).await.unwrap();
        client.fetch_detail(&id).await.unwrap();

        client.remove(&id).await.unwrap();

        // Null, not an error, not stale data
        assert_eq!(client.fetch_detail(&id).await, Ok(None));
    }

    #[tokio::test]
    async fn test_remove_with_cached_detail_invalidates_list() {
        let (_, client) = client();
        let id = client.create(&netflix("u1")).await.unwrap();
        client.fetch_detail(&id).await.unwrap();
        client.fetch_list(Some("u1")).await.unwrap();
        assert_eq!(client.list_state("u1").await, EntryState::Fresh);

        client.remove(&id).await.unwrap();

        assert_eq!(client.list_state("u1").await, EntryState::Stale);
        assert_eq!(client.detail_state(&id).await, EntryState::Absent);
        assert!(client.fetch_list(Some("u1")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_without_cached_detail_leaves_list_to_caller() {
        let (_, client) = client();
        let id = client.create(&netflix("u1")).await.unwrap();
        client.fetch_list(Some("u1")).await.unwrap();

        // Delete straight from the list view; the detail was never fetched,
        // so the layer cannot recover the owner.
        client.remove(&id).await.unwrap();
        assert_eq!(client.list_state("u1").await, EntryState::Fresh);

        // The initiating screen invalidates its own key
        client.invalidate_list("u1").await;
        assert_eq!(client.list_state("u1").await, EntryState::Stale);
        assert!(client.fetch_list(Some("u1")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_create_touches_nothing() {
        let (store, client) = client();
        client.create(&netflix("u1")).await.unwrap();
        client.fetch_list(Some("u1")).await.unwrap();

        store.fail_next(1);
        let result = client.create(&netflix("u1")).await;
        assert!(matches!(result, Err(SyncError::RemoteUnavailable(_))));

        // The cached list is still fresh and served without a remote call
        assert_eq!(client.list_state("u1").await, EntryState::Fresh);
        let calls_before = store.call_count();
        client.fetch_list(Some("u1")).await.unwrap();
        assert_eq!(store.call_count(), calls_before);
    }

    #[tokio::test]
    async fn test_failed_update_leaves_cached_detail_fresh() {
        let (store, client) = client();
        let id = client.create(&netflix("u1")).await.unwrap();
        let mut sub = client.fetch_detail(&id).await.unwrap().unwrap();

        store.fail_next(1);
        sub.price = 99.99;
        assert!(client.update(&sub).await.is_err());

        assert_eq!(client.detail_state(&id).await, EntryState::Fresh);
        let cached = client.fetch_detail(&id).await.unwrap().unwrap();
        assert_eq!(cached.price, 15.99);
    }

    #[tokio::test]
    async fn test_fetch_retries_once_on_failure() {
        let (store, client) = client();
        client.create(&netflix("u1")).await.unwrap();

        store.fail_next(1);
        let list = client.fetch_list(Some("u1")).await.unwrap();
        assert_eq!(list.len(), 1);
        // insert + failed query + retried query
        assert_eq!(store.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fetch_surfaces_error_after_retry() {
        let (store, client) = client();
        store.fail_next(2);

        let result = client.fetch_list(Some("u1")).await;
        assert!(matches!(result, Err(SyncError::RemoteUnavailable(_))));
        assert_eq!(store.call_count(), 2);
    }

    #[tokio::test]
    async fn test_detail_for_unknown_id_is_none() {
        let (_, client) = client();
        assert_eq!(client.fetch_detail("missing").await, Ok(None));
    }

    #[tokio::test]
    async fn test_clear_tears_down_both_namespaces() {
        let (store, client) = client();
        let id = client.create(&netflix("u1")).await.unwrap();
        client.fetch_list(Some("u1")).await.unwrap();
        client.fetch_detail(&id).await.unwrap();

        client.clear().await;

        assert_eq!(client.list_state("u1").await, EntryState::Absent);
        assert_eq!(client.detail_state(&id).await, EntryState::Absent);

        // Next reads are misses that go back to the store
        let calls_before = store.call_count();
        client.fetch_list(Some("u1")).await.unwrap();
        assert_eq!(store.call_count(), calls_before + 1);
    }

    #[tokio::test]
    async fn test_full_lifecycle_scenario() {
        let (_, client) = client();

        // u1 creates Netflix
        let id = client.create(&netflix("u1")).await.unwrap();

        // list shows it
        let list = client.fetch_list(Some("u1")).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, id);
        assert_eq!(list[0].name, "Netflix");

        // price bump propagates through the detail view
        let mut sub = list[0].clone();
        sub.price = 17.99;
        client.update(&sub).await.unwrap();
        let detail = client.fetch_detail(&id).await.unwrap().unwrap();
        assert_eq!(detail.price, 17.99);

        // removal empties both views
        client.remove(&id).await.unwrap();
        assert!(client.fetch_list(Some("u1")).await.unwrap().is_empty());
        assert_eq!(client.fetch_detail(&id).await, Ok(None));
    }
}
