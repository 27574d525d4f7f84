//! Client-side synchronization layer
//!
//! Keeps the list view, the detail view, and the remote store consistent.
//! Fetched data lives in per-namespace query caches ([`cache::QueryCache`]);
//! [`client::SyncClient`] performs the remote operations and applies the
//! invalidation rules that pair each mutation with the cache keys it makes
//! stale.

pub mod cache;
pub mod client;

pub use cache::{EntryState, QueryCache};
pub use client::SyncClient;

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the synchronization layer
///
/// Clonable because coalesced fetches hand the same result to every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Create was called without an owner id
    #[error("an owner id is required")]
    MissingOwner,

    /// The remote store could not be reached (after one retry, for fetches)
    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// The remote store rejected the operation; message forwarded verbatim
    #[error("{0}")]
    Remote(String),

    /// A write targeted an id the store does not know
    #[error("no record with id '{0}'")]
    NotFound(String),
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(message) => SyncError::RemoteUnavailable(message),
            StoreError::Provider { message, .. } => SyncError::Remote(message),
            StoreError::NotFound(id) => SyncError::NotFound(id),
            StoreError::InvalidRecord(message) => SyncError::Remote(message),
        }
    }
}
