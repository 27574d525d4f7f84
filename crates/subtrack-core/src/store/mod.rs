//! Remote store access
//!
//! The remote store holds subscription records keyed by an opaque,
//! store-assigned id and queried by equality on the owner field. The
//! [`RemoteStore`] trait is the seam; the synchronization layer only ever
//! talks to the store through it.
//!
//! Implementations:
//! - [`MemoryStore`]: in-process map, used by tests and local fixtures
//! - [`RestStore`]: REST backend adapter

mod memory;
mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Subscription, SubscriptionDraft};

/// Errors reported by a remote store
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached (network/transport failure)
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected the operation; message is forwarded verbatim
    #[error("{message}")]
    Provider {
        /// Provider-defined error code, when one was supplied
        code: Option<String>,
        message: String,
    },

    /// A write targeted an id the store does not know
    #[error("no record with id '{0}'")]
    NotFound(String),

    /// A record could not be decoded from the wire
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

impl StoreError {
    pub fn provider(message: impl Into<String>) -> Self {
        StoreError::Provider {
            code: None,
            message: message.into(),
        }
    }
}

/// A document store holding subscription records
///
/// Ids are assigned by the store on insert, never by the caller. Replace is
/// whole-record: the payload carries every field except the id.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Insert a new record; returns the store-assigned id
    async fn insert(&self, draft: &SubscriptionDraft) -> Result<String, StoreError>;

    /// All records whose owner field equals `owner_id`
    async fn query_by_owner(&self, owner_id: &str) -> Result<Vec<Subscription>, StoreError>;

    /// Fetch a single record; `Ok(None)` when the store has no such id
    async fn get_by_id(&self, id: &str) -> Result<Option<Subscription>, StoreError>;

    /// Replace every field of an existing record except its id
    async fn replace(&self, id: &str, draft: &SubscriptionDraft) -> Result<(), StoreError>;

    /// Delete a record by id
    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError>;
}
