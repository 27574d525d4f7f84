//! subtrack Core Library
//!
//! This crate provides the core functionality for subtrack, a tracker for
//! recurring payments backed by a remote document store.
//!
//! # Architecture
//!
//! - **Remote store**: owns the records; reached only through the
//!   [`RemoteStore`] trait
//! - **Synchronization layer**: caches list and detail queries and pairs
//!   every mutation with the cache keys it makes stale
//! - **Auth**: provider seam plus an observable signed-in state
//!
//! # Quick Start
//!
//! ```text
//! let store = MemoryStore::shared();
//! let client = SyncClient::new(store);
//!
//! // Add a subscription
//! let draft = SubscriptionDraft::new("u1", "Netflix", 15.99, "USD",
//!     BillingCycle::Monthly, renewal_date);
//! let id = client.create(&draft).await?;
//!
//! // Query subscriptions
//! let subs = client.fetch_list(Some("u1")).await?;
//! ```
//!
//! # Modules
//!
//! - `sync`: query caches and the synchronization client (main entry point)
//! - `models`: data structures for subscriptions and payments
//! - `store`: remote store trait and adapters
//! - `auth`: auth provider trait, adapters, and state stream
//! - `config`: application configuration

pub mod auth;
pub mod config;
pub mod models;
pub mod store;
pub mod sync;

pub use auth::{AuthClient, AuthError, AuthProvider, AuthState, MemoryAuth, RestAuth, User};
pub use config::Config;
pub use models::{BillingCycle, Subscription, SubscriptionDraft, Transaction};
pub use store::{MemoryStore, RemoteStore, RestStore, StoreError};
pub use sync::{EntryState, QueryCache, SyncClient, SyncError};
