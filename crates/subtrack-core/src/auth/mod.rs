//! Authentication
//!
//! The provider owns credentials and account state; this crate only consumes
//! it through the [`AuthProvider`] seam. [`AuthClient`] wraps a provider and
//! publishes the signed-in state on a watch channel so screens can subscribe
//! to changes instead of polling.
//!
//! The state starts as [`AuthState::Unknown`] and stays there until the first
//! login/restore/logout event resolves it.

mod memory;
mod rest;

pub use memory::MemoryAuth;
pub use rest::RestAuth;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

/// An authenticated account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Stable id; scopes which subscriptions a list query returns
    pub uid: String,
    pub email: String,
}

/// Current authentication state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// No event has arrived yet
    Unknown,
    SignedOut,
    SignedIn(User),
}

impl AuthState {
    /// The signed-in user, if any
    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::SignedIn(user) => Some(user),
            _ => None,
        }
    }
}

/// Errors reported by an authentication provider
#[derive(Error, Debug)]
pub enum AuthError {
    /// The provider could not be reached
    #[error("auth provider unavailable: {0}")]
    Unavailable(String),

    /// The provider rejected the request; message forwarded verbatim
    #[error("{message}")]
    Provider {
        /// Provider-defined code, e.g. "auth/invalid-credential"
        code: Option<String>,
        message: String,
    },
}

impl AuthError {
    pub fn provider(code: impl Into<String>, message: impl Into<String>) -> Self {
        AuthError::Provider {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Provider-defined error code, when one was supplied
    pub fn code(&self) -> Option<&str> {
        match self {
            AuthError::Provider { code, .. } => code.as_deref(),
            AuthError::Unavailable(_) => None,
        }
    }
}

/// An external authentication provider
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create a new account
    async fn register(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Sign in an existing account
    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Sign out the current session
    async fn logout(&self) -> Result<(), AuthError>;
}

/// Provider wrapper that tracks and publishes auth state
///
/// Created at application start; the receiver side of the watch channel is
/// the change stream screens subscribe to.
pub struct AuthClient {
    provider: Arc<dyn AuthProvider>,
    state: watch::Sender<AuthState>,
    state_rx: watch::Receiver<AuthState>,
}

impl AuthClient {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        let (state, state_rx) = watch::channel(AuthState::Unknown);
        Self {
            provider,
            state,
            state_rx,
        }
    }

    /// The current auth state
    pub fn state(&self) -> AuthState {
        self.state_rx.borrow().clone()
    }

    /// The signed-in user, if any
    pub fn current_user(&self) -> Option<User> {
        self.state_rx.borrow().user().cloned()
    }

    /// Subscribe to auth state changes
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_rx.clone()
    }

    /// Seed the state from a previously persisted session
    pub fn restore(&self, user: User) {
        info!(uid = %user.uid, "restored persisted session");
        let _ = self.state.send(AuthState::SignedIn(user));
    }

    /// Resolve the initial `Unknown` state to signed-out
    pub fn mark_signed_out(&self) {
        let _ = self.state.send(AuthState::SignedOut);
    }

    /// Register a new account and sign it in
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self.provider.register(email, password).await?;
        info!(uid = %user.uid, "registered new account");
        let _ = self.state.send(AuthState::SignedIn(user.clone()));
        Ok(user)
    }

    /// Sign in and publish the new state
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self.provider.login(email, password).await?;
        info!(uid = %user.uid, "signed in");
        let _ = self.state.send(AuthState::SignedIn(user.clone()));
        Ok(user)
    }

    /// Sign out and publish the new state
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.provider.logout().await?;
        info!("signed out");
        let _ = self.state.send(AuthState::SignedOut);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initial_state_is_unknown() {
        let client = AuthClient::new(Arc::new(MemoryAuth::new()));
        assert_eq!(client.state(), AuthState::Unknown);
        assert!(client.current_user().is_none());
    }

    #[tokio::test]
    async fn test_register_publishes_signed_in() {
        let client = AuthClient::new(Arc::new(MemoryAuth::new()));
        let mut rx = client.subscribe();

        let user = client.register("a@example.com", "hunter2").await.unwrap();
        assert_eq!(client.state(), AuthState::SignedIn(user.clone()));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().user(), Some(&user));
    }

    #[tokio::test]
    async fn test_login_logout_cycle() {
        let provider = Arc::new(MemoryAuth::new());
        let client = AuthClient::new(provider);

        client.register("a@example.com", "hunter2").await.unwrap();
        client.logout().await.unwrap();
        assert_eq!(client.state(), AuthState::SignedOut);

        let user = client.login("a@example.com", "hunter2").await.unwrap();
        assert_eq!(client.current_user(), Some(user));
    }

    #[tokio::test]
    async fn test_failed_login_leaves_state() {
        let client = AuthClient::new(Arc::new(MemoryAuth::new()));
        client.mark_signed_out();

        let result = client.login("ghost@example.com", "nope").await;
        assert!(result.is_err());
        assert_eq!(client.state(), AuthState::SignedOut);
    }

    #[tokio::test]
    async fn test_restore_seeds_signed_in() {
        let client = AuthClient::new(Arc::new(MemoryAuth::new()));
        let user = User {
            uid: "u1".to_string(),
            email: "a@example.com".to_string(),
        };
        client.restore(user.clone());
        assert_eq!(client.current_user(), Some(user));
    }
}
