//! In-memory authentication provider
//!
//! Test and fixture double. Error codes follow the provider convention the
//! screens already map to user-facing text ("auth/..." strings).

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{AuthError, AuthProvider, User};

struct Account {
    uid: String,
    password: String,
}

/// In-memory [`AuthProvider`] implementation
#[derive(Default)]
pub struct MemoryAuth {
    accounts: Mutex<HashMap<String, Account>>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if email.trim().is_empty() || !email.contains('@') {
            return Err(AuthError::provider(
                "auth/invalid-email",
                "The email address is badly formatted.",
            ));
        }
        if password.len() < 6 {
            return Err(AuthError::provider(
                "auth/weak-password",
                "Password should be at least 6 characters.",
            ));
        }

        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(email) {
            return Err(AuthError::provider(
                "auth/email-already-in-use",
                "The email address is already in use by another account.",
            ));
        }

        let uid = Uuid::new_v4().to_string();
        accounts.insert(
            email.to_string(),
            Account {
                uid: uid.clone(),
                password: password.to_string(),
            },
        );

        Ok(User {
            uid,
            email: email.to_string(),
        })
    }

    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let accounts = self.accounts.lock().await;
        match accounts.get(email) {
            Some(account) if account.password == password => Ok(User {
                uid: account.uid.clone(),
                email: email.to_string(),
            }),
            _ => Err(AuthError::provider(
                "auth/invalid-credential",
                "The supplied credential is incorrect or has expired.",
            )),
        }
    }

    async fn logout(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_login() {
        let auth = MemoryAuth::new();
        let registered = auth.register("a@example.com", "hunter2").await.unwrap();

        let logged_in = auth.login("a@example.com", "hunter2").await.unwrap();
        assert_eq!(logged_in.uid, registered.uid);
        assert_eq!(logged_in.email, "a@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let auth = MemoryAuth::new();
        auth.register("a@example.com", "hunter2").await.unwrap();

        let err = auth.register("a@example.com", "other1").await.unwrap_err();
        assert_eq!(err.code(), Some("auth/email-already-in-use"));
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let auth = MemoryAuth::new();
        auth.register("a@example.com", "hunter2").await.unwrap();

        let err = auth.login("a@example.com", "wrong1").await.unwrap_err();
        assert_eq!(err.code(), Some("auth/invalid-credential"));
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let auth = MemoryAuth::new();
        let err = auth.login("ghost@example.com", "hunter2").await.unwrap_err();
        assert_eq!(err.code(), Some("auth/invalid-credential"));
    }

    #[tokio::test]
    async fn test_invalid_email_and_weak_password() {
        let auth = MemoryAuth::new();

        let err = auth.register("not-an-email", "hunter2").await.unwrap_err();
        assert_eq!(err.code(), Some("auth/invalid-email"));

        let err = auth.register("a@example.com", "abc").await.unwrap_err();
        assert_eq!(err.code(), Some("auth/weak-password"));
    }
}
