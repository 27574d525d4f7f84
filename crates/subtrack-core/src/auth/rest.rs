//! REST backend auth adapter
//!
//! - `POST {api_url}/auth/register`
//! - `POST {api_url}/auth/login`
//! - `POST {api_url}/auth/logout`
//!
//! The backend returns the account plus a bearer token on register/login;
//! the token is kept here so callers can persist it and feed it to the
//! store adapter.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AuthError, AuthProvider, User};

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct SessionResponse {
    uid: String,
    email: String,
    token: Option<String>,
}

/// REST [`AuthProvider`] implementation
pub struct RestAuth {
    http: Client,
    base_url: String,
    token: Mutex<Option<String>>,
}

impl RestAuth {
    /// Create an auth client against the given backend base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: Mutex::new(None),
        }
    }

    /// The bearer token from the most recent register/login, if any
    pub fn token(&self) -> Option<String> {
        self.lock_token().clone()
    }

    fn lock_token(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // A poisoned lock only means a panic elsewhere; the token itself
        // is still usable.
        self.token.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/{}", self.base_url, path)
    }

    async fn post_credentials(
        &self,
        path: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let url = self.url(path);
        debug!(%url, "posting credentials");
        let response = self
            .http
            .post(&url)
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            return Err(AuthError::Provider {
                code: Some(status.as_u16().to_string()),
                message,
            });
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        *self.lock_token() = session.token;

        Ok(User {
            uid: session.uid,
            email: session.email,
        })
    }
}

#[async_trait]
impl AuthProvider for RestAuth {
    async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.post_credentials("register", email, password).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.post_credentials("login", email, password).await
    }

    async fn logout(&self) -> Result<(), AuthError> {
        let token = self.lock_token().take();

        let url = self.url("logout");
        debug!(%url, "logging out");
        let mut request = self.http.post(&url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        // The session is gone locally either way; a dead backend shouldn't
        // trap the user in a signed-in state.
        if let Err(e) = request.send().await {
            debug!("logout request failed: {}", e);
        }
        Ok(())
    }
}
