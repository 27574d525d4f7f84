//! REST backend store adapter
//!
//! Talks to the subscription backend over JSON:
//!
//! - `GET    {api_url}/subscriptions/user/{owner_id}`
//! - `GET    {api_url}/subscriptions/{id}`
//! - `POST   {api_url}/subscriptions`
//! - `PUT    {api_url}/subscriptions/{id}`
//! - `DELETE {api_url}/subscriptions/{id}`
//!
//! A bearer token, when present, is attached to every request. Transport
//! failures map to `StoreError::Unavailable`; non-success responses carry the
//! backend's message through verbatim.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::debug;

use super::{RemoteStore, StoreError};
use crate::models::{Subscription, SubscriptionDraft};

/// REST [`RemoteStore`] implementation
pub struct RestStore {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl RestStore {
    /// Create a store client against the given backend base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Attach a bearer token to every request
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/subscriptions{}", self.base_url, path)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| status.to_string());
        Err(StoreError::Provider {
            code: Some(status.as_u16().to_string()),
            message,
        })
    }
}

fn transport_error(err: reqwest::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

#[async_trait]
impl RemoteStore for RestStore {
    async fn insert(&self, draft: &SubscriptionDraft) -> Result<String, StoreError> {
        let url = self.url("");
        debug!(%url, "inserting subscription");
        let response = self
            .authorize(self.http.post(&url).json(draft))
            .send()
            .await
            .map_err(transport_error)?;
        let created: Subscription = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::InvalidRecord(e.to_string()))?;
        Ok(created.id)
    }

    async fn query_by_owner(&self, owner_id: &str) -> Result<Vec<Subscription>, StoreError> {
        let url = self.url(&format!("/user/{}", owner_id));
        debug!(%url, "querying subscriptions by owner");
        let response = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .map_err(transport_error)?;
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::InvalidRecord(e.to_string()))
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Subscription>, StoreError> {
        let url = self.url(&format!("/{}", id));
        debug!(%url, "fetching subscription");
        let response = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .map_err(transport_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let record: Subscription = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::InvalidRecord(e.to_string()))?;
        Ok(Some(record))
    }

    async fn replace(&self, id: &str, draft: &SubscriptionDraft) -> Result<(), StoreError> {
        let url = self.url(&format!("/{}", id));
        debug!(%url, "replacing subscription");
        let response = self
            .authorize(self.http.put(&url).json(draft))
            .send()
            .await
            .map_err(transport_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        let url = self.url(&format!("/{}", id));
        debug!(%url, "deleting subscription");
        let response = self
            .authorize(self.http.delete(&url))
            .send()
            .await
            .map_err(transport_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let store = RestStore::new("http://localhost:8080/api/");
        assert_eq!(
            store.url("/user/u1"),
            "http://localhost:8080/api/subscriptions/user/u1"
        );
    }

    #[test]
    fn test_collection_url() {
        let store = RestStore::new("http://localhost:8080/api");
        assert_eq!(store.url(""), "http://localhost:8080/api/subscriptions");
    }
}
