//! Gmail API v1: message search and metadata fetch

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use super::{GoogleApiError, GoogleConfig, api_error, oauth};
use crate::scanner::{InboxMessage, Mailbox, MailboxError, MessageHeader};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    #[serde(default)]
    messages: Vec<MessageStub>,
}

#[derive(Debug, Deserialize)]
struct MessageStub {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageDetail {
    #[serde(default)]
    id: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    payload: Option<MessagePayload>,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<Header>,
}

#[derive(Debug, Deserialize)]
struct Header {
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: String,
}

/// Gmail REST client for one user's credential.
///
/// A 401 triggers one token refresh (when a refresh token is available)
/// and one retry of the same request. The refreshed token is then used for
/// the rest of the client's life and exposed by `current_access_token`.
pub struct GmailClient {
    http: reqwest::Client,
    google: Arc<GoogleConfig>,
    access_token: RwLock<String>,
    refresh_token: Option<String>,
}

impl GmailClient {
    pub fn new(
        http: reqwest::Client,
        google: Arc<GoogleConfig>,
        access_token: String,
        refresh_token: Option<String>,
    ) -> Self {
        Self {
            http,
            google,
            access_token: RwLock::new(access_token),
            refresh_token,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GoogleApiError> {
        let url = format!("{}{}", self.google.endpoints.gmail_base, path);

        let token = self.access_token.read().await.clone();
        let mut resp = self.http.get(&url).bearer_auth(&token).query(query).send().await?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            let fresh = self.refresh(&token).await?;
            resp = self.http.get(&url).bearer_auth(&fresh).query(query).send().await?;
            if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
                return Err(GoogleApiError::AuthExpired);
            }
        }
        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }
        Ok(resp.json().await?)
    }

    /// New access token after `rejected` got a 401
    async fn refresh(&self, rejected: &str) -> Result<String, GoogleApiError> {
        let Some(refresh_token) = self.refresh_token.as_deref() else {
            return Err(GoogleApiError::AuthExpired);
        };

        let mut current = self.access_token.write().await;
        if *current != rejected {
            // Someone refreshed while we waited for the lock
            return Ok(current.clone());
        }

        let token = oauth::refresh_access_token(&self.http, &self.google, refresh_token).await?;
        tracing::info!("Gmail access token refreshed");
        *current = token.access_token.clone();
        Ok(token.access_token)
    }
}

#[async_trait]
impl Mailbox for GmailClient {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<String>, MailboxError> {
        let max = max_results.to_string();
        let list: MessageListResponse = self
            .get_json("/messages", &[("q", query), ("maxResults", &max)])
            .await?;
        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    async fn fetch(&self, id: &str) -> Result<InboxMessage, MailboxError> {
        let detail: MessageDetail = self
            .get_json(
                &format!("/messages/{id}"),
                &[
                    ("format", "metadata"),
                    ("metadataHeaders", "From"),
                    ("metadataHeaders", "Subject"),
                ],
            )
            .await?;

        let headers = detail
            .payload
            .map(|p| p.headers)
            .unwrap_or_default()
            .into_iter()
            .map(|h| MessageHeader {
                name: h.name,
                value: h.value,
            })
            .collect();

        Ok(InboxMessage {
            id: if detail.id.is_empty() { id.to_string() } else { detail.id },
            headers,
            snippet: detail.snippet,
        })
    }

    async fn current_access_token(&self) -> String {
        self.access_token.read().await.clone()
    }
}
