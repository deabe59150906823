//! Google OAuth2 and Gmail REST client
//!
//! Direct HTTP via reqwest, no SDK:
//! - oauth: consent URL, code exchange, token refresh, userinfo
//! - gmail: [`GmailClient`], the inbox behind the scanner

pub mod gmail;
pub mod oauth;

pub use gmail::GmailClient;

use crate::config::Config;
use crate::scanner::MailboxError;

/// Scopes requested at consent
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/gmail.readonly",
];

/// Google endpoint base URLs (overridable for local fakes)
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub auth_uri: String,
    pub token_uri: String,
    pub userinfo_uri: String,
    pub gmail_base: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_uri: "https://accounts.google.com/o/oauth2/auth".into(),
            token_uri: "https://oauth2.googleapis.com/token".into(),
            userinfo_uri: "https://www.googleapis.com/oauth2/v2/userinfo".into(),
            gmail_base: "https://gmail.googleapis.com/gmail/v1/users/me".into(),
        }
    }
}

/// OAuth client registration plus endpoints
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub endpoints: GoogleEndpoints,
}

impl GoogleConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_uri: config.google_redirect_uri.clone(),
            endpoints: GoogleEndpoints::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GoogleApiError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Token expired or revoked")]
    AuthExpired,
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<GoogleApiError> for MailboxError {
    fn from(e: GoogleApiError) -> Self {
        match e {
            GoogleApiError::AuthExpired | GoogleApiError::RefreshFailed(_) => {
                MailboxError::Unauthorized(e.to_string())
            }
            GoogleApiError::Json(_) | GoogleApiError::Url(_) => MailboxError::Malformed(e.to_string()),
            GoogleApiError::Http(_) | GoogleApiError::ApiError { .. } => {
                MailboxError::Transport(e.to_string())
            }
        }
    }
}

/// Read a non-success response into an [`GoogleApiError::ApiError`]
pub(crate) async fn api_error(resp: reqwest::Response) -> GoogleApiError {
    let status = resp.status().as_u16();
    let message = resp.text().await.unwrap_or_default();
    GoogleApiError::ApiError { status, message }
}
