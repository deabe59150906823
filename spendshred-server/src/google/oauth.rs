//! OAuth2 web-server flow

use serde::Deserialize;

use super::{GoogleApiError, GoogleConfig, SCOPES, api_error};

/// Token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Only present on first consent (or with `prompt=consent`)
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    /// Absolute expiry in milliseconds, relative to `now_millis`
    pub fn expires_at(&self, now_millis: i64) -> Option<i64> {
        self.expires_in.map(|secs| now_millis + secs * 1000)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Consent screen URL with offline access
pub fn authorization_url(google: &GoogleConfig) -> Result<String, GoogleApiError> {
    let scope = SCOPES.join(" ");
    let url = url::Url::parse_with_params(
        &google.endpoints.auth_uri,
        &[
            ("response_type", "code"),
            ("client_id", google.client_id.as_str()),
            ("redirect_uri", google.redirect_uri.as_str()),
            ("scope", scope.as_str()),
            ("access_type", "offline"),
            ("include_granted_scopes", "true"),
            ("prompt", "consent"),
        ],
    )?;
    Ok(url.into())
}

pub async fn exchange_code(
    http: &reqwest::Client,
    google: &GoogleConfig,
    code: &str,
) -> Result<TokenResponse, GoogleApiError> {
    let resp = http
        .post(&google.endpoints.token_uri)
        .form(&[
            ("code", code),
            ("client_id", google.client_id.as_str()),
            ("client_secret", google.client_secret.as_str()),
            ("redirect_uri", google.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?;
    if !resp.status().is_success() {
        return Err(api_error(resp).await);
    }
    Ok(resp.json().await?)
}

/// Trade a refresh token for a new access token
pub async fn refresh_access_token(
    http: &reqwest::Client,
    google: &GoogleConfig,
    refresh_token: &str,
) -> Result<TokenResponse, GoogleApiError> {
    let resp = http
        .post(&google.endpoints.token_uri)
        .form(&[
            ("client_id", google.client_id.as_str()),
            ("client_secret", google.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .send()
        .await?;

    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(map_refresh_error(status.as_u16(), &body));
    }
    Ok(serde_json::from_str(&body)?)
}

fn map_refresh_error(status: u16, body: &str) -> GoogleApiError {
    let lowered = body.to_lowercase();
    if (status == 400 || status == 401)
        && (lowered.contains("invalid_grant") || lowered.contains("token has been expired"))
    {
        return GoogleApiError::AuthExpired;
    }
    GoogleApiError::RefreshFailed(format!("HTTP {status}: {body}"))
}

pub async fn fetch_userinfo(
    http: &reqwest::Client,
    google: &GoogleConfig,
    access_token: &str,
) -> Result<GoogleUserInfo, GoogleApiError> {
    let resp = http
        .get(&google.endpoints.userinfo_uri)
        .bearer_auth(access_token)
        .send()
        .await?;
    if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
        return Err(GoogleApiError::AuthExpired);
    }
    if !resp.status().is_success() {
        return Err(api_error(resp).await);
    }
    Ok(resp.json().await?)
}
