// Google OAuth2 access tokens for the REST clients.
// - `service_account.rs` exchanges a signed JWT for a token.
// - `authorized_user.rs` refreshes a stored user refresh token.

pub mod authorized_user;
pub mod service_account;

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;

pub use authorized_user::AuthorizedUserAuth;
pub use service_account::ServiceAccountAuth;

pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

pub mod scopes {
    pub const DRIVE: &str = "https://www.googleapis.com/auth/drive";
    pub const SPREADSHEETS: &str = "https://www.googleapis.com/auth/spreadsheets";
    pub const ADWORDS: &str = "https://www.googleapis.com/auth/adwords";
    pub const YOUTUBE_READONLY: &str = "https://www.googleapis.com/auth/youtube.readonly";
    pub const YOUTUBE_UPLOAD: &str = "https://www.googleapis.com/auth/youtube.upload";
}

/// A token is refreshed once it has less than this left.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const DEFAULT_LIFETIME: Duration = Duration::from_secs(55 * 60);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to read credentials from {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("Invalid credentials: {0}")]
    Invalid(String),
    #[error("Failed to sign token request: {0}")]
    Sign(String),
    #[error("Token request failed: {0}")]
    Request(String),
    #[error("Token exchange failed ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Bearer tokens for Google APIs.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, AuthError>;
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl TokenResponse {
    fn lifetime(&self) -> Duration {
        self.expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_LIFETIME)
    }
}

struct CachedToken {
    token: String,
    expires_at: SystemTime,
}

#[derive(Default)]
struct TokenCache {
    cached: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    async fn valid_at(&self, now: SystemTime) -> Option<String> {
        let cached = self.cached.read().await;
        cached
            .as_ref()
            .filter(|token| token.expires_at > now + EXPIRY_MARGIN)
            .map(|token| token.token.clone())
    }

    async fn store(&self, token: &str, expires_at: SystemTime) {
        let mut cached = self.cached.write().await;
        *cached = Some(CachedToken {
            token: token.to_string(),
            expires_at,
        });
    }
}

/// Posts a token request form and reads the access token out of the reply.
async fn request_token(
    client: &reqwest::Client,
    token_uri: &str,
    form: &[(&str, &str)],
) -> Result<TokenResponse, AuthError> {
    let response = client
        .post(token_uri)
        .form(form)
        .send()
        .await
        .map_err(|e| AuthError::Request(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;
        return Err(AuthError::Rejected { status, body });
    }

    response
        .json()
        .await
        .map_err(|e| AuthError::Request(e.to_string()))
}
