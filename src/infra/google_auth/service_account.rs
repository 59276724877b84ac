use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{request_token, AuthError, TokenCache, TokenProvider, GOOGLE_TOKEN_URI};

/// Service account credentials from the JSON key file.
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    /// PEM encoded.
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// JWT claims for Google OAuth2.
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: u64,
    exp: u64,
    /// Impersonated user for domain-wide delegation.
    #[serde(skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
}

/// Access tokens for a service account, cached until shortly before they expire.
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    scopes: Vec<String>,
    subject: Option<String>,
    client: Client,
    cache: TokenCache,
}

impl ServiceAccountAuth {
    pub async fn from_file(path: &str, scopes: &[&str]) -> Result<Self, AuthError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AuthError::Read {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        Self::from_json(&content, scopes)
    }

    pub fn from_json(json: &str, scopes: &[&str]) -> Result<Self, AuthError> {
        let key: ServiceAccountKey =
            serde_json::from_str(json).map_err(|e| AuthError::Invalid(e.to_string()))?;
        Ok(Self {
            key,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            subject: None,
            client: Client::new(),
            cache: TokenCache::default(),
        })
    }

    /// Acts on behalf of `email` (domain-wide delegation).
    pub fn impersonating(mut self, email: Option<String>) -> Self {
        self.subject = email.filter(|e| !e.trim().is_empty());
        self
    }

    fn claims(&self, now: u64) -> JwtClaims {
        JwtClaims {
            iss: self.key.client_email.clone(),
            scope: self.scopes.join(" "),
            aud: self.key.token_uri.clone(),
            iat: now,
            exp: now + 3600,
            sub: self.subject.clone(),
        }
    }

    async fn fetch_new_token(&self) -> Result<(String, SystemTime), AuthError> {
        let requested_at = SystemTime::now();
        let now = requested_at
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AuthError::Sign(e.to_string()))?
            .as_secs();

        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| AuthError::Invalid(e.to_string()))?;
        let jwt = encode(&Header::new(Algorithm::RS256), &self.claims(now), &key)
            .map_err(|e| AuthError::Sign(e.to_string()))?;

        let response = request_token(
            &self.client,
            &self.key.token_uri,
            &[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ],
        )
        .await?;
        let expires_at = requested_at + response.lifetime();
        Ok((response.access_token, expires_at))
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountAuth {
    async fn access_token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.cache.valid_at(SystemTime::now()).await {
            return Ok(token);
        }
        let (token, expires_at) = self.fetch_new_token().await?;
        self.cache.store(&token, expires_at).await;
        Ok(token)
    }
}
