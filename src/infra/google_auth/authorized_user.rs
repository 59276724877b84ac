use std::time::SystemTime;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::core::settings::AdsAccount;

use super::{request_token, AuthError, TokenCache, TokenProvider, GOOGLE_TOKEN_URI};

/// The fields of an authorized-user token file (`token.json`) this tool needs.
#[derive(Debug, Clone, Deserialize)]
struct UserCredentials {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// Access tokens minted from a user's refresh token.
pub struct AuthorizedUserAuth {
    credentials: UserCredentials,
    client: Client,
    cache: TokenCache,
}

impl AuthorizedUserAuth {
    /// Reads a token file written by the consent flow. The file must hold a refresh token.
    pub async fn from_file(path: &str) -> Result<Self, AuthError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AuthError::Read {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let credentials: UserCredentials = serde_json::from_str(json)
            .map_err(|e| AuthError::Invalid(format!("token file: {}", e)))?;
        Ok(Self::new(credentials))
    }

    /// Uses the OAuth client and refresh token of a `google-ads.yaml` account.
    pub fn from_ads_account(account: &AdsAccount) -> Result<Self, AuthError> {
        match (
            &account.client_id,
            &account.client_secret,
            &account.refresh_token,
        ) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => {
                Ok(Self::new(UserCredentials {
                    client_id: client_id.clone(),
                    client_secret: client_secret.clone(),
                    refresh_token: refresh_token.clone(),
                    token_uri: default_token_uri(),
                }))
            }
            _ => Err(AuthError::Invalid(
                "the Ads account needs client_id, client_secret and refresh_token".to_string(),
            )),
        }
    }

    fn new(credentials: UserCredentials) -> Self {
        Self {
            credentials,
            client: Client::new(),
            cache: TokenCache::default(),
        }
    }
}

#[async_trait]
impl TokenProvider for AuthorizedUserAuth {
    async fn access_token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.cache.valid_at(SystemTime::now()).await {
            return Ok(token);
        }

        let requested_at = SystemTime::now();
        let response = request_token(
            &self.client,
            &self.credentials.token_uri,
            &[
                ("grant_type", "refresh_token"),
                ("client_id", &self.credentials.client_id),
                ("client_secret", &self.credentials.client_secret),
                ("refresh_token", &self.credentials.refresh_token),
            ],
        )
        .await?;
        self.cache
            .store(&response.access_token, requested_at + response.lifetime())
            .await;
        Ok(response.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn token_file_is_read_with_default_token_uri() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"token":"old","refresh_token":"r","client_id":"id","client_secret":"s","scopes":[]}}"#
        )
        .unwrap();

        let auth = AuthorizedUserAuth::from_file(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(auth.credentials.refresh_token, "r");
        assert_eq!(auth.credentials.token_uri, GOOGLE_TOKEN_URI);
    }

    #[tokio::test]
    async fn missing_token_file_reports_path() {
        let err = AuthorizedUserAuth::from_file("does/not/exist.json")
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("does/not/exist.json"));
    }

    #[test]
    fn ads_account_needs_all_three_oauth_fields() {
        let account: AdsAccount = serde_yaml::from_str(
            "developer_token: t\nclient_id: id\nclient_secret: s\n",
        )
        .unwrap();
        assert!(AuthorizedUserAuth::from_ads_account(&account).is_err());

        let account: AdsAccount = serde_yaml::from_str(
            "developer_token: t\nclient_id: id\nclient_secret: s\nrefresh_token: r\n",
        )
        .unwrap();
        assert!(AuthorizedUserAuth::from_ads_account(&account).is_ok());
    }
}
