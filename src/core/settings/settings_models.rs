use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Value left in the sample setup file when no service account is configured.
pub const SERVICE_ACCOUNT_PLACEHOLDER: &str = "PATH_TO_SERVICE_JSON";
/// Value left in the sample setup file when no OAuth client is configured.
pub const CLIENT_SECRET_PLACEHOLDER: &str = "PATH_TO_CLIENT_SECRET_JSON";

pub const DEFAULT_SETUP_FILE: &str = "config/setup.yaml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// How the mapping refresh fills the alias column for new ad groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DefaultAlias {
    #[default]
    None,
    AppId,
    CampaignName,
}

/// Contents of `config/setup.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub spreadsheet_ids: Vec<String>,
    #[serde(default)]
    pub service_account: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub ads_account: String,
    #[serde(default)]
    pub youtube_secret: Option<String>,
    #[serde(default)]
    pub youtube_service_enable: bool,
    /// Look-back window for channel uploads, in months.
    #[serde(default)]
    pub youtube_window: Option<u32>,
    #[serde(default)]
    pub drive_folder_ids: Option<Vec<String>>,
    #[serde(default)]
    pub refresh_mapping_sheet_enable: bool,
    #[serde(default = "default_token_file")]
    pub token_file: String,
    #[serde(default = "default_youtube_token_file")]
    pub youtube_token_file: String,
    #[serde(default)]
    pub text_asset_auto_modify: bool,
    #[serde(default)]
    pub remove_by_performance_enable: bool,
    #[serde(default)]
    pub default_alias: DefaultAlias,
}

fn default_token_file() -> String {
    "token.json".to_string()
}

fn default_youtube_token_file() -> String {
    "config/yt_token.json".to_string()
}

/// Which credential the Sheets/Drive (and possibly Ads) clients authenticate with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    AuthorizedUser { token_file: String },
    ServiceAccount { key_file: String },
}

fn configured(value: &Option<String>, placeholder: &str) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != placeholder)
        .map(str::to_string)
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.spreadsheet_ids.iter().all(|id| id.trim().is_empty()) {
            return Err(SettingsError::Invalid(
                "spreadsheetIds must contain at least one spreadsheet id".to_string(),
            ));
        }
        if self.ads_account.trim().is_empty() {
            return Err(SettingsError::Invalid("adsAccount is empty".to_string()));
        }
        self.credential_source()?;
        Ok(())
    }

    pub fn service_account_path(&self) -> Option<String> {
        configured(&self.service_account, SERVICE_ACCOUNT_PLACEHOLDER)
    }

    pub fn client_secret_path(&self) -> Option<String> {
        configured(&self.client_secret, CLIENT_SECRET_PLACEHOLDER)
    }

    /// A configured OAuth client wins over the service account.
    pub fn credential_source(&self) -> Result<CredentialSource, SettingsError> {
        if self.client_secret_path().is_some() {
            return Ok(CredentialSource::AuthorizedUser {
                token_file: self.token_file.clone(),
            });
        }
        if let Some(key_file) = self.service_account_path() {
            return Ok(CredentialSource::ServiceAccount { key_file });
        }
        Err(SettingsError::Invalid(
            "Neither serviceAccount nor clientSecret is configured".to_string(),
        ))
    }

    pub fn drive_folders(&self) -> Vec<String> {
        self.drive_folder_ids
            .clone()
            .unwrap_or_default()
            .into_iter()
            .filter(|id| !id.trim().is_empty())
            .collect()
    }
}

/// Contents of the `google-ads.yaml` account file.
#[derive(Debug, Clone, Deserialize)]
pub struct AdsAccount {
    pub developer_token: String,
    #[serde(default, deserialize_with = "customer_id_opt")]
    pub login_customer_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub json_key_file_path: Option<String>,
    #[serde(default)]
    pub impersonated_email: Option<String>,
}

impl AdsAccount {
    pub fn has_refresh_token(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some() && self.refresh_token.is_some()
    }
}

/// `login_customer_id` may be written as a bare number or a dashed string.
fn customer_id_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    let raw = Option::<Raw>::deserialize(deserializer)?;
    Ok(raw
        .map(|value| match value {
            Raw::Number(n) => n.to_string(),
            Raw::Text(s) => s.replace('-', "").trim().to_string(),
        })
        .filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(yaml: &str) -> AppConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn optional_keys_fall_back_to_defaults() {
        let cfg = config(
            "spreadsheetIds: [abc]\nserviceAccount: sa.json\nadsAccount: google-ads.yaml\n",
        );
        assert!(!cfg.youtube_service_enable);
        assert!(!cfg.refresh_mapping_sheet_enable);
        assert_eq!(cfg.youtube_window, None);
        assert_eq!(cfg.token_file, "token.json");
        assert_eq!(cfg.youtube_token_file, "config/yt_token.json");
        assert_eq!(cfg.default_alias, DefaultAlias::None);
        assert!(cfg.drive_folders().is_empty());
    }

    #[test]
    fn placeholder_client_secret_selects_service_account() {
        let cfg = config(
            "spreadsheetIds: [abc]\nserviceAccount: sa.json\nclientSecret: PATH_TO_CLIENT_SECRET_JSON\nadsAccount: ads.yaml\n",
        );
        assert_eq!(
            cfg.credential_source().unwrap(),
            CredentialSource::ServiceAccount {
                key_file: "sa.json".to_string()
            }
        );
    }

    #[test]
    fn client_secret_wins_over_service_account() {
        let cfg = config(
            "spreadsheetIds: [abc]\nserviceAccount: sa.json\nclientSecret: client.json\nadsAccount: ads.yaml\ntokenFile: my_token.json\n",
        );
        assert_eq!(
            cfg.credential_source().unwrap(),
            CredentialSource::AuthorizedUser {
                token_file: "my_token.json".to_string()
            }
        );
    }

    #[test]
    fn missing_credentials_fail_validation() {
        let cfg = config(
            "spreadsheetIds: [abc]\nserviceAccount: PATH_TO_SERVICE_JSON\nadsAccount: ads.yaml\n",
        );
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn default_alias_parses_camel_case() {
        let cfg = config(
            "spreadsheetIds: [abc]\nserviceAccount: sa.json\nadsAccount: ads.yaml\ndefaultAlias: campaignName\n",
        );
        assert_eq!(cfg.default_alias, DefaultAlias::CampaignName);
    }

    #[test]
    fn login_customer_id_accepts_numbers_and_dashes() {
        let numeric: AdsAccount =
            serde_yaml::from_str("developer_token: t\nlogin_customer_id: 1234567890\n").unwrap();
        assert_eq!(numeric.login_customer_id.as_deref(), Some("1234567890"));

        let dashed: AdsAccount =
            serde_yaml::from_str("developer_token: t\nlogin_customer_id: \"123-456-7890\"\n")
                .unwrap();
        assert_eq!(dashed.login_customer_id.as_deref(), Some("1234567890"));

        let missing: AdsAccount = serde_yaml::from_str("developer_token: t\n").unwrap();
        assert_eq!(missing.login_customer_id, None);
        assert!(!missing.has_refresh_token());
    }
}
