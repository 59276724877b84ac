use std::path::Path;

use serde::de::DeserializeOwned;

use crate::core::settings::{AdsAccount, AppConfig, SettingsError};

async fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, SettingsError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SettingsError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    serde_yaml::from_str(&content).map_err(|e| SettingsError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Loads and validates the setup file.
pub async fn load_app_config(path: impl AsRef<Path>) -> Result<AppConfig, SettingsError> {
    let config: AppConfig = read_yaml(path.as_ref()).await?;
    config.validate()?;
    Ok(config)
}

/// Loads the `google-ads.yaml` account file named by `adsAccount`.
pub async fn load_ads_account(path: impl AsRef<Path>) -> Result<AdsAccount, SettingsError> {
    let account: AdsAccount = read_yaml(path.as_ref()).await?;
    if account.developer_token.trim().is_empty() {
        return Err(SettingsError::Invalid(
            "developer_token is empty in the Ads account file".to_string(),
        ));
    }
    if !account.has_refresh_token() && account.json_key_file_path.is_none() {
        return Err(SettingsError::Invalid(
            "the Ads account file needs either a refresh token or json_key_file_path".to_string(),
        ));
    }
    Ok(account)
}
