// This is the entry point of the creative management tool.
//
// **Architecture Overview:**
// - `core/` = Business logic (pipeline stages, sheet layout, Ads rules)
// - `infra/` = Implementations of core traits (Google REST clients, config files)
//
// This file's job is to:
// 1. Load configuration
// 2. Build the authenticated API clients (dependency injection)
// 3. Run the requested pipeline stage(s)

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};

use crate::core::ads::AdsService;
use crate::core::pipeline::{Pipeline, PipelineSettings, Stage, UploaderOptions};
use crate::core::settings::{AdsAccount, AppConfig, CredentialSource, DEFAULT_SETUP_FILE};
use crate::infra::ads::GoogleAdsApiClient;
use crate::infra::google_auth::{scopes, AuthorizedUserAuth, ServiceAccountAuth, TokenProvider};
use crate::infra::media::{DriveApiClient, YoutubeApiClient};
use crate::infra::settings::{load_ads_account, load_app_config};
use crate::infra::sheets::SheetsApiClient;

#[derive(Debug, Parser)]
#[command(name = "creative_mango", about = "Spreadsheet driven creative management for app campaigns")]
struct Cli {
    /// Path to the setup file.
    #[arg(long, env = "CREATIVE_MANGO_CONFIG", default_value = DEFAULT_SETUP_FILE)]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Run every stage in order (the default).
    Run,
    /// Add new Drive and YouTube media to the Upload sheet.
    GetFiles,
    /// Remove expired or underperforming creatives.
    Remove,
    /// Upload the creatives listed in the Upload sheet.
    Upload,
    /// Rebuild the Mapping sheet from the Ads account.
    RefreshMapping,
}

impl Command {
    fn stage(self) -> Option<Stage> {
        match self {
            Command::Run => None,
            Command::GetFiles => Some(Stage::GetFiles),
            Command::Remove => Some(Stage::RemoveCreatives),
            Command::Upload => Some(Stage::UploadCreatives),
            Command::RefreshMapping => Some(Stage::RefreshMapping),
        }
    }
}

/// Credentials for Sheets and Drive.
async fn workspace_auth(config: &AppConfig) -> Result<Arc<dyn TokenProvider>> {
    let provider: Arc<dyn TokenProvider> = match config.credential_source()? {
        CredentialSource::AuthorizedUser { token_file } => {
            Arc::new(AuthorizedUserAuth::from_file(&token_file).await?)
        }
        CredentialSource::ServiceAccount { key_file } => Arc::new(
            ServiceAccountAuth::from_file(&key_file, &[scopes::DRIVE, scopes::SPREADSHEETS])
                .await?,
        ),
    };
    Ok(provider)
}

/// Credentials for Google Ads: the account file's refresh token, or its service account key.
async fn ads_auth(account: &AdsAccount) -> Result<Arc<dyn TokenProvider>> {
    if account.has_refresh_token() {
        return Ok(Arc::new(AuthorizedUserAuth::from_ads_account(account)?));
    }
    let key_file = account
        .json_key_file_path
        .as_deref()
        .context("The Ads account file has no credentials")?;
    let auth = ServiceAccountAuth::from_file(key_file, &[scopes::ADWORDS])
        .await?
        .impersonating(account.impersonated_email.clone());
    Ok(Arc::new(auth))
}

fn pipeline_settings(config: &AppConfig, account: &AdsAccount) -> PipelineSettings {
    PipelineSettings {
        spreadsheet_ids: config
            .spreadsheet_ids
            .iter()
            .filter(|id| !id.trim().is_empty())
            .cloned()
            .collect(),
        drive_folder_ids: config.drive_folders(),
        youtube_window_months: config
            .youtube_service_enable
            .then_some(config.youtube_window)
            .flatten(),
        refresh_mapping: config.refresh_mapping_sheet_enable,
        login_customer_id: account.login_customer_id.clone(),
        default_alias: config.default_alias,
        uploader: UploaderOptions {
            text_auto_modify: config.text_asset_auto_modify,
            remove_by_performance: config.remove_by_performance_enable,
        },
        ..Default::default()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = load_app_config(&cli.config)
        .await
        .with_context(|| format!("Unable to load {}", cli.config))?;
    let account = load_ads_account(&config.ads_account).await?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let workspace = workspace_auth(&config).await?;
    let sheets = SheetsApiClient::new(workspace.clone());
    let drive = DriveApiClient::new(workspace);

    let ads = AdsService::new(GoogleAdsApiClient::new(ads_auth(&account).await?, &account));

    let youtube = if config.youtube_service_enable {
        let auth = AuthorizedUserAuth::from_file(&config.youtube_token_file)
            .await
            .context("YouTube is enabled but its token file could not be used")?;
        Some(YoutubeApiClient::new(Arc::new(auth)))
    } else {
        None
    };

    let pipeline = Pipeline::new(
        &sheets,
        &ads,
        &drive,
        youtube.as_ref(),
        pipeline_settings(&config, &account),
    );

    match cli.command.unwrap_or(Command::Run).stage() {
        None => pipeline.run_all().await,
        Some(stage) => pipeline.run_stage(stage, Local::now()).await?,
    }
    Ok(())
}
