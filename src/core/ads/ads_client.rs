use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use super::ads_models::{
    AdAssets, AdGroupAd, AdType, AssetMetrics, AssetPerformance, CampaignAdGroup, CreativeType,
    CustomerClient, ImageAsset,
};
use super::error_translation::translate_ads_error;

#[derive(Debug, Error)]
pub enum AdsError {
    /// Messages of a GoogleAdsFailure, untranslated.
    #[error("Google Ads API error: {}", .0.join(" "))]
    Failure(Vec<String>),
    #[error("Google Ads request failed: {0}")]
    Api(String),
    #[error("{0}")]
    Invalid(String),
}

impl AdsError {
    /// Text written back to the spreadsheet for this error.
    pub fn row_message(&self) -> String {
        match self {
            AdsError::Failure(messages) => messages
                .iter()
                .map(|m| translate_ads_error(m))
                .collect::<Vec<_>>()
                .join(" ")
                .trim_end()
                .to_string(),
            AdsError::Api(message) | AdsError::Invalid(message) => message.clone(),
        }
    }
}

/// Ad group ads of one customer, keyed by ad group id.
#[derive(Debug, Clone, PartialEq)]
pub struct AdGroupAdRow {
    pub ad_group_id: String,
    pub ad: AdGroupAd,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdAssetsRow {
    pub ad_group_id: String,
    pub ad_id: String,
    pub assets: AdAssets,
}

/// The Google Ads reads and mutates the pipeline needs. Customer ids are digits only.
#[async_trait]
pub trait AdsClient: Send + Sync {
    /// Resource names (`customers/123`) reachable with the current credentials.
    async fn list_accessible_customers(&self) -> Result<Vec<String>, AdsError>;

    /// Enabled clients at level 0 or 1 below `customer_id`.
    async fn customer_clients(&self, customer_id: &str) -> Result<Vec<CustomerClient>, AdsError>;

    /// Enabled ad groups of enabled app campaigns.
    async fn campaign_ad_groups(&self, customer_id: &str)
        -> Result<Vec<CampaignAdGroup>, AdsError>;

    async fn ad_group_ads(&self, customer_id: &str) -> Result<Vec<AdGroupAdRow>, AdsError>;

    async fn ad_assets(
        &self,
        customer_id: &str,
        ad_ids: &[String],
    ) -> Result<Vec<AdAssetsRow>, AdsError>;

    /// Labelled assets of one field type over the last 14 days.
    async fn asset_performance(
        &self,
        customer_id: &str,
        ad_group_id: &str,
        creative: CreativeType,
    ) -> Result<Vec<AssetPerformance>, AdsError>;

    /// Labelled asset metrics between `start` and `end` inclusive. Text assets are
    /// filtered by `text` server side.
    async fn asset_metrics(
        &self,
        customer_id: &str,
        ad_group_id: &str,
        creative: CreativeType,
        text: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AssetMetrics>, AdsError>;

    async fn text_asset_value(
        &self,
        customer_id: &str,
        asset_resource_name: &str,
    ) -> Result<Option<String>, AdsError>;

    async fn image_assets(&self, customer_id: &str) -> Result<Vec<ImageAsset>, AdsError>;

    /// Returns the new asset resource name.
    async fn create_youtube_asset(
        &self,
        customer_id: &str,
        youtube_id: &str,
    ) -> Result<String, AdsError>;

    /// Returns the new asset resource name.
    async fn create_image_asset(
        &self,
        customer_id: &str,
        name: &str,
        data: &[u8],
    ) -> Result<String, AdsError>;

    /// Replaces one asset list of an ad with `assets`.
    async fn update_ad_assets(
        &self,
        customer_id: &str,
        ad_id: &str,
        ad_type: AdType,
        creative: CreativeType,
        assets: &[String],
    ) -> Result<(), AdsError>;
}
