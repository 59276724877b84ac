// Google Ads feature.
// - `ads_client.rs` is the trait the REST client implements.
// - `ads_service.rs` builds the asset operations on top of it.
// - `performance.rs` holds the pure ranking and grading rules.

pub mod ads_client;
pub mod ads_models;
pub mod ads_service;
pub mod error_translation;
pub mod performance;

pub use ads_client::{AdAssetsRow, AdGroupAdRow, AdsClient, AdsError};
pub use ads_models::{
    AdAssets, AdGroupAd, AdType, AssetCounts, AssetMetrics, AssetPerformance, CampaignAdGroup,
    CreativeType, CustomerClient, ImageAsset, PerformanceLabel,
};
pub use ads_service::AdsService;
