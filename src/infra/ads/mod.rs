// Google Ads infra layer.
// - `google_ads_client.rs` implements the core Ads trait over the REST API.

pub mod google_ads_client;

pub use google_ads_client::GoogleAdsApiClient;
