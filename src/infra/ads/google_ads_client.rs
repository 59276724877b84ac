use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::core::ads::{
    AdAssets, AdAssetsRow, AdGroupAd, AdGroupAdRow, AdType, AdsClient, AdsError, AssetMetrics,
    AssetPerformance, CampaignAdGroup, CreativeType, CustomerClient, ImageAsset, PerformanceLabel,
};
use crate::core::settings::AdsAccount;
use crate::infra::google_auth::TokenProvider;

const ADS_API: &str = "https://googleads.googleapis.com/v18";

const CUSTOMER_CLIENT_QUERY: &str = "SELECT customer_client.client_customer, \
    customer_client.level, customer_client.manager, customer_client.descriptive_name, \
    customer_client.id FROM customer_client WHERE customer_client.level <= 1 \
    AND customer_client.status = \"ENABLED\"";

const CAMPAIGN_AD_GROUP_QUERY: &str = "SELECT campaign.id, campaign.name, \
    campaign.app_campaign_setting.app_id, ad_group.id, ad_group.name FROM ad_group \
    WHERE campaign.advertising_channel_type = \"MULTI_CHANNEL\" \
    AND campaign.advertising_channel_sub_type IN (\"APP_CAMPAIGN\", \"APP_CAMPAIGN_FOR_ENGAGEMENT\") \
    AND campaign.status = \"ENABLED\" AND ad_group.status = \"ENABLED\"";

const AD_GROUP_AD_QUERY: &str =
    "SELECT ad_group.id, ad_group_ad.ad.id, ad_group_ad.ad.type FROM ad_group_ad";

const AD_ASSETS_FIELDS: &str = "SELECT ad_group.id, ad_group_ad.ad.id, \
    ad_group_ad.ad.app_ad.descriptions, ad_group_ad.ad.app_ad.headlines, \
    ad_group_ad.ad.app_ad.youtube_videos, ad_group_ad.ad.app_ad.images, \
    ad_group_ad.ad.app_engagement_ad.descriptions, ad_group_ad.ad.app_engagement_ad.headlines, \
    ad_group_ad.ad.app_engagement_ad.videos, ad_group_ad.ad.app_engagement_ad.images \
    FROM ad_group_ad";

const IMAGE_ASSET_QUERY: &str = "SELECT asset.id, asset.name, asset.type, \
    asset.image_asset.full_size.url FROM asset WHERE asset.type IN (\"IMAGE\")";

/// Accepts int64 values both as JSON strings (the REST encoding) and as numbers.
fn int64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

fn id_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    int64(deserializer).map(|n| n.to_string())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Row {
    customer_client: Option<ApiCustomerClient>,
    campaign: Option<ApiCampaign>,
    ad_group: Option<ApiAdGroup>,
    ad_group_ad: Option<ApiAdGroupAd>,
    ad_group_ad_asset_view: Option<ApiAssetView>,
    asset: Option<ApiAsset>,
    metrics: Option<ApiMetrics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCustomerClient {
    #[serde(deserialize_with = "id_text")]
    id: String,
    #[serde(default, deserialize_with = "int64")]
    level: i64,
    #[serde(default)]
    manager: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCampaign {
    #[serde(deserialize_with = "id_text")]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    app_campaign_setting: Option<AppCampaignSetting>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppCampaignSetting {
    #[serde(default)]
    app_id: String,
}

#[derive(Debug, Deserialize)]
struct ApiAdGroup {
    #[serde(deserialize_with = "id_text")]
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiAdGroupAd {
    ad: ApiAd,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiAd {
    #[serde(deserialize_with = "id_text")]
    id: String,
    #[serde(default, rename = "type")]
    ad_type: Option<String>,
    #[serde(default)]
    app_ad: Option<ApiAppAd>,
    #[serde(default)]
    app_engagement_ad: Option<ApiAppAd>,
}

/// Asset lists shared by app ads and app engagement ads.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ApiAppAd {
    headlines: Vec<TextAsset>,
    descriptions: Vec<TextAsset>,
    images: Vec<MediaAsset>,
    youtube_videos: Vec<MediaAsset>,
    videos: Vec<MediaAsset>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TextAsset {
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MediaAsset {
    asset: String,
}

impl ApiAppAd {
    fn into_assets(self) -> AdAssets {
        let media = |list: Vec<MediaAsset>| -> Vec<String> { list.into_iter().map(|m| m.asset).collect() };
        let mut videos: Vec<String> = media(self.youtube_videos);
        videos.extend(media(self.videos));
        AdAssets {
            headlines: self.headlines.into_iter().map(|t| t.text).collect(),
            descriptions: self.descriptions.into_iter().map(|t| t.text).collect(),
            images: media(self.images),
            videos,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ApiAssetView {
    asset: String,
    performance_label: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ApiAsset {
    resource_name: String,
    name: String,
    text_asset: Option<TextAsset>,
    image_asset: Option<ApiImageAsset>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ApiImageAsset {
    full_size: Option<ImageSize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImageSize {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ApiMetrics {
    #[serde(deserialize_with = "int64")]
    cost_micros: i64,
    #[serde(deserialize_with = "int64")]
    impressions: i64,
    #[serde(deserialize_with = "int64")]
    clicks: i64,
    conversions: f64,
    conversions_value: f64,
    ctr: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchPage {
    #[serde(default)]
    results: Vec<Row>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessibleCustomers {
    #[serde(default)]
    resource_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutateResponse {
    #[serde(default)]
    results: Vec<MutateResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutateResult {
    resource_name: String,
}

/// Google Ads REST client. Every call carries the developer token and, when
/// configured, the manager account as `login-customer-id`.
pub struct GoogleAdsApiClient {
    client: Client,
    auth: Arc<dyn TokenProvider>,
    developer_token: String,
    login_customer_id: Option<String>,
}

impl GoogleAdsApiClient {
    pub fn new(auth: Arc<dyn TokenProvider>, account: &AdsAccount) -> Self {
        Self {
            client: Client::new(),
            auth,
            developer_token: account.developer_token.clone(),
            login_customer_id: account.login_customer_id.clone(),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, AdsError> {
        let token = self
            .auth
            .access_token()
            .await
            .map_err(|e| AdsError::Api(e.to_string()))?;
        let mut request = request
            .bearer_auth(token)
            .header("developer-token", &self.developer_token);
        if let Some(login) = &self.login_customer_id {
            request = request.header("login-customer-id", login);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AdsError::Api(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdsError::Api(e.to_string()))?;
        if !status.is_success() {
            return Err(failure_from_body(status.as_u16(), &body));
        }
        serde_json::from_str(&body).map_err(|e| AdsError::Api(e.to_string()))
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, AdsError> {
        self.call(self.client.post(format!("{}/{}", ADS_API, path)).json(&body))
            .await
    }

    /// Runs a GAQL query and collects every page.
    async fn search(&self, customer_id: &str, query: &str) -> Result<Vec<Row>, AdsError> {
        let path = format!("customers/{}/googleAds:search", customer_id);
        let mut rows = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut body = json!({ "query": query });
            if let Some(token) = &page_token {
                body["pageToken"] = json!(token);
            }
            let page: SearchPage = self.post(&path, body).await?;
            rows.extend(page.results);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        debug!("{} rows from customer {}", rows.len(), customer_id);
        Ok(rows)
    }

    async fn create_asset(&self, customer_id: &str, asset: Value) -> Result<String, AdsError> {
        let response: MutateResponse = self
            .post(
                &format!("customers/{}/assets:mutate", customer_id),
                json!({ "operations": [{ "create": asset }] }),
            )
            .await?;
        response
            .results
            .into_iter()
            .next()
            .map(|r| r.resource_name)
            .ok_or_else(|| AdsError::Api("asset mutate returned no result".to_string()))
    }
}

/// Turns an error body into the messages of its GoogleAdsFailure, falling
/// back to the top level status message.
fn failure_from_body(status: u16, body: &str) -> AdsError {
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let error = &parsed["error"];
    let messages: Vec<String> = error["details"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|detail| detail["errors"].as_array())
        .flatten()
        .filter_map(|e| e["message"].as_str().map(str::to_string))
        .collect();
    if !messages.is_empty() {
        return AdsError::Failure(messages);
    }
    match error["message"].as_str() {
        Some(message) => AdsError::Api(format!("{} {}", status, message)),
        None => AdsError::Api(format!("{} {}", status, body)),
    }
}

/// GAQL string literal.
fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// `app_ad.youtube_videos` -> `appAd.youtubeVideos`, the JSON form of a field mask.
fn json_field_mask(mask: &str) -> String {
    mask.split('.')
        .map(|part| {
            let mut out = String::with_capacity(part.len());
            let mut upper = false;
            for c in part.chars() {
                if c == '_' {
                    upper = true;
                } else if upper {
                    out.extend(c.to_uppercase());
                    upper = false;
                } else {
                    out.push(c);
                }
            }
            out
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn asset_list_json(creative: CreativeType, assets: &[String]) -> Value {
    let key = if creative.is_text() { "text" } else { "asset" };
    Value::Array(
        assets
            .iter()
            .map(|a| {
                let mut entry = Map::new();
                entry.insert(key.to_string(), json!(a));
                Value::Object(entry)
            })
            .collect(),
    )
}

fn performance_query(ad_group_id: &str, creative: CreativeType) -> String {
    format!(
        "SELECT ad_group_ad_asset_view.performance_label, ad_group_ad_asset_view.asset, \
         ad_group_ad_asset_view.field_type, metrics.cost_micros, metrics.conversions \
         FROM ad_group_ad_asset_view WHERE ad_group.id = {} \
         AND ad_group_ad_asset_view.enabled = True AND segments.date DURING LAST_14_DAYS \
         AND ad_group_ad_asset_view.performance_label IN (\"BEST\", \"GOOD\", \"LOW\") \
         AND ad_group_ad_asset_view.field_type = \"{}\"",
        ad_group_id,
        creative.field_type()
    )
}

fn metrics_query(
    ad_group_id: &str,
    creative: CreativeType,
    text: Option<&str>,
    start: NaiveDate,
    end: NaiveDate,
) -> String {
    let mut query = format!(
        "SELECT ad_group_ad_asset_view.asset, ad_group_ad_asset_view.field_type, \
         ad_group_ad_asset_view.performance_label, asset.text_asset.text, metrics.impressions, \
         metrics.conversions, metrics.conversions_value, metrics.ctr, metrics.clicks \
         FROM ad_group_ad_asset_view WHERE ad_group.id = {} \
         AND segments.date BETWEEN \"{}\" AND \"{}\" \
         AND ad_group_ad_asset_view.field_type = \"{}\" \
         AND ad_group_ad_asset_view.enabled = True \
         AND ad_group_ad_asset_view.performance_label IN (\"LOW\", \"GOOD\", \"BEST\")",
        ad_group_id,
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d"),
        creative.field_type()
    );
    if let Some(text) = text {
        query.push_str(&format!(" AND asset.text_asset.text = {}", quoted(text)));
    }
    query
}

#[async_trait]
impl AdsClient for GoogleAdsApiClient {
    async fn list_accessible_customers(&self) -> Result<Vec<String>, AdsError> {
        let response: AccessibleCustomers = self
            .call(
                self.client
                    .get(format!("{}/customers:listAccessibleCustomers", ADS_API)),
            )
            .await?;
        Ok(response.resource_names)
    }

    async fn customer_clients(&self, customer_id: &str) -> Result<Vec<CustomerClient>, AdsError> {
        let rows = self.search(customer_id, CUSTOMER_CLIENT_QUERY).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.customer_client)
            .map(|c| CustomerClient {
                customer_id: c.id,
                level: c.level.max(0) as u32,
                manager: c.manager,
            })
            .collect())
    }

    async fn campaign_ad_groups(
        &self,
        customer_id: &str,
    ) -> Result<Vec<CampaignAdGroup>, AdsError> {
        let rows = self.search(customer_id, CAMPAIGN_AD_GROUP_QUERY).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let campaign = row.campaign?;
                let ad_group = row.ad_group?;
                Some(CampaignAdGroup {
                    campaign_id: campaign.id,
                    campaign_name: campaign.name,
                    app_id: campaign
                        .app_campaign_setting
                        .map(|s| s.app_id)
                        .unwrap_or_default(),
                    ad_group_id: ad_group.id,
                    ad_group_name: ad_group.name,
                })
            })
            .collect())
    }

    async fn ad_group_ads(&self, customer_id: &str) -> Result<Vec<AdGroupAdRow>, AdsError> {
        let rows = self.search(customer_id, AD_GROUP_AD_QUERY).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let ad = row.ad_group_ad?.ad;
                let ad_type = AdType::from_api(ad.ad_type.as_deref()?)?;
                Some(AdGroupAdRow {
                    ad_group_id: row.ad_group?.id,
                    ad: AdGroupAd {
                        ad_id: ad.id,
                        ad_type,
                    },
                })
            })
            .collect())
    }

    async fn ad_assets(
        &self,
        customer_id: &str,
        ad_ids: &[String],
    ) -> Result<Vec<AdAssetsRow>, AdsError> {
        if ad_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "{} WHERE ad_group_ad.ad.id IN ({})",
            AD_ASSETS_FIELDS,
            ad_ids.join(",")
        );
        let rows = self.search(customer_id, &query).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let ad = row.ad_group_ad?.ad;
                let assets = ad.app_ad.or(ad.app_engagement_ad).unwrap_or_default();
                Some(AdAssetsRow {
                    ad_group_id: row.ad_group?.id,
                    ad_id: ad.id,
                    assets: assets.into_assets(),
                })
            })
            .collect())
    }

    async fn asset_performance(
        &self,
        customer_id: &str,
        ad_group_id: &str,
        creative: CreativeType,
    ) -> Result<Vec<AssetPerformance>, AdsError> {
        let rows = self
            .search(customer_id, &performance_query(ad_group_id, creative))
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let view = row.ad_group_ad_asset_view?;
                let label = PerformanceLabel::from_api(view.performance_label.as_deref()?)?;
                let metrics = row.metrics.unwrap_or_default();
                Some(AssetPerformance {
                    asset: view.asset,
                    label,
                    cost_micros: metrics.cost_micros,
                    conversions: metrics.conversions,
                })
            })
            .collect())
    }

    async fn asset_metrics(
        &self,
        customer_id: &str,
        ad_group_id: &str,
        creative: CreativeType,
        text: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AssetMetrics>, AdsError> {
        let query = metrics_query(ad_group_id, creative, text, start, end);
        let rows = self.search(customer_id, &query).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let view = row.ad_group_ad_asset_view?;
                let asset_id = if creative.is_text() {
                    row.asset?.text_asset?.text
                } else {
                    view.asset
                };
                let metrics = row.metrics.unwrap_or_default();
                Some(AssetMetrics {
                    asset_id,
                    label: view
                        .performance_label
                        .as_deref()
                        .and_then(PerformanceLabel::from_api),
                    impressions: metrics.impressions,
                    conversions: metrics.conversions,
                    conversions_value: metrics.conversions_value,
                    ctr: metrics.ctr,
                    clicks: metrics.clicks,
                })
            })
            .collect())
    }

    async fn text_asset_value(
        &self,
        customer_id: &str,
        asset_resource_name: &str,
    ) -> Result<Option<String>, AdsError> {
        let query = format!(
            "SELECT asset.resource_name, asset.text_asset.text FROM asset \
             WHERE asset.resource_name = {}",
            quoted(asset_resource_name)
        );
        let rows = self.search(customer_id, &query).await?;
        Ok(rows
            .into_iter()
            .find_map(|row| row.asset?.text_asset.map(|t| t.text)))
    }

    async fn image_assets(&self, customer_id: &str) -> Result<Vec<ImageAsset>, AdsError> {
        let rows = self.search(customer_id, IMAGE_ASSET_QUERY).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let asset = row.asset?;
                let url = asset
                    .image_asset
                    .and_then(|image| image.full_size)
                    .map(|size| size.url)
                    .unwrap_or_default();
                Some(ImageAsset {
                    resource_name: asset.resource_name,
                    name: asset.name,
                    url,
                })
            })
            .collect())
    }

    async fn create_youtube_asset(
        &self,
        customer_id: &str,
        youtube_id: &str,
    ) -> Result<String, AdsError> {
        self.create_asset(
            customer_id,
            json!({ "youtubeVideoAsset": { "youtubeVideoId": youtube_id } }),
        )
        .await
    }

    async fn create_image_asset(
        &self,
        customer_id: &str,
        name: &str,
        data: &[u8],
    ) -> Result<String, AdsError> {
        self.create_asset(
            customer_id,
            json!({
                "name": name,
                "type": "IMAGE",
                "imageAsset": { "data": BASE64.encode(data) },
            }),
        )
        .await
    }

    async fn update_ad_assets(
        &self,
        customer_id: &str,
        ad_id: &str,
        ad_type: AdType,
        creative: CreativeType,
        assets: &[String],
    ) -> Result<(), AdsError> {
        let mut lists = Map::new();
        lists.insert(
            ad_type.list_field(creative).to_string(),
            asset_list_json(creative, assets),
        );
        let mut ad = json!({ "resourceName": format!("customers/{}/ads/{}", customer_id, ad_id) });
        ad[ad_type.payload_key()] = Value::Object(lists);
        let _: Value = self
            .post(
                &format!("customers/{}/ads:mutate", customer_id),
                json!({
                    "operations": [{
                        "update": ad,
                        "updateMask": json_field_mask(&ad_type.update_mask(creative)),
                    }]
                }),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_messages_come_from_error_details() {
        let body = r#"{"error":{"code":400,"message":"Request contains an invalid argument.",
            "details":[{"@type":"type.googleapis.com/google.ads.googleads.v18.errors.GoogleAdsFailure",
            "errors":[{"errorCode":{"fieldError":"REQUIRED"},"message":"Too short."},
                      {"message":"Too many."}]}]}}"#;
        match failure_from_body(400, body) {
            AdsError::Failure(messages) => assert_eq!(messages, vec!["Too short.", "Too many."]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn plain_errors_fall_back_to_status_message() {
        let err = failure_from_body(401, r#"{"error":{"code":401,"message":"Unauthenticated."}}"#);
        assert_eq!(err.row_message(), "401 Unauthenticated.");
        let err = failure_from_body(502, "Bad gateway");
        assert_eq!(err.row_message(), "502 Bad gateway");
    }

    #[test]
    fn rest_int64_values_parse_from_strings() {
        let page: SearchPage = serde_json::from_str(
            r#"{"results":[{"customerClient":{"resourceName":"customers/1/customerClients/2",
                "id":"2","level":"1","manager":true}}],"nextPageToken":"n"}"#,
        )
        .unwrap();
        let client = page.results.into_iter().next().unwrap().customer_client.unwrap();
        assert_eq!(client.id, "2");
        assert_eq!(client.level, 1);
        assert!(client.manager);
    }

    #[test]
    fn engagement_ads_use_plain_video_list() {
        let ad: ApiAd = serde_json::from_str(
            r#"{"id":"9","type":"APP_ENGAGEMENT_AD","appEngagementAd":{
                "headlines":[{"text":"Play now"}],
                "videos":[{"asset":"customers/1/assets/5"}]}}"#,
        )
        .unwrap();
        let assets = ad.app_engagement_ad.unwrap().into_assets();
        assert_eq!(assets.headlines, vec!["Play now"]);
        assert_eq!(assets.videos, vec!["customers/1/assets/5"]);
        assert!(assets.images.is_empty());
    }

    #[test]
    fn field_masks_are_camel_cased() {
        assert_eq!(json_field_mask("app_ad.youtube_videos"), "appAd.youtubeVideos");
        assert_eq!(
            json_field_mask("app_engagement_ad.headlines"),
            "appEngagementAd.headlines"
        );
    }

    #[test]
    fn text_filters_are_quoted() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let query = metrics_query(
            "42",
            CreativeType::Headline,
            Some(r#"Say "hi""#),
            day,
            day,
        );
        assert!(query.contains(r#"asset.text_asset.text = "Say \"hi\"""#));
        assert!(query.contains(r#"BETWEEN "2024-06-01" AND "2024-06-01""#));
        assert!(query.contains(r#"field_type = "HEADLINE""#));
    }

    #[test]
    fn asset_lists_use_text_or_asset_keys() {
        assert_eq!(
            asset_list_json(CreativeType::Description, &["d".to_string()]),
            json!([{ "text": "d" }])
        );
        assert_eq!(
            asset_list_json(CreativeType::Image, &["customers/1/assets/2".to_string()]),
            json!([{ "asset": "customers/1/assets/2" }])
        );
    }
}
