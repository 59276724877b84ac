use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{Duration, NaiveDate};
use dashmap::DashMap;
use regex::Regex;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::ads_client::{AdsClient, AdsError};
use super::ads_models::{
    AdAssets, AdGroupAd, AdType, AssetCounts, AssetMetrics, AssetPerformance, CreativeType,
};
use crate::core::media::images::{content_digest, ImageIndex, IndexedImage};
use crate::core::media::DriveClient;

const ASSET_NOT_IN_AD: &str = "Please check if the asset exists in the adgroup. If not, manually delete from the Time Managed Sheet.";

/// Higher level Ads operations shared by the remover, uploader and mapping refresh.
///
/// Keeps two per-run caches: ad group -> ad lookups, and the last image listing so
/// digests are not recomputed when the same customer is listed again.
pub struct AdsService<C: AdsClient> {
    client: C,
    ad_cache: DashMap<(String, String), AdGroupAd>,
    previous_images: RwLock<Option<ImageIndex>>,
}

impl<C: AdsClient> AdsService<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            ad_cache: DashMap::new(),
            previous_images: RwLock::new(None),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// `customers/123` -> `123`.
    pub fn customer_id_from_resource(resource_name: &str) -> Result<String, AdsError> {
        let re = Regex::new(r"^customers/(\d+)$").map_err(|e| AdsError::Api(e.to_string()))?;
        re.captures(resource_name)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                AdsError::Invalid(format!(
                    "Unable to match customer resource name {}.",
                    resource_name
                ))
            })
    }

    async fn refresh_ad_cache(&self, customer_id: &str) -> Result<(), AdsError> {
        let rows = self.client.ad_group_ads(customer_id).await?;
        debug!("Cached {} ad group ads for customer {}", rows.len(), customer_id);
        for row in rows {
            self.ad_cache
                .insert((customer_id.to_string(), row.ad_group_id), row.ad);
        }
        Ok(())
    }

    fn cached_ad(&self, customer_id: &str, ad_group_id: &str) -> Option<AdGroupAd> {
        self.ad_cache
            .get(&(customer_id.to_string(), ad_group_id.to_string()))
            .map(|entry| entry.value().clone())
    }

    /// The ad of an ad group. A miss reloads the customer's ads once.
    pub async fn ad_group_ad(
        &self,
        customer_id: &str,
        ad_group_id: &str,
    ) -> Result<AdGroupAd, AdsError> {
        if let Some(ad) = self.cached_ad(customer_id, ad_group_id) {
            return Ok(ad);
        }
        self.refresh_ad_cache(customer_id).await?;
        self.cached_ad(customer_id, ad_group_id).ok_or_else(|| {
            AdsError::Invalid(format!(
                "This {} ad_group does not have ad. Kindly check if the ad group id is correct.",
                ad_group_id
            ))
        })
    }

    async fn current_assets(
        &self,
        customer_id: &str,
        ad: &AdGroupAd,
    ) -> Result<AdAssets, AdsError> {
        let rows = self
            .client
            .ad_assets(customer_id, std::slice::from_ref(&ad.ad_id))
            .await?;
        Ok(rows
            .into_iter()
            .find(|row| row.ad_id == ad.ad_id)
            .map(|row| row.assets)
            .unwrap_or_default())
    }

    /// Number of assets per type in the ad group's ad, plus the ad type.
    pub async fn asset_counts(
        &self,
        customer_id: &str,
        ad_group_id: &str,
    ) -> Result<(AssetCounts, AdType), AdsError> {
        let ad = self.ad_group_ad(customer_id, ad_group_id).await?;
        let assets = self.current_assets(customer_id, &ad).await?;
        Ok((assets.counts(), ad.ad_type))
    }

    /// Counts for many ad groups of one customer in a single report. Ad groups
    /// without an ad are left out.
    pub async fn asset_counts_by_ad_group(
        &self,
        customer_id: &str,
        ad_group_ids: &[String],
    ) -> Result<HashMap<String, AssetCounts>, AdsError> {
        if ad_group_ids.is_empty() {
            return Ok(HashMap::new());
        }
        self.refresh_ad_cache(customer_id).await?;

        let ad_ids: Vec<String> = ad_group_ids
            .iter()
            .filter_map(|ad_group_id| self.cached_ad(customer_id, ad_group_id))
            .map(|ad| ad.ad_id)
            .collect();
        if ad_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = self.client.ad_assets(customer_id, &ad_ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| (row.ad_group_id, row.assets.counts()))
            .collect())
    }

    pub async fn add_asset(
        &self,
        customer_id: &str,
        ad_group_id: &str,
        creative: CreativeType,
        value: &str,
    ) -> Result<(), AdsError> {
        self.change_asset(customer_id, ad_group_id, creative, value, true)
            .await
    }

    /// Removes the first matching text (text creatives) or asset resource name (media).
    pub async fn remove_asset(
        &self,
        customer_id: &str,
        ad_group_id: &str,
        creative: CreativeType,
        value: &str,
    ) -> Result<(), AdsError> {
        self.change_asset(customer_id, ad_group_id, creative, value, false)
            .await
    }

    async fn change_asset(
        &self,
        customer_id: &str,
        ad_group_id: &str,
        creative: CreativeType,
        value: &str,
        add: bool,
    ) -> Result<(), AdsError> {
        if value.is_empty() {
            let kind = if creative.is_text() { "text" } else { "media" };
            return Err(AdsError::Invalid(format!(
                "Unable to perform {} action. Unknown error.",
                kind
            )));
        }

        let ad = self.ad_group_ad(customer_id, ad_group_id).await?;
        let mut assets = self.current_assets(customer_id, &ad).await?;
        let list = assets.list_mut(creative);

        if add {
            list.push(value.to_string());
        } else {
            let position = list
                .iter()
                .position(|existing| existing == value)
                .ok_or_else(|| AdsError::Invalid(ASSET_NOT_IN_AD.to_string()))?;
            list.remove(position);
        }

        self.client
            .update_ad_assets(customer_id, &ad.ad_id, ad.ad_type, creative, list)
            .await?;
        info!(
            "{} {} asset {} for ad group {}",
            if add { "Added" } else { "Removed" },
            creative,
            value,
            ad_group_id
        );
        Ok(())
    }

    /// Non-manager accounts under `seed`, found breadth first through level-1 managers.
    pub async fn child_accounts(&self, seed: &str) -> Result<Vec<String>, AdsError> {
        let mut pending = VecDeque::from([seed.to_string()]);
        let mut visited_managers = HashSet::new();
        let mut children: Vec<String> = Vec::new();

        while let Some(manager_id) = pending.pop_front() {
            if !visited_managers.insert(manager_id.clone()) {
                continue;
            }
            for client in self.client.customer_clients(&manager_id).await? {
                if children.contains(&client.customer_id) {
                    continue;
                }
                if client.manager {
                    if client.level == 1 {
                        pending.push_back(client.customer_id);
                    }
                } else {
                    children.push(client.customer_id);
                }
            }
        }
        Ok(children)
    }

    pub async fn performance_report(
        &self,
        customer_id: &str,
        ad_group_id: &str,
        creative: CreativeType,
    ) -> Result<Vec<AssetPerformance>, AdsError> {
        self.client
            .asset_performance(customer_id, ad_group_id, creative)
            .await
    }

    /// Metrics of one asset over the `duration` days before `today`.
    pub async fn asset_metrics(
        &self,
        customer_id: &str,
        ad_group_id: &str,
        creative: CreativeType,
        asset_id: &str,
        duration: i64,
        today: NaiveDate,
    ) -> Result<Vec<AssetMetrics>, AdsError> {
        let start = today - Duration::days(duration);
        let end = today - Duration::days(1);
        let text = creative.is_text().then_some(asset_id);
        let rows = self
            .client
            .asset_metrics(customer_id, ad_group_id, creative, text, start, end)
            .await?;
        Ok(rows.into_iter().filter(|row| row.asset_id == asset_id).collect())
    }

    pub async fn text_asset_value(
        &self,
        customer_id: &str,
        asset_resource_name: &str,
    ) -> Result<String, AdsError> {
        Ok(self
            .client
            .text_asset_value(customer_id, asset_resource_name)
            .await?
            .unwrap_or_default())
    }

    /// Image assets of a customer with content digests. Digests from the previous
    /// listing of the same customer are reused while the image URL is unchanged.
    pub async fn image_index<D>(&self, customer_id: &str, downloader: &D) -> Result<ImageIndex, AdsError>
    where
        D: DriveClient + ?Sized,
    {
        let assets = self.client.image_assets(customer_id).await?;
        let previous = self.previous_images.read().await.clone();

        let mut images = Vec::with_capacity(assets.len());
        for asset in assets {
            let reused = previous
                .as_ref()
                .filter(|prev| prev.customer_id == customer_id)
                .and_then(|prev| prev.known_digest(&asset.resource_name, &asset.url))
                .map(str::to_string);
            let digest = match reused {
                Some(digest) => digest,
                None => {
                    let data = downloader
                        .download(&asset.url)
                        .await
                        .map_err(|e| AdsError::Api(e.to_string()))?;
                    content_digest(&data)
                }
            };
            images.push(IndexedImage {
                resource_name: asset.resource_name,
                name: asset.name,
                url: asset.url,
                digest,
            });
        }

        let index = ImageIndex {
            customer_id: customer_id.to_string(),
            images,
        };
        *self.previous_images.write().await = Some(index.clone());
        Ok(index)
    }

    pub async fn create_youtube_asset(
        &self,
        customer_id: &str,
        youtube_id: &str,
    ) -> Result<String, AdsError> {
        self.client.create_youtube_asset(customer_id, youtube_id).await
    }

    pub async fn create_image_asset(
        &self,
        customer_id: &str,
        name: &str,
        data: &[u8],
    ) -> Result<String, AdsError> {
        self.client.create_image_asset(customer_id, name, data).await
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use crate::core::ads::ads_client::{AdAssetsRow, AdGroupAdRow, AdsClient, AdsError};
    use crate::core::ads::ads_models::{
        AdAssets, AdGroupAd, AdType, AssetMetrics, AssetPerformance, CampaignAdGroup,
        CreativeType, CustomerClient, ImageAsset,
    };

    /// In-memory Ads account used across the pipeline tests.
    #[derive(Default)]
    pub struct FakeAds {
        pub accessible: Vec<String>,
        pub clients: Vec<(String, Vec<CustomerClient>)>,
        pub ad_groups: Vec<(String, Vec<CampaignAdGroup>)>,
        /// (customer, ad group, ad id, type, assets)
        pub ads: Mutex<Vec<(String, String, String, AdType, AdAssets)>>,
        pub performance: Vec<AssetPerformance>,
        pub metrics: Vec<AssetMetrics>,
        pub texts: Vec<(String, String)>,
        pub images: Vec<ImageAsset>,
        pub fail_mutate: Option<String>,
        pub created: Mutex<Vec<String>>,
        pub ad_group_ad_calls: Mutex<u32>,
        pub metric_windows: Mutex<Vec<(NaiveDate, NaiveDate, Option<String>)>>,
    }

    impl FakeAds {
        pub fn with_ad(
            mut self,
            customer_id: &str,
            ad_group_id: &str,
            ad_type: AdType,
            assets: AdAssets,
        ) -> Self {
            let ad_id = format!("9{}", ad_group_id);
            self.ads.get_mut().unwrap().push((
                customer_id.to_string(),
                ad_group_id.to_string(),
                ad_id,
                ad_type,
                assets,
            ));
            self
        }

        pub fn assets_of(&self, ad_group_id: &str) -> AdAssets {
            self.ads
                .lock()
                .unwrap()
                .iter()
                .find(|(_, agid, _, _, _)| agid == ad_group_id)
                .map(|(_, _, _, _, assets)| assets.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl AdsClient for FakeAds {
        async fn list_accessible_customers(&self) -> Result<Vec<String>, AdsError> {
            Ok(self.accessible.clone())
        }

        async fn customer_clients(&self, customer_id: &str) -> Result<Vec<CustomerClient>, AdsError> {
            Ok(self
                .clients
                .iter()
                .find(|(id, _)| id == customer_id)
                .map(|(_, rows)| rows.clone())
                .unwrap_or_default())
        }

        async fn campaign_ad_groups(
            &self,
            customer_id: &str,
        ) -> Result<Vec<CampaignAdGroup>, AdsError> {
            Ok(self
                .ad_groups
                .iter()
                .find(|(id, _)| id == customer_id)
                .map(|(_, rows)| rows.clone())
                .unwrap_or_default())
        }

        async fn ad_group_ads(&self, customer_id: &str) -> Result<Vec<AdGroupAdRow>, AdsError> {
            *self.ad_group_ad_calls.lock().unwrap() += 1;
            Ok(self
                .ads
                .lock()
                .unwrap()
                .iter()
                .filter(|(cid, _, _, _, _)| cid == customer_id)
                .map(|(_, agid, ad_id, ad_type, _)| AdGroupAdRow {
                    ad_group_id: agid.clone(),
                    ad: AdGroupAd {
                        ad_id: ad_id.clone(),
                        ad_type: *ad_type,
                    },
                })
                .collect())
        }

        async fn ad_assets(
            &self,
            customer_id: &str,
            ad_ids: &[String],
        ) -> Result<Vec<AdAssetsRow>, AdsError> {
            Ok(self
                .ads
                .lock()
                .unwrap()
                .iter()
                .filter(|(cid, _, ad_id, _, _)| cid == customer_id && ad_ids.contains(ad_id))
                .map(|(_, agid, ad_id, _, assets)| AdAssetsRow {
                    ad_group_id: agid.clone(),
                    ad_id: ad_id.clone(),
                    assets: assets.clone(),
                })
                .collect())
        }

        async fn asset_performance(
            &self,
            _: &str,
            _: &str,
            _: CreativeType,
        ) -> Result<Vec<AssetPerformance>, AdsError> {
            Ok(self.performance.clone())
        }

        async fn asset_metrics(
            &self,
            _: &str,
            _: &str,
            _: CreativeType,
            text: Option<&str>,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<AssetMetrics>, AdsError> {
            self.metric_windows
                .lock()
                .unwrap()
                .push((start, end, text.map(str::to_string)));
            Ok(self.metrics.clone())
        }

        async fn text_asset_value(
            &self,
            _: &str,
            asset_resource_name: &str,
        ) -> Result<Option<String>, AdsError> {
            Ok(self
                .texts
                .iter()
                .find(|(rn, _)| rn == asset_resource_name)
                .map(|(_, text)| text.clone()))
        }

        async fn image_assets(&self, _: &str) -> Result<Vec<ImageAsset>, AdsError> {
            Ok(self.images.clone())
        }

        async fn create_youtube_asset(
            &self,
            customer_id: &str,
            youtube_id: &str,
        ) -> Result<String, AdsError> {
            let name = format!("customers/{}/assets/yt-{}", customer_id, youtube_id);
            self.created.lock().unwrap().push(name.clone());
            Ok(name)
        }

        async fn create_image_asset(
            &self,
            customer_id: &str,
            name: &str,
            _: &[u8],
        ) -> Result<String, AdsError> {
            let name = format!("customers/{}/assets/img-{}", customer_id, name);
            self.created.lock().unwrap().push(name.clone());
            Ok(name)
        }

        async fn update_ad_assets(
            &self,
            _: &str,
            ad_id: &str,
            _: AdType,
            creative: CreativeType,
            assets: &[String],
        ) -> Result<(), AdsError> {
            if let Some(message) = &self.fail_mutate {
                return Err(AdsError::Failure(vec![message.clone()]));
            }
            let mut ads = self.ads.lock().unwrap();
            if let Some(entry) = ads.iter_mut().find(|(_, _, id, _, _)| id == ad_id) {
                *entry.4.list_mut(creative) = assets.to_vec();
            }
            Ok(())
        }
    }
}
