use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::core::ads::{AdsClient, AdsService, CampaignAdGroup};
use crate::core::settings::DefaultAlias;
use crate::core::sheets::layout::{
    history_timestamp, mapping_col, MappingRow, MAPPING_DATE_CELL, MAPPING_RANGE,
};
use crate::core::sheets::SheetsClient;

/// Rebuilds the Mapping sheet from the ad groups the Ads account can reach.
pub struct MappingRefresher<'a, S: SheetsClient, A: AdsClient> {
    sheets: &'a S,
    ads: &'a AdsService<A>,
    login_customer_id: Option<String>,
    default_alias: DefaultAlias,
}

impl<'a, S: SheetsClient, A: AdsClient> MappingRefresher<'a, S, A> {
    pub fn new(
        sheets: &'a S,
        ads: &'a AdsService<A>,
        login_customer_id: Option<String>,
        default_alias: DefaultAlias,
    ) -> Self {
        Self {
            sheets,
            ads,
            login_customer_id,
            default_alias,
        }
    }

    pub async fn run(&self, spreadsheet_ids: &[String], now: DateTime<Local>) -> Result<()> {
        let customers = self.child_customer_ids().await?;
        info!("Found {} child accounts", customers.len());
        let rows = self.account_rows(&customers).await;

        for spreadsheet_id in spreadsheet_ids {
            self.write_mapping(spreadsheet_id, rows.clone(), now)
                .await
                .with_context(|| format!("Unable to refresh the mapping sheet of {}", spreadsheet_id))?;
            info!(
                "Successfully updated the Mapping Sheet of {}. Last update time: {}",
                spreadsheet_id,
                history_timestamp(now)
            );
        }
        Ok(())
    }

    /// Non-manager accounts below the login customer, or below every accessible
    /// customer when no login customer is configured.
    pub async fn child_customer_ids(&self) -> Result<Vec<String>> {
        let seeds = match &self.login_customer_id {
            Some(id) => vec![id.clone()],
            None => {
                info!("No manager ID is specified. Using every accessible customer.");
                self.ads
                    .client()
                    .list_accessible_customers()
                    .await
                    .map_err(|e| anyhow::anyhow!(e.row_message()))
                    .context("Unable to list accessible customers")?
                    .iter()
                    .map(|resource| AdsService::<A>::customer_id_from_resource(resource))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        let mut children: Vec<String> = Vec::new();
        for seed in seeds {
            match self.ads.child_accounts(&seed).await {
                Ok(accounts) => {
                    for account in accounts {
                        if !children.contains(&account) {
                            children.push(account);
                        }
                    }
                }
                Err(e) => warn!("Unable to list child accounts of {}: {}", seed, e.row_message()),
            }
        }
        Ok(children)
    }

    /// One Mapping row per enabled app-campaign ad group that has an ad.
    pub async fn account_rows(&self, customer_ids: &[String]) -> Vec<MappingRow> {
        let mut rows = Vec::new();
        for customer_id in customer_ids {
            let ad_groups = match self.ads.client().campaign_ad_groups(customer_id).await {
                Ok(ad_groups) => ad_groups,
                Err(e) => {
                    warn!(
                        "Unable to read campaigns and ad groups of customer [{}]: {}",
                        customer_id,
                        e.row_message()
                    );
                    continue;
                }
            };
            let ids: Vec<String> = ad_groups.iter().map(|g| g.ad_group_id.clone()).collect();
            let counts = match self.ads.asset_counts_by_ad_group(customer_id, &ids).await {
                Ok(counts) => counts,
                Err(e) => {
                    warn!(
                        "Unable to count assets of customer [{}]: {}",
                        customer_id,
                        e.row_message()
                    );
                    continue;
                }
            };

            for group in ad_groups {
                let Some(count) = counts.get(&group.ad_group_id) else {
                    warn!("Ad group [{}] has no ad, leaving it out", group.ad_group_id);
                    continue;
                };
                rows.push(MappingRow {
                    alias: default_alias(&group, self.default_alias),
                    customer_id: customer_id.clone(),
                    ad_group_id: group.ad_group_id,
                    ad_group_name: group.ad_group_name,
                    campaign_id: group.campaign_id,
                    campaign_name: group.campaign_name,
                    app_id: group.app_id,
                    headlines: count.headlines,
                    descriptions: count.descriptions,
                    images: count.images,
                    videos: count.videos,
                });
            }
        }
        rows
    }

    async fn write_mapping(
        &self,
        spreadsheet_id: &str,
        mut rows: Vec<MappingRow>,
        now: DateTime<Local>,
    ) -> Result<()> {
        let existing: Vec<Vec<String>> = self
            .sheets
            .get_values(spreadsheet_id, MAPPING_RANGE)
            .await
            .context("Unable to read the mapping sheet")?
            .into_iter()
            .filter(|row| row.len() >= mapping_col::KEY_COUNT)
            .collect();

        if existing.is_empty() {
            let cells: Vec<Vec<String>> = rows.iter().map(MappingRow::cells).collect();
            self.sheets
                .append_values(spreadsheet_id, MAPPING_RANGE, &cells)
                .await?;
        } else {
            carry_over_aliases(&mut rows, &existing, self.default_alias);
            rows.sort_by(|a, b| {
                (&a.alias, &a.customer_id, &a.ad_group_id).cmp(&(
                    &b.alias,
                    &b.customer_id,
                    &b.ad_group_id,
                ))
            });
            let cells: Vec<Vec<String>> = rows.iter().map(MappingRow::cells).collect();
            self.sheets
                .clear_values(spreadsheet_id, MAPPING_RANGE)
                .await?;
            self.sheets
                .append_values(spreadsheet_id, MAPPING_RANGE, &cells)
                .await?;
        }

        self.sheets
            .update_values(
                spreadsheet_id,
                MAPPING_DATE_CELL,
                &[vec![history_timestamp(now)]],
            )
            .await?;
        Ok(())
    }
}

/// Alias a new ad group starts with.
pub fn default_alias(group: &CampaignAdGroup, mode: DefaultAlias) -> String {
    match mode {
        DefaultAlias::None => String::new(),
        DefaultAlias::AppId => group.app_id.rsplit('.').next().unwrap_or_default().to_string(),
        DefaultAlias::CampaignName => match group.campaign_name.rsplit_once('.') {
            Some((_, last)) => last.split('-').next().unwrap_or_default().to_string(),
            None => group.campaign_name.clone(),
        },
    }
}

/// Keeps the aliases people typed for ad groups already in the sheet. With a
/// default alias mode an empty alias in the sheet does not erase the default.
fn carry_over_aliases(rows: &mut [MappingRow], existing: &[Vec<String>], mode: DefaultAlias) {
    for row in rows.iter_mut() {
        let Some(previous) = existing
            .iter()
            .find(|cells| cells[mapping_col::AD_GROUP_ID] == row.ad_group_id)
        else {
            continue;
        };
        let alias = &previous[mapping_col::ALIAS];
        if mode == DefaultAlias::None || !alias.is_empty() {
            row.alias = alias.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ads::ads_service::fake::FakeAds;
    use crate::core::ads::{AdAssets, AdType, CustomerClient};
    use crate::core::sheets::client::fake::FakeSheets;
    use chrono::TimeZone;

    fn group(ad_group_id: &str, campaign_name: &str, app_id: &str) -> CampaignAdGroup {
        CampaignAdGroup {
            campaign_id: format!("c{}", ad_group_id),
            campaign_name: campaign_name.to_string(),
            app_id: app_id.to_string(),
            ad_group_id: ad_group_id.to_string(),
            ad_group_name: format!("Ad group {}", ad_group_id),
        }
    }

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 10, 8, 0, 0).unwrap()
    }

    fn fake_account() -> FakeAds {
        let assets = AdAssets {
            headlines: vec!["a".into(), "b".into()],
            descriptions: vec!["d".into()],
            images: vec![],
            videos: vec!["v".into()],
        };
        FakeAds {
            accessible: vec!["customers/100".to_string()],
            clients: vec![(
                "100".to_string(),
                vec![
                    CustomerClient {
                        customer_id: "100".to_string(),
                        level: 0,
                        manager: true,
                    },
                    CustomerClient {
                        customer_id: "200".to_string(),
                        level: 1,
                        manager: false,
                    },
                ],
            )],
            ad_groups: vec![(
                "200".to_string(),
                vec![
                    group("11", "US.puzzle-installs", "com.example.puzzle"),
                    group("12", "Generic", "com.example.racer"),
                    group("13", "No ad", "com.example.none"),
                ],
            )],
            ..Default::default()
        }
        .with_ad("200", "11", AdType::AppAd, assets.clone())
        .with_ad("200", "12", AdType::AppEngagementAd, assets)
    }

    #[test]
    fn default_aliases_follow_mode() {
        let g = group("1", "JP.rpg-launch", "com.studio.rpg");
        assert_eq!(default_alias(&g, DefaultAlias::None), "");
        assert_eq!(default_alias(&g, DefaultAlias::AppId), "rpg");
        assert_eq!(default_alias(&g, DefaultAlias::CampaignName), "rpg");
        let plain = group("1", "Brand campaign", "1234567");
        assert_eq!(default_alias(&plain, DefaultAlias::CampaignName), "Brand campaign");
        assert_eq!(default_alias(&plain, DefaultAlias::AppId), "1234567");
    }

    #[tokio::test]
    async fn empty_sheet_is_initialised() {
        let sheets = FakeSheets::default();
        let ads = AdsService::new(fake_account());
        let refresher = MappingRefresher::new(&sheets, &ads, None, DefaultAlias::AppId);

        refresher.run(&["s".to_string()], now()).await.unwrap();

        let written = sheets.appended_to(MAPPING_RANGE);
        assert_eq!(written.len(), 2);
        assert_eq!(
            written[0],
            vec![
                "puzzle",
                "200",
                "11",
                "Ad group 11",
                "c11",
                "US.puzzle-installs",
                "com.example.puzzle",
                "2",
                "1",
                "0",
                "1"
            ]
        );
        assert!(sheets.cleared.lock().unwrap().is_empty());
        let stamp = sheets.updated_at(MAPPING_DATE_CELL).unwrap();
        assert!(stamp[0][0].starts_with("2024-06-10 08:00:00"));
    }

    #[tokio::test]
    async fn existing_aliases_survive_and_rows_are_sorted() {
        let sheets = FakeSheets::default().with_range(
            MAPPING_RANGE,
            vec![vec!["zeta", "200", "11"], vec!["", "200", "12"]],
        );
        let ads = AdsService::new(fake_account());
        let refresher =
            MappingRefresher::new(&sheets, &ads, Some("100".to_string()), DefaultAlias::None);

        refresher.run(&["s".to_string()], now()).await.unwrap();

        assert_eq!(*sheets.cleared.lock().unwrap(), vec![MAPPING_RANGE]);
        let written = sheets.appended_to(MAPPING_RANGE);
        let keys: Vec<(&str, &str)> = written
            .iter()
            .map(|r| (r[0].as_str(), r[2].as_str()))
            .collect();
        assert_eq!(keys, vec![("", "12"), ("zeta", "11")]);
    }

    #[tokio::test]
    async fn empty_alias_keeps_default_when_mode_is_set() {
        let sheets = FakeSheets::default().with_range(
            MAPPING_RANGE,
            vec![vec!["", "200", "11"], vec!["mine", "200", "12"]],
        );
        let ads = AdsService::new(fake_account());
        let refresher = MappingRefresher::new(&sheets, &ads, None, DefaultAlias::AppId);

        refresher.run(&["s".to_string()], now()).await.unwrap();

        let written = sheets.appended_to(MAPPING_RANGE);
        let aliases: Vec<&str> = written.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(aliases, vec!["mine", "puzzle"]);
    }
}
