use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use regex::Regex;
use tracing::{error, info, warn};

use crate::core::ads::performance::least_performing_asset;
use crate::core::ads::{AdType, AdsClient, AdsService, CreativeType};
use crate::core::media::images::content_digest;
use crate::core::media::links::{
    is_http_url, watch_url, youtube_id_from_watch_url, YOUTUBE_WATCH_URL,
};
use crate::core::media::{DriveClient, YoutubeClient};
use crate::core::sheets::layout::{
    format_sheet_date, history_timestamp, parse_sheet_date, MappingKey, UploadRow,
    CHANGE_HISTORY_RANGE, MAPPING_KEY_RANGE, TIME_MANAGED_APPEND_RANGE, UPLOAD_RANGE,
    YT_LIST_RANGE,
};
use crate::core::sheets::SheetsClient;

/// Characters stripped from headlines when text auto-modification is on.
const HEADLINE_PUNCTUATION: &str = r"!”#$%&\()*+,-./:;<=>?@[\]^_`{|}~";

const PROCESSING_ATTEMPTS: u32 = 60;
const ASSET_RESOURCE_PATTERN: &str = r"^customers/\d+/assets/\d+$";

const ACTION_SUCCEED: &str = "Action succeed.";
const BAD_START_DATE: &str = "START_DATE is not in the correct format of YYYY-MM-DD.";
const YOUTUBE_UPLOAD_FAILED: &str = "Unable to upload YouTube Video. Verify your URL is correct.";
const UNKNOWN_TYPE: &str =
    "Unknown asset type. Only DESCRIPTION, HEADLINE, IMAGE, VIDEO are allowed.";

#[derive(Debug, Clone, Copy, Default)]
pub struct UploaderOptions {
    pub text_auto_modify: bool,
    pub remove_by_performance: bool,
}

/// An ad group an upload row resolved to through the Mapping sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdGroupTarget {
    pub customer_id: String,
    pub ad_group_id: String,
}

/// Uploads the rows of the Upload sheet into their mapped ad groups, replacing
/// or rotating out assets first when asked to.
pub struct CreativeUploader<'a, S, A, D, Y>
where
    S: SheetsClient,
    A: AdsClient,
    D: DriveClient,
    Y: YoutubeClient,
{
    sheets: &'a S,
    ads: &'a AdsService<A>,
    drive: &'a D,
    youtube: Option<&'a Y>,
    options: UploaderOptions,
    /// Source URL (or bare id) -> YouTube id, kept for the whole run.
    youtube_ids: HashMap<String, String>,
    pause: Duration,
}

impl<'a, S, A, D, Y> CreativeUploader<'a, S, A, D, Y>
where
    S: SheetsClient,
    A: AdsClient,
    D: DriveClient,
    Y: YoutubeClient,
{
    pub fn new(
        sheets: &'a S,
        ads: &'a AdsService<A>,
        drive: &'a D,
        youtube: Option<&'a Y>,
        options: UploaderOptions,
    ) -> Self {
        Self {
            sheets,
            ads,
            drive,
            youtube,
            options,
            youtube_ids: HashMap::new(),
            pause: Duration::from_secs(1),
        }
    }

    /// Interval between YouTube uploads and between processing checks.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub async fn run(&mut self, spreadsheet_ids: &[String], now: DateTime<Local>) -> Result<()> {
        for spreadsheet_id in spreadsheet_ids {
            if let Err(e) = self.run_for_spreadsheet(spreadsheet_id, now).await {
                error!("Creative uploader failed for {}: {:#}", spreadsheet_id, e);
            }
        }
        Ok(())
    }

    async fn run_for_spreadsheet(&mut self, spreadsheet_id: &str, now: DateTime<Local>) -> Result<()> {
        let mapping: Vec<MappingKey> = self
            .sheets
            .get_values(spreadsheet_id, MAPPING_KEY_RANGE)
            .await
            .context("Unable to read the mapping sheet")?
            .iter()
            .filter_map(|cells| MappingKey::from_cells(cells))
            .collect();
        let rows = self.upload_rows(spreadsheet_id, now).await?;
        self.collect_youtube_ids(spreadsheet_id, &rows, now).await;

        for row in &rows {
            let Some(targets) = map_to_ad_groups(row, &mapping) else {
                continue;
            };
            let (history, succeeded) = self.process_row(spreadsheet_id, row, &targets, now).await;

            if !succeeded.is_empty() {
                let marker = format!("{}/{}", row.used_ad_group_ids, succeeded.join("/"));
                if let Err(e) = self
                    .sheets
                    .update_values(spreadsheet_id, &row.used_ad_group_cell(), &[vec![marker]])
                    .await
                {
                    warn!("Unable to update the used ad group ids of row {}: {}", row.row_index, e);
                }
            }
            if !history.is_empty() {
                self.append_history(spreadsheet_id, &history).await;
            }
        }
        Ok(())
    }

    /// Upload rows with an alias whose start date has been reached.
    async fn upload_rows(&self, spreadsheet_id: &str, now: DateTime<Local>) -> Result<Vec<UploadRow>> {
        let values = self
            .sheets
            .get_values(spreadsheet_id, UPLOAD_RANGE)
            .await
            .context("Unable to read the uploading sheet")?;

        let mut rows = Vec::new();
        for (position, cells) in values.iter().enumerate() {
            let Some(mut row) = UploadRow::from_cells(cells, position) else {
                continue;
            };
            if self.options.text_auto_modify {
                row.name_or_text = auto_modify_text(&row.name_or_text, &row.creative_type);
            }
            if row.start_date.is_empty() {
                rows.push(row);
                continue;
            }
            match parse_sheet_date(&row.start_date) {
                Some(start) if start <= now.date_naive() => rows.push(row),
                Some(_) => {}
                None => {
                    let mut entry = row.cells();
                    entry.push(BAD_START_DATE.to_string());
                    self.append_history(spreadsheet_id, &[entry]).await;
                }
            }
        }
        Ok(rows)
    }

    /// Resolves every video row to a YouTube id, uploading Drive or web videos
    /// when the YouTube service is enabled.
    async fn collect_youtube_ids(&mut self, spreadsheet_id: &str, rows: &[UploadRow], now: DateTime<Local>) {
        if let Ok(listed) = self.sheets.get_values(spreadsheet_id, YT_LIST_RANGE).await {
            for entry in listed {
                if let [youtube_url, source, ..] = entry.as_slice() {
                    if let Some((_, id)) = youtube_url.split_once(YOUTUBE_WATCH_URL) {
                        self.youtube_ids.insert(source.clone(), id.to_string());
                    }
                }
            }
        }

        let mut new_videos: Vec<Vec<String>> = Vec::new();
        for row in rows {
            if row.creative_type != CreativeType::Video.as_str() || row.url.is_empty() {
                continue;
            }
            let title = if row.name_or_text.is_empty() {
                &row.alias
            } else {
                &row.name_or_text
            };
            match self.resolve_video(&row.url, title).await {
                Ok(Some(youtube_id)) => {
                    new_videos.push(vec![watch_url(&youtube_id), row.url.clone(), title.clone()]);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("YouTube upload of {} failed: {}", row.url, e);
                    let entry = history_row(row, None, "", YOUTUBE_UPLOAD_FAILED, now);
                    self.append_history(spreadsheet_id, &[entry]).await;
                }
            }
        }

        let Some(youtube) = self.youtube else {
            return;
        };
        if new_videos.is_empty() {
            return;
        }
        if let Err(e) = self
            .sheets
            .append_values(spreadsheet_id, YT_LIST_RANGE, &new_videos)
            .await
        {
            warn!("Unable to update the YT List sheet: {}", e);
        }

        let ids: Vec<String> = new_videos
            .iter()
            .map(|video| video[0].replace(YOUTUBE_WATCH_URL, ""))
            .collect();
        info!("Wait until youtube asset upload finished.");
        let mut attempts = 0;
        loop {
            match youtube.processing_finished(&ids).await {
                Ok(true) => {
                    info!("Upload finished! Time spent: {}s", attempts + 1);
                    break;
                }
                Ok(false) => {}
                Err(e) => warn!("Unable to check YouTube processing status: {}", e),
            }
            attempts += 1;
            if attempts >= PROCESSING_ATTEMPTS {
                warn!(
                    "Time limit {}s exceeded! Video asset upload may fail. Please re-run the script if the failure occurs.",
                    PROCESSING_ATTEMPTS
                );
                break;
            }
            tokio::time::sleep(self.pause).await;
        }
    }

    /// Returns the id of a freshly uploaded video; known ids resolve to `None`.
    async fn resolve_video(&mut self, url: &str, title: &str) -> Result<Option<String>, String> {
        if !url.contains("http") {
            self.youtube_ids.insert(url.to_string(), url.to_string());
            return Ok(None);
        }
        if url.contains(YOUTUBE_WATCH_URL) {
            if let Some(id) = youtube_id_from_watch_url(url) {
                self.youtube_ids.insert(url.to_string(), id);
            }
            return Ok(None);
        }
        let Some(youtube) = self.youtube else {
            return Ok(None);
        };
        if self.youtube_ids.contains_key(url) {
            return Ok(None);
        }

        let data = self.drive.download(url).await.map_err(|e| e.to_string())?;
        let youtube_id = youtube
            .upload_video(data, title)
            .await
            .map_err(|e| e.to_string())?;
        tokio::time::sleep(self.pause).await;
        info!("Uploaded {} to YouTube as {}", url, youtube_id);
        self.youtube_ids.insert(url.to_string(), youtube_id.clone());
        Ok(Some(youtube_id))
    }

    /// Runs one upload row against all its ad groups. Returns the Change History
    /// entries and the ad groups that received the asset.
    async fn process_row(
        &self,
        spreadsheet_id: &str,
        row: &UploadRow,
        targets: &[AdGroupTarget],
        now: DateTime<Local>,
    ) -> (Vec<Vec<String>>, Vec<String>) {
        let mut history = Vec::new();
        let mut succeeded = Vec::new();

        for target in targets {
            let Some(creative) = row.creative() else {
                let message = format!("Unable to upload the asset. Errors: {}", UNKNOWN_TYPE);
                history.push(history_row(row, Some(target), "", &message, now));
                continue;
            };

            if let Err(message) = self.make_room(row, creative, target).await {
                let message = format!("Unable to remove the asset. Errors: {}", message);
                warn!("{}", message);
                history.push(history_row(row, Some(target), "", &message, now));
                continue;
            }

            match self.upload(row, creative, target).await {
                Ok(resource) => {
                    info!("{} {} for ad group {}", ACTION_SUCCEED, resource, target.ad_group_id);
                    self.record_time_managed(spreadsheet_id, row, target, &resource, now.date_naive())
                        .await;
                    history.push(history_row(row, Some(target), &resource, ACTION_SUCCEED, now));
                    succeeded.push(target.ad_group_id.clone());
                }
                Err(message) => {
                    let message = format!("Unable to upload the asset. Errors: {}", message);
                    warn!("{}", message);
                    history.push(history_row(row, Some(target), "", &message, now));
                }
            }
        }
        (history, succeeded)
    }

    /// Removes the asset named in the replace column, or the weakest asset
    /// when rotation by performance is on and the ad group is full.
    async fn make_room(
        &self,
        row: &UploadRow,
        creative: CreativeType,
        target: &AdGroupTarget,
    ) -> Result<(), String> {
        let (customer_id, ad_group_id) = (target.customer_id.as_str(), target.ad_group_id.as_str());

        if !row.replace_asset.is_empty() {
            let asset = match creative {
                CreativeType::Headline | CreativeType::Description => Some(row.replace_asset.clone()),
                CreativeType::Image => self.replaced_image(customer_id, &row.replace_asset).await?,
                CreativeType::Video => Some(self.replaced_video(customer_id, &row.replace_asset).await?),
            };
            let Some(asset) = asset else {
                warn!("Replace image doesn't exist.");
                return Ok(());
            };
            return self
                .ads
                .remove_asset(customer_id, ad_group_id, creative, &asset)
                .await
                .map_err(|e| e.row_message());
        }

        if self.options.remove_by_performance {
            self.remove_least_performing(creative, customer_id, ad_group_id)
                .await?;
        }
        Ok(())
    }

    async fn remove_least_performing(
        &self,
        creative: CreativeType,
        customer_id: &str,
        ad_group_id: &str,
    ) -> Result<(), String> {
        let (counts, ad_type) = self
            .ads
            .asset_counts(customer_id, ad_group_id)
            .await
            .map_err(|e| e.row_message())?;
        if ad_type == AdType::AppEngagementAd || counts.of(creative) < creative.ad_group_limit() {
            return Ok(());
        }

        let report = self
            .ads
            .performance_report(customer_id, ad_group_id, creative)
            .await
            .map_err(|e| e.row_message())?;
        let worst = least_performing_asset(&report).ok_or_else(|| {
            format!("Unable to find a {} to be removed by performance.", creative)
        })?;

        let value = if creative.is_text() {
            self.ads
                .text_asset_value(customer_id, &worst.asset)
                .await
                .map_err(|e| e.row_message())?
        } else {
            worst.asset.clone()
        };
        info!("Rotating out {} {} from ad group {}", creative, value, ad_group_id);
        self.ads
            .remove_asset(customer_id, ad_group_id, creative, &value)
            .await
            .map_err(|e| e.row_message())
    }

    /// Resource name of the image to replace: given directly, found by the
    /// content of a URL, or found by asset name.
    async fn replaced_image(&self, customer_id: &str, replace: &str) -> Result<Option<String>, String> {
        if is_asset_resource(replace) {
            return Ok(Some(replace.to_string()));
        }
        let index = self
            .ads
            .image_index(customer_id, self.drive)
            .await
            .map_err(|e| e.row_message())?;
        if is_http_url(replace) {
            let data = self.drive.download(replace).await.map_err(|e| e.to_string())?;
            return Ok(index
                .find_by_digest(&content_digest(&data))
                .map(|image| image.resource_name.clone()));
        }
        Ok(index
            .find_by_name(replace)
            .map(|image| image.resource_name.clone()))
    }

    async fn replaced_video(&self, customer_id: &str, replace: &str) -> Result<String, String> {
        if is_asset_resource(replace) {
            return Ok(replace.to_string());
        }
        self.youtube_asset(customer_id, replace).await
    }

    /// Adds the row's asset to the ad group and returns what was added: the
    /// text for text assets, the asset resource name for media.
    async fn upload(
        &self,
        row: &UploadRow,
        creative: CreativeType,
        target: &AdGroupTarget,
    ) -> Result<String, String> {
        let (customer_id, ad_group_id) = (target.customer_id.as_str(), target.ad_group_id.as_str());
        let resource = match creative {
            CreativeType::Headline | CreativeType::Description => row.name_or_text.clone(),
            CreativeType::Image => self.image_asset(customer_id, &row.url, &row.name_or_text).await?,
            CreativeType::Video => self.youtube_asset(customer_id, &row.url).await?,
        };
        self.ads
            .add_asset(customer_id, ad_group_id, creative, &resource)
            .await
            .map_err(|e| e.row_message())?;
        Ok(resource)
    }

    /// Reuses an image asset with the same name or content, otherwise creates one.
    async fn image_asset(&self, customer_id: &str, url: &str, name: &str) -> Result<String, String> {
        let index = self
            .ads
            .image_index(customer_id, self.drive)
            .await
            .map_err(|e| e.row_message())?;
        if let Some(image) = index.find_by_name(name) {
            return Ok(image.resource_name.clone());
        }

        let data = self.drive.download(url).await.map_err(|e| e.to_string())?;
        if let Some(image) = index.find_by_digest(&content_digest(&data)) {
            info!("Reusing image asset {} for {}", image.resource_name, url);
            return Ok(image.resource_name.clone());
        }
        self.ads
            .create_image_asset(customer_id, name, &data)
            .await
            .map_err(|e| e.row_message())
    }

    /// YouTube asset for a bare id or for a URL resolved earlier in the run.
    async fn youtube_asset(&self, customer_id: &str, video: &str) -> Result<String, String> {
        let youtube_id = if is_http_url(video) {
            self.youtube_ids
                .get(video)
                .cloned()
                .ok_or_else(|| format!("No YouTube video is known for {}.", video))?
        } else {
            video.to_string()
        };
        self.ads
            .create_youtube_asset(customer_id, &youtube_id)
            .await
            .map_err(|e| e.row_message())
    }

    async fn record_time_managed(
        &self,
        spreadsheet_id: &str,
        row: &UploadRow,
        target: &AdGroupTarget,
        asset: &str,
        today: NaiveDate,
    ) {
        let start_date = if row.start_date.is_empty() {
            format_sheet_date(today)
        } else {
            row.start_date.clone()
        };
        let entry = vec![
            row.alias.clone(),
            row.creative_type.clone(),
            row.name_or_text.clone(),
            row.url.clone(),
            target.customer_id.clone(),
            target.ad_group_id.clone(),
            asset.to_string(),
            start_date,
            row.end_date.clone(),
        ];
        if let Err(e) = self
            .sheets
            .append_values(spreadsheet_id, TIME_MANAGED_APPEND_RANGE, &[entry])
            .await
        {
            warn!("Unable to write to time managed sheet: {}", e);
        }
    }

    async fn append_history(&self, spreadsheet_id: &str, entries: &[Vec<String>]) {
        if let Err(e) = self
            .sheets
            .append_values(spreadsheet_id, CHANGE_HISTORY_RANGE, entries)
            .await
        {
            warn!("Unable to write to change history spreadsheet: {}", e);
        }
    }
}

/// Ad groups whose alias matches the row, minus those already listed in its
/// used-ad-group column. `None` when the alias matches nothing.
pub fn map_to_ad_groups(row: &UploadRow, mapping: &[MappingKey]) -> Option<Vec<AdGroupTarget>> {
    let alias = row.alias.to_uppercase();
    let matching: Vec<&MappingKey> = mapping
        .iter()
        .filter(|key| key.alias.to_uppercase() == alias)
        .collect();
    if matching.is_empty() {
        return None;
    }
    Some(
        matching
            .into_iter()
            .filter(|key| !row.used_ad_group_ids.contains(key.ad_group_id.as_str()))
            .map(|key| AdGroupTarget {
                customer_id: key.customer_id.replace('-', ""),
                ad_group_id: key.ad_group_id.clone(),
            })
            .collect(),
    )
}

/// Headlines lose all punctuation; in descriptions a punctuation character
/// repeated back to back is collapsed to one.
pub fn auto_modify_text(text: &str, creative_type: &str) -> String {
    match creative_type {
        "HEADLINE" => text
            .chars()
            .filter(|c| !HEADLINE_PUNCTUATION.contains(*c))
            .collect(),
        "DESCRIPTION" => {
            let chars: Vec<char> = text.chars().collect();
            chars
                .iter()
                .enumerate()
                .filter(|(i, c)| {
                    !(HEADLINE_PUNCTUATION.contains(**c) && chars.get(i + 1) == Some(*c))
                })
                .map(|(_, c)| *c)
                .collect()
        }
        _ => text.to_string(),
    }
}

fn is_asset_resource(value: &str) -> bool {
    Regex::new(ASSET_RESOURCE_PATTERN)
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}

/// A Change History entry: the row's first four columns, where it went, what
/// was added, its dates, the outcome and a timestamp.
fn history_row(
    row: &UploadRow,
    target: Option<&AdGroupTarget>,
    resource: &str,
    message: &str,
    now: DateTime<Local>,
) -> Vec<String> {
    let (customer_id, ad_group_id) = target
        .map(|t| (t.customer_id.clone(), t.ad_group_id.clone()))
        .unwrap_or_default();
    vec![
        row.alias.clone(),
        row.creative_type.clone(),
        row.name_or_text.clone(),
        row.url.clone(),
        customer_id,
        ad_group_id,
        resource.to_string(),
        row.start_date.clone(),
        row.end_date.clone(),
        message.to_string(),
        history_timestamp(now),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ads::ads_service::fake::FakeAds;
    use crate::core::ads::{AdAssets, AssetPerformance, ImageAsset, PerformanceLabel};
    use crate::core::media::client::fake::{FakeDrive, FakeYoutube};
    use crate::core::sheets::client::fake::FakeSheets;
    use chrono::TimeZone;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap()
    }

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn upload_row(cells: &[&str]) -> UploadRow {
        UploadRow::from_cells(&strings(cells), 0).unwrap()
    }

    fn assets(headlines: usize) -> AdAssets {
        AdAssets {
            headlines: (1..=headlines).map(|i| format!("Headline {}", i)).collect(),
            images: vec!["customers/1/assets/500".to_string()],
            ..Default::default()
        }
    }

    fn mapping_sheet() -> FakeSheets {
        FakeSheets::default().with_range(MAPPING_KEY_RANGE, vec![vec!["Game", "1-00", "7"]])
    }

    type Uploader<'a> = CreativeUploader<'a, FakeSheets, FakeAds, FakeDrive, FakeYoutube>;

    fn uploader<'a>(
        sheets: &'a FakeSheets,
        ads: &'a AdsService<FakeAds>,
        drive: &'a FakeDrive,
        youtube: Option<&'a FakeYoutube>,
        options: UploaderOptions,
    ) -> Uploader<'a> {
        CreativeUploader::new(sheets, ads, drive, youtube, options).with_pause(Duration::ZERO)
    }

    #[test]
    fn headlines_lose_punctuation() {
        assert_eq!(auto_modify_text("Play now!! (free)", "HEADLINE"), "Play now free");
    }

    #[test]
    fn descriptions_collapse_repeated_punctuation() {
        assert_eq!(
            auto_modify_text("Wow!!! Best game... ever", "DESCRIPTION"),
            "Wow! Best game. ever"
        );
        assert_eq!(auto_modify_text("Hello!!", "IMAGE"), "Hello!!");
    }

    #[test]
    fn aliases_match_case_insensitively_and_skip_used_groups() {
        let mapping = vec![
            MappingKey {
                alias: "game".to_string(),
                customer_id: "123-456".to_string(),
                ad_group_id: "7".to_string(),
            },
            MappingKey {
                alias: "GAME".to_string(),
                customer_id: "123-456".to_string(),
                ad_group_id: "8".to_string(),
            },
        ];
        let row = upload_row(&["Game", "HEADLINE", "Hi", "", "", "", "", "/8"]);
        assert_eq!(
            map_to_ad_groups(&row, &mapping),
            Some(vec![AdGroupTarget {
                customer_id: "123456".to_string(),
                ad_group_id: "7".to_string()
            }])
        );

        let other = upload_row(&["Other", "HEADLINE", "Hi"]);
        assert_eq!(map_to_ad_groups(&other, &mapping), None);
    }

    #[tokio::test]
    async fn headline_upload_is_recorded_everywhere() {
        let sheets = mapping_sheet().with_range(
            UPLOAD_RANGE,
            vec![
                vec!["game", "headline", "Fresh", "", "", "", "2024-07-01"],
                vec!["game", "HEADLINE", "Later", "", "", "2024-12-01"],
            ],
        );
        let ads = AdsService::new(FakeAds::default().with_ad("100", "7", AdType::AppAd, assets(3)));
        let drive = FakeDrive::default();

        uploader(&sheets, &ads, &drive, None, UploaderOptions::default())
            .run(&["s".to_string()], now())
            .await
            .unwrap();

        assert_eq!(ads.client().assets_of("7").headlines.last().unwrap(), "Fresh");
        assert_eq!(
            sheets.appended_to(TIME_MANAGED_APPEND_RANGE),
            vec![strings(&[
                "game", "HEADLINE", "Fresh", "", "100", "7", "Fresh", "2024-06-10", "2024-07-01"
            ])]
        );
        let history = sheets.appended_to(CHANGE_HISTORY_RANGE);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0][9], ACTION_SUCCEED);
        assert_eq!(history[0][6], "Fresh");
        assert_eq!(sheets.updated_at("Upload!H2"), Some(vec![strings(&["/7"])]));
    }

    #[tokio::test]
    async fn bad_start_date_is_logged_and_skipped() {
        let sheets = mapping_sheet().with_range(
            UPLOAD_RANGE,
            vec![vec!["game", "HEADLINE", "Fresh", "", "", "10/06/2024"]],
        );
        let ads = AdsService::new(FakeAds::default().with_ad("100", "7", AdType::AppAd, assets(3)));
        let drive = FakeDrive::default();

        uploader(&sheets, &ads, &drive, None, UploaderOptions::default())
            .run(&["s".to_string()], now())
            .await
            .unwrap();

        let history = sheets.appended_to(CHANGE_HISTORY_RANGE);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].last().unwrap(), BAD_START_DATE);
        assert_eq!(ads.client().assets_of("7").headlines.len(), 3);
    }

    #[tokio::test]
    async fn replace_target_is_removed_before_upload() {
        let sheets = mapping_sheet().with_range(
            UPLOAD_RANGE,
            vec![vec!["game", "HEADLINE", "Fresh", "", "Headline 2"]],
        );
        let ads = AdsService::new(FakeAds::default().with_ad("100", "7", AdType::AppAd, assets(3)));
        let drive = FakeDrive::default();

        uploader(&sheets, &ads, &drive, None, UploaderOptions::default())
            .run(&["s".to_string()], now())
            .await
            .unwrap();

        assert_eq!(
            ads.client().assets_of("7").headlines,
            strings(&["Headline 1", "Headline 3", "Fresh"])
        );
    }

    #[tokio::test]
    async fn failed_removal_skips_upload() {
        let sheets = mapping_sheet().with_range(
            UPLOAD_RANGE,
            vec![vec!["game", "HEADLINE", "Fresh", "", "Missing"]],
        );
        let ads = AdsService::new(FakeAds::default().with_ad("100", "7", AdType::AppAd, assets(3)));
        let drive = FakeDrive::default();

        uploader(&sheets, &ads, &drive, None, UploaderOptions::default())
            .run(&["s".to_string()], now())
            .await
            .unwrap();

        let history = sheets.appended_to(CHANGE_HISTORY_RANGE);
        assert!(history[0][9].starts_with("Unable to remove the asset. Errors: Please check"));
        assert_eq!(ads.client().assets_of("7").headlines.len(), 3);
        assert!(sheets.updated_at("Upload!H2").is_none());
    }

    #[tokio::test]
    async fn full_ad_group_rotates_out_weakest_headline() {
        let sheets = mapping_sheet().with_range(UPLOAD_RANGE, vec![vec!["game", "HEADLINE", "Fresh"]]);
        let performance = |asset: &str, label, cost, conversions| AssetPerformance {
            asset: asset.to_string(),
            label,
            cost_micros: cost,
            conversions,
        };
        let fake = FakeAds {
            performance: vec![
                performance("customers/100/assets/1", PerformanceLabel::Good, 10, 0.0),
                performance("customers/100/assets/2", PerformanceLabel::Low, 50, 5.0),
                performance("customers/100/assets/4", PerformanceLabel::Low, 90, 0.0),
            ],
            texts: vec![("customers/100/assets/4".to_string(), "Headline 4".to_string())],
            ..Default::default()
        }
        .with_ad("100", "7", AdType::AppAd, assets(5));
        let ads = AdsService::new(fake);
        let drive = FakeDrive::default();
        let options = UploaderOptions {
            remove_by_performance: true,
            ..Default::default()
        };

        uploader(&sheets, &ads, &drive, None, options)
            .run(&["s".to_string()], now())
            .await
            .unwrap();

        assert_eq!(
            ads.client().assets_of("7").headlines,
            strings(&["Headline 1", "Headline 2", "Headline 3", "Headline 5", "Fresh"])
        );
    }

    #[tokio::test]
    async fn existing_image_is_reused_by_name() {
        let sheets = mapping_sheet().with_range(
            UPLOAD_RANGE,
            vec![vec!["game", "IMAGE", "banner", "https://drive.google.com/file/d/x"]],
        );
        let fake = FakeAds {
            images: vec![ImageAsset {
                resource_name: "customers/100/assets/900".to_string(),
                name: "banner".to_string(),
                url: "https://img/900".to_string(),
            }],
            ..Default::default()
        }
        .with_ad("100", "7", AdType::AppAd, assets(3));
        let ads = AdsService::new(fake);
        let drive = FakeDrive::default();

        uploader(&sheets, &ads, &drive, None, UploaderOptions::default())
            .run(&["s".to_string()], now())
            .await
            .unwrap();

        assert!(ads.client().created.lock().unwrap().is_empty());
        assert_eq!(
            ads.client().assets_of("7").images,
            strings(&["customers/1/assets/500", "customers/100/assets/900"])
        );
    }

    #[tokio::test]
    async fn new_image_is_created_from_download() {
        let sheets = mapping_sheet().with_range(
            UPLOAD_RANGE,
            vec![vec!["game", "IMAGE", "splash", "https://drive.google.com/file/d/x"]],
        );
        let ads = AdsService::new(FakeAds::default().with_ad("100", "7", AdType::AppAd, assets(3)));
        let drive = FakeDrive::default();

        uploader(&sheets, &ads, &drive, None, UploaderOptions::default())
            .run(&["s".to_string()], now())
            .await
            .unwrap();

        assert_eq!(
            *ads.client().created.lock().unwrap(),
            strings(&["customers/100/assets/img-splash"])
        );
    }

    #[tokio::test]
    async fn drive_video_goes_through_youtube() {
        let sheets = mapping_sheet()
            .with_range(
                UPLOAD_RANGE,
                vec![
                    vec!["game", "VIDEO", "", "https://drive.google.com/file/d/v1"],
                    vec!["game", "VIDEO", "Known", "https://drive.google.com/file/d/v2"],
                ],
            )
            .with_range(
                YT_LIST_RANGE,
                vec![vec![
                    "https://www.youtube.com/watch?v=old1",
                    "https://drive.google.com/file/d/v2",
                    "Known",
                ]],
            );
        let ads = AdsService::new(FakeAds::default().with_ad("100", "7", AdType::AppAd, assets(3)));
        let drive = FakeDrive::default();
        let youtube = FakeYoutube::default();

        uploader(&sheets, &ads, &drive, Some(&youtube), UploaderOptions::default())
            .run(&["s".to_string()], now())
            .await
            .unwrap();

        // untitled rows are uploaded under their alias
        assert_eq!(*youtube.uploaded.lock().unwrap(), strings(&["game"]));
        assert_eq!(
            sheets.appended_to(YT_LIST_RANGE),
            vec![strings(&[
                "https://www.youtube.com/watch?v=yt1",
                "https://drive.google.com/file/d/v1",
                "game"
            ])]
        );
        assert_eq!(*youtube.processing_polls.lock().unwrap(), 1);
        assert_eq!(
            ads.client().assets_of("7").videos,
            strings(&["customers/100/assets/yt-yt1", "customers/100/assets/yt-old1"])
        );
    }

    #[tokio::test]
    async fn failed_video_download_is_logged() {
        let sheets = mapping_sheet().with_range(
            UPLOAD_RANGE,
            vec![vec!["game", "VIDEO", "Clip", "https://example.com/clip.mp4"]],
        );
        let ads = AdsService::new(FakeAds::default().with_ad("100", "7", AdType::AppAd, assets(3)));
        let drive = FakeDrive {
            broken_urls: vec!["https://example.com/clip.mp4".to_string()],
            ..Default::default()
        };
        let youtube = FakeYoutube::default();

        uploader(&sheets, &ads, &drive, Some(&youtube), UploaderOptions::default())
            .run(&["s".to_string()], now())
            .await
            .unwrap();

        let history = sheets.appended_to(CHANGE_HISTORY_RANGE);
        assert_eq!(history[0][9], YOUTUBE_UPLOAD_FAILED);
        assert!(history[1][9].starts_with("Unable to upload the asset. Errors: No YouTube video"));
        assert!(sheets.appended_to(YT_LIST_RANGE).is_empty());
    }
}
