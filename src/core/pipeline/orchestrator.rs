use std::fmt;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use tracing::{error, info};

use crate::core::ads::{AdsClient, AdsService};
use crate::core::media::{DriveClient, YoutubeClient};
use crate::core::settings::DefaultAlias;
use crate::core::sheets::SheetsClient;

use super::creative_remover::CreativeRemover;
use super::creative_uploader::{CreativeUploader, UploaderOptions};
use super::file_collector::FileCollector;
use super::mapping_refresher::MappingRefresher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    GetFiles,
    RemoveCreatives,
    UploadCreatives,
    RefreshMapping,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::GetFiles,
        Stage::RemoveCreatives,
        Stage::UploadCreatives,
        Stage::RefreshMapping,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::GetFiles => "get_file",
            Stage::RemoveCreatives => "creative_remover",
            Stage::UploadCreatives => "creative_uploader",
            Stage::RefreshMapping => "refresh_mapping_sheet",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything the stages need from the setup file, resolved once.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub spreadsheet_ids: Vec<String>,
    pub drive_folder_ids: Vec<String>,
    pub youtube_window_months: Option<u32>,
    pub refresh_mapping: bool,
    pub login_customer_id: Option<String>,
    pub default_alias: DefaultAlias,
    pub uploader: UploaderOptions,
    /// Pause between uploader mutations.
    pub upload_pause: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            spreadsheet_ids: Vec::new(),
            drive_folder_ids: Vec::new(),
            youtube_window_months: None,
            refresh_mapping: false,
            login_customer_id: None,
            default_alias: DefaultAlias::None,
            uploader: UploaderOptions::default(),
            upload_pause: Duration::from_secs(1),
        }
    }
}

pub struct Pipeline<'a, S, A, D, Y>
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
    settings: PipelineSettings,
}

impl<'a, S, A, D, Y> Pipeline<'a, S, A, D, Y>
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
        settings: PipelineSettings,
    ) -> Self {
        Self {
            sheets,
            ads,
            drive,
            youtube,
            settings,
        }
    }

    /// Runs every stage in order. A failing stage is logged and the next one
    /// still runs. The mapping stage only runs when it is enabled.
    pub async fn run_all(&self) {
        let started = Instant::now();
        info!("Creative Mango started at {}", Local::now());

        for stage in Stage::ALL {
            if stage == Stage::RefreshMapping && !self.settings.refresh_mapping {
                info!("Mapping sheet refresh is disabled, skipping it");
                continue;
            }
            if let Err(e) = self.run_stage(stage, Local::now()).await {
                error!("{} failed: {:#}", stage, e);
            }
        }

        info!(
            "Creative Mango finished at {}. Elapsed time: {:.1?}",
            Local::now(),
            started.elapsed()
        );
    }

    pub async fn run_stage(&self, stage: Stage, now: DateTime<Local>) -> Result<()> {
        info!("Starting {}", stage);
        let ids = &self.settings.spreadsheet_ids;
        match stage {
            Stage::GetFiles => {
                FileCollector::new(self.sheets, self.drive, self.youtube)
                    .run(
                        ids,
                        &self.settings.drive_folder_ids,
                        self.settings.youtube_window_months,
                        now.with_timezone(&Utc),
                    )
                    .await?
            }
            Stage::RemoveCreatives => {
                CreativeRemover::new(self.sheets, self.ads)
                    .run(ids, now)
                    .await?
            }
            Stage::UploadCreatives => {
                CreativeUploader::new(
                    self.sheets,
                    self.ads,
                    self.drive,
                    self.youtube,
                    self.settings.uploader,
                )
                .with_pause(self.settings.upload_pause)
                .run(ids, now)
                .await?
            }
            Stage::RefreshMapping => {
                MappingRefresher::new(
                    self.sheets,
                    self.ads,
                    self.settings.login_customer_id.clone(),
                    self.settings.default_alias,
                )
                .run(ids, now)
                .await?
            }
        }
        info!("Finished {}", stage);
        Ok(())
    }
}
