use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{info, warn};

use crate::core::media::links::{watch_url, youtube_id_from_watch_url, DRIVE_FILE_URL, YOUTUBE_WATCH_URL};
use crate::core::media::{ChannelVideo, DriveClient, DriveFile, YoutubeClient};
use crate::core::sheets::layout::{UPLOAD_FILES_RANGE, YT_LIST_URL_RANGE};
use crate::core::sheets::SheetsClient;

/// Average month length used for the YouTube look-back window.
const DAYS_PER_MONTH: f64 = 30.436875;

const FOLDER_QUERY: &str = "mimeType='application/vnd.google-apps.folder' and trashed = false";

/// Fills the Upload sheet with media found in Drive and on the YouTube channel.
pub struct FileCollector<'a, S: SheetsClient, D: DriveClient, Y: YoutubeClient> {
    sheets: &'a S,
    drive: &'a D,
    youtube: Option<&'a Y>,
}

impl<'a, S: SheetsClient, D: DriveClient, Y: YoutubeClient> FileCollector<'a, S, D, Y> {
    pub fn new(sheets: &'a S, drive: &'a D, youtube: Option<&'a Y>) -> Self {
        Self {
            sheets,
            drive,
            youtube,
        }
    }

    pub async fn run(
        &self,
        spreadsheet_ids: &[String],
        folder_ids: &[String],
        youtube_window_months: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let files = self.recent_drive_files(folder_ids, now).await?;
        info!("Found {} recent image/video files in Drive", files.len());

        let mut known_videos = HashSet::new();
        for spreadsheet_id in spreadsheet_ids {
            if let Err(e) = self
                .append_new_files(spreadsheet_id, &files, &mut known_videos)
                .await
            {
                warn!("Unable to add Drive files to {}: {:#}", spreadsheet_id, e);
            }
        }

        let (Some(youtube), Some(window)) = (self.youtube, youtube_window_months) else {
            return Ok(());
        };
        let uploads = youtube
            .channel_uploads()
            .await
            .context("Unable to list YouTube channel uploads")?;
        let since = window_start(now.date_naive(), window);

        for spreadsheet_id in spreadsheet_ids {
            let rows = new_channel_rows(&uploads, &mut known_videos, since);
            if rows.is_empty() {
                continue;
            }
            info!("Adding {} YouTube videos to {}", rows.len(), spreadsheet_id);
            self.sheets
                .append_values(spreadsheet_id, UPLOAD_FILES_RANGE, &rows)
                .await
                .with_context(|| format!("Unable to add YouTube videos to {}", spreadsheet_id))?;
        }
        Ok(())
    }

    async fn recent_drive_files(
        &self,
        folder_ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<Vec<Vec<String>>> {
        let folders: Vec<String> = if folder_ids.is_empty() {
            self.drive
                .list_files(FOLDER_QUERY)
                .await
                .context("Unable to list Drive folders")?
                .into_iter()
                .map(|folder| folder.id)
                .collect()
        } else {
            folder_ids.to_vec()
        };

        let since = (now - Duration::hours(24)).format("%Y-%m-%dT%H:%M:%S%.3fZ");
        let mut rows = Vec::new();
        for folder_id in folders {
            let query = format!(
                "'{}' in parents and createdTime > '{}' and trashed = false",
                folder_id, since
            );
            let files = self
                .drive
                .list_files(&query)
                .await
                .with_context(|| format!("Unable to list files of Drive folder {}", folder_id))?;
            rows.extend(files.iter().filter_map(upload_row_for_file));
        }
        Ok(rows)
    }

    async fn append_new_files(
        &self,
        spreadsheet_id: &str,
        files: &[Vec<String>],
        known_videos: &mut HashSet<String>,
    ) -> Result<()> {
        let upload_rows = self
            .sheets
            .get_values(spreadsheet_id, UPLOAD_FILES_RANGE)
            .await?;
        let yt_rows = self
            .sheets
            .get_values(spreadsheet_id, YT_LIST_URL_RANGE)
            .await?;

        for row in &yt_rows {
            if let [url] = row.as_slice() {
                if url.contains(YOUTUBE_WATCH_URL) {
                    known_videos.extend(youtube_id_from_watch_url(url));
                }
            }
        }

        let mut urls_in_sheet = HashSet::new();
        for row in &upload_rows {
            if row.len() == 4 {
                let url = &row[3];
                urls_in_sheet.insert(url.clone());
                if url.contains(YOUTUBE_WATCH_URL) {
                    known_videos.extend(youtube_id_from_watch_url(url));
                }
            }
        }

        let new_files: Vec<Vec<String>> = files
            .iter()
            .filter(|file| !urls_in_sheet.contains(&file[3]))
            .cloned()
            .collect();
        if new_files.is_empty() {
            return Ok(());
        }
        info!("Adding {} Drive files to {}", new_files.len(), spreadsheet_id);
        self.sheets
            .append_values(spreadsheet_id, UPLOAD_FILES_RANGE, &new_files)
            .await?;
        Ok(())
    }
}

/// `['', TYPE, name, url]` for images and videos, nothing for other files.
fn upload_row_for_file(file: &DriveFile) -> Option<Vec<String>> {
    let kind = file.mime_type.split('/').next()?.to_uppercase();
    if kind != "IMAGE" && kind != "VIDEO" {
        return None;
    }
    Some(vec![
        String::new(),
        kind,
        strip_extension(&file.name).to_string(),
        format!("{}{}", DRIVE_FILE_URL, file.id),
    ])
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}

fn window_start(today: NaiveDate, months: u32) -> NaiveDate {
    let seconds = (months as f64 * DAYS_PER_MONTH * 24.0 * 60.0 * 60.0) as i64;
    today - Duration::seconds(seconds)
}

/// Channel uploads not seen before and published after `since`. Every unseen
/// video is remembered, even when it falls outside the window.
fn new_channel_rows(
    uploads: &[ChannelVideo],
    known_videos: &mut HashSet<String>,
    since: NaiveDate,
) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for video in uploads {
        if !known_videos.insert(video.video_id.clone()) {
            continue;
        }
        if video.published_on.is_some_and(|published| published > since) {
            rows.push(vec![
                String::new(),
                "VIDEO".to_string(),
                video.title.clone(),
                watch_url(&video.video_id),
            ]);
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::media::client::fake::{FakeDrive, FakeYoutube};
    use crate::core::sheets::client::fake::FakeSheets;
    use chrono::TimeZone;

    fn file(id: &str, name: &str, mime: &str) -> DriveFile {
        DriveFile {
            id: id.to_string(),
            name: name.to_string(),
            mime_type: mime.to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn only_images_and_videos_become_rows() {
        assert_eq!(
            upload_row_for_file(&file("f1", "hero.banner.png", "image/png")).unwrap(),
            vec!["", "IMAGE", "hero.banner", "https://drive.google.com/file/d/f1"]
        );
        assert!(upload_row_for_file(&file("f2", "notes.txt", "text/plain")).is_none());
        assert_eq!(strip_extension(".hidden"), ".hidden");
    }

    #[test]
    fn window_uses_average_month_length() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(
            window_start(today, 1),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
        );
    }

    #[tokio::test]
    async fn drive_files_already_in_sheet_are_skipped() {
        let sheets = FakeSheets::default().with_range(
            UPLOAD_FILES_RANGE,
            vec![vec!["", "IMAGE", "old", "https://drive.google.com/file/d/old"]],
        );
        let drive = FakeDrive {
            listings: vec![(
                "'folder-1' in parents".to_string(),
                vec![
                    file("old", "old.png", "image/png"),
                    file("new", "clip.mp4", "video/mp4"),
                ],
            )],
            ..Default::default()
        };
        let collector: FileCollector<_, _, FakeYoutube> = FileCollector::new(&sheets, &drive, None);

        collector
            .run(&["sheet".to_string()], &["folder-1".to_string()], None, now())
            .await
            .unwrap();

        assert_eq!(
            sheets.appended_to(UPLOAD_FILES_RANGE),
            vec![vec![
                "".to_string(),
                "VIDEO".to_string(),
                "clip".to_string(),
                "https://drive.google.com/file/d/new".to_string()
            ]]
        );
        let queries = drive.queries.lock().unwrap();
        assert!(queries[0].contains("createdTime > '2024-04-30T12:00:00.000Z'"));
    }

    #[tokio::test]
    async fn without_folders_every_folder_is_scanned() {
        let sheets = FakeSheets::default();
        let drive = FakeDrive {
            listings: vec![(
                "application/vnd.google-apps.folder".to_string(),
                vec![file("a", "A", "application/vnd.google-apps.folder")],
            )],
            ..Default::default()
        };
        let collector: FileCollector<_, _, FakeYoutube> = FileCollector::new(&sheets, &drive, None);
        collector.run(&["sheet".to_string()], &[], None, now()).await.unwrap();

        let queries = drive.queries.lock().unwrap();
        assert_eq!(queries.len(), 2);
        assert!(queries[1].starts_with("'a' in parents"));
    }

    #[tokio::test]
    async fn channel_uploads_inside_window_are_added_once() {
        let sheets = FakeSheets::default().with_range(
            YT_LIST_URL_RANGE,
            vec![vec!["https://www.youtube.com/watch?v=known"]],
        );
        let video = |id: &str, published: Option<NaiveDate>| ChannelVideo {
            video_id: id.to_string(),
            title: format!("title {}", id),
            published_on: published,
        };
        let youtube = FakeYoutube {
            uploads: vec![
                video("known", NaiveDate::from_ymd_opt(2024, 4, 20)),
                video("fresh", NaiveDate::from_ymd_opt(2024, 4, 20)),
                video("stale", NaiveDate::from_ymd_opt(2023, 1, 1)),
                video("private", None),
            ],
            ..Default::default()
        };
        let drive = FakeDrive::default();
        let collector = FileCollector::new(&sheets, &drive, Some(&youtube));

        collector
            .run(&["sheet".to_string()], &["f".to_string()], Some(2), now())
            .await
            .unwrap();

        assert_eq!(
            sheets.appended_to(UPLOAD_FILES_RANGE),
            vec![vec![
                "".to_string(),
                "VIDEO".to_string(),
                "title fresh".to_string(),
                "https://www.youtube.com/watch?v=fresh".to_string()
            ]]
        );
    }
}
