use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rand::Rng;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::core::media::{ChannelVideo, MediaError, YoutubeClient};
use crate::infra::google_auth::TokenProvider;

const YOUTUBE_API: &str = "https://www.googleapis.com/youtube/v3";
const UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status";

const DEFAULT_TITLE: &str = "creative-mango tool upload";
const DESCRIPTION: &str = "creative-mango tool upload";
const CATEGORY_ID: &str = "22";
const MAX_TITLE_CHARS: usize = 100;
const MAX_RETRIES: u32 = 10;
const RETRIABLE_STATUS_CODES: [u16; 4] = [500, 502, 503, 504];
const PLAYLIST_PAGE_SIZE: &str = "5";

#[derive(Debug, Deserialize)]
struct UploadedVideo {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessingItem {
    processing_details: Option<ProcessingDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessingDetails {
    processing_status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Channel {
    content_details: ChannelContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    snippet: PlaylistSnippet,
    content_details: PlaylistContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistSnippet {
    title: String,
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistContentDetails {
    video_published_at: Option<String>,
}

impl From<PlaylistItem> for ChannelVideo {
    fn from(item: PlaylistItem) -> Self {
        ChannelVideo {
            video_id: item.snippet.resource_id.video_id,
            title: item.snippet.title,
            published_on: item
                .content_details
                .video_published_at
                .as_deref()
                .and_then(|at| at.get(..10))
                .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()),
        }
    }
}

/// YouTube Data v3 REST client for the authenticated channel.
pub struct YoutubeApiClient {
    client: Client,
    auth: Arc<dyn TokenProvider>,
}

impl YoutubeApiClient {
    pub fn new(auth: Arc<dyn TokenProvider>) -> Self {
        Self {
            client: Client::new(),
            auth,
        }
    }

    async fn token(&self) -> Result<String, MediaError> {
        self.auth
            .access_token()
            .await
            .map_err(|e| MediaError::Youtube(e.to_string()))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, MediaError> {
        let response = request
            .bearer_auth(self.token().await?)
            .send()
            .await
            .map_err(|e| MediaError::Youtube(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Youtube(format!("{}: {}", status, body)));
        }
        Ok(response)
    }

    /// Opens a resumable upload session and returns its URL.
    async fn start_session(&self, title: &str, size: usize) -> Result<String, MediaError> {
        let response = self
            .send(
                self.client
                    .post(UPLOAD_URL)
                    .header("X-Upload-Content-Type", "video/mp4")
                    .header("X-Upload-Content-Length", size.to_string())
                    .json(&upload_metadata(title)),
            )
            .await?;
        response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| MediaError::Youtube("upload session has no Location header".to_string()))
    }

    /// Sends the video body, retrying server errors and dropped connections.
    async fn resumable_upload(&self, session: &str, data: Vec<u8>) -> Result<String, MediaError> {
        let mut retry = 0;
        loop {
            let attempt = self
                .client
                .put(session)
                .bearer_auth(self.token().await?)
                .header(CONTENT_TYPE, "video/mp4")
                .body(data.clone())
                .send()
                .await;

            let error = match attempt {
                Ok(response) if response.status().is_success() => {
                    let video: UploadedVideo = response
                        .json()
                        .await
                        .map_err(|e| MediaError::Youtube(e.to_string()))?;
                    return video.id.ok_or_else(|| {
                        MediaError::Youtube(
                            "The upload failed with an unexpected response".to_string(),
                        )
                    });
                }
                Ok(response) if is_retriable(response.status()) => {
                    format!("A retriable HTTP error {} occurred", response.status())
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(MediaError::Youtube(format!("{}: {}", status, body)));
                }
                Err(e) => format!("A retriable error occurred: {}", e),
            };

            retry += 1;
            if retry > MAX_RETRIES {
                return Err(MediaError::Youtube(
                    "No longer attempting to retry.".to_string(),
                ));
            }
            let sleep = backoff(retry);
            warn!(
                "{}. YouTube sleeping {:.1?} and then retrying...",
                error, sleep
            );
            tokio::time::sleep(sleep).await;
        }
    }
}

fn is_retriable(status: StatusCode) -> bool {
    RETRIABLE_STATUS_CODES.contains(&status.as_u16())
}

/// Random wait in `[0, 2 * retry)` seconds.
fn backoff(retry: u32) -> Duration {
    let max_sleep = 2.0 * retry as f64;
    Duration::from_secs_f64(rand::thread_rng().gen::<f64>() * max_sleep)
}

fn video_title(title: &str) -> String {
    if title.is_empty() {
        return DEFAULT_TITLE.to_string();
    }
    title.chars().take(MAX_TITLE_CHARS).collect()
}

fn upload_metadata(title: &str) -> Value {
    json!({
        "snippet": {
            "title": video_title(title),
            "description": DESCRIPTION,
            "categoryId": CATEGORY_ID,
        },
        "status": { "privacyStatus": "unlisted" },
    })
}

#[async_trait]
impl YoutubeClient for YoutubeApiClient {
    async fn upload_video(&self, data: Vec<u8>, title: &str) -> Result<String, MediaError> {
        if data.is_empty() {
            return Err(MediaError::Youtube("video file is empty".to_string()));
        }
        let session = self.start_session(title, data.len()).await?;
        let video_id = self.resumable_upload(&session, data).await?;
        info!("Uploaded video {} to YouTube", video_id);
        Ok(video_id)
    }

    async fn processing_finished(&self, video_ids: &[String]) -> Result<bool, MediaError> {
        if video_ids.is_empty() {
            return Ok(true);
        }
        let ids = video_ids.join(",");
        let list: ItemList<ProcessingItem> = self
            .send(
                self.client
                    .get(format!("{}/videos", YOUTUBE_API))
                    .query(&[("part", "processingDetails"), ("id", ids.as_str())]),
            )
            .await?
            .json()
            .await
            .map_err(|e| MediaError::Youtube(e.to_string()))?;

        Ok(!list.items.iter().any(|item| {
            item.processing_details
                .as_ref()
                .and_then(|d| d.processing_status.as_deref())
                == Some("processing")
        }))
    }

    async fn channel_uploads(&self) -> Result<Vec<ChannelVideo>, MediaError> {
        let channels: ItemList<Channel> = self
            .send(
                self.client
                    .get(format!("{}/channels", YOUTUBE_API))
                    .query(&[("mine", "true"), ("part", "contentDetails")]),
            )
            .await?
            .json()
            .await
            .map_err(|e| MediaError::Youtube(e.to_string()))?;
        let Some(playlist_id) = channels
            .items
            .into_iter()
            .last()
            .map(|c| c.content_details.related_playlists.uploads)
        else {
            return Err(MediaError::Youtube(
                "the authenticated user has no channel".to_string(),
            ));
        };

        let mut videos = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut params = vec![
                ("playlistId", playlist_id.clone()),
                ("part", "snippet,contentDetails".to_string()),
                ("maxResults", PLAYLIST_PAGE_SIZE.to_string()),
            ];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }
            let page: ItemList<PlaylistItem> = self
                .send(
                    self.client
                        .get(format!("{}/playlistItems", YOUTUBE_API))
                        .query(&params),
                )
                .await?
                .json()
                .await
                .map_err(|e| MediaError::Youtube(e.to_string()))?;
            videos.extend(page.items.into_iter().map(ChannelVideo::from));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(videos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_are_capped_and_defaulted() {
        assert_eq!(video_title(""), DEFAULT_TITLE);
        assert_eq!(video_title(&"é".repeat(150)).chars().count(), 100);
        let metadata = upload_metadata("Launch trailer");
        assert_eq!(metadata["snippet"]["title"], "Launch trailer");
        assert_eq!(metadata["snippet"]["categoryId"], "22");
        assert_eq!(metadata["status"]["privacyStatus"], "unlisted");
    }

    #[test]
    fn only_gateway_errors_are_retried() {
        assert!(is_retriable(StatusCode::BAD_GATEWAY));
        assert!(is_retriable(StatusCode::GATEWAY_TIMEOUT));
        assert!(!is_retriable(StatusCode::FORBIDDEN));
        for retry in 1..=MAX_RETRIES {
            assert!(backoff(retry) < Duration::from_secs(2 * retry as u64));
        }
    }

    #[test]
    fn playlist_items_keep_publish_day() {
        let page: ItemList<PlaylistItem> = serde_json::from_str(
            r#"{"items":[
                {"snippet":{"title":"Teaser","resourceId":{"kind":"youtube#video","videoId":"abc"}},
                 "contentDetails":{"videoId":"abc","videoPublishedAt":"2024-04-20T10:00:00Z"}},
                {"snippet":{"title":"Private","resourceId":{"videoId":"def"}},
                 "contentDetails":{"videoId":"def"}}
            ]}"#,
        )
        .unwrap();
        let videos: Vec<ChannelVideo> = page.items.into_iter().map(ChannelVideo::from).collect();
        assert_eq!(videos[0].video_id, "abc");
        assert_eq!(videos[0].published_on, NaiveDate::from_ymd_opt(2024, 4, 20));
        assert_eq!(videos[1].published_on, None);
        assert!(page.next_page_token.is_none());
    }
}
