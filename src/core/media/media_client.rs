use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Drive API error: {0}")]
    Drive(String),
    #[error("YouTube API error: {0}")]
    Youtube(String),
    #[error("Download failed: {0}")]
    Download(String),
    #[error("{0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
}

/// An upload on the authenticated YouTube channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelVideo {
    pub video_id: String,
    pub title: String,
    pub published_on: Option<NaiveDate>,
}

#[async_trait]
pub trait DriveClient: Send + Sync {
    /// All files matching a Drive search query, across every page and shared drive.
    async fn list_files(&self, query: &str) -> Result<Vec<DriveFile>, MediaError>;

    /// Drive links are fetched through the Drive API, anything else with a plain GET.
    async fn download(&self, url: &str) -> Result<Vec<u8>, MediaError>;
}

#[async_trait]
pub trait YoutubeClient: Send + Sync {
    /// Uploads an unlisted video and returns its id.
    async fn upload_video(&self, data: Vec<u8>, title: &str) -> Result<String, MediaError>;

    /// False while any of `video_ids` is still processing.
    async fn processing_finished(&self, video_ids: &[String]) -> Result<bool, MediaError>;

    async fn channel_uploads(&self) -> Result<Vec<ChannelVideo>, MediaError>;
}

#[cfg(test)]
pub(crate) mod fake {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{ChannelVideo, DriveClient, DriveFile, MediaError, YoutubeClient};

    #[derive(Default)]
    pub struct FakeDrive {
        /// (query fragment, files)
        pub listings: Vec<(String, Vec<DriveFile>)>,
        pub queries: Mutex<Vec<String>>,
        pub broken_urls: Vec<String>,
    }

    #[async_trait]
    impl DriveClient for FakeDrive {
        async fn list_files(&self, query: &str) -> Result<Vec<DriveFile>, MediaError> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self
                .listings
                .iter()
                .find(|(fragment, _)| query.contains(fragment.as_str()))
                .map(|(_, files)| files.clone())
                .unwrap_or_default())
        }

        async fn download(&self, url: &str) -> Result<Vec<u8>, MediaError> {
            if self.broken_urls.iter().any(|u| u == url) {
                return Err(MediaError::Download(format!("404 for {}", url)));
            }
            Ok(format!("bytes:{}", url).into_bytes())
        }
    }

    #[derive(Default)]
    pub struct FakeYoutube {
        pub uploads: Vec<ChannelVideo>,
        pub uploaded: Mutex<Vec<String>>,
        pub processing_polls: Mutex<u32>,
    }

    #[async_trait]
    impl YoutubeClient for FakeYoutube {
        async fn upload_video(&self, _: Vec<u8>, title: &str) -> Result<String, MediaError> {
            let mut uploaded = self.uploaded.lock().unwrap();
            uploaded.push(title.to_string());
            Ok(format!("yt{}", uploaded.len()))
        }

        async fn processing_finished(&self, _: &[String]) -> Result<bool, MediaError> {
            *self.processing_polls.lock().unwrap() += 1;
            Ok(true)
        }

        async fn channel_uploads(&self) -> Result<Vec<ChannelVideo>, MediaError> {
            Ok(self.uploads.clone())
        }
    }
}
