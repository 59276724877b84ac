use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::debug;

use crate::core::media::links::{drive_file_id, is_drive_url};
use crate::core::media::{DriveClient, DriveFile, MediaError};
use crate::infra::google_auth::TokenProvider;

const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";
const LIST_FIELDS: &str = "files(id, name, mimeType, createdTime), nextPageToken";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<ApiFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiFile {
    id: String,
    name: String,
    #[serde(default)]
    mime_type: String,
}

impl From<ApiFile> for DriveFile {
    fn from(file: ApiFile) -> Self {
        DriveFile {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
        }
    }
}

/// Google Drive v3 REST client.
pub struct DriveApiClient {
    client: Client,
    auth: Arc<dyn TokenProvider>,
}

impl DriveApiClient {
    pub fn new(auth: Arc<dyn TokenProvider>) -> Self {
        Self {
            client: Client::new(),
            auth,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, MediaError> {
        let token = self
            .auth
            .access_token()
            .await
            .map_err(|e| MediaError::Drive(e.to_string()))?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| MediaError::Drive(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Drive(format!("{}: {}", status, body)));
        }
        Ok(response)
    }
}

#[async_trait]
impl DriveClient for DriveApiClient {
    async fn list_files(&self, query: &str) -> Result<Vec<DriveFile>, MediaError> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("q", query.to_string()),
                ("fields", LIST_FIELDS.to_string()),
                ("pageSize", "1000".to_string()),
                ("supportsAllDrives", "true".to_string()),
                ("includeItemsFromAllDrives", "true".to_string()),
            ];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }

            let page: FileList = self
                .send(self.client.get(DRIVE_FILES_API).query(&params))
                .await?
                .json()
                .await
                .map_err(|e| MediaError::Drive(e.to_string()))?;
            files.extend(page.files.into_iter().map(DriveFile::from));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(files)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, MediaError> {
        let bytes = if is_drive_url(url) {
            let file_id = drive_file_id(url)?;
            debug!("Downloading Drive file {}", file_id);
            self.send(
                self.client
                    .get(format!("{}/{}", DRIVE_FILES_API, file_id))
                    .query(&[("alt", "media"), ("supportsAllDrives", "true")]),
            )
            .await?
            .bytes()
            .await
        } else {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| MediaError::Download(e.to_string()))?;
            if !response.status().is_success() {
                return Err(MediaError::Download(format!(
                    "{} returned {}",
                    url,
                    response.status()
                )));
            }
            response.bytes().await
        };
        bytes
            .map(|b| b.to_vec())
            .map_err(|e| MediaError::Download(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_list_pages_parse() {
        let page: FileList = serde_json::from_str(
            r#"{"files":[{"id":"1","name":"hero.png","mimeType":"image/png","createdTime":"2024-05-01T00:00:00Z"}],"nextPageToken":"p2"}"#,
        )
        .unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("p2"));
        let file = DriveFile::from(page.files.into_iter().next().unwrap());
        assert_eq!(file.mime_type, "image/png");

        let last: FileList = serde_json::from_str(r#"{"files":[]}"#).unwrap();
        assert!(last.next_page_token.is_none());
    }
}
