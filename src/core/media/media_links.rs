use regex::Regex;
use url::Url;

use super::client::MediaError;

pub const DRIVE_HOST_MARKER: &str = "drive.google.com";
pub const DRIVE_FILE_URL: &str = "https://drive.google.com/file/d/";
pub const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch?v=";

const DRIVE_OPEN_MARKER: &str = "drive.google.com/open?id=";
const DRIVE_FILE_MARKER: &str = "drive.google.com/file/d/";

const UNPARSEABLE_DRIVE_URL: &str =
    "Unable to prase the Drive URL. Kindly check the Drive URL of image exists.";

pub fn is_drive_url(url: &str) -> bool {
    url.contains(DRIVE_HOST_MARKER)
}

pub fn is_http_url(value: &str) -> bool {
    value.contains("http://") || value.contains("https://")
}

/// Extracts the file id from `open?id=` and `/file/d/` style links.
pub fn drive_file_id(url: &str) -> Result<String, MediaError> {
    if url.contains(DRIVE_OPEN_MARKER) {
        let parsed =
            Url::parse(url).map_err(|_| MediaError::InvalidUrl(UNPARSEABLE_DRIVE_URL.into()))?;
        return parsed
            .query_pairs()
            .find(|(k, _)| k == "id")
            .map(|(_, v)| v.into_owned())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| MediaError::InvalidUrl(UNPARSEABLE_DRIVE_URL.into()));
    }
    if url.contains(DRIVE_FILE_MARKER) {
        let re = Regex::new(r"/file/d/([^/?#]+)")
            .map_err(|e| MediaError::InvalidUrl(e.to_string()))?;
        return re
            .captures(url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| MediaError::InvalidUrl(UNPARSEABLE_DRIVE_URL.into()));
    }
    Err(MediaError::InvalidUrl(UNPARSEABLE_DRIVE_URL.into()))
}

/// The `v` parameter of a watch URL.
pub fn youtube_id_from_watch_url(url: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == "v")
        .map(|(_, v)| v.to_string())
        .filter(|v| !v.is_empty())
}

pub fn watch_url(video_id: &str) -> String {
    format!("{}{}", YOUTUBE_WATCH_URL, video_id)
}
