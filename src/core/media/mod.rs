// Media sources: Drive files, YouTube uploads and image de-duplication.

#[path = "media_client.rs"]
pub mod client;

#[path = "media_links.rs"]
pub mod links;

#[path = "image_matching.rs"]
pub mod images;

pub use client::{ChannelVideo, DriveClient, DriveFile, MediaError, YoutubeClient};
