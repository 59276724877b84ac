// Media infra layer.
// - `drive_api_client.rs` lists and downloads Drive files.
// - `youtube_api_client.rs` uploads videos and reads the channel's uploads.

pub mod drive_api_client;
pub mod youtube_api_client;

pub use drive_api_client::DriveApiClient;
pub use youtube_api_client::YoutubeApiClient;
