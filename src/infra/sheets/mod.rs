// Sheets infra layer.
// - `sheets_api_client.rs` talks to the Sheets v4 REST API.

pub mod sheets_api_client;

pub use sheets_api_client::SheetsApiClient;
