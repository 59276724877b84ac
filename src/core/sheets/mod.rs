// Spreadsheet feature.
// - `sheet_layout.rs` fixes ranges, columns and row shapes.
// - `sheets_client.rs` is the trait the Sheets API client implements.
// - `sheet_requests.rs` builds batchUpdate requests.

#[path = "sheet_layout.rs"]
pub mod layout;

#[path = "sheets_client.rs"]
pub mod client;

#[path = "sheet_requests.rs"]
pub mod requests;

pub use client::{SheetsClient, SheetsError};
