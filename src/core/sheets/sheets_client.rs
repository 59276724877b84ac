use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("Sheets API error: {0}")]
    Api(String),
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),
}

/// Values API plus batchUpdate, scoped by spreadsheet id. Cells are plain strings.
#[async_trait]
pub trait SheetsClient: Send + Sync {
    async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError>;

    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<(), SheetsError>;

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<(), SheetsError>;

    async fn clear_values(&self, spreadsheet_id: &str, range: &str) -> Result<(), SheetsError>;

    async fn batch_update(&self, spreadsheet_id: &str, requests: Vec<Value>)
        -> Result<(), SheetsError>;

    /// Numeric id of the tab called `title`.
    async fn sheet_id(&self, spreadsheet_id: &str, title: &str) -> Result<i64, SheetsError>;
}
