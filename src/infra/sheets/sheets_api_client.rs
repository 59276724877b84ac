use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::sheets::{SheetsClient, SheetsError};
use crate::infra::google_auth::TokenProvider;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
struct Sheet {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

/// Google Sheets v4 REST client.
pub struct SheetsApiClient {
    client: Client,
    auth: Arc<dyn TokenProvider>,
}

impl SheetsApiClient {
    pub fn new(auth: Arc<dyn TokenProvider>) -> Self {
        Self {
            client: Client::new(),
            auth,
        }
    }

    fn values_url(spreadsheet_id: &str, range: &str) -> String {
        format!(
            "{}/{}/values/{}",
            SHEETS_API,
            spreadsheet_id,
            urlencode(range)
        )
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, SheetsError> {
        let token = self
            .auth
            .access_token()
            .await
            .map_err(|e| SheetsError::Api(e.to_string()))?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SheetsError::Api(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Api(format!("{}: {}", status, body)));
        }
        Ok(response)
    }
}

fn urlencode(range: &str) -> String {
    url::form_urlencoded::byte_serialize(range.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Sheets returns formatted strings, but keep numbers and booleans readable too.
fn cell_text(cell: Value) -> String {
    match cell {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SheetsClient for SheetsApiClient {
    async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        let response = self
            .send(self.client.get(Self::values_url(spreadsheet_id, range)))
            .await?;
        let body: ValueRange = response
            .json()
            .await
            .map_err(|e| SheetsError::Api(e.to_string()))?;
        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<(), SheetsError> {
        if rows.is_empty() {
            return Ok(());
        }
        let url = format!("{}:append", Self::values_url(spreadsheet_id, range));
        self.send(
            self.client
                .post(url)
                .query(&[("valueInputOption", "RAW")])
                .json(&json!({ "values": rows })),
        )
        .await?;
        Ok(())
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<(), SheetsError> {
        self.send(
            self.client
                .put(Self::values_url(spreadsheet_id, range))
                .query(&[("valueInputOption", "RAW")])
                .json(&json!({ "range": range, "values": rows })),
        )
        .await?;
        Ok(())
    }

    async fn clear_values(&self, spreadsheet_id: &str, range: &str) -> Result<(), SheetsError> {
        let url = format!("{}:clear", Self::values_url(spreadsheet_id, range));
        self.send(self.client.post(url).json(&json!({}))).await?;
        Ok(())
    }

    async fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: Vec<Value>,
    ) -> Result<(), SheetsError> {
        if requests.is_empty() {
            return Ok(());
        }
        let url = format!("{}/{}:batchUpdate", SHEETS_API, spreadsheet_id);
        self.send(self.client.post(url).json(&json!({ "requests": requests })))
            .await?;
        Ok(())
    }

    async fn sheet_id(&self, spreadsheet_id: &str, title: &str) -> Result<i64, SheetsError> {
        let url = format!("{}/{}", SHEETS_API, spreadsheet_id);
        let response = self
            .send(self.client.get(url).query(&[("fields", "sheets.properties")]))
            .await?;
        let spreadsheet: Spreadsheet = response
            .json()
            .await
            .map_err(|e| SheetsError::Api(e.to_string()))?;
        spreadsheet
            .sheets
            .into_iter()
            .find(|sheet| sheet.properties.title == title)
            .map(|sheet| sheet.properties.sheet_id)
            .ok_or_else(|| SheetsError::SheetNotFound(title.to_string()))
    }
}
