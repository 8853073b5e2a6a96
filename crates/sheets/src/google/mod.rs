//! Google Sheets v4 backend.
//!
//! Partitions are sheet tabs. All writes use `valueInputOption=RAW` so
//! values land exactly as the exporter produced them.

pub mod auth;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::SheetError;
use crate::store::{column_letters, quote_partition, CellRef, SheetStore};

pub use auth::{ServiceAccountAuth, ServiceAccountKey};

/// Default Sheets API endpoint.
pub const DEFAULT_API_URL: &str = "https://sheets.googleapis.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSpreadsheet {
    spreadsheet_id: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Spreadsheet stored in Google Sheets.
pub struct GoogleSheetsStore {
    client: reqwest::Client,
    auth: ServiceAccountAuth,
    api_url: String,
    spreadsheet_id: String,
}

impl GoogleSheetsStore {
    /// Create a store for `spreadsheet_id` authenticated as `key`.
    pub fn new(
        key: ServiceAccountKey,
        spreadsheet_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SheetError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, key, DEFAULT_API_URL, spreadsheet_id))
    }

    /// Create a store reusing an existing [`reqwest::Client`] and API URL.
    pub fn with_client(
        client: reqwest::Client,
        key: ServiceAccountKey,
        api_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
    ) -> Self {
        Self {
            auth: ServiceAccountAuth::new(key, client.clone()),
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// `{api}/v4/spreadsheets/{segments...}` with each segment escaped.
    fn url(&self, segments: &[&str]) -> Result<Url, SheetError> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| SheetError::Decode(format!("invalid API URL '{}': {e}", self.api_url)))?;
        url.path_segments_mut()
            .map_err(|_| SheetError::Decode(format!("API URL '{}' cannot be a base", self.api_url)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets"])
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, SheetError> {
        let token = self.auth.access_token().await?;
        let response = request.bearer_auth(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SheetError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<Value>().await?)
    }

    async fn send_as<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SheetError> {
        let body = self.send(request).await?;
        serde_json::from_value(body).map_err(|e| SheetError::Decode(e.to_string()))
    }
}

/// Append range covering the columns of the widest row, e.g. `'Mochi'!A:F`.
fn append_range(partition: &str, rows: &[Vec<Value>]) -> String {
    let width = rows.iter().map(Vec::len).max().unwrap_or(1).max(1);
    format!(
        "{}!A:{}",
        quote_partition(partition),
        column_letters(width as u32 - 1)
    )
}

#[async_trait]
impl SheetStore for GoogleSheetsStore {
    async fn create_spreadsheet(&self, title: &str) -> Result<String, SheetError> {
        let url = self.url(&[])?;
        let body = json!({"properties": {"title": title}});
        let created: CreatedSpreadsheet = self
            .send_as(
                self.client
                    .post(url)
                    .query(&[("fields", "spreadsheetId")])
                    .json(&body),
            )
            .await?;
        tracing::info!(spreadsheet_id = %created.spreadsheet_id, title, "Created spreadsheet");
        Ok(created.spreadsheet_id)
    }

    async fn list_partitions(&self) -> Result<Vec<String>, SheetError> {
        let url = self.url(&[&self.spreadsheet_id])?;
        let meta: SpreadsheetMeta = self
            .send_as(self.client.get(url).query(&[("fields", "sheets.properties.title")]))
            .await?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    async fn create_partition(&self, name: &str) -> Result<(), SheetError> {
        let url = self.url(&[&format!("{}:batchUpdate", self.spreadsheet_id)])?;
        let body = json!({"requests": [{"addSheet": {"properties": {"title": name}}}]});
        self.send(self.client.post(url).json(&body)).await?;
        tracing::info!(partition = name, "Created sheet partition");
        Ok(())
    }

    async fn read_cell(&self, cell: &CellRef) -> Result<Option<Value>, SheetError> {
        let url = self.url(&[&self.spreadsheet_id, "values", &cell.a1()])?;
        let range: ValueRange = self.send_as(self.client.get(url)).await?;
        Ok(range
            .values
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .filter(|v| !v.is_null() && v.as_str() != Some("")))
    }

    async fn write_row(&self, start: &CellRef, values: Vec<Value>) -> Result<(), SheetError> {
        let url = self.url(&[&self.spreadsheet_id, "values", &start.a1()])?;
        let body = json!({"majorDimension": "ROWS", "values": [values]});
        self.send(
            self.client
                .put(url)
                .query(&[("valueInputOption", "RAW")])
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn append_rows(&self, partition: &str, rows: Vec<Vec<Value>>) -> Result<(), SheetError> {
        let range = append_range(partition, &rows);
        let url = self.url(&[&self.spreadsheet_id, "values", &format!("{range}:append")])?;
        let count = rows.len();
        let body = json!({"majorDimension": "ROWS", "values": rows});
        self.send(
            self.client
                .post(url)
                .query(&[("valueInputOption", "RAW")])
                .json(&body),
        )
        .await?;
        tracing::debug!(partition, rows = count, "Appended rows");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(api_url: &str) -> GoogleSheetsStore {
        GoogleSheetsStore::with_client(
            reqwest::Client::new(),
            ServiceAccountKey {
                client_email: "bot@x.iam".into(),
                private_key: "pem".into(),
                token_uri: "http://localhost/token".into(),
            },
            api_url,
            "sheet-123",
        )
    }

    #[test]
    fn urls_escape_ranges() {
        let s = store("https://sheets.googleapis.com/");
        let url = s
            .url(&["sheet-123", "values", "'Mr Whiskers'!A1"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/'Mr%20Whiskers'!A1"
        );
    }

    #[test]
    fn batch_update_url_keeps_colon_suffix() {
        let s = store("https://sheets.googleapis.com");
        let url = s.url(&["sheet-123:batchUpdate"]).unwrap();
        assert!(url.as_str().ends_with("/v4/spreadsheets/sheet-123:batchUpdate"));
    }

    #[test]
    fn append_range_spans_widest_row() {
        let rows = vec![vec![json!(1); 6], vec![json!(1); 10]];
        assert_eq!(append_range("other", &rows), "'other'!A:J");
        assert_eq!(append_range("Mochi", &[]), "'Mochi'!A:A");
    }
}
