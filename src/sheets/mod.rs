pub mod auth;

pub use auth::{ServiceAccountTokenSource, TokenSource};
#[cfg(test)]
pub use auth::StaticToken;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::release::ReportRow;

/// Sheet id of the template every report is copied from.
pub const TEMPLATE_SHEET_ID: i64 = 0;

/// First spreadsheet row that receives report data.
pub const FIRST_DATA_ROW: usize = 3;

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("Sheets API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("Google credentials error: {0}")]
    Credentials(String),
}

/// The spreadsheet operations a release report needs.
#[async_trait]
pub trait SheetService: Send + Sync {
    /// Duplicate the template sheet and return the new sheet's id.
    async fn copy_template(&self) -> Result<i64, SheetsError>;

    async fn rename_sheet(&self, sheet_id: i64, title: &str) -> Result<(), SheetsError>;

    /// Write rows into columns A-C starting at `FIRST_DATA_ROW`.
    async fn write_rows(&self, title: &str, rows: &[ReportRow]) -> Result<(), SheetsError>;

    fn sheet_url(&self, sheet_id: i64) -> String;
}

/// Google Sheets v4 REST client bound to one spreadsheet.
pub struct SheetsClient<T> {
    client: reqwest::Client,
    api_url: String,
    spreadsheet_id: String,
    tokens: T,
}

impl<T: TokenSource> SheetsClient<T> {
    pub fn new(api_url: impl Into<String>, spreadsheet_id: impl Into<String>, tokens: T) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            tokens,
        }
    }

    fn spreadsheet_url(&self) -> String {
        format!("{}/v4/spreadsheets/{}", self.api_url, self.spreadsheet_id)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
}

/// A1 range covering `row_count` rows of columns A-C, e.g. `'Title'!A3:C7`.
pub fn values_range(title: &str, row_count: usize) -> String {
    let last_row = FIRST_DATA_ROW + row_count.saturating_sub(1);
    format!(
        "'{}'!A{}:C{}",
        title.replace('\'', "''"),
        FIRST_DATA_ROW,
        last_row
    )
}

pub fn sheet_url(spreadsheet_id: &str, sheet_id: i64) -> String {
    format!("https://docs.google.com/spreadsheets/d/{spreadsheet_id}/edit#gid={sheet_id}")
}

#[async_trait]
impl<T: TokenSource> SheetService for SheetsClient<T> {
    #[instrument(skip(self), fields(spreadsheet = %self.spreadsheet_id))]
    async fn copy_template(&self) -> Result<i64, SheetsError> {
        let token = self.tokens.access_token().await?;
        let url = format!(
            "{}/sheets/{}:copyTo",
            self.spreadsheet_url(),
            TEMPLATE_SHEET_ID
        );
        let properties = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&json!({ "destinationSpreadsheetId": self.spreadsheet_id }))
            .send()
            .await?
            .error_for_status()?
            .json::<SheetProperties>()
            .await?;
        debug!(sheet_id = properties.sheet_id, "copied template sheet");
        Ok(properties.sheet_id)
    }

    #[instrument(skip(self), fields(spreadsheet = %self.spreadsheet_id))]
    async fn rename_sheet(&self, sheet_id: i64, title: &str) -> Result<(), SheetsError> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}:batchUpdate", self.spreadsheet_url());
        let body = json!({
            "requests": [{
                "updateSheetProperties": {
                    "properties": { "sheetId": sheet_id, "title": title },
                    "fields": "title"
                }
            }]
        });
        self.client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        debug!("renamed sheet");
        Ok(())
    }

    #[instrument(skip(self, rows), fields(spreadsheet = %self.spreadsheet_id, row_count = rows.len()))]
    async fn write_rows(&self, title: &str, rows: &[ReportRow]) -> Result<(), SheetsError> {
        let token = self.tokens.access_token().await?;
        let range = values_range(title, rows.len());
        let url = format!(
            "{}/values/{}?valueInputOption=USER_ENTERED",
            self.spreadsheet_url(),
            urlencoding::encode(&range)
        );
        let values: Vec<[&str; 3]> = rows.iter().map(ReportRow::cells).collect();
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": values,
        });
        self.client
            .put(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        debug!(range = %range, "wrote rows");
        Ok(())
    }

    fn sheet_url(&self, sheet_id: i64) -> String {
        sheet_url(&self.spreadsheet_id, sheet_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::PullRequestRecord;
    use wiremock::matchers::{body_json, header, method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SheetsClient<StaticToken> {
        SheetsClient::new(server.uri(), "sheet-123", StaticToken("ya29".to_string()))
    }

    #[test]
    fn test_values_range() {
        assert_eq!(values_range("2024-01-02 03:04:05", 2), "'2024-01-02 03:04:05'!A3:C4");
        assert_eq!(values_range("It's", 1), "'It''s'!A3:C3");
    }

    #[test]
    fn test_sheet_url() {
        assert_eq!(
            sheet_url("abc", 987),
            "https://docs.google.com/spreadsheets/d/abc/edit#gid=987"
        );
    }

    #[tokio::test]
    async fn test_copy_template_returns_new_sheet_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet-123/sheets/0:copyTo"))
            .and(header("authorization", "Bearer ya29"))
            .and(body_json(json!({ "destinationSpreadsheetId": "sheet-123" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sheetId": 555, "title": "Copy of Template", "index": 3
            })))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(client(&server).copy_template().await.unwrap(), 555);
    }

    #[tokio::test]
    async fn test_rename_sheet_sends_update_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet-123:batchUpdate"))
            .and(body_json(json!({
                "requests": [{
                    "updateSheetProperties": {
                        "properties": { "sheetId": 555, "title": "2024-01-02 03:04:05" },
                        "fields": "title"
                    }
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "replies": [{}] })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .rename_sheet(555, "2024-01-02 03:04:05")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_write_rows_puts_values() {
        let server = MockServer::start().await;
        let record = PullRequestRecord::new("org/repo", 7, "alice", "Add feature").unwrap();
        let rows = vec![ReportRow::from(&record)];

        Mock::given(method("PUT"))
            .and(path_regex(r"^/v4/spreadsheets/sheet-123/values/.+$"))
            .and(query_param("valueInputOption", "USER_ENTERED"))
            .and(body_json(json!({
                "range": "'Release'!A3:C3",
                "majorDimension": "ROWS",
                "values": [[
                    "repo",
                    "alice",
                    "=HYPERLINK(\"https://github.com/org/repo/pull/7\", \"Add feature\")"
                ]]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "updatedRows": 1 })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).write_rows("Release", &rows).await.unwrap();
    }

    #[tokio::test]
    async fn test_api_error_is_propagated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client(&server).copy_template().await.unwrap_err();
        assert!(matches!(err, SheetsError::ApiRequest(_)));
    }

    #[tokio::test]
    async fn test_missing_key_file_is_credentials_error() {
        let result =
            ServiceAccountTokenSource::from_key_file(std::path::Path::new("/nonexistent/key.json"))
                .await;
        assert!(matches!(result, Err(SheetsError::Credentials(_))));
    }
}
