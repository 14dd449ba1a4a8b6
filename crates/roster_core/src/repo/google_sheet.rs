//! Google Sheets worksheet backend.
//!
//! # Responsibility
//! - Open a spreadsheet by name (Drive file search) or by id.
//! - Map positional worksheet operations onto Sheets v4 REST calls.
//!
//! # Invariants
//! - Every request carries the configured bearer token.
//! - Values are read with `UNFORMATTED_VALUE` so numbers keep their type.
//! - Writes use `RAW`: names are never evaluated as formulas and `007`
//!   stays text.

use crate::repo::cell::CellValue;
use crate::repo::worksheet::{check_row, RepoError, RepoResult, Worksheet};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// OAuth scopes requested for service-account tokens.
pub const SHEETS_SCOPES: &[&str] = &[
    "https://spreadsheets.google.com/feeds",
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.file",
    "https://www.googleapis.com/auth/drive",
];

const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Transport settings for the Sheets client.
#[derive(Debug, Clone)]
pub struct SheetsClientConfig {
    pub access_token: String,
    pub sheets_api_base: String,
    pub drive_api_base: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl SheetsClientConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            sheets_api_base: SHEETS_API_BASE.to_string(),
            drive_api_base: DRIVE_API_BASE.to_string(),
            connect_timeout_ms: 5_000,
            request_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SheetTab {
    #[serde(rename = "sheetId")]
    pub sheet_id: i64,
    pub title: String,
    #[serde(default)]
    pub index: i64,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetTab,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Handle on one opened spreadsheet.
pub struct SheetsClient {
    agent: ureq::Agent,
    config: SheetsClientConfig,
    spreadsheet_id: String,
    tabs: Vec<SheetTab>,
}

impl SheetsClient {
    /// Resolves `name` through Drive and opens the first matching spreadsheet.
    pub fn open_by_name(config: SheetsClientConfig, name: &str) -> RepoResult<Self> {
        let agent = build_agent(&config);
        let query = format!(
            "name = '{}' and mimeType = '{SPREADSHEET_MIME_TYPE}' and trashed = false",
            name.replace('\\', "\\\\").replace('\'', "\\'")
        );
        let url = format!("{}/files", config.drive_api_base);
        let list: DriveFileList = read_json(
            authorized(agent.get(&url), &config.access_token)
                .query("q", &query)
                .query("fields", "files(id,name)")
                .query("supportsAllDrives", "true")
                .query("includeItemsFromAllDrives", "true")
                .call(),
        )?;

        let id = list
            .files
            .into_iter()
            .next()
            .map(|file| file.id)
            .ok_or_else(|| RepoError::SpreadsheetNotFound(name.to_string()))?;
        Self::open_with_agent(agent, config, id)
    }

    /// Opens a spreadsheet by its id.
    pub fn open_by_key(config: SheetsClientConfig, spreadsheet_id: &str) -> RepoResult<Self> {
        let agent = build_agent(&config);
        Self::open_with_agent(agent, config, spreadsheet_id.to_string())
    }

    fn open_with_agent(
        agent: ureq::Agent,
        config: SheetsClientConfig,
        spreadsheet_id: String,
    ) -> RepoResult<Self> {
        let url = format!(
            "{}/spreadsheets/{}",
            config.sheets_api_base,
            urlencoding::encode(&spreadsheet_id)
        );
        let meta: SpreadsheetMeta = read_json(
            authorized(agent.get(&url), &config.access_token)
                .query("fields", "sheets.properties(sheetId,title,index)")
                .call(),
        )?;

        let mut tabs = meta
            .sheets
            .into_iter()
            .map(|entry| entry.properties)
            .collect::<Vec<_>>();
        tabs.sort_by_key(|tab| tab.index);
        debug!(
            "event=sheets_open module=repo status=ok tabs={}",
            tabs.len()
        );

        Ok(Self {
            agent,
            config,
            spreadsheet_id,
            tabs,
        })
    }

    #[cfg(test)]
    pub(crate) fn from_parts(
        config: SheetsClientConfig,
        spreadsheet_id: &str,
        tabs: Vec<SheetTab>,
    ) -> Self {
        Self {
            agent: build_agent(&config),
            config,
            spreadsheet_id: spreadsheet_id.to_string(),
            tabs,
        }
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// Returns the first tab by display order.
    pub fn sheet1(&self) -> RepoResult<GoogleWorksheet<'_>> {
        self.tabs
            .first()
            .cloned()
            .map(|tab| GoogleWorksheet { client: self, tab })
            .ok_or_else(|| RepoError::WorksheetNotFound("<first tab>".to_string()))
    }

    pub fn worksheet(&self, title: &str) -> RepoResult<GoogleWorksheet<'_>> {
        self.tabs
            .iter()
            .find(|tab| tab.title == title)
            .cloned()
            .map(|tab| GoogleWorksheet { client: self, tab })
            .ok_or_else(|| RepoError::WorksheetNotFound(title.to_string()))
    }

    fn values_url(&self, range: &str, suffix: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}{suffix}",
            self.config.sheets_api_base,
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(range)
        )
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        debug!("event=sheets_request module=repo method={method}");
        authorized(self.agent.request(method, url), &self.config.access_token)
    }
}

/// One tab of an opened spreadsheet.
pub struct GoogleWorksheet<'client> {
    client: &'client SheetsClient,
    tab: SheetTab,
}

impl GoogleWorksheet<'_> {
    pub fn sheet_id(&self) -> i64 {
        self.tab.sheet_id
    }

    fn whole_range(&self) -> String {
        quote_title(&self.tab.title)
    }

    fn row_range(&self, row: usize) -> String {
        format!("{}!A{row}", quote_title(&self.tab.title))
    }
}

impl Worksheet for GoogleWorksheet<'_> {
    fn title(&self) -> &str {
        &self.tab.title
    }

    fn get_all_values(&self) -> RepoResult<Vec<Vec<CellValue>>> {
        let url = self.client.values_url(&self.whole_range(), "");
        let range: ValueRange = read_json(
            self.client
                .request("GET", &url)
                .query("valueRenderOption", "UNFORMATTED_VALUE")
                .query("majorDimension", "ROWS")
                .call(),
        )?;
        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_from_json).collect())
            .collect())
    }

    fn append_row(&self, cells: &[CellValue]) -> RepoResult<()> {
        let range = self.whole_range();
        let url = self.client.values_url(&range, ":append");
        let _: Value = read_json(
            self.client
                .request("POST", &url)
                .query("valueInputOption", "RAW")
                .query("insertDataOption", "INSERT_ROWS")
                .send_json(json!({
                    "range": range,
                    "majorDimension": "ROWS",
                    "values": [cells_to_json(cells)],
                })),
        )?;
        Ok(())
    }

    fn update_row(&self, row: usize, cells: &[CellValue]) -> RepoResult<()> {
        check_row(row, self.get_all_values()?.len())?;
        let range = self.row_range(row);
        let url = self.client.values_url(&range, "");
        let _: Value = read_json(
            self.client
                .request("PUT", &url)
                .query("valueInputOption", "RAW")
                .send_json(json!({
                    "range": range,
                    "majorDimension": "ROWS",
                    "values": [cells_to_json(cells)],
                })),
        )?;
        Ok(())
    }

    fn delete_row(&self, row: usize) -> RepoResult<()> {
        check_row(row, self.get_all_values()?.len())?;
        let url = format!(
            "{}/spreadsheets/{}:batchUpdate",
            self.client.config.sheets_api_base,
            urlencoding::encode(&self.client.spreadsheet_id)
        );
        let _: Value = read_json(self.client.request("POST", &url).send_json(json!({
            "requests": [{
                "deleteDimension": {
                    "range": {
                        "sheetId": self.tab.sheet_id,
                        "dimension": "ROWS",
                        "startIndex": row - 1,
                        "endIndex": row,
                    }
                }
            }]
        })))?;
        Ok(())
    }
}

pub(crate) fn build_agent(config: &SheetsClientConfig) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_millis(config.connect_timeout_ms))
        .timeout_read(Duration::from_millis(config.request_timeout_ms))
        .timeout_write(Duration::from_millis(config.request_timeout_ms))
        .build()
}

fn authorized(request: ureq::Request, token: &str) -> ureq::Request {
    request
        .set("Authorization", &format!("Bearer {token}"))
        .set("Accept", "application/json")
}

pub(crate) fn read_json<T: DeserializeOwned>(
    response: Result<ureq::Response, ureq::Error>,
) -> RepoResult<T> {
    match response {
        Ok(response) => response
            .into_json::<T>()
            .map_err(|err| RepoError::InvalidData(format!("unexpected sheets response: {err}"))),
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            Err(RepoError::HttpStatus {
                status,
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            })
        }
        Err(ureq::Error::Transport(err)) => Err(RepoError::Transport(err.to_string())),
    }
}

/// Quotes a tab title for A1 notation (`'Logs'`, `'O''Brien'`).
fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn cells_to_json(cells: &[CellValue]) -> Vec<Value> {
    cells
        .iter()
        .map(|cell| match cell {
            CellValue::Empty => Value::String(String::new()),
            CellValue::Bool(value) => json!(value),
            CellValue::Integer(value) => json!(value),
            CellValue::Number(value) => json!(value),
            CellValue::Text(value) => json!(value),
        })
        .collect()
}

fn cell_from_json(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::Bool(value) => CellValue::Bool(value),
        Value::Number(number) => match number.as_i64() {
            Some(value) => CellValue::Integer(value),
            None => number.as_f64().map_or(CellValue::Empty, CellValue::Number),
        },
        Value::String(text) => CellValue::text(text),
        other => CellValue::text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        cell_from_json, cells_to_json, quote_title, SheetTab, SheetsClient, SheetsClientConfig,
    };
    use crate::repo::cell::CellValue;
    use crate::repo::test_support::serve;
    use crate::repo::worksheet::{RepoError, Worksheet};
    use serde_json::json;

    const THREE_ROWS: &str = r#"{"values":[["ID","Name","Age","Grade"],["a1","ana",12,7.5],["b2","bia",13,9]]}"#;

    #[test]
    fn quote_title_escapes_apostrophes() {
        assert_eq!(quote_title("Logs"), "'Logs'");
        assert_eq!(quote_title("O'Brien"), "'O''Brien'");
    }

    #[test]
    fn json_cells_keep_numeric_typing() {
        assert_eq!(cell_from_json(json!(12)), CellValue::Integer(12));
        assert_eq!(cell_from_json(json!(7.5)), CellValue::Number(7.5));
        assert_eq!(cell_from_json(json!("")), CellValue::Empty);
        assert_eq!(cell_from_json(json!("ana")), CellValue::text("ana"));

        let encoded = cells_to_json(&[CellValue::Empty, CellValue::Integer(3), CellValue::text("x")]);
        assert_eq!(encoded, vec![json!(""), json!(3), json!("x")]);
    }

    #[test]
    fn get_all_values_reads_rows_with_bearer_token() {
        let (base, server) = serve(vec![(200, THREE_ROWS)]);
        let client = test_client(&base);

        let rows = client.worksheet("Students").unwrap().get_all_values().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][2], CellValue::Integer(12));
        assert_eq!(rows[1][3], CellValue::Number(7.5));

        let requests = server.join().unwrap();
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].path, "/spreadsheets/sheet-123/values/%27Students%27");
        assert_eq!(requests[0].header("authorization"), Some("Bearer token-abc"));
        assert_eq!(
            requests[0].query_param("valueRenderOption").as_deref(),
            Some("UNFORMATTED_VALUE")
        );
    }

    #[test]
    fn append_row_sends_raw_values_for_the_whole_tab() {
        let (base, server) = serve(vec![(200, "{}")]);
        let client = test_client(&base);

        client
            .worksheet("Students")
            .unwrap()
            .append_row(&[
                CellValue::text("a1"),
                CellValue::text("=IMPORTXML(\"http://x\")"),
                CellValue::text("007"),
                CellValue::Number(7.5),
            ])
            .unwrap();

        let requests = server.join().unwrap();
        let request = &requests[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/spreadsheets/sheet-123/values/%27Students%27:append");
        assert_eq!(request.query_param("valueInputOption").as_deref(), Some("RAW"));
        assert_eq!(
            request.query_param("insertDataOption").as_deref(),
            Some("INSERT_ROWS")
        );
        assert_eq!(
            request.json()["values"],
            json!([["a1", "=IMPORTXML(\"http://x\")", "007", 7.5]])
        );
    }

    #[test]
    fn update_row_targets_the_a1_row_range() {
        let (base, server) = serve(vec![(200, THREE_ROWS), (200, "{}")]);
        let client = test_client(&base);

        client
            .worksheet("Students")
            .unwrap()
            .update_row(2, &[CellValue::text("a1"), CellValue::text("ana maria")])
            .unwrap();

        let requests = server.join().unwrap();
        assert_eq!(requests.len(), 2);
        let update = &requests[1];
        assert_eq!(update.method, "PUT");
        assert_eq!(update.path, "/spreadsheets/sheet-123/values/%27Students%27%21A2");
        assert_eq!(update.query_param("valueInputOption").as_deref(), Some("RAW"));
        assert_eq!(update.json()["range"], json!("'Students'!A2"));
        assert_eq!(update.json()["values"], json!([["a1", "ana maria"]]));
    }

    #[test]
    fn delete_row_removes_exactly_that_row_index() {
        let (base, server) = serve(vec![(200, THREE_ROWS), (200, "{}")]);
        let client = test_client(&base);

        client.worksheet("Logs").unwrap().delete_row(3).unwrap();

        let requests = server.join().unwrap();
        let delete = &requests[1];
        assert_eq!(delete.method, "POST");
        assert_eq!(delete.path, "/spreadsheets/sheet-123:batchUpdate");
        assert_eq!(
            delete.json()["requests"][0]["deleteDimension"]["range"],
            json!({"sheetId": 77, "dimension": "ROWS", "startIndex": 2, "endIndex": 3})
        );
    }

    #[test]
    fn delete_row_past_the_end_sends_no_batch_update() {
        let (base, server) = serve(vec![(200, THREE_ROWS)]);
        let client = test_client(&base);

        let err = client.worksheet("Students").unwrap().delete_row(4).unwrap_err();
        assert!(matches!(err, RepoError::RowOutOfRange { row: 4, row_count: 3 }));
        assert_eq!(server.join().unwrap().len(), 1);
    }

    #[test]
    fn open_by_name_queries_drive_then_orders_tabs() {
        let files = r#"{"files":[{"id":"file-9","name":"Turma D'Agua"}]}"#;
        let meta = r#"{"sheets":[{"properties":{"sheetId":5,"title":"Logs","index":1}},{"properties":{"sheetId":0,"title":"Alunos","index":0}}]}"#;
        let (base, server) = serve(vec![(200, files), (200, meta)]);
        let mut config = SheetsClientConfig::new("token-abc");
        config.sheets_api_base = base.clone();
        config.drive_api_base = base;

        let client = SheetsClient::open_by_name(config, "Turma D'Agua").unwrap();
        assert_eq!(client.spreadsheet_id(), "file-9");
        assert_eq!(client.sheet1().unwrap().title(), "Alunos");
        assert_eq!(client.worksheet("Logs").unwrap().sheet_id(), 5);

        let requests = server.join().unwrap();
        assert_eq!(requests[0].path, "/files");
        assert_eq!(
            requests[0].query_param("q").as_deref(),
            Some(
                "name = 'Turma D\\'Agua' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false"
            )
        );
        assert_eq!(requests[1].path, "/spreadsheets/file-9");
        assert_eq!(requests[1].header("authorization"), Some("Bearer token-abc"));
    }

    #[test]
    fn open_by_name_without_match_is_reported() {
        let (base, server) = serve(vec![(200, r#"{"files":[]}"#)]);
        let mut config = SheetsClientConfig::new("token-abc");
        config.drive_api_base = base;

        assert!(matches!(
            SheetsClient::open_by_name(config, "Banco-Alunos"),
            Err(RepoError::SpreadsheetNotFound(name)) if name == "Banco-Alunos"
        ));
        server.join().unwrap();
    }

    #[test]
    fn http_error_status_maps_to_repo_error() {
        let (base, server) = serve(vec![(403, r#"{"error":{"message":"denied"}}"#)]);
        let client = test_client(&base);

        let err = client.worksheet("Students").unwrap().get_all_values().unwrap_err();
        match err {
            RepoError::HttpStatus { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("denied"));
            }
            other => panic!("unexpected error: {other}"),
        }
        server.join().unwrap();
    }

    #[test]
    fn unknown_tab_is_reported() {
        let client = test_client("http://127.0.0.1:9");
        assert!(matches!(
            client.worksheet("Missing"),
            Err(RepoError::WorksheetNotFound(title)) if title == "Missing"
        ));
        assert_eq!(client.sheet1().unwrap().sheet_id(), 0);
    }

    fn test_client(base: &str) -> SheetsClient {
        let mut config = SheetsClientConfig::new("token-abc");
        config.sheets_api_base = base.to_string();
        config.drive_api_base = base.to_string();
        SheetsClient::from_parts(
            config,
            "sheet-123",
            vec![
                SheetTab {
                    sheet_id: 0,
                    title: "Students".to_string(),
                    index: 0,
                },
                SheetTab {
                    sheet_id: 77,
                    title: "Logs".to_string(),
                    index: 1,
                },
            ],
        )
    }
}
