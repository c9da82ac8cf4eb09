//! Google Sheets REST ingestion.
//!
//! Talks to the v4 `spreadsheets` API with a bearer token: list the tabs
//! of a spreadsheet, then pull one tab's values and shape them into the
//! same headers/rows structure the XLSX path produces. Credentials are
//! an explicit [`AuthContext`] loaded from a [`TokenStore`]; nothing in
//! the binding engine ever touches them.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;

use super::{SheetData, derive_headers, rows_from_cells};
use crate::error::SheetSyncError;

static SHEET_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"spreadsheets/d/([a-zA-Z0-9-_]+)").expect("valid sheet id pattern"));

/// Pull the spreadsheet id out of a share URL, or `None` if the URL does
/// not look like a Sheets link.
pub fn parse_sheet_id(url: &str) -> Option<String> {
    SHEET_ID_RE
        .captures(url)
        .map(|c| c[1].to_string())
}

/// A stored OAuth token. Only the access token is consulted here;
/// refresh flows live outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

/// Where tokens persist between runs.
pub trait TokenStore {
    fn load(&self) -> Result<Option<OAuthToken>, SheetSyncError>;
    fn save(&self, token: &OAuthToken) -> Result<(), SheetSyncError>;
    fn clear(&self) -> Result<(), SheetSyncError>;
}

/// JSON-file token store.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<OAuthToken>, SheetSyncError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, token: &OAuthToken) -> Result<(), SheetSyncError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(token)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SheetSyncError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Credentials handed to [`SheetsClient`] for one session.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub token: OAuthToken,
}

impl AuthContext {
    pub fn new(token: OAuthToken) -> Self {
        Self { token }
    }

    /// Load from a store, failing with [`SheetSyncError::Auth`] when no
    /// token has been saved yet.
    pub fn from_store(store: &dyn TokenStore) -> Result<Self, SheetSyncError> {
        match store.load()? {
            Some(token) => Ok(Self { token }),
            None => Err(SheetSyncError::Auth(
                "no stored Google token; authenticate first".to_string(),
            )),
        }
    }
}

/// One tab of a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: i64,
    pub title: String,
}

#[derive(Deserialize)]
struct MetaResponse {
    #[serde(default)]
    sheets: Vec<MetaSheet>,
}

#[derive(Deserialize)]
struct MetaSheet {
    properties: MetaProperties,
}

#[derive(Deserialize)]
struct MetaProperties {
    #[serde(rename = "sheetId")]
    sheet_id: i64,
    title: String,
}

#[derive(Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Thin client over the Sheets v4 REST API.
pub struct SheetsClient {
    http: reqwest::Client,
    auth: AuthContext,
    base: String,
}

impl SheetsClient {
    pub fn new(auth: AuthContext) -> Result<Self, SheetSyncError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("sheetsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SheetSyncError::Ingest(format!("http client: {e}")))?;
        Ok(Self {
            http,
            auth,
            base: "https://sheets.googleapis.com/v4/spreadsheets".to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, SheetSyncError> {
        let res = self
            .http
            .get(url)
            .bearer_auth(&self.auth.token.access_token)
            .send()
            .await
            .map_err(|e| SheetSyncError::Ingest(format!("sheets request failed: {e}")))?;
        if !res.status().is_success() {
            return Err(SheetSyncError::Ingest(format!(
                "sheets API returned {}",
                res.status()
            )));
        }
        res.json()
            .await
            .map_err(|e| SheetSyncError::Ingest(format!("sheets response body: {e}")))
    }

    /// Tab metadata in spreadsheet order.
    pub async fn list_tabs(&self, sheet_id: &str) -> Result<Vec<TabInfo>, SheetSyncError> {
        let url = format!(
            "{}/{sheet_id}?fields=sheets(properties(sheetId,title,index))",
            self.base
        );
        let meta: MetaResponse = self.get_json(&url).await?;
        Ok(meta
            .sheets
            .into_iter()
            .map(|s| TabInfo {
                id: s.properties.sheet_id,
                title: s.properties.title,
            })
            .collect())
    }

    /// Fetch one tab's values. The first row is the header row; columns
    /// beyond it label as `Column N`. Ragged rows pad with empty strings.
    pub async fn fetch_tab(
        &self,
        sheet_id: &str,
        tab_title: &str,
    ) -> Result<SheetData, SheetSyncError> {
        let range = format!("'{tab_title}'!A1:Z10000");
        let url = format!(
            "{}/{sheet_id}/values/{}",
            self.base,
            encode_path_segment(&range)
        );
        let body: ValuesResponse = self.get_json(&url).await?;
        Ok(shape_values(body.values))
    }
}

/// Values → headers + rows, with missing header cells labeled `Column N`.
fn shape_values(values: Vec<Vec<String>>) -> SheetData {
    if values.is_empty() {
        return SheetData::default();
    }
    let max_cols = values.iter().map(Vec::len).max().unwrap_or(0);
    let header_row = &values[0];
    let labels: Vec<String> = (0..max_cols)
        .map(|i| {
            header_row
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("Column {}", i + 1))
        })
        .collect();
    let headers = derive_headers(&labels);
    let rows = rows_from_cells(&headers, &values[1..]);
    SheetData { headers, rows }
}

/// Percent-encode the A1 range for a path segment.
fn encode_path_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_sheet_id_from_share_url() {
        let url = "https://docs.google.com/spreadsheets/d/1AbC-dEf_123/edit#gid=0";
        assert_eq!(parse_sheet_id(url), Some("1AbC-dEf_123".to_string()));
        assert_eq!(parse_sheet_id("https://example.com/doc"), None);
    }

    #[test]
    fn ragged_values_get_positional_labels_and_padding() {
        let data = shape_values(vec![
            vec!["Title".into()],
            vec!["Hello".into(), "extra".into()],
        ]);
        let keys: Vec<&str> = data.headers.iter().map(|h| h.key.as_str()).collect();
        assert_eq!(keys, vec!["title", "column_2"]);
        assert_eq!(data.headers[1].label, "Column 2");
        assert_eq!(data.rows[0]["column_2"], "extra");
    }

    #[test]
    fn empty_values_produce_empty_data() {
        let data = shape_values(vec![]);
        assert!(data.headers.is_empty());
        assert!(data.rows.is_empty());
    }

    #[test]
    fn range_encoding_escapes_quotes_and_bang() {
        assert_eq!(
            encode_path_segment("'My Tab'!A1:Z10000"),
            "%27My%20Tab%27%21A1%3AZ10000"
        );
    }

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = std::env::temp_dir().join(format!("sheetsync-test-{}", std::process::id()));
        let store = FileTokenStore::new(dir.join("token.json"));
        assert!(store.load().unwrap().is_none());
        let token = OAuthToken {
            access_token: "ya29.secret".into(),
            refresh_token: Some("1//refresh".into()),
            expires_at: None,
        };
        store.save(&token).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.access_token, "ya29.secret");
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        let _ = std::fs::remove_dir_all(dir);
    }
}
