use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::auth::AuthorizedClient;
use crate::config::LedgerConfig;
use crate::models::SessionRecord;

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Which part of the session tracker to read.
#[derive(Debug, Clone)]
pub struct RowWindow {
    pub sheet: String,
    pub start_row: usize,
    pub last_column: String,
}

impl RowWindow {
    pub fn from_config(config: &LedgerConfig) -> Self {
        RowWindow {
            sheet: config.sheet.clone(),
            start_row: config.start_row.max(1),
            last_column: config.last_column.clone(),
        }
    }

    /// A1 notation, e.g. `'Session Tracker'!A500:P`.
    pub fn a1_range(&self) -> String {
        format!("'{}'!A{}:{}", self.sheet, self.start_row, self.last_column)
    }
}

/// Source of raw ledger rows, each an ordered list of cell strings.
#[async_trait]
pub trait LedgerSource {
    async fn get_rows(&self, window: &RowWindow) -> anyhow::Result<Vec<Vec<String>>>;
}

/// Attach sheet row numbers to the rows of `window`.
pub fn decode_rows(window: &RowWindow, rows: &[Vec<String>]) -> Vec<SessionRecord> {
    rows.iter()
        .enumerate()
        .map(|(idx, cells)| SessionRecord::from_row(window.start_row + idx, cells))
        .collect()
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

pub struct SheetsLedger {
    client: AuthorizedClient,
    spreadsheet_id: String,
}

impl SheetsLedger {
    pub fn new(client: AuthorizedClient, spreadsheet_id: impl Into<String>) -> Self {
        SheetsLedger {
            client,
            spreadsheet_id: spreadsheet_id.into(),
        }
    }
}

#[async_trait]
impl LedgerSource for SheetsLedger {
    async fn get_rows(&self, window: &RowWindow) -> anyhow::Result<Vec<Vec<String>>> {
        let mut url = reqwest::Url::parse(SHEETS_API_URL)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("invalid Sheets API base URL"))?
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&window.a1_range());

        debug!("Fetching {}", window.a1_range());
        let response = self
            .client
            .http
            .get(url)
            .bearer_auth(&self.client.access_token)
            .send()
            .await
            .context("Sheets API request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Sheets API returned {}", response.status());
        }

        let body: ValueRange = response
            .json()
            .await
            .context("failed to parse Sheets API response")?;
        Ok(body.values)
    }
}

/// Headerless CSV export of the whole session tracker.
pub struct CsvLedger {
    path: PathBuf,
}

impl CsvLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvLedger { path: path.into() }
    }
}

#[async_trait]
impl LedgerSource for CsvLedger {
    async fn get_rows(&self, window: &RowWindow) -> anyhow::Result<Vec<Vec<String>>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result.with_context(|| format!("bad CSV line {}", idx + 1))?;
            if idx + 1 < window.start_row {
                continue;
            }
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(rows)
    }
}
