//! Store configuration.
//!
//! Configuration-driven backend selection.

use crate::store::backend::StoreType;
use crate::store::google::{ServiceAccountKey, DEFAULT_SHEETS_API_BASE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default path of the plain-text watchlist.
pub const DEFAULT_FILE_PATH: &str = "stock_list.txt";

/// Watchlist store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend type to use
    pub backend: StoreType,
    /// File-specific config
    pub file: Option<FileConfig>,
    /// Sheet-specific config
    pub sheet: Option<SheetConfig>,
}

impl StoreConfig {
    /// Plain-text file store.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: StoreType::File,
            file: Some(FileConfig { path: path.into() }),
            sheet: None,
        }
    }

    /// Google spreadsheet store.
    pub fn sheet(config: SheetConfig) -> Self {
        Self {
            backend: StoreType::Sheet,
            file: None,
            sheet: Some(config),
        }
    }

    /// In-memory store.
    pub fn memory() -> Self {
        Self {
            backend: StoreType::Memory,
            file: None,
            sheet: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::file(DEFAULT_FILE_PATH)
    }
}

/// File backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileConfig {
    /// Path of the list file
    pub path: PathBuf,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_FILE_PATH),
        }
    }
}

fn default_sheets_api_base() -> String {
    DEFAULT_SHEETS_API_BASE.to_string()
}

fn default_sheet_timeout() -> u64 {
    15
}

/// Spreadsheet backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Spreadsheet id (the long key in the sheet URL, not its title)
    pub spreadsheet_id: String,
    /// Service account the bot acts as; it must be an editor of the sheet
    pub credentials: ServiceAccountKey,
    /// Worksheet title (None = first worksheet)
    #[serde(default)]
    pub worksheet: Option<String>,
    /// Sheets API base URL
    #[serde(default = "default_sheets_api_base")]
    pub api_base: String,
    /// Per-request timeout (seconds)
    #[serde(default = "default_sheet_timeout")]
    pub timeout_secs: u64,
}

impl SheetConfig {
    /// Create a config for the first worksheet of a spreadsheet.
    pub fn new(spreadsheet_id: &str, credentials: ServiceAccountKey) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.to_string(),
            credentials,
            worksheet: None,
            api_base: default_sheets_api_base(),
            timeout_secs: default_sheet_timeout(),
        }
    }

    /// Use a named worksheet.
    pub fn with_worksheet(mut self, worksheet: &str) -> Self {
        self.worksheet = Some(worksheet.to_string());
        self
    }

    /// Override the API base URL.
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.to_string();
        self
    }
}
