//! Process configuration.
//!
//! Everything a run needs, read from the environment by the binary and
//! passed down explicitly.

use crate::core::{Error, Result};
use crate::intent::ExtractorConfig;
use crate::store::config::DEFAULT_FILE_PATH;
use crate::store::{ServiceAccountKey, SheetConfig, StoreConfig, StoreType};
use crate::transport::TelegramConfig;
use serde::{Deserialize, Serialize};

/// Bot token variable (required).
pub const ENV_BOT_TOKEN: &str = "TG_BOT_TOKEN";
/// Authorized chat id variable (optional).
pub const ENV_CHAT_ID: &str = "TG_CHAT_ID";
/// Bot API base URL variable (optional).
pub const ENV_API_BASE: &str = "TG_API_BASE";
/// Staleness threshold variable, in seconds (optional).
pub const ENV_STALENESS_SECS: &str = "WATCHLIST_STALENESS_SECS";
/// Store backend variable: `file` or `sheet` (optional).
pub const ENV_BACKEND: &str = "WATCHLIST_BACKEND";
/// File store path variable (optional).
pub const ENV_PATH: &str = "WATCHLIST_PATH";
/// Service account key JSON (required for the sheet store).
pub const ENV_SA_KEY: &str = "GCP_SA_KEY";
/// Spreadsheet id (required for the sheet store).
pub const ENV_SHEET_ID: &str = "SHEET_NAME";
/// Worksheet title (optional, first worksheet by default).
pub const ENV_WORKSHEET: &str = "SHEET_TAB";
/// Sheets API base URL (optional).
pub const ENV_SHEETS_API_BASE: &str = "SHEETS_API_BASE";

/// Bot runner configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BotConfig {
    /// Filters and keywords applied to each message
    pub extractor: ExtractorConfig,
}

impl BotConfig {
    /// Create a config with default extractor settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict processing to one sender; replies also go there.
    pub fn with_authorized_sender(mut self, sender: &str) -> Self {
        self.extractor = self.extractor.with_authorized_sender(sender);
        self
    }

    /// Set the staleness threshold.
    pub fn with_staleness_secs(mut self, secs: u64) -> Self {
        self.extractor = self.extractor.with_staleness_secs(secs);
        self
    }

    /// The configured authorized sender, if any.
    pub fn authorized_sender(&self) -> Option<&str> {
        self.extractor.authorized_sender.as_deref()
    }
}

/// Full application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chat transport
    pub telegram: TelegramConfig,
    /// Runner
    pub bot: BotConfig,
    /// Persistence
    pub store: StoreConfig,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through a variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let token = get(ENV_BOT_TOKEN).ok_or_else(|| Error::MissingCredential(ENV_BOT_TOKEN.to_string()))?;
        let mut telegram = TelegramConfig::new(&token);
        if let Some(base) = get(ENV_API_BASE) {
            telegram = telegram.with_api_base(&base);
        }

        let mut bot = BotConfig::new();
        if let Some(chat_id) = get(ENV_CHAT_ID) {
            bot = bot.with_authorized_sender(&chat_id);
        }
        if let Some(raw) = get(ENV_STALENESS_SECS) {
            let secs = raw
                .parse::<u64>()
                .map_err(|_| Error::Config(format!("{} must be a number of seconds, got {:?}", ENV_STALENESS_SECS, raw)))?;
            bot = bot.with_staleness_secs(secs);
        }

        let backend = match get(ENV_BACKEND) {
            Some(raw) => raw.parse::<StoreType>()?,
            None => StoreType::File,
        };
        let store = match backend {
            StoreType::File => StoreConfig::file(get(ENV_PATH).unwrap_or_else(|| DEFAULT_FILE_PATH.to_string())),
            StoreType::Sheet => {
                let key = get(ENV_SA_KEY).ok_or_else(|| Error::MissingCredential(ENV_SA_KEY.to_string()))?;
                let spreadsheet_id =
                    get(ENV_SHEET_ID).ok_or_else(|| Error::MissingCredential(ENV_SHEET_ID.to_string()))?;
                let credentials = ServiceAccountKey::from_json(&key).map_err(|e| match e {
                    Error::Config(msg) => Error::Config(format!("{}: {}", ENV_SA_KEY, msg)),
                    other => other,
                })?;

                let mut sheet = SheetConfig::new(&spreadsheet_id, credentials);
                if let Some(tab) = get(ENV_WORKSHEET) {
                    sheet = sheet.with_worksheet(&tab);
                }
                if let Some(base) = get(ENV_SHEETS_API_BASE) {
                    sheet = sheet.with_api_base(&base);
                }
                StoreConfig::sheet(sheet)
            }
            StoreType::Memory => StoreConfig::memory(),
        };

        Ok(Self { telegram, bot, store })
    }
}
