//! WatchlistStore trait definition.
//!
//! Core trait that all watchlist persistence backends implement.

use crate::core::{Result, Watchlist};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Backend type identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Plain text file, one code per line
    File,
    /// Hosted Google spreadsheet
    Sheet,
    /// In-process memory
    Memory,
}

impl std::fmt::Display for StoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreType::File => write!(f, "file"),
            StoreType::Sheet => write!(f, "sheet"),
            StoreType::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for StoreType {
    type Err = crate::core::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "txt" => Ok(StoreType::File),
            "sheet" | "sheets" => Ok(StoreType::Sheet),
            "memory" | "mem" => Ok(StoreType::Memory),
            other => Err(crate::core::Error::Config(format!("unknown store backend: {}", other))),
        }
    }
}

/// Core trait for watchlist stores.
///
/// The watchlist is loaded once per run and saved at most once, always as
/// the full set.
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Load the persisted watchlist.
    ///
    /// A store that has never been written loads as empty.
    async fn load(&self) -> Result<Watchlist>;

    /// Replace the persisted watchlist.
    async fn save(&self, watchlist: &Watchlist) -> Result<()>;

    /// Get the backend type.
    fn store_type(&self) -> StoreType;

    /// Health check for the backend.
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
