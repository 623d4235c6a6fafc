//! Backend factory.
//!
//! Creates watchlist stores based on configuration.

use crate::core::{Error, Result};
use crate::store::backend::{StoreType, WatchlistStore};
use crate::store::backends::{FileBackend, MemoryBackend, SheetBackend};
use crate::store::config::StoreConfig;
use std::sync::Arc;
use tracing::info;

/// Create a watchlist store from configuration.
///
/// Returns an Arc-wrapped store for shared ownership.
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn WatchlistStore>> {
    let store: Arc<dyn WatchlistStore> = match config.backend {
        StoreType::File => {
            let file_config = config.file.clone().unwrap_or_default();
            info!(path = %file_config.path.display(), "Using file watchlist store");
            Arc::new(FileBackend::new(file_config))
        }
        StoreType::Sheet => {
            let sheet_config = config
                .sheet
                .clone()
                .ok_or_else(|| Error::Config("sheet store selected without sheet settings".to_string()))?;
            info!(
                spreadsheet = %sheet_config.spreadsheet_id,
                client_email = %sheet_config.credentials.client_email,
                "Using spreadsheet watchlist store"
            );
            Arc::new(SheetBackend::new(sheet_config)?)
        }
        StoreType::Memory => Arc::new(MemoryBackend::new()),
    };
    Ok(store)
}
