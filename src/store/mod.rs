//! Watchlist persistence.
//!
//! Trait-based store supporting:
//! - Plain-text file
//! - Google spreadsheet (service account auth)
//! - In-memory

pub mod backend;
pub mod backends;
pub mod config;
pub mod factory;
pub mod google;

pub use backend::{StoreType, WatchlistStore};
pub use backends::{FileBackend, MemoryBackend, SheetBackend, SheetRow, Upsert};
pub use config::{FileConfig, SheetConfig, StoreConfig};
pub use factory::create_store;
pub use google::{ServiceAccountAuth, ServiceAccountKey, SheetsClient};
