//! Plain-text file backend.
//!
//! One code per line, sorted. Writes go to a sibling temp file which is then
//! renamed over the list so a crash never leaves a half-written file.

use crate::core::{Error, Result, StockCode, Watchlist};
use crate::store::backend::{StoreType, WatchlistStore};
use crate::store::config::FileConfig;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File backend.
pub struct FileBackend {
    /// Configuration
    config: FileConfig,
}

impl FileBackend {
    /// Create a new file backend.
    pub fn new(config: FileConfig) -> Self {
        Self { config }
    }

    /// Get the list path.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .config
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.config.path.with_file_name(name)
    }
}

/// Parse the line format. Blank lines are ignored.
pub fn parse_list(contents: &str) -> Result<Watchlist> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(StockCode::parse)
        .collect()
}

/// Render the line format.
pub fn render_list(watchlist: &Watchlist) -> String {
    let mut output = String::new();
    for code in watchlist {
        output.push_str(code.as_str());
        output.push('\n');
    }
    output
}

#[async_trait]
impl WatchlistStore for FileBackend {
    async fn load(&self) -> Result<Watchlist> {
        match tokio::fs::read_to_string(&self.config.path).await {
            Ok(contents) => {
                let watchlist = parse_list(&contents)?;
                debug!(path = %self.config.path.display(), count = watchlist.len(), "Loaded watchlist");
                Ok(watchlist)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Watchlist::new()),
            Err(e) => Err(Error::Io(e)),
        }
    }

    async fn save(&self, watchlist: &Watchlist) -> Result<()> {
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, render_list(watchlist)).await?;
        tokio::fs::rename(&tmp, &self.config.path).await?;
        debug!(path = %self.config.path.display(), count = watchlist.len(), "Saved watchlist");
        Ok(())
    }

    fn store_type(&self) -> StoreType {
        StoreType::File
    }

    async fn health_check(&self) -> Result<bool> {
        let parent = self
            .config
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Ok(tokio::fs::metadata(parent).await.map(|m| m.is_dir()).unwrap_or(false))
    }
}
