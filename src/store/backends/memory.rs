//! In-memory backend.
//!
//! Holds the watchlist in process. Used for tests and dry runs; can be told
//! to fail saves so callers can exercise their error paths.

use crate::core::{Error, Result, Watchlist};
use crate::store::backend::{StoreType, WatchlistStore};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory watchlist store.
#[derive(Default)]
pub struct MemoryBackend {
    watchlist: RwLock<Watchlist>,
    loads: AtomicUsize,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryBackend {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding a watchlist.
    pub fn with_watchlist(watchlist: Watchlist) -> Self {
        Self {
            watchlist: RwLock::new(watchlist),
            ..Default::default()
        }
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Current contents.
    pub async fn snapshot(&self) -> Watchlist {
        self.watchlist.read().await.clone()
    }

    /// Number of loads performed.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Number of successful saves performed.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WatchlistStore for MemoryBackend {
    async fn load(&self) -> Result<Watchlist> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.watchlist.read().await.clone())
    }

    async fn save(&self, watchlist: &Watchlist) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::Store("memory store configured to fail saves".to_string()));
        }
        *self.watchlist.write().await = watchlist.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn store_type(&self) -> StoreType {
        StoreType::Memory
    }
}
