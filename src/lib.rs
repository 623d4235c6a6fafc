//! # stockwatch - chat-driven stock watchlist
//!
//! Keeps a persisted set of six-digit stock codes in sync with free-text
//! chat messages:
//! - **intent**: keyword classification of messages into Add/Remove/Clear/View
//! - **reconcile**: deterministic, order-independent fold of a batch onto the list
//! - **report**: change summaries and view snapshots
//! - **transport** / **store**: pluggable chat and persistence collaborators
//! - **bot**: one fetch, reconcile, persist, reply, acknowledge pass
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stockwatch::bot::WatchlistBot;
//! use stockwatch::config::BotConfig;
//! use stockwatch::store::{create_store, StoreConfig};
//! use stockwatch::transport::{TelegramConfig, TelegramTransport};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> stockwatch::Result<()> {
//!     let transport = Arc::new(TelegramTransport::new(TelegramConfig::new("123:token"))?);
//!     let store = create_store(&StoreConfig::file("stock_list.txt"))?;
//!     let bot = WatchlistBot::new(BotConfig::new().with_authorized_sender("1001"), transport, store)?;
//!     let report = bot.run_once().await?;
//!     println!("changed: {}", report.changed);
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod config;
pub mod core;
pub mod intent;
pub mod logging;
pub mod reconcile;
pub mod report;
pub mod store;
pub mod transport;

pub use crate::core::error::{Error, Result};
pub use crate::core::types::{StockCode, Watchlist};
