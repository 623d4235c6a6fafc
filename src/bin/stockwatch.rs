//! stockwatch - one bot run.
//!
//! Reads pending Telegram messages, reconciles the watchlist, replies and
//! acknowledges, then exits. Meant to be invoked by a scheduler; overlapping
//! invocations against the same list must be prevented there.
//!
//! Environment:
//!   TG_BOT_TOKEN               Bot token (required)
//!   TG_CHAT_ID                 Only this chat may edit the list; replies go here
//!   TG_API_BASE                Bot API base URL
//!   WATCHLIST_STALENESS_SECS   Ignore messages older than this (default 2400)
//!   WATCHLIST_BACKEND          file | sheet (default file)
//!   WATCHLIST_PATH             List file (file store, default stock_list.txt)
//!   GCP_SA_KEY                 Service account key JSON (sheet store, required)
//!   SHEET_NAME                 Spreadsheet id (sheet store, required)
//!   SHEET_TAB                  Worksheet title (sheet store, default first sheet)
//!   SHEETS_API_BASE            Sheets API base URL
//!   RUST_LOG                   Log filter (default info)
//!   STOCKWATCH_LOG_JSON        Set to 1 for JSON logs

use anyhow::Context;
use std::sync::Arc;
use stockwatch::bot::WatchlistBot;
use stockwatch::config::AppConfig;
use stockwatch::logging::init_logging;
use stockwatch::store::create_store;
use stockwatch::transport::TelegramTransport;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("loading configuration")?;
    info!(
        authorized_sender = config.bot.authorized_sender().unwrap_or("<any>"),
        staleness_secs = config.bot.extractor.staleness_threshold_secs,
        store = %config.store.backend,
        "Starting watchlist run"
    );

    let transport = Arc::new(TelegramTransport::new(config.telegram.clone())?);
    let store = create_store(&config.store)?;
    let bot = WatchlistBot::new(config.bot.clone(), transport, store)?;

    let report = bot.run_once().await.context("watchlist run failed")?;
    info!(
        fetched = report.fetched,
        processed = report.processed,
        rejected = report.rejected,
        changed = report.changed,
        summary_sent = report.summary_sent,
        view_sent = report.view_sent,
        acknowledged = report.acknowledged,
        "Run finished"
    );
    Ok(())
}
