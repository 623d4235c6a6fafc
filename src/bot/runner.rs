//! Single-pass bot run.
//!
//! Fetches one batch, folds it, persists at most once, replies, and only then
//! acknowledges. A failed store write returns before acknowledging so the
//! same messages come back on the next run; reconciliation is set-based, so
//! reprocessing them is harmless.

use crate::config::BotConfig;
use crate::core::{now, Result, Timestamp, Watchlist};
use crate::intent::{Extraction, IntentExtractor};
use crate::reconcile::{reconcile, BatchResult};
use crate::report::render_view;
use crate::store::WatchlistStore;
use crate::transport::MessageTransport;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// What one run did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Correlation id of the run
    pub run_id: String,
    /// Fetching failed; nothing else happened
    pub fetch_failed: bool,
    /// Messages retrieved
    pub fetched: usize,
    /// Messages that passed the sender and staleness filters
    pub processed: usize,
    /// Messages rejected by a filter
    pub rejected: usize,
    /// Highest order id retrieved
    pub max_order_id: Option<i64>,
    /// A mutation was requested and persisted
    pub changed: bool,
    /// Change summary reply delivered
    pub summary_sent: bool,
    /// View snapshot reply delivered
    pub view_sent: bool,
    /// Transport confirmed the acknowledgment
    pub acknowledged: bool,
    /// Watchlist at the end of the run (None when nothing was loaded)
    pub watchlist: Option<Watchlist>,
}

impl RunReport {
    fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            ..Default::default()
        }
    }
}

/// Watchlist bot wired to a transport and a store.
pub struct WatchlistBot {
    config: BotConfig,
    extractor: IntentExtractor,
    transport: Arc<dyn MessageTransport>,
    store: Arc<dyn WatchlistStore>,
}

impl WatchlistBot {
    /// Create a bot, compiling the configured keywords.
    pub fn new(
        config: BotConfig,
        transport: Arc<dyn MessageTransport>,
        store: Arc<dyn WatchlistStore>,
    ) -> Result<Self> {
        let extractor = IntentExtractor::new(config.extractor.clone())?;
        Ok(Self {
            config,
            extractor,
            transport,
            store,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Run once against the current time.
    pub async fn run_once(&self) -> Result<RunReport> {
        self.run_once_at(now()).await
    }

    /// Run once, judging staleness against `at`.
    pub async fn run_once_at(&self, at: Timestamp) -> Result<RunReport> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("run", run_id = %run_id);
        self.run(RunReport::new(&run_id), at).instrument(span).await
    }

    async fn run(&self, mut report: RunReport, at: Timestamp) -> Result<RunReport> {
        let messages = match self.transport.fetch_pending().await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(error = %e, transport = %self.transport.transport_type(), "Fetching messages failed, skipping run");
                report.fetch_failed = true;
                return Ok(report);
            }
        };

        report.fetched = messages.len();
        if messages.is_empty() {
            info!("No new messages");
            return Ok(report);
        }
        info!(count = messages.len(), "Processing messages");

        let existing = self.store.load().await?;

        let extractions: Vec<Extraction> = messages
            .iter()
            .map(|message| self.extractor.extract(message, at))
            .collect();
        let batch = BatchResult::from_extractions(&extractions);
        report.max_order_id = batch.max_order_id;
        report.rejected = batch.rejected;
        report.processed = batch.messages - batch.rejected;

        let destination = self.destination(&batch);
        let outcome = reconcile(&existing, &batch);

        if outcome.changed {
            self.store.save(&outcome.watchlist).await?;
            report.changed = true;
            info!(
                count = outcome.watchlist.len(),
                cleared = batch.clear_requested,
                added = batch.codes_to_add.len(),
                removed = batch.codes_to_remove.len(),
                "Watchlist updated"
            );

            if let Some(summary) = &outcome.summary {
                report.summary_sent = self.send(destination.as_deref(), &summary.to_text()).await;
            }
        }

        if let Some(snapshot) = render_view(&outcome.watchlist, batch.view_requested) {
            report.view_sent = self.send(destination.as_deref(), &snapshot).await;
        }

        if let Some(max_order_id) = batch.max_order_id {
            match self.transport.acknowledge(max_order_id).await {
                Ok(()) => report.acknowledged = true,
                Err(e) => warn!(error = %e, max_order_id, "Acknowledging messages failed; they will be redelivered"),
            }
        }

        if batch.is_noop() {
            info!("Nothing to do");
        }

        report.watchlist = Some(outcome.watchlist);
        Ok(report)
    }

    /// Replies go to the authorized sender, or else to whoever sent the
    /// latest accepted message.
    fn destination(&self, batch: &BatchResult) -> Option<String> {
        self.config
            .authorized_sender()
            .map(str::to_string)
            .or_else(|| batch.latest_sender.clone())
            .filter(|d| !d.is_empty())
    }

    /// Best-effort reply. Returns whether it was delivered.
    async fn send(&self, destination: Option<&str>, text: &str) -> bool {
        let Some(destination) = destination else {
            warn!("No reply destination, dropping reply");
            return false;
        };
        match self.transport.reply(destination, text).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, destination, "Sending reply failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StockCode;
    use crate::intent::InboundMessage;
    use crate::store::MemoryBackend;
    use crate::transport::MemoryTransport;
    use chrono::Duration;

    fn list(codes: &[&str]) -> Watchlist {
        codes.iter().map(|s| StockCode::parse(s).unwrap()).collect()
    }

    fn setup(
        config: BotConfig,
        messages: Vec<InboundMessage>,
        existing: Watchlist,
    ) -> (WatchlistBot, Arc<MemoryTransport>, Arc<MemoryBackend>) {
        let transport = Arc::new(MemoryTransport::with_messages(messages));
        let store = Arc::new(MemoryBackend::with_watchlist(existing));
        let bot = WatchlistBot::new(config, transport.clone(), store.clone()).unwrap();
        (bot, transport, store)
    }

    #[tokio::test]
    async fn test_empty_batch_does_nothing() {
        let (bot, transport, store) = setup(BotConfig::new(), vec![], list(&["600001"]));
        let report = bot.run_once().await.unwrap();

        assert_eq!(report.fetched, 0);
        assert!(!report.acknowledged);
        assert_eq!(store.load_count(), 0);
        assert!(transport.replies().await.is_empty());
        assert!(!report.run_id.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_noop() {
        let at = now();
        let (bot, transport, store) = setup(
            BotConfig::new(),
            vec![InboundMessage::new(1, "a", "600519", at)],
            Watchlist::new(),
        );
        transport.set_fail_fetch(true);

        let report = bot.run_once_at(at).await.unwrap();
        assert!(report.fetch_failed);
        assert_eq!(store.save_count(), 0);
        assert!(transport.acknowledged().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_failure_skips_ack() {
        let at = now();
        let (bot, transport, store) = setup(
            BotConfig::new(),
            vec![InboundMessage::new(1, "a", "600519", at)],
            Watchlist::new(),
        );
        store.set_fail_saves(true);

        assert!(bot.run_once_at(at).await.is_err());
        assert!(transport.acknowledged().await.is_empty());
        assert!(transport.replies().await.is_empty());
        assert_eq!(transport.pending().await.len(), 1);
    }

    #[tokio::test]
    async fn test_reply_failure_keeps_mutation() {
        let at = now();
        let (bot, transport, store) = setup(
            BotConfig::new(),
            vec![InboundMessage::new(1, "a", "600519", at)],
            Watchlist::new(),
        );
        transport.set_fail_reply(true);

        let report = bot.run_once_at(at).await.unwrap();
        assert!(report.changed);
        assert!(!report.summary_sent);
        assert!(report.acknowledged);
        assert_eq!(store.snapshot().await, list(&["600519"]));
    }

    #[tokio::test]
    async fn test_ack_failure_is_swallowed() {
        let at = now();
        let (bot, transport, _store) = setup(
            BotConfig::new(),
            vec![InboundMessage::new(1, "a", "list", at)],
            Watchlist::new(),
        );
        transport.set_fail_ack(true);

        let report = bot.run_once_at(at).await.unwrap();
        assert!(report.view_sent);
        assert!(!report.acknowledged);
    }

    #[tokio::test]
    async fn test_reply_destination_falls_back_to_latest_sender() {
        let at = now();
        let (bot, transport, _store) = setup(
            BotConfig::new(),
            vec![
                InboundMessage::new(5, "222", "600002", at),
                InboundMessage::new(3, "111", "600001", at),
            ],
            Watchlist::new(),
        );

        bot.run_once_at(at).await.unwrap();
        let replies = transport.replies().await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].destination, "222");
    }

    #[tokio::test]
    async fn test_reply_goes_to_authorized_sender() {
        let at = now();
        let (bot, transport, _store) = setup(
            BotConfig::new().with_authorized_sender("111"),
            vec![InboundMessage::new(3, "111", "list", at)],
            Watchlist::new(),
        );

        bot.run_once_at(at).await.unwrap();
        assert_eq!(transport.replies().await[0].destination, "111");
    }

    #[tokio::test]
    async fn test_all_filtered_still_acknowledged() {
        let at = now();
        let (bot, transport, store) = setup(
            BotConfig::new().with_authorized_sender("111"),
            vec![
                InboundMessage::new(8, "999", "600519", at),
                InboundMessage::new(9, "111", "600519", at - Duration::hours(2)),
            ],
            Watchlist::new(),
        );

        let report = bot.run_once_at(at).await.unwrap();
        assert_eq!(report.rejected, 2);
        assert_eq!(report.processed, 0);
        assert_eq!(report.max_order_id, Some(9));
        assert!(!report.changed);
        assert_eq!(store.save_count(), 0);
        assert_eq!(transport.acknowledged().await, vec![9]);
        assert!(transport.replies().await.is_empty());
    }
}
