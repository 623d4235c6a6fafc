//! MessageTransport trait definition.
//!
//! Core trait for the chat transport the bot reads from and replies through.

use crate::core::Result;
use crate::intent::InboundMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Transport type identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportType {
    /// Telegram Bot API
    Telegram,
    /// In-process queue
    Memory,
}

impl std::fmt::Display for TransportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportType::Telegram => write!(f, "telegram"),
            TransportType::Memory => write!(f, "memory"),
        }
    }
}

/// Core trait for message transports.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Retrieve every message not yet acknowledged.
    ///
    /// Order is not meaningful to the caller.
    async fn fetch_pending(&self) -> Result<Vec<InboundMessage>>;

    /// Mark every message up to and including `up_to_order_id` as consumed.
    async fn acknowledge(&self, up_to_order_id: i64) -> Result<()>;

    /// Send a reply. `text` may use the inline `<b>`/`<code>` markup subset.
    async fn reply(&self, destination: &str, text: &str) -> Result<()>;

    /// Get the transport type.
    fn transport_type(&self) -> TransportType;
}
