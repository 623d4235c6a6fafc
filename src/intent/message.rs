//! Inbound chat messages and the intents derived from them.

use crate::core::{StockCode, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A message retrieved from the chat transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Monotonically increasing transport identifier, used for acknowledgment
    pub order_id: i64,
    /// Sender (chat) identifier
    pub sender_id: String,
    /// Raw message text
    pub text: String,
    /// When the message was sent
    pub sent_at: Timestamp,
}

impl InboundMessage {
    /// Create a new inbound message.
    pub fn new(order_id: i64, sender_id: &str, text: &str, sent_at: Timestamp) -> Self {
        Self {
            order_id,
            sender_id: sender_id.to_string(),
            text: text.to_string(),
            sent_at,
        }
    }
}

/// A classified action derived from one message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    /// Add these codes to the watchlist
    Add(BTreeSet<StockCode>),
    /// Remove these codes from the watchlist
    Remove(BTreeSet<StockCode>),
    /// Drop every code from the watchlist
    Clear,
    /// Reply with a snapshot of the watchlist
    View,
}

impl Intent {
    /// Whether this intent changes the watchlist.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Intent::View)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::Add(codes) => write!(f, "add({})", crate::core::join_codes(codes)),
            Intent::Remove(codes) => write!(f, "remove({})", crate::core::join_codes(codes)),
            Intent::Clear => write!(f, "clear"),
            Intent::View => write!(f, "view"),
        }
    }
}
