//! In-process transport.
//!
//! Queues messages in memory and records replies and acknowledgments.
//! Acknowledging drops every queued message up to the given id, so
//! unacknowledged messages are redelivered by the next fetch like a real
//! offset-based transport.

use crate::core::{Error, Result};
use crate::intent::InboundMessage;
use crate::transport::channel::{MessageTransport, TransportType};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// A reply captured by the memory transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentReply {
    /// Destination chat
    pub destination: String,
    /// Reply text
    pub text: String,
}

/// In-memory transport.
#[derive(Default)]
pub struct MemoryTransport {
    pending: Mutex<Vec<InboundMessage>>,
    replies: Mutex<Vec<SentReply>>,
    acknowledged: Mutex<Vec<i64>>,
    fail_fetch: AtomicBool,
    fail_reply: AtomicBool,
    fail_ack: AtomicBool,
}

impl MemoryTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport with queued messages.
    pub fn with_messages(messages: Vec<InboundMessage>) -> Self {
        Self {
            pending: Mutex::new(messages),
            ..Default::default()
        }
    }

    /// Queue a message.
    pub async fn push(&self, message: InboundMessage) {
        self.pending.lock().await.push(message);
    }

    /// Messages still awaiting acknowledgment.
    pub async fn pending(&self) -> Vec<InboundMessage> {
        self.pending.lock().await.clone()
    }

    /// Replies sent so far.
    pub async fn replies(&self) -> Vec<SentReply> {
        self.replies.lock().await.clone()
    }

    /// Acknowledgment ids received so far.
    pub async fn acknowledged(&self) -> Vec<i64> {
        self.acknowledged.lock().await.clone()
    }

    /// Make fetches fail.
    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    /// Make replies fail.
    pub fn set_fail_reply(&self, fail: bool) {
        self.fail_reply.store(fail, Ordering::SeqCst);
    }

    /// Make acknowledgments fail.
    pub fn set_fail_ack(&self, fail: bool) {
        self.fail_ack.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MessageTransport for MemoryTransport {
    async fn fetch_pending(&self) -> Result<Vec<InboundMessage>> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(Error::Transport("memory transport configured to fail fetches".to_string()));
        }
        Ok(self.pending.lock().await.clone())
    }

    async fn acknowledge(&self, up_to_order_id: i64) -> Result<()> {
        if self.fail_ack.load(Ordering::SeqCst) {
            return Err(Error::Transport("memory transport configured to fail acknowledgments".to_string()));
        }
        self.pending
            .lock()
            .await
            .retain(|m| m.order_id > up_to_order_id);
        self.acknowledged.lock().await.push(up_to_order_id);
        Ok(())
    }

    async fn reply(&self, destination: &str, text: &str) -> Result<()> {
        if self.fail_reply.load(Ordering::SeqCst) {
            return Err(Error::Transport("memory transport configured to fail replies".to_string()));
        }
        self.replies.lock().await.push(SentReply {
            destination: destination.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    fn transport_type(&self) -> TransportType {
        TransportType::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::now;

    #[tokio::test]
    async fn test_acknowledge_drops_delivered() {
        let transport = MemoryTransport::with_messages(vec![
            InboundMessage::new(1, "a", "600001", now()),
            InboundMessage::new(2, "a", "600002", now()),
            InboundMessage::new(3, "a", "600003", now()),
        ]);

        transport.acknowledge(2).await.unwrap();
        let pending = transport.fetch_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].order_id, 3);
        assert_eq!(transport.acknowledged().await, vec![2]);
    }

    #[tokio::test]
    async fn test_reply_recorded() {
        let transport = MemoryTransport::new();
        transport.reply("1001", "<b>hi</b>").await.unwrap();
        assert_eq!(
            transport.replies().await,
            vec![SentReply {
                destination: "1001".to_string(),
                text: "<b>hi</b>".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let transport = MemoryTransport::new();
        transport.set_fail_fetch(true);
        transport.set_fail_reply(true);
        transport.set_fail_ack(true);

        assert!(transport.fetch_pending().await.is_err());
        assert!(transport.reply("x", "y").await.is_err());
        assert!(transport.acknowledge(1).await.is_err());
        assert!(transport.replies().await.is_empty());
    }
}
