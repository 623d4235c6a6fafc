//! Telegram Bot API transport.
//!
//! Delivery offsets are kept by Telegram: `getUpdates` returns every
//! update not yet confirmed, and calling it with `offset = id + 1` confirms
//! everything up to `id`.

use crate::core::{Error, Result, Timestamp};
use crate::intent::InboundMessage;
use crate::transport::channel::{MessageTransport, TransportType};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Bot API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Telegram transport configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API base URL
    pub api_base: String,
    /// Bot token, never serialized
    #[serde(skip_serializing)]
    pub bot_token: String,
    /// Timeout for `getUpdates` (seconds)
    pub fetch_timeout_secs: u64,
    /// Timeout for replies and acknowledgments (seconds)
    pub send_timeout_secs: u64,
}

impl TelegramConfig {
    /// Create a config with default endpoints and timeouts.
    pub fn new(bot_token: &str) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            bot_token: bot_token.to_string(),
            fetch_timeout_secs: 10,
            send_timeout_secs: 5,
        }
    }

    /// Override the API base URL.
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_base", &self.api_base)
            .field("bot_token", &"<redacted>")
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("send_timeout_secs", &self.send_timeout_secs)
            .finish()
    }
}

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> Result<Option<T>> {
        if self.ok {
            Ok(self.result)
        } else {
            Err(Error::Transport(format!(
                "{} rejected: {}",
                method,
                self.description.unwrap_or_else(|| "no description".to_string())
            )))
        }
    }
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Option<Chat>,
    text: Option<String>,
    #[serde(default)]
    date: i64,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

impl Update {
    /// Updates without a usable message keep their id so they are still
    /// acknowledged; they carry an empty sender and the epoch as send time.
    fn into_message(self) -> InboundMessage {
        let message = self.message;
        let sender_id = message
            .as_ref()
            .and_then(|m| m.chat.as_ref())
            .map(|c| c.id.to_string())
            .unwrap_or_default();
        let date = message.as_ref().map(|m| m.date).unwrap_or(0);
        let text = message.and_then(|m| m.text).unwrap_or_default();

        InboundMessage {
            order_id: self.update_id,
            sender_id,
            text,
            sent_at: unix_time(date),
        }
    }
}

fn unix_time(secs: i64) -> Timestamp {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

/// Parse a `getUpdates` response body.
pub fn parse_updates(body: &str) -> Result<Vec<InboundMessage>> {
    let response: ApiResponse<Vec<Update>> = serde_json::from_str(body)?;
    Ok(response
        .into_result("getUpdates")?
        .unwrap_or_default()
        .into_iter()
        .map(Update::into_message)
        .collect())
}

/// Telegram transport.
pub struct TelegramTransport {
    config: TelegramConfig,
    client: Client,
}

impl TelegramTransport {
    /// Create a new Telegram transport.
    pub fn new(config: TelegramConfig) -> Result<Self> {
        if config.bot_token.trim().is_empty() {
            return Err(Error::MissingCredential("Telegram bot token".to_string()));
        }
        let client = Client::builder().build()?;
        Ok(Self { config, client })
    }

    /// Get the configuration.
    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }

    async fn check(response: reqwest::Response, method: &str) -> Result<String> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Transport(format!("{} returned HTTP {}: {}", method, status, body)));
        }
        Ok(body)
    }
}

#[async_trait]
impl MessageTransport for TelegramTransport {
    async fn fetch_pending(&self) -> Result<Vec<InboundMessage>> {
        let response = self
            .client
            .get(self.config.method_url("getUpdates"))
            .timeout(Duration::from_secs(self.config.fetch_timeout_secs))
            .send()
            .await?;
        let body = Self::check(response, "getUpdates").await?;
        let messages = parse_updates(&body)?;
        debug!(count = messages.len(), "Fetched updates");
        Ok(messages)
    }

    async fn acknowledge(&self, up_to_order_id: i64) -> Result<()> {
        let offset = up_to_order_id.saturating_add(1);
        let response = self
            .client
            .get(self.config.method_url("getUpdates"))
            .query(&[("offset", offset)])
            .timeout(Duration::from_secs(self.config.send_timeout_secs))
            .send()
            .await?;
        Self::check(response, "getUpdates").await?;
        debug!(offset, "Acknowledged updates");
        Ok(())
    }

    async fn reply(&self, destination: &str, text: &str) -> Result<()> {
        let request = SendMessage {
            chat_id: destination,
            text,
            parse_mode: "HTML",
        };
        let response = self
            .client
            .post(self.config.method_url("sendMessage"))
            .json(&request)
            .timeout(Duration::from_secs(self.config.send_timeout_secs))
            .send()
            .await?;
        let body = Self::check(response, "sendMessage").await?;
        let envelope: ApiResponse<serde_json::Value> = serde_json::from_str(&body)?;
        envelope.into_result("sendMessage")?;
        Ok(())
    }

    fn transport_type(&self) -> TransportType {
        TransportType::Telegram
    }
}
