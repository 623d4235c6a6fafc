//! Intent extraction.
//!
//! Applies the sender and staleness filters to one message, then hands the
//! surviving text to the keyword classifier. The message's `order_id` is
//! reported whether or not it survives, so filtered messages still advance
//! the acknowledgment point.

use crate::core::Timestamp;
use crate::intent::classifier::{KeywordClassifier, KeywordSet};
use crate::intent::message::{InboundMessage, Intent};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default maximum message age, in seconds (40 minutes).
pub const DEFAULT_STALENESS_SECS: u64 = 2400;

/// Extractor configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Only this sender may drive the watchlist (None = everyone)
    pub authorized_sender: Option<String>,
    /// Maximum message age relative to the run time
    pub staleness_threshold_secs: u64,
    /// Keyword alternations
    #[serde(default)]
    pub keywords: KeywordSet,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            authorized_sender: None,
            staleness_threshold_secs: DEFAULT_STALENESS_SECS,
            keywords: KeywordSet::default(),
        }
    }
}

impl ExtractorConfig {
    /// Restrict processing to one sender.
    pub fn with_authorized_sender(mut self, sender: &str) -> Self {
        self.authorized_sender = Some(sender.to_string());
        self
    }

    /// Set the staleness threshold.
    pub fn with_staleness_secs(mut self, secs: u64) -> Self {
        self.staleness_threshold_secs = secs;
        self
    }

    /// Replace the keyword set.
    pub fn with_keywords(mut self, keywords: KeywordSet) -> Self {
        self.keywords = keywords;
        self
    }
}

/// Why a message contributed no intents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// Sender does not match the authorized sender
    Unauthorized,
    /// Message is older than the staleness threshold
    Stale,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Unauthorized => write!(f, "unauthorized"),
            Rejection::Stale => write!(f, "stale"),
        }
    }
}

/// Outcome of extracting one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extraction {
    /// Order id of the message, always reported
    pub order_id: i64,
    /// Sender of the message
    pub sender_id: String,
    /// Intents found (empty when rejected)
    pub intents: Vec<Intent>,
    /// Filter that rejected the message, if any
    pub rejection: Option<Rejection>,
}

impl Extraction {
    /// Whether the message passed both filters.
    pub fn accepted(&self) -> bool {
        self.rejection.is_none()
    }

    fn rejected(message: &InboundMessage, rejection: Rejection) -> Self {
        Self {
            order_id: message.order_id,
            sender_id: message.sender_id.clone(),
            intents: Vec::new(),
            rejection: Some(rejection),
        }
    }
}

/// Maps inbound messages to intents.
#[derive(Clone, Debug)]
pub struct IntentExtractor {
    config: ExtractorConfig,
    classifier: KeywordClassifier,
}

impl IntentExtractor {
    /// Create an extractor, compiling the configured keywords.
    pub fn new(config: ExtractorConfig) -> crate::core::Result<Self> {
        let classifier = KeywordClassifier::new(&config.keywords)?;
        Ok(Self { config, classifier })
    }

    /// Get the configuration.
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Get the classifier.
    pub fn classifier(&self) -> &KeywordClassifier {
        &self.classifier
    }

    /// Whether a sender may drive the watchlist.
    pub fn is_authorized(&self, sender_id: &str) -> bool {
        match &self.config.authorized_sender {
            Some(allowed) => allowed == sender_id,
            None => true,
        }
    }

    /// Whether a message is too old to act on at `now`.
    pub fn is_stale(&self, message: &InboundMessage, now: Timestamp) -> bool {
        let age_ms = now.signed_duration_since(message.sent_at).num_milliseconds();
        let limit_ms = i64::try_from(self.config.staleness_threshold_secs)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        age_ms > limit_ms
    }

    /// Extract intents from one message.
    pub fn extract(&self, message: &InboundMessage, now: Timestamp) -> Extraction {
        if !self.is_authorized(&message.sender_id) {
            debug!(order_id = message.order_id, sender = %message.sender_id, "Ignoring message from unauthorized sender");
            return Extraction::rejected(message, Rejection::Unauthorized);
        }

        if self.is_stale(message, now) {
            debug!(order_id = message.order_id, sent_at = %message.sent_at, "Ignoring stale message");
            return Extraction::rejected(message, Rejection::Stale);
        }

        let intents = self.classifier.classify(&message.text);
        for intent in &intents {
            debug!(order_id = message.order_id, %intent, "Extracted intent");
        }

        Extraction {
            order_id: message.order_id,
            sender_id: message.sender_id.clone(),
            intents,
            rejection: None,
        }
    }
}

impl Default for IntentExtractor {
    fn default() -> Self {
        Self {
            config: ExtractorConfig::default(),
            classifier: KeywordClassifier::with_defaults(),
        }
    }
}
