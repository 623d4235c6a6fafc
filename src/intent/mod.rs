//! Intent extraction.
//!
//! Turns raw chat messages into structured intents:
//! - Inbound message and intent types
//! - Keyword classifier (Remove > Clear > default Add, View orthogonal)
//! - Extractor applying sender and staleness filters

pub mod classifier;
pub mod extractor;
pub mod message;

pub use classifier::{KeywordClassifier, KeywordRule, KeywordSet, MutationKind};
pub use extractor::{ExtractorConfig, Extraction, IntentExtractor, Rejection, DEFAULT_STALENESS_SECS};
pub use message::{InboundMessage, Intent};
