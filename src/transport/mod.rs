//! Chat transports.
//!
//! - MessageTransport trait (fetch, acknowledge, reply)
//! - Telegram Bot API implementation
//! - In-memory implementation

pub mod channel;
pub mod memory;
pub mod telegram;

pub use channel::{MessageTransport, TransportType};
pub use memory::{MemoryTransport, SentReply};
pub use telegram::{parse_updates, TelegramConfig, TelegramTransport};
