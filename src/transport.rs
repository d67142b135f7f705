//! Chat transport
//!
//! Inbound user messages and outbound replies, independent of the chat
//! platform. [`telegram`] provides the production implementation.

mod keyboard;
pub mod telegram;
mod types;

pub use telegram::TelegramClient;
pub use types::{InboundMessage, OutboundMessage, TransportError};
