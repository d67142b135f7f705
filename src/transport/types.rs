//! Transport-level message types

use crate::state_machine::{Reply, UserId};
use thiserror::Error;

/// A text message typed (or a button pressed) by a chat user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub user_id: UserId,
    pub chat_id: i64,
    pub username: Option<String>,
    pub text: String,
}

/// A reply addressed to a chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub reply: Reply,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{method} request failed: {source}")]
    Http {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} failed: {description}")]
    Api {
        method: &'static str,
        description: String,
    },

    /// The bot token was rejected
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl TransportError {
    pub fn http(method: &'static str, source: reqwest::Error) -> Self {
        Self::Http { method, source }
    }

    /// Whether retrying the same request is pointless
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Unauthorized(_) => true,
            Self::Http { .. } | Self::Api { .. } => false,
        }
    }
}
