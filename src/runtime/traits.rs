//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the dispatcher with mock implementations.

use crate::transport::{InboundMessage, OutboundMessage, TransportError};
use async_trait::async_trait;
use std::sync::Arc;

/// Source of inbound chat messages
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Wait for the next batch of messages; an empty batch is a timeout
    async fn next_batch(&self) -> Result<Vec<InboundMessage>, TransportError>;
}

/// Destination for replies
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: UpdateSource + ?Sized> UpdateSource for Arc<T> {
    async fn next_batch(&self) -> Result<Vec<InboundMessage>, TransportError> {
        (**self).next_batch().await
    }
}

#[async_trait]
impl<T: MessageSink + ?Sized> MessageSink for Arc<T> {
    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        (**self).send(message).await
    }
}
