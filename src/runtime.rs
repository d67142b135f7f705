//! Runtime for driving dialog sessions
//!
//! The [`Dispatcher`] hands every inbound message to the worker of the user
//! who sent it, spawning the worker on first contact. Workers of different
//! users run concurrently; a slow backend call for one user never delays
//! another.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;
pub use traits::*;

use crate::backend::{GrpcTaskBackend, LoggingBackend, TaskBackend};
use crate::session::{InMemorySessionStore, SessionStore};
use crate::state_machine::{Reply, SessionContext, UserId};
use crate::transport::{InboundMessage, OutboundMessage, TelegramClient, TransportError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Type alias for the production dispatcher with concrete implementations
pub type ProductionDispatcher =
    Dispatcher<InMemorySessionStore, LoggingBackend<GrpcTaskBackend>, TelegramClient>;

/// Messages a user may have queued before further ones are dropped
const SESSION_QUEUE_CAPACITY: usize = 64;

/// Sent instead of processing a message that did not fit the queue
const SESSION_BUSY: &str = "Still working on your previous messages, please try again in a moment";

/// Pause after a failed poll before asking again
const POLL_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Handle to a running session worker
struct SessionHandle {
    message_tx: mpsc::Sender<InboundMessage>,
    task: JoinHandle<()>,
}

/// Routes inbound messages to per-user session workers
pub struct Dispatcher<S, B, O>
where
    S: SessionStore + 'static,
    B: TaskBackend + 'static,
    O: MessageSink + 'static,
{
    store: Arc<S>,
    backend: Arc<B>,
    sink: Arc<O>,
    call_timeout: Option<Duration>,
    sessions: RwLock<HashMap<UserId, SessionHandle>>,
}

impl<S, B, O> Dispatcher<S, B, O>
where
    S: SessionStore + 'static,
    B: TaskBackend + 'static,
    O: MessageSink + 'static,
{
    pub fn new(store: Arc<S>, backend: Arc<B>, sink: Arc<O>) -> Self {
        Self {
            store,
            backend,
            sink,
            call_timeout: None,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Bound every backend request; `None` waits forever
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Queue `message` on its sender's worker
    pub async fn dispatch(&self, message: InboundMessage) {
        let user_id = message.user_id;

        let sent = {
            let sessions = self.sessions.read().await;
            match sessions.get(&user_id) {
                Some(handle) => handle.message_tx.try_send(message),
                None => Err(TrySendError::Closed(message)),
            }
        };

        match sent {
            Ok(()) => {}
            Err(TrySendError::Full(message)) => {
                tracing::warn!(
                    user_id,
                    text = %message.text,
                    "Session queue full, dropping message"
                );
                let busy = OutboundMessage {
                    chat_id: message.chat_id,
                    reply: Reply::text(SESSION_BUSY),
                };
                if let Err(e) = self.sink.send(&busy).await {
                    tracing::warn!(user_id, error = %e, "Failed to deliver busy reply");
                }
            }
            // First contact, or the worker is gone
            Err(TrySendError::Closed(message)) => {
                let mut sessions = self.sessions.write().await;
                let handle = sessions
                    .entry(user_id)
                    .and_modify(|handle| {
                        if handle.message_tx.is_closed() {
                            *handle = self.spawn_session(user_id);
                        }
                    })
                    .or_insert_with(|| self.spawn_session(user_id));
                if let Err(e) = handle.message_tx.try_send(message) {
                    tracing::warn!(user_id, error = %e, "Could not queue message");
                }
            }
        }
    }

    fn spawn_session(&self, user_id: UserId) -> SessionHandle {
        tracing::info!(user_id, "Starting session");
        let (message_tx, message_rx) = mpsc::channel(SESSION_QUEUE_CAPACITY);
        let runtime = SessionRuntime::new(
            SessionContext::new(user_id),
            Arc::clone(&self.store),
            Arc::clone(&self.backend),
            Arc::clone(&self.sink),
            message_rx,
        )
        .with_call_timeout(self.call_timeout);

        let task = tokio::spawn(runtime.run());
        SessionHandle { message_tx, task }
    }

    /// Pull batches from `source` until `shutdown` fires
    ///
    /// Transient transport errors are logged and retried; a fatal one ends
    /// the loop with the error.
    pub async fn run<U>(&self, source: &U, shutdown: CancellationToken) -> Result<(), TransportError>
    where
        U: UpdateSource + ?Sized,
    {
        tracing::info!("Dispatcher started");

        loop {
            let batch = tokio::select! {
                () = shutdown.cancelled() => break,
                batch = source.next_batch() => batch,
            };

            match batch {
                Ok(messages) => {
                    for message in messages {
                        self.dispatch(message).await;
                    }
                }
                Err(e) if e.is_fatal() => {
                    tracing::error!(error = %e, "Update source failed");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Polling for updates failed, retrying");
                    tokio::select! {
                        () = shutdown.cancelled() => break,
                        () = tokio::time::sleep(POLL_RETRY_DELAY) => {}
                    }
                }
            }
        }

        tracing::info!("Dispatcher stopped");
        Ok(())
    }

    /// Number of users with a live worker
    #[allow(dead_code)] // Used by tests
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Stop accepting messages and wait for workers to drain their queues
    pub async fn shutdown(&self) {
        let handles: Vec<SessionHandle> = self.sessions.write().await.drain().map(|(_, h)| h).collect();
        tracing::info!(sessions = handles.len(), "Shutting down sessions");

        let tasks = handles.into_iter().map(|SessionHandle { message_tx, task }| {
            drop(message_tx);
            task
        });
        for result in futures::future::join_all(tasks).await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Session worker panicked");
            }
        }
    }
}
