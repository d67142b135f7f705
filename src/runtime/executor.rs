//! Per-user session runtime

use super::traits::MessageSink;
use crate::backend::{BackendError, TaskBackend};
use crate::session::SessionStore;
use crate::state_machine::{
    recover, transition, BackendRequest, BackendResponse, Effect, Event, SessionContext,
};
use crate::transport::{InboundMessage, OutboundMessage};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Runtime owning one user's dialog
///
/// Messages are handled strictly one after another, so the session is never
/// written by two transitions at once.
pub struct SessionRuntime<S, B, O>
where
    S: SessionStore + 'static,
    B: TaskBackend + 'static,
    O: MessageSink + 'static,
{
    context: SessionContext,
    store: Arc<S>,
    backend: Arc<B>,
    sink: Arc<O>,
    call_timeout: Option<Duration>,
    message_rx: mpsc::Receiver<InboundMessage>,
}

impl<S, B, O> SessionRuntime<S, B, O>
where
    S: SessionStore + 'static,
    B: TaskBackend + 'static,
    O: MessageSink + 'static,
{
    pub fn new(
        context: SessionContext,
        store: Arc<S>,
        backend: Arc<B>,
        sink: Arc<O>,
        message_rx: mpsc::Receiver<InboundMessage>,
    ) -> Self {
        Self {
            context,
            store,
            backend,
            sink,
            call_timeout: None,
            message_rx,
        }
    }

    /// Give up on a backend request after `timeout`
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub async fn run(mut self) {
        tracing::debug!(user_id = self.context.user_id, "Starting session runtime");

        while let Some(message) = self.message_rx.recv().await {
            self.process_message(message).await;
        }

        tracing::debug!(user_id = self.context.user_id, "Session runtime stopped");
    }

    async fn process_message(&self, message: InboundMessage) {
        let InboundMessage {
            chat_id,
            username,
            text,
            ..
        } = message;

        // Backend outcomes are fed back in the order they were produced
        let mut events = VecDeque::from([Event::Message { text, username }]);

        while let Some(event) = events.pop_front() {
            let session = self.store.snapshot(self.context.user_id);
            let result = match transition(&session, &self.context, event) {
                Ok(r) => r,
                Err(e) => {
                    tracing::error!(
                        user_id = self.context.user_id,
                        error = %e,
                        "Transition failed, resetting session"
                    );
                    recover(&e)
                }
            };

            for effect in result.effects {
                if let Some(generated) = self.execute_effect(effect, chat_id).await {
                    events.push_back(generated);
                }
            }
        }
    }

    async fn execute_effect(&self, effect: Effect, chat_id: i64) -> Option<Event> {
        let user_id = self.context.user_id;
        match effect {
            Effect::SetState {
                state,
                reset_pending,
            } => {
                self.store.set_state(user_id, state, reset_pending);
                None
            }
            Effect::SetStateAndStore { state, value } => {
                self.store.set_state_and_store(user_id, state, value);
                None
            }
            Effect::CallBackend(request) => Some(self.call_backend(request).await),
            Effect::Reply(reply) => {
                let message = OutboundMessage { chat_id, reply };
                if let Err(e) = self.sink.send(&message).await {
                    tracing::warn!(user_id, chat_id, error = %e, "Failed to deliver reply");
                }
                None
            }
        }
    }

    async fn call_backend(&self, request: BackendRequest) -> Event {
        tracing::debug!(
            user_id = self.context.user_id,
            request = request.name(),
            "Calling backend"
        );

        let outcome = match self.call_timeout {
            Some(timeout) => {
                tokio::time::timeout(timeout, perform(&*self.backend, &request))
                    .await
                    .unwrap_or_else(|_| Err(BackendError::timeout(timeout)))
            }
            None => perform(&*self.backend, &request).await,
        };

        match outcome {
            Ok(response) => Event::BackendSucceeded { request, response },
            Err(e) => {
                tracing::warn!(
                    user_id = self.context.user_id,
                    request = request.name(),
                    kind = ?e.kind,
                    error = %e,
                    "Backend request failed"
                );
                Event::BackendFailed {
                    request,
                    message: e.message,
                }
            }
        }
    }
}

/// Run one request against the backend
///
/// Creating a task is two calls; the price is only set once the task exists
/// and the first failure ends the request.
async fn perform<B>(backend: &B, request: &BackendRequest) -> Result<BackendResponse, BackendError>
where
    B: TaskBackend + ?Sized,
{
    match request {
        BackendRequest::SignUp { user_id, username } => {
            backend.sign_up(*user_id, username).await?;
        }
        BackendRequest::ListUnassigned => {
            return Ok(BackendResponse::Tasks(backend.get_unassigned_tasks().await?));
        }
        BackendRequest::CreateTask { url, price } => {
            backend.create_task(url).await?;
            backend.set_task_price(url, *price).await?;
        }
        BackendRequest::DeleteTask { url } => backend.delete_task(url).await?,
        BackendRequest::AssignUser { url, assignee } => backend.assign_user(url, assignee).await?,
        BackendRequest::CloseTask { url } => backend.close_task(url).await?,
    }
    Ok(BackendResponse::Done)
}
