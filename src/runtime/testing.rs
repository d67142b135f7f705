//! Mock implementations for testing
//!
//! These mocks enable integration testing of the dispatcher without real
//! I/O.

use super::traits::*;
use crate::backend::{BackendError, Task, TaskBackend};
use crate::state_machine::validate::{Assignee, TaskUrl};
use crate::transport::{InboundMessage, OutboundMessage, TransportError};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

/// How long tests wait for asynchronous output before failing
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Mock Task Backend
// ============================================================================

/// A call received by [`MockTaskBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    SignUp { id: i64, username: String },
    CreateTask(String),
    SetTaskPrice(String, u64),
    DeleteTask(String),
    AssignUser(String, Assignee),
    CloseTask(String),
    GetUnassignedTasks,
}

impl BackendCall {
    fn url(&self) -> Option<&str> {
        match self {
            BackendCall::CreateTask(url)
            | BackendCall::SetTaskPrice(url, _)
            | BackendCall::DeleteTask(url)
            | BackendCall::AssignUser(url, _)
            | BackendCall::CloseTask(url) => Some(url),
            BackendCall::SignUp { .. } | BackendCall::GetUnassignedTasks => None,
        }
    }
}

/// Backend that records calls and answers from a script
#[derive(Default)]
pub struct MockTaskBackend {
    calls: Mutex<Vec<BackendCall>>,
    failures: Mutex<VecDeque<BackendError>>,
    tasks: Mutex<Vec<Task>>,
    /// Calls touching these URLs never complete
    hanging_urls: Mutex<HashSet<String>>,
}

impl MockTaskBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next call with `error`
    pub fn queue_failure(&self, error: BackendError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn set_tasks(&self, tasks: Vec<Task>) {
        *self.tasks.lock().unwrap() = tasks;
    }

    pub fn hang_on(&self, url: &str) {
        self.hanging_urls.lock().unwrap().insert(url.to_string());
    }

    pub fn recorded_calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn record(&self, call: BackendCall) -> Result<(), BackendError> {
        let hangs = call
            .url()
            .is_some_and(|url| self.hanging_urls.lock().unwrap().contains(url));
        self.calls.lock().unwrap().push(call);
        if hangs {
            std::future::pending::<()>().await;
        }
        match self.failures.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TaskBackend for MockTaskBackend {
    async fn sign_up(&self, id: i64, username: &str) -> Result<(), BackendError> {
        self.record(BackendCall::SignUp {
            id,
            username: username.to_string(),
        })
        .await
    }

    async fn create_task(&self, url: &TaskUrl) -> Result<(), BackendError> {
        self.record(BackendCall::CreateTask(url.to_string())).await
    }

    async fn set_task_price(&self, url: &TaskUrl, price: u64) -> Result<(), BackendError> {
        self.record(BackendCall::SetTaskPrice(url.to_string(), price))
            .await
    }

    async fn delete_task(&self, url: &TaskUrl) -> Result<(), BackendError> {
        self.record(BackendCall::DeleteTask(url.to_string())).await
    }

    async fn assign_user(&self, url: &TaskUrl, assignee: &Assignee) -> Result<(), BackendError> {
        self.record(BackendCall::AssignUser(url.to_string(), assignee.clone()))
            .await
    }

    async fn close_task(&self, url: &TaskUrl) -> Result<(), BackendError> {
        self.record(BackendCall::CloseTask(url.to_string())).await
    }

    async fn get_unassigned_tasks(&self) -> Result<Vec<Task>, BackendError> {
        self.record(BackendCall::GetUnassignedTasks).await?;
        Ok(self.tasks.lock().unwrap().clone())
    }
}

// ============================================================================
// Recording Sink
// ============================================================================

/// Sink that keeps every outbound message
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<OutboundMessage>>,
    notify: Notify,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.lock().unwrap().clone()
    }

    /// Reply texts sent to `chat_id`, oldest first
    pub fn texts_for(&self, chat_id: i64) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .map(|m| m.reply.text.clone())
            .collect()
    }

    /// Wait until `chat_id` received at least `count` messages
    pub async fn wait_for(&self, chat_id: i64, count: usize) -> Vec<String> {
        tokio::time::timeout(WAIT_TIMEOUT, async {
            loop {
                let notified = self.notify.notified();
                let texts = self.texts_for(chat_id);
                if texts.len() >= count {
                    return texts;
                }
                notified.await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "chat {chat_id} got {:?}, expected {count} messages",
                self.texts_for(chat_id)
            )
        })
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        self.messages.lock().unwrap().push(message.clone());
        self.notify.notify_waiters();
        Ok(())
    }
}

// ============================================================================
// Scripted Update Source
// ============================================================================

/// Source that yields queued batches, then waits forever
#[derive(Default)]
pub struct ScriptedSource {
    batches: Mutex<VecDeque<Result<Vec<InboundMessage>, TransportError>>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_batch(&self, messages: Vec<InboundMessage>) {
        self.batches.lock().unwrap().push_back(Ok(messages));
    }

    pub fn push_error(&self, error: TransportError) {
        self.batches.lock().unwrap().push_back(Err(error));
    }
}

#[async_trait]
impl UpdateSource for ScriptedSource {
    async fn next_batch(&self) -> Result<Vec<InboundMessage>, TransportError> {
        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(batch) => batch,
            None => std::future::pending().await,
        }
    }
}

/// Private-chat message from `user_id`
pub fn message_from(user_id: i64, text: &str) -> InboundMessage {
    InboundMessage {
        user_id,
        chat_id: user_id,
        username: None,
        text: text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendErrorKind, TaskStatus};
    use crate::runtime::{Dispatcher, SESSION_BUSY, SESSION_QUEUE_CAPACITY};
    use crate::session::{InMemorySessionStore, SessionStore};
    use crate::state_machine::{DialogState, PendingKey, PendingValue, ReplyMarkup};
    use crate::state_machine::validate::parse_url;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    struct Harness {
        store: Arc<InMemorySessionStore>,
        backend: Arc<MockTaskBackend>,
        sink: Arc<RecordingSink>,
        dispatcher: Dispatcher<InMemorySessionStore, MockTaskBackend, RecordingSink>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_timeout(None)
        }

        fn with_timeout(timeout: Option<Duration>) -> Self {
            let store = Arc::new(InMemorySessionStore::new());
            let backend = Arc::new(MockTaskBackend::new());
            let sink = Arc::new(RecordingSink::new());
            let dispatcher =
                Dispatcher::new(Arc::clone(&store), Arc::clone(&backend), Arc::clone(&sink))
                    .with_call_timeout(timeout);
            Self {
                store,
                backend,
                sink,
                dispatcher,
            }
        }

        /// Send `text` as `user` and wait for the `nth` reply to that user
        async fn say(&self, user: i64, text: &str, nth: usize) -> String {
            self.dispatcher.dispatch(message_from(user, text)).await;
            let texts = self.sink.wait_for(user, nth).await;
            texts[nth - 1].clone()
        }
    }

    #[tokio::test]
    async fn test_mock_backend_scripted_failure() {
        let backend = MockTaskBackend::new();
        backend.queue_failure(BackendError::not_found("no such task"));
        let url = parse_url("https://tracker.test/1").unwrap();

        let err = backend.close_task(&url).await.unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::NotFound);
        assert!(backend.close_task(&url).await.is_ok());
        assert_eq!(backend.recorded_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_create_task_end_to_end() {
        let h = Harness::new();

        assert_eq!(h.say(1, "createTask", 1).await, "Enter task URL");
        assert_eq!(h.say(1, "https://x.test/t1", 2).await, "Enter task price");
        assert_eq!(h.say(1, "150", 3).await, "Task was created");

        assert_eq!(
            h.backend.recorded_calls(),
            vec![
                BackendCall::CreateTask("https://x.test/t1".to_string()),
                BackendCall::SetTaskPrice("https://x.test/t1".to_string(), 150),
            ]
        );
        assert_eq!(h.store.get_state(1), DialogState::Idle);
        assert_eq!(h.store.get_pending(1, PendingKey::Url), None);
    }

    #[tokio::test]
    async fn test_price_is_not_set_when_create_fails() {
        let h = Harness::new();
        h.backend
            .queue_failure(BackendError::already_exists("task already exists"));

        h.say(1, "createTask", 1).await;
        h.say(1, "https://x.test/t1", 2).await;
        assert_eq!(h.say(1, "150", 3).await, "task already exists");

        assert_eq!(
            h.backend.recorded_calls(),
            vec![BackendCall::CreateTask("https://x.test/t1".to_string())]
        );
        // Still on the price step so the user can retry
        assert_eq!(h.store.get_state(1), DialogState::AwaitingTaskPriceForCreate);
    }

    #[tokio::test]
    async fn test_new_command_discards_half_finished_workflow() {
        let h = Harness::new();

        h.say(1, "assignWorker", 1).await;
        h.say(1, "https://x.test/t1", 2).await;
        assert_eq!(h.store.get_state(1), DialogState::AwaitingAssigneeForAssign);

        assert_eq!(h.say(1, "closeTask", 3).await, "Enter task URL");
        assert_eq!(h.store.get_state(1), DialogState::AwaitingTaskUrlForClose);
        assert_eq!(h.store.get_pending(1, PendingKey::Url), None);
        assert!(h.backend.recorded_calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_resets_to_idle() {
        let h = Harness::new();
        h.backend.queue_failure(BackendError::not_found("Task not found"));

        h.say(1, "deleteTask", 1).await;
        assert_eq!(h.say(1, "https://x.test/gone", 2).await, "Task not found");
        assert_eq!(h.store.get_state(1), DialogState::Idle);
    }

    #[tokio::test]
    async fn test_assign_by_username() {
        let h = Harness::new();

        h.say(1, "assignWorker", 1).await;
        h.say(1, "https://x.test/t1", 2).await;
        assert_eq!(h.say(1, "@worker_1", 3).await, "Worker was assigned");
        assert_eq!(
            h.backend.recorded_calls(),
            vec![BackendCall::AssignUser(
                "https://x.test/t1".to_string(),
                Assignee::Username("worker_1".to_string())
            )]
        );
    }

    #[tokio::test]
    async fn test_empty_task_list() {
        let h = Harness::new();

        assert_eq!(h.say(1, "listOpenTasks", 1).await, "Empty tasks list");
        assert_eq!(h.sink.messages()[0].reply.markup, ReplyMarkup::None);
    }

    #[tokio::test]
    async fn test_task_list_links() {
        let h = Harness::new();
        h.backend.set_tasks(vec![
            Task {
                url: "https://x.test/t1".to_string(),
                status: TaskStatus::Open,
                assigned_user_id: None,
                price: Some(150),
            },
            Task {
                url: "https://x.test/t2".to_string(),
                status: TaskStatus::Open,
                assigned_user_id: None,
                price: None,
            },
        ]);

        h.say(1, "listOpenTasks", 1).await;
        let ReplyMarkup::TaskLinks(links) = h.sink.messages()[0].reply.markup.clone() else {
            panic!("expected task links");
        };
        let urls: Vec<_> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://x.test/t1", "https://x.test/t2"]);
    }

    #[tokio::test]
    async fn test_start_signs_up_and_shows_menu() {
        let h = Harness::new();
        h.dispatcher
            .dispatch(InboundMessage {
                username: Some("ann_w".to_string()),
                ..message_from(5, "/start")
            })
            .await;

        let texts = h.sink.wait_for(5, 1).await;
        assert_eq!(texts, vec!["User with id '5' signed up as @ann_w"]);
        assert_eq!(h.sink.messages()[0].reply.markup, ReplyMarkup::MainMenu);
        assert_eq!(
            h.backend.recorded_calls(),
            vec![BackendCall::SignUp {
                id: 5,
                username: "ann_w".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_repeated_sign_up_is_reported() {
        let h = Harness::new();
        h.backend
            .queue_failure(BackendError::already_exists("user 5 already exists"));

        assert_eq!(h.say(5, "/start", 1).await, "user 5 already exists");
        assert_eq!(h.dispatcher.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_hung_backend_does_not_block_other_users() {
        let h = Harness::new();
        h.backend.hang_on("https://x.test/stuck");

        h.say(1, "closeTask", 1).await;
        h.dispatcher
            .dispatch(message_from(1, "https://x.test/stuck"))
            .await;

        assert_eq!(h.say(2, "createTask", 1).await, "Enter task URL");
        assert_eq!(h.say(2, "https://x.test/t2", 2).await, "Enter task price");
        assert_eq!(h.say(2, "10", 3).await, "Task was created");

        // User 1 is still waiting on the backend
        assert_eq!(h.sink.texts_for(1).len(), 1);
        assert_eq!(h.store.get_state(1), DialogState::AwaitingTaskUrlForClose);
    }

    #[tokio::test]
    async fn test_full_queue_tells_user_to_retry() {
        let h = Harness::new();
        h.backend.hang_on("https://x.test/stuck");

        h.say(1, "deleteTask", 1).await;
        h.dispatcher
            .dispatch(message_from(1, "https://x.test/stuck"))
            .await;
        let stuck = BackendCall::DeleteTask("https://x.test/stuck".to_string());
        tokio::time::timeout(WAIT_TIMEOUT, async {
            while !h.backend.recorded_calls().contains(&stuck) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        // The worker is blocked, so the queue fills up
        for _ in 0..SESSION_QUEUE_CAPACITY {
            h.dispatcher.dispatch(message_from(1, "createTask")).await;
        }
        assert_eq!(h.sink.texts_for(1).len(), 1);

        assert_eq!(h.say(1, "closeTask", 2).await, SESSION_BUSY);
        assert_eq!(h.backend.recorded_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_backend_timeout_is_reported() {
        let h = Harness::with_timeout(Some(Duration::from_millis(50)));
        h.backend.hang_on("https://x.test/stuck");

        h.say(1, "closeTask", 1).await;
        let reply = h.say(1, "https://x.test/stuck", 2).await;
        assert_eq!(reply, "Backend did not answer within 50ms");
        assert_eq!(h.store.get_state(1), DialogState::Idle);

        // The session is usable again
        assert_eq!(h.say(1, "createTask", 3).await, "Enter task URL");
    }

    #[tokio::test]
    async fn test_inconsistent_session_is_recovered() {
        let h = Harness::new();
        // Price step without the URL the previous step stores
        h.store
            .set_state(1, DialogState::AwaitingTaskPriceForCreate, true);

        let reply = h.say(1, "150", 1).await;
        assert_eq!(reply, "Something went wrong, please start over");
        assert_eq!(h.store.get_state(1), DialogState::Idle);
        assert!(h.backend.recorded_calls().is_empty());
    }

    #[tokio::test]
    async fn test_messages_of_one_user_are_handled_in_order() {
        let h = Harness::new();
        for text in ["createTask", "https://x.test/t1", "150"] {
            h.dispatcher.dispatch(message_from(1, text)).await;
        }

        let texts = h.sink.wait_for(1, 3).await;
        assert_eq!(
            texts,
            vec!["Enter task URL", "Enter task price", "Task was created"]
        );
    }

    #[tokio::test]
    async fn test_run_dispatches_batches_until_shutdown() {
        let h = Harness::new();
        let source = ScriptedSource::new();
        source.push_batch(vec![message_from(1, "createTask"), message_from(2, "deleteTask")]);
        source.push_error(TransportError::Api {
            method: "getUpdates",
            description: "Bad Gateway".to_string(),
        });
        source.push_batch(vec![message_from(1, "https://x.test/t1")]);

        let shutdown = CancellationToken::new();
        let run = h.dispatcher.run(&source, shutdown.clone());
        let wait = async {
            h.sink.wait_for(1, 2).await;
            h.sink.wait_for(2, 1).await;
            shutdown.cancel();
        };
        let (result, ()) = tokio::join!(run, wait);

        assert!(result.is_ok());
        assert_eq!(h.dispatcher.session_count().await, 2);
        assert_eq!(
            h.store.get_pending(1, PendingKey::Url),
            Some(PendingValue::Url(parse_url("https://x.test/t1").unwrap()))
        );

        h.dispatcher.shutdown().await;
        assert_eq!(h.dispatcher.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_fatal_source_error_stops_run() {
        let h = Harness::new();
        let source = ScriptedSource::new();
        source.push_error(TransportError::Unauthorized("Unauthorized".to_string()));

        let result = h.dispatcher.run(&source, CancellationToken::new()).await;
        assert!(matches!(result, Err(TransportError::Unauthorized(_))));
    }
}
