//! Effects produced by state transitions

use super::state::{DialogState, PendingValue, UserId};
use super::validate::{Assignee, TaskUrl};
use crate::backend::Task;

/// Effects to be executed after a transition, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Move the session to `state`, dropping pending data if `reset_pending`
    SetState {
        state: DialogState,
        reset_pending: bool,
    },

    /// Move the session to `state` and stash a validated value
    SetStateAndStore {
        state: DialogState,
        value: PendingValue,
    },

    /// Call the task backend; the outcome comes back as an event
    CallBackend(BackendRequest),

    /// Send a message to the chat the input came from
    Reply(Reply),
}

impl Effect {
    pub fn reset_to_idle() -> Self {
        Effect::SetState {
            state: DialogState::Idle,
            reset_pending: true,
        }
    }

    pub fn reply(text: impl Into<String>) -> Self {
        Effect::Reply(Reply::text(text))
    }

    pub fn reply_with_menu(text: impl Into<String>) -> Self {
        Effect::Reply(Reply::text(text).with_markup(ReplyMarkup::MainMenu))
    }
}

/// One workflow's worth of backend work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendRequest {
    SignUp {
        user_id: UserId,
        username: String,
    },
    ListUnassigned,
    /// Create the task, then set its price
    CreateTask {
        url: TaskUrl,
        price: u64,
    },
    DeleteTask {
        url: TaskUrl,
    },
    AssignUser {
        url: TaskUrl,
        assignee: Assignee,
    },
    CloseTask {
        url: TaskUrl,
    },
}

impl BackendRequest {
    /// Name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            BackendRequest::SignUp { .. } => "sign_up",
            BackendRequest::ListUnassigned => "list_unassigned",
            BackendRequest::CreateTask { .. } => "create_task",
            BackendRequest::DeleteTask { .. } => "delete_task",
            BackendRequest::AssignUser { .. } => "assign_user",
            BackendRequest::CloseTask { .. } => "close_task",
        }
    }

    /// Whether a failure ends the workflow instead of leaving the user on
    /// the current step to retry
    pub fn failure_resets_session(&self) -> bool {
        matches!(
            self,
            BackendRequest::DeleteTask { .. } | BackendRequest::CloseTask { .. }
        )
    }
}

/// Successful backend outcome
#[derive(Debug, Clone, PartialEq)]
pub enum BackendResponse {
    Done,
    Tasks(Vec<Task>),
}

// ============================================================================
// Replies
// ============================================================================

/// Outbound message body plus optional selectable options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub markup: ReplyMarkup,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: ReplyMarkup::None,
        }
    }

    #[must_use]
    pub fn with_markup(mut self, markup: ReplyMarkup) -> Self {
        self.markup = markup;
        self
    }
}

/// Options attached to a reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReplyMarkup {
    #[default]
    None,
    /// Keyboard with one button per top-level command
    MainMenu,
    /// One entry per listed task, offered as a link button where the URL allows
    TaskLinks(Vec<TaskLink>),
}

/// A selectable entry pointing at a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLink {
    pub label: String,
    pub url: String,
}
