//! Dialog session types

use super::validate::{Assignee, TaskUrl};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable chat-platform identity of a user
pub type UserId = i64;

// ============================================================================
// Dialog State
// ============================================================================

/// Which input the bot expects next from a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DialogState {
    /// Main menu, only commands are meaningful
    #[default]
    Idle,
    AwaitingTaskUrlForCreate,
    /// URL already collected, waiting for the price
    AwaitingTaskPriceForCreate,
    AwaitingTaskUrlForDelete,
    AwaitingTaskUrlForAssign,
    /// URL already collected, waiting for the worker id or username
    AwaitingAssigneeForAssign,
    AwaitingTaskUrlForClose,
}

impl DialogState {
    #[allow(dead_code)] // Used by property tests
    pub const ALL: [DialogState; 7] = [
        DialogState::Idle,
        DialogState::AwaitingTaskUrlForCreate,
        DialogState::AwaitingTaskPriceForCreate,
        DialogState::AwaitingTaskUrlForDelete,
        DialogState::AwaitingTaskUrlForAssign,
        DialogState::AwaitingAssigneeForAssign,
        DialogState::AwaitingTaskUrlForClose,
    ];

    /// Slot that must already be filled when this state handles input
    #[allow(dead_code)] // Used by property tests
    pub fn required_pending(self) -> Option<PendingKey> {
        match self {
            DialogState::AwaitingTaskPriceForCreate | DialogState::AwaitingAssigneeForAssign => {
                Some(PendingKey::Url)
            }
            _ => None,
        }
    }
}

// ============================================================================
// Pending workflow data
// ============================================================================

/// Fixed set of slots a workflow can fill across steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingKey {
    Url,
    Assignee,
}

impl fmt::Display for PendingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingKey::Url => f.write_str("url"),
            PendingKey::Assignee => f.write_str("assignee"),
        }
    }
}

/// An already-validated value held in a slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "snake_case")]
pub enum PendingValue {
    Url(TaskUrl),
    Assignee(Assignee),
}

impl PendingValue {
    pub fn key(&self) -> PendingKey {
        match self {
            PendingValue::Url(_) => PendingKey::Url,
            PendingValue::Assignee(_) => PendingKey::Assignee,
        }
    }
}

/// Values collected by earlier steps of the current workflow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<TaskUrl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    assignee: Option<Assignee>,
}

impl PendingData {
    pub fn get(&self, key: PendingKey) -> Option<PendingValue> {
        match key {
            PendingKey::Url => self.url.clone().map(PendingValue::Url),
            PendingKey::Assignee => self.assignee.clone().map(PendingValue::Assignee),
        }
    }

    pub fn insert(&mut self, value: PendingValue) {
        match value {
            PendingValue::Url(url) => self.url = Some(url),
            PendingValue::Assignee(assignee) => self.assignee = Some(assignee),
        }
    }

    pub fn url(&self) -> Option<&TaskUrl> {
        self.url.as_ref()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.url.is_none() && self.assignee.is_none()
    }
}

// ============================================================================
// Session
// ============================================================================

/// Per-user dialog state plus the data accumulated by the current workflow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub state: DialogState,
    #[serde(default)]
    pub pending: PendingData,
}

impl Session {
    #[cfg(test)]
    pub fn new(state: DialogState) -> Self {
        Self {
            state,
            pending: PendingData::default(),
        }
    }

    /// Move to `state`; pending data survives unless `reset_pending` is set
    pub fn set_state(&mut self, state: DialogState, reset_pending: bool) {
        self.state = state;
        if reset_pending {
            self.pending.clear();
        }
    }

    /// Move to `state` and stash one value for later steps
    pub fn set_state_and_store(&mut self, state: DialogState, value: PendingValue) {
        self.state = state;
        self.pending.insert(value);
    }
}

/// Immutable per-user context of a session runtime
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user_id: UserId,
}

impl SessionContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}
