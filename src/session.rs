//! Per-user session storage
//!
//! A user never seen before is in [`DialogState::Idle`] with nothing
//! pending. Entries are never evicted.

use crate::state_machine::{DialogState, PendingKey, PendingValue, Session, UserId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Storage for dialog sessions, keyed by chat user
///
/// Calls for different users never block on each other for longer than a
/// map lookup; each user's session is only written by that user's worker.
pub trait SessionStore: Send + Sync {
    #[allow(dead_code)] // API completeness
    fn get_state(&self, user: UserId) -> DialogState;

    #[allow(dead_code)] // API completeness
    fn get_pending(&self, user: UserId, key: PendingKey) -> Option<PendingValue>;

    /// Move `user` to `state`; pending data is cleared when `reset_pending`
    fn set_state(&self, user: UserId, state: DialogState, reset_pending: bool);

    /// Move `user` to `state` and store `value` in one step
    fn set_state_and_store(&self, user: UserId, state: DialogState, value: PendingValue);

    /// Copy of the whole session, for feeding the transition function
    fn snapshot(&self, user: UserId) -> Session;
}

impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    fn get_state(&self, user: UserId) -> DialogState {
        (**self).get_state(user)
    }

    fn get_pending(&self, user: UserId, key: PendingKey) -> Option<PendingValue> {
        (**self).get_pending(user, key)
    }

    fn set_state(&self, user: UserId, state: DialogState, reset_pending: bool) {
        (**self).set_state(user, state, reset_pending);
    }

    fn set_state_and_store(&self, user: UserId, state: DialogState, value: PendingValue) {
        (**self).set_state_and_store(user, state, value);
    }

    fn snapshot(&self, user: UserId) -> Session {
        (**self).snapshot(user)
    }
}

/// Process-local store; sessions do not survive a restart
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<UserId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, user: UserId, f: impl FnOnce(&Session) -> T) -> T {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        match sessions.get(&user) {
            Some(session) => f(session),
            None => f(&Session::default()),
        }
    }

    fn write(&self, user: UserId, f: impl FnOnce(&mut Session)) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        f(sessions.entry(user).or_default());
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_state(&self, user: UserId) -> DialogState {
        self.read(user, |session| session.state)
    }

    fn get_pending(&self, user: UserId, key: PendingKey) -> Option<PendingValue> {
        self.read(user, |session| session.pending.get(key))
    }

    fn set_state(&self, user: UserId, state: DialogState, reset_pending: bool) {
        tracing::debug!(user_id = user, ?state, reset_pending, "Session state changed");
        self.write(user, |session| session.set_state(state, reset_pending));
    }

    fn set_state_and_store(&self, user: UserId, state: DialogState, value: PendingValue) {
        tracing::debug!(user_id = user, ?state, key = %value.key(), "Session value stored");
        self.write(user, |session| session.set_state_and_store(state, value));
    }

    fn snapshot(&self, user: UserId) -> Session {
        self.read(user, Session::clone)
    }
}
