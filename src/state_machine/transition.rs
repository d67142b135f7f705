//! Pure state transition function
//!
//! Every message is first offered to the command router; only text that is
//! not a command is validated as the input the current state expects.
//! Backend work is requested through [`Effect::CallBackend`] and its outcome
//! comes back as a separate event, so this module never performs I/O.

use super::command::{self, Command};
use super::effect::{BackendRequest, BackendResponse, Effect, Reply, ReplyMarkup, TaskLink};
use super::event::Event;
use super::replies;
use super::state::{DialogState, PendingKey, PendingValue, Session, SessionContext};
use super::validate::{parse_assignee, parse_price, parse_url, TaskUrl, ValidationError};
use crate::backend::Task;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug, Default, PartialEq)]
pub struct TransitionResult {
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    /// No effects yet; the session stays as it is unless effects are added
    pub fn unchanged() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    /// Session left behind once the session effects are applied to `session`
    #[cfg(test)]
    pub fn apply(&self, session: &Session) -> Session {
        let mut next = session.clone();
        for effect in &self.effects {
            match effect {
                Effect::SetState {
                    state,
                    reset_pending,
                } => next.set_state(*state, *reset_pending),
                Effect::SetStateAndStore { state, value } => {
                    next.set_state_and_store(*state, value.clone());
                }
                Effect::CallBackend(_) | Effect::Reply(_) => {}
            }
        }
        next
    }

    /// Backend requests issued by this transition
    #[cfg(test)]
    pub fn backend_requests(&self) -> impl Iterator<Item = &BackendRequest> {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::CallBackend(request) => Some(request),
            _ => None,
        })
    }

    /// Replies sent by this transition
    #[cfg(test)]
    pub fn replies(&self) -> impl Iterator<Item = &Reply> {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::Reply(reply) => Some(reply),
            _ => None,
        })
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// A later workflow step ran without the value an earlier step stores
    #[error("session in {state:?} is missing pending {key}")]
    MissingPending { state: DialogState, key: PendingKey },

    /// The runtime answered a request with the wrong kind of response
    #[error("{request} request completed without a task list")]
    MissingTaskList { request: &'static str },
}

/// Pure transition function
///
/// Given the same session, context and event it always produces the same
/// effects; the runtime is responsible for executing them.
pub fn transition(
    session: &Session,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        Event::Message { text, username } => {
            if let Some(command) = Command::parse(&text) {
                return Ok(command::route(command, context, username.as_deref()));
            }
            handle_step_input(session, &text)
        }
        Event::BackendSucceeded { request, response } => complete(request, response),
        Event::BackendFailed { request, message } => Ok(fail(&request, message)),
    }
}

/// Recovery after a failed transition
///
/// The in-flight workflow is abandoned: back to Idle with nothing pending.
pub fn recover(_error: &TransitionError) -> TransitionResult {
    TransitionResult::unchanged().with_effects([
        Effect::reset_to_idle(),
        Effect::reply_with_menu(replies::SESSION_LOST),
    ])
}

// ============================================================================
// Step handlers
// ============================================================================

fn handle_step_input(session: &Session, text: &str) -> Result<TransitionResult, TransitionError> {
    match session.state {
        DialogState::Idle => Ok(TransitionResult::unchanged()
            .with_effect(Effect::reply_with_menu(replies::UNKNOWN_COMMAND))),

        // Collect the URL, then ask for the price
        DialogState::AwaitingTaskUrlForCreate => Ok(match parse_url(text) {
            Ok(url) => TransitionResult::unchanged()
                .with_effect(Effect::SetStateAndStore {
                    state: DialogState::AwaitingTaskPriceForCreate,
                    value: PendingValue::Url(url),
                })
                .with_effect(Effect::reply(replies::ENTER_TASK_PRICE)),
            Err(e) => rejected(e),
        }),

        DialogState::AwaitingTaskPriceForCreate => {
            let price = match parse_price(text) {
                Ok(price) => price,
                Err(e) => return Ok(rejected(e)),
            };
            let url = required_url(session)?;
            Ok(TransitionResult::unchanged()
                .with_effect(Effect::CallBackend(BackendRequest::CreateTask { url, price })))
        }

        DialogState::AwaitingTaskUrlForDelete => Ok(match parse_url(text) {
            Ok(url) => TransitionResult::unchanged()
                .with_effect(Effect::CallBackend(BackendRequest::DeleteTask { url })),
            Err(e) => rejected(e),
        }),

        // Collect the URL, then ask who should do the task
        DialogState::AwaitingTaskUrlForAssign => Ok(match parse_url(text) {
            Ok(url) => TransitionResult::unchanged()
                .with_effect(Effect::SetStateAndStore {
                    state: DialogState::AwaitingAssigneeForAssign,
                    value: PendingValue::Url(url),
                })
                .with_effect(Effect::reply(replies::ENTER_ASSIGNEE)),
            Err(e) => rejected(e),
        }),

        DialogState::AwaitingAssigneeForAssign => {
            let assignee = match parse_assignee(text) {
                Ok(assignee) => assignee,
                Err(e) => return Ok(rejected(e)),
            };
            let url = required_url(session)?;
            Ok(TransitionResult::unchanged()
                .with_effect(Effect::CallBackend(BackendRequest::AssignUser { url, assignee })))
        }

        DialogState::AwaitingTaskUrlForClose => Ok(match parse_url(text) {
            Ok(url) => TransitionResult::unchanged()
                .with_effect(Effect::CallBackend(BackendRequest::CloseTask { url })),
            Err(e) => rejected(e),
        }),
    }
}

/// Invalid step input: tell the user, touch nothing
fn rejected(error: ValidationError) -> TransitionResult {
    TransitionResult::unchanged().with_effect(Effect::reply(error.to_string()))
}

fn required_url(session: &Session) -> Result<TaskUrl, TransitionError> {
    session
        .pending
        .url()
        .cloned()
        .ok_or(TransitionError::MissingPending {
            state: session.state,
            key: PendingKey::Url,
        })
}

// ============================================================================
// Backend outcomes
// ============================================================================

fn complete(
    request: BackendRequest,
    response: BackendResponse,
) -> Result<TransitionResult, TransitionError> {
    let done = |text: &str| {
        TransitionResult::unchanged()
            .with_effect(Effect::reset_to_idle())
            .with_effect(Effect::reply(text))
    };

    Ok(match request {
        BackendRequest::SignUp { user_id, username } => TransitionResult::unchanged()
            .with_effect(Effect::reset_to_idle())
            .with_effect(Effect::reply_with_menu(replies::signed_up(user_id, &username))),
        BackendRequest::ListUnassigned => {
            let BackendResponse::Tasks(tasks) = response else {
                return Err(TransitionError::MissingTaskList {
                    request: BackendRequest::ListUnassigned.name(),
                });
            };
            TransitionResult::unchanged().with_effect(Effect::Reply(task_listing(&tasks)))
        }
        BackendRequest::CreateTask { .. } => done(replies::TASK_CREATED),
        BackendRequest::DeleteTask { .. } => done(replies::TASK_DELETED),
        BackendRequest::AssignUser { .. } => done(replies::WORKER_ASSIGNED),
        BackendRequest::CloseTask { .. } => done(replies::TASK_CLOSED),
    })
}

fn fail(request: &BackendRequest, message: String) -> TransitionResult {
    let result = if request.failure_resets_session() {
        TransitionResult::unchanged().with_effect(Effect::reset_to_idle())
    } else {
        TransitionResult::unchanged()
    };
    result.with_effect(Effect::reply(message))
}

fn task_listing(tasks: &[Task]) -> Reply {
    if tasks.is_empty() {
        return Reply::text(replies::EMPTY_TASK_LIST);
    }
    let links = tasks
        .iter()
        .enumerate()
        .map(|(index, task)| TaskLink {
            label: replies::task_link_label(index, task.price),
            url: task.url.clone(),
        })
        .collect();
    Reply::text(replies::OPEN_TASKS).with_markup(ReplyMarkup::TaskLinks(links))
}
