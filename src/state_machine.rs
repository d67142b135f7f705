//! Dialog state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! every inbound message or backend outcome is an [`Event`], and
//! [`transition`] turns it into the [`Effect`]s the runtime executes.

pub mod command;
mod effect;
pub mod event;
mod replies;
pub mod state;
pub(crate) mod transition;
pub mod validate;

#[cfg(test)]
mod proptests;

pub use command::Command;
pub use effect::{BackendRequest, BackendResponse, Effect, Reply, ReplyMarkup, TaskLink};
pub use event::Event;
pub use state::{DialogState, PendingKey, PendingValue, Session, SessionContext, UserId};
pub use transition::{recover, transition};
