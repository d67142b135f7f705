//! Events that drive a session

use super::effect::{BackendRequest, BackendResponse};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// Text typed or a button pressed by the user
    Message {
        text: String,
        username: Option<String>,
    },

    /// A backend request issued by a previous transition succeeded
    BackendSucceeded {
        request: BackendRequest,
        response: BackendResponse,
    },

    /// A backend request issued by a previous transition failed
    BackendFailed {
        request: BackendRequest,
        message: String,
    },
}

impl Event {
    #[cfg(test)]
    pub fn message(text: impl Into<String>) -> Self {
        Event::Message {
            text: text.into(),
            username: None,
        }
    }
}
