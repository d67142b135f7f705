//! Backend error types

use std::time::Duration;
use thiserror::Error;

/// Backend error with classification
///
/// The message is what the user gets to see, so it is kept as the backend
/// reported it.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

#[allow(dead_code)] // Constructors for every kind, not all used outside tests
impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::AlreadyExists, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::NotFound, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Rejected, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Unavailable, message)
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            BackendErrorKind::Timeout,
            format!("Backend did not answer within {after:?}"),
        )
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Unknown, message)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// The entity being created is already there
    AlreadyExists,
    /// The task or user does not exist
    NotFound,
    /// The backend refused the request (bad argument, wrong task status)
    Rejected,
    /// Backend unreachable
    Unavailable,
    /// No answer within the configured deadline
    Timeout,
    Unknown,
}

impl BackendErrorKind {
    /// Whether the failure says something about the request rather than the
    /// connection
    pub fn is_domain_error(self) -> bool {
        matches!(self, Self::AlreadyExists | Self::NotFound | Self::Rejected)
    }
}
