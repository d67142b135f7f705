//! Input validators
//!
//! Pure parsers for the free-text input a workflow step expects. Each one
//! either yields a typed value or a [`ValidationError`]; none of them
//! normalizes the text it accepts.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a message was rejected as step input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Invalid price")]
    InvalidPrice,
    #[error("Invalid user ID")]
    InvalidIdentifier,
}

/// A task URL that passed [`parse_url`], kept exactly as the user typed it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskUrl(String);

impl TaskUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TaskUrl {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_url(&value)
    }
}

impl From<TaskUrl> for String {
    fn from(url: TaskUrl) -> Self {
        url.0
    }
}

/// Worker a task gets assigned to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Assignee {
    Id(i64),
    /// Chat username without the leading `@`
    Username(String),
}

impl fmt::Display for Assignee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assignee::Id(id) => write!(f, "{id}"),
            Assignee::Username(name) => write!(f, "@{name}"),
        }
    }
}

/// Accept `input` iff it is an absolute URI
pub fn parse_url(input: &str) -> Result<TaskUrl, ValidationError> {
    if input.is_empty() || input.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidUrl);
    }
    url::Url::parse(input)
        .map(|_| TaskUrl(input.to_string()))
        .map_err(|_| ValidationError::InvalidUrl)
}

/// Accept a base-10 non-negative integer that fits in 64 bits
pub fn parse_price(input: &str) -> Result<u64, ValidationError> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidPrice);
    }
    input.parse().map_err(|_| ValidationError::InvalidPrice)
}

/// Accept a base-10 signed 64-bit integer
pub fn parse_identifier(input: &str) -> Result<i64, ValidationError> {
    input
        .parse()
        .map_err(|_| ValidationError::InvalidIdentifier)
}

/// Accept a numeric user id, or failing that a chat username
pub fn parse_assignee(input: &str) -> Result<Assignee, ValidationError> {
    if let Ok(id) = parse_identifier(input) {
        return Ok(Assignee::Id(id));
    }

    let name = input.strip_prefix('@').unwrap_or(input);
    let valid_chars = name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    let starts_with_letter = name.bytes().next().is_some_and(|b| b.is_ascii_alphabetic());
    if (5..=32).contains(&name.len()) && valid_chars && starts_with_letter {
        Ok(Assignee::Username(name.to_string()))
    } else {
        Err(ValidationError::InvalidIdentifier)
    }
}
