//! Task backend abstraction
//!
//! The dialog engine only needs the handful of operations below; the
//! production implementation talks gRPC, tests use in-memory mocks.

mod error;
pub mod grpc;
mod proto;

pub use error::{BackendError, BackendErrorKind};
pub use grpc::GrpcTaskBackend;

use crate::state_machine::validate::{Assignee, TaskUrl};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Task status as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    Closed,
    Declined,
}

/// Read-only projection of a backend task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub url: String,
    #[allow(dead_code)] // Part of the backend contract, not shown to users
    pub status: TaskStatus,
    #[allow(dead_code)]
    pub assigned_user_id: Option<i64>,
    pub price: Option<u64>,
}

/// Remote task/user service
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Register a chat user; repeating it for a known id is an error, not a
    /// crash
    async fn sign_up(&self, id: i64, username: &str) -> Result<(), BackendError>;

    async fn create_task(&self, url: &TaskUrl) -> Result<(), BackendError>;

    async fn set_task_price(&self, url: &TaskUrl, price: u64) -> Result<(), BackendError>;

    async fn delete_task(&self, url: &TaskUrl) -> Result<(), BackendError>;

    async fn assign_user(&self, url: &TaskUrl, assignee: &Assignee) -> Result<(), BackendError>;

    async fn close_task(&self, url: &TaskUrl) -> Result<(), BackendError>;

    /// Open tasks nobody works on; empty is a valid answer
    async fn get_unassigned_tasks(&self) -> Result<Vec<Task>, BackendError>;
}

#[async_trait]
impl<T: TaskBackend + ?Sized> TaskBackend for Arc<T> {
    async fn sign_up(&self, id: i64, username: &str) -> Result<(), BackendError> {
        (**self).sign_up(id, username).await
    }

    async fn create_task(&self, url: &TaskUrl) -> Result<(), BackendError> {
        (**self).create_task(url).await
    }

    async fn set_task_price(&self, url: &TaskUrl, price: u64) -> Result<(), BackendError> {
        (**self).set_task_price(url, price).await
    }

    async fn delete_task(&self, url: &TaskUrl) -> Result<(), BackendError> {
        (**self).delete_task(url).await
    }

    async fn assign_user(&self, url: &TaskUrl, assignee: &Assignee) -> Result<(), BackendError> {
        (**self).assign_user(url, assignee).await
    }

    async fn close_task(&self, url: &TaskUrl) -> Result<(), BackendError> {
        (**self).close_task(url).await
    }

    async fn get_unassigned_tasks(&self) -> Result<Vec<Task>, BackendError> {
        (**self).get_unassigned_tasks().await
    }
}

// ============================================================================
// Logging wrapper
// ============================================================================

/// Logging wrapper for task backends
pub struct LoggingBackend<B> {
    inner: B,
}

impl<B: TaskBackend> LoggingBackend<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    fn log<T>(operation: &'static str, started: Instant, result: &Result<T, BackendError>) {
        let duration_ms = started.elapsed().as_millis();
        match result {
            Ok(_) => {
                tracing::debug!(operation, duration_ms = %duration_ms, "Backend call completed");
            }
            Err(e) if e.kind.is_domain_error() => {
                tracing::info!(
                    operation,
                    duration_ms = %duration_ms,
                    kind = ?e.kind,
                    error = %e.message,
                    "Backend rejected request"
                );
            }
            Err(e) => {
                tracing::error!(
                    operation,
                    duration_ms = %duration_ms,
                    kind = ?e.kind,
                    error = %e.message,
                    "Backend call failed"
                );
            }
        }
    }
}

#[async_trait]
impl<B: TaskBackend> TaskBackend for LoggingBackend<B> {
    async fn sign_up(&self, id: i64, username: &str) -> Result<(), BackendError> {
        let started = Instant::now();
        let result = self.inner.sign_up(id, username).await;
        Self::log("sign_up", started, &result);
        result
    }

    async fn create_task(&self, url: &TaskUrl) -> Result<(), BackendError> {
        let started = Instant::now();
        let result = self.inner.create_task(url).await;
        Self::log("create_task", started, &result);
        result
    }

    async fn set_task_price(&self, url: &TaskUrl, price: u64) -> Result<(), BackendError> {
        let started = Instant::now();
        let result = self.inner.set_task_price(url, price).await;
        Self::log("set_task_price", started, &result);
        result
    }

    async fn delete_task(&self, url: &TaskUrl) -> Result<(), BackendError> {
        let started = Instant::now();
        let result = self.inner.delete_task(url).await;
        Self::log("delete_task", started, &result);
        result
    }

    async fn assign_user(&self, url: &TaskUrl, assignee: &Assignee) -> Result<(), BackendError> {
        let started = Instant::now();
        let result = self.inner.assign_user(url, assignee).await;
        Self::log("assign_user", started, &result);
        result
    }

    async fn close_task(&self, url: &TaskUrl) -> Result<(), BackendError> {
        let started = Instant::now();
        let result = self.inner.close_task(url).await;
        Self::log("close_task", started, &result);
        result
    }

    async fn get_unassigned_tasks(&self) -> Result<Vec<Task>, BackendError> {
        let started = Instant::now();
        let result = self.inner.get_unassigned_tasks().await;
        if let Ok(tasks) = &result {
            tracing::debug!(count = tasks.len(), "Fetched unassigned tasks");
        }
        Self::log("get_unassigned_tasks", started, &result);
        result
    }
}
