//! gRPC implementation of [`TaskBackend`]
//!
//! Talks to `taskdesk.v1.TaskService` with plain unary calls over a lazily
//! connected channel, so the bot starts even while the backend is down.

use super::proto::{self, assign_user_request};
use super::{BackendError, BackendErrorKind, Task, TaskBackend, TaskStatus};
use crate::state_machine::validate::{Assignee, TaskUrl};
use async_trait::async_trait;
use std::time::Duration;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::Code;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

mod path {
    pub const SIGN_UP: &str = "/taskdesk.v1.TaskService/SignUp";
    pub const CREATE_TASK: &str = "/taskdesk.v1.TaskService/CreateTask";
    pub const SET_TASK_PRICE: &str = "/taskdesk.v1.TaskService/SetTaskPrice";
    pub const DELETE_TASK: &str = "/taskdesk.v1.TaskService/DeleteTask";
    pub const ASSIGN_USER: &str = "/taskdesk.v1.TaskService/AssignUser";
    pub const CLOSE_TASK: &str = "/taskdesk.v1.TaskService/CloseTask";
    pub const GET_UNASSIGNED_TASKS: &str = "/taskdesk.v1.TaskService/GetUnassignedTasks";
}

#[derive(Debug, Clone)]
pub struct GrpcTaskBackend {
    inner: tonic::client::Grpc<Channel>,
}

impl GrpcTaskBackend {
    /// Prepare a client for `uri` (e.g. `http://127.0.0.1:50051`). The
    /// connection is established on the first call.
    pub fn connect_lazy(uri: impl Into<String>) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::from_shared(uri.into())?
            .connect_timeout(CONNECT_TIMEOUT)
            .connect_lazy();
        Ok(Self {
            inner: tonic::client::Grpc::new(channel),
        })
    }

    async fn unary<Req, Resp>(&self, path: &'static str, request: Req) -> Result<Resp, BackendError>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = self.inner.clone();
        grpc.ready()
            .await
            .map_err(|e| BackendError::unavailable(format!("Service was not ready: {e}")))?;

        let codec = tonic::codec::ProstCodec::<Req, Resp>::default();
        let response = grpc
            .unary(tonic::Request::new(request), PathAndQuery::from_static(path), codec)
            .await?;
        Ok(response.into_inner())
    }
}

#[async_trait]
impl TaskBackend for GrpcTaskBackend {
    async fn sign_up(&self, id: i64, username: &str) -> Result<(), BackendError> {
        let request = proto::SignUpRequest {
            id,
            username: username.to_string(),
        };
        self.unary::<_, proto::Empty>(path::SIGN_UP, request).await?;
        Ok(())
    }

    async fn create_task(&self, url: &TaskUrl) -> Result<(), BackendError> {
        let request = proto::CreateTaskRequest {
            url: url.as_str().to_owned(),
        };
        self.unary::<_, proto::Empty>(path::CREATE_TASK, request).await?;
        Ok(())
    }

    async fn set_task_price(&self, url: &TaskUrl, price: u64) -> Result<(), BackendError> {
        let request = proto::SetTaskPriceRequest {
            url: url.as_str().to_owned(),
            price,
        };
        self.unary::<_, proto::Empty>(path::SET_TASK_PRICE, request).await?;
        Ok(())
    }

    async fn delete_task(&self, url: &TaskUrl) -> Result<(), BackendError> {
        let request = proto::DeleteTaskRequest {
            url: url.as_str().to_owned(),
        };
        self.unary::<_, proto::Empty>(path::DELETE_TASK, request).await?;
        Ok(())
    }

    async fn assign_user(&self, url: &TaskUrl, assignee: &Assignee) -> Result<(), BackendError> {
        let request = proto::AssignUserRequest {
            url: url.as_str().to_owned(),
            assignee: Some(assignee.into()),
        };
        self.unary::<_, proto::Empty>(path::ASSIGN_USER, request).await?;
        Ok(())
    }

    async fn close_task(&self, url: &TaskUrl) -> Result<(), BackendError> {
        let request = proto::CloseTaskRequest {
            url: url.as_str().to_owned(),
        };
        self.unary::<_, proto::Empty>(path::CLOSE_TASK, request).await?;
        Ok(())
    }

    async fn get_unassigned_tasks(&self) -> Result<Vec<Task>, BackendError> {
        let response: proto::GetUnassignedTasksResponse = self
            .unary(path::GET_UNASSIGNED_TASKS, proto::GetUnassignedTasksRequest {})
            .await?;
        response.tasks.into_iter().map(Task::try_from).collect()
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<tonic::Status> for BackendError {
    fn from(status: tonic::Status) -> Self {
        let kind = match status.code() {
            Code::AlreadyExists => BackendErrorKind::AlreadyExists,
            Code::NotFound => BackendErrorKind::NotFound,
            Code::InvalidArgument | Code::FailedPrecondition => BackendErrorKind::Rejected,
            Code::Unavailable | Code::DeadlineExceeded => BackendErrorKind::Unavailable,
            _ => BackendErrorKind::Unknown,
        };
        let message = if status.message().is_empty() {
            status.code().description().to_string()
        } else {
            status.message().to_string()
        };
        BackendError::new(kind, message)
    }
}

impl From<&Assignee> for assign_user_request::Assignee {
    fn from(assignee: &Assignee) -> Self {
        match assignee {
            Assignee::Id(id) => Self::UserId(*id),
            Assignee::Username(name) => Self::Username(name.clone()),
        }
    }
}

impl From<proto::TaskStatus> for TaskStatus {
    fn from(status: proto::TaskStatus) -> Self {
        match status {
            proto::TaskStatus::Open => TaskStatus::Open,
            proto::TaskStatus::Closed => TaskStatus::Closed,
            proto::TaskStatus::Declined => TaskStatus::Declined,
        }
    }
}

impl TryFrom<proto::Task> for Task {
    type Error = BackendError;

    fn try_from(task: proto::Task) -> Result<Self, Self::Error> {
        let status = proto::TaskStatus::try_from(task.status).map_err(|_| {
            BackendError::unknown(format!(
                "Unknown status {} for task {}",
                task.status, task.url
            ))
        })?;
        Ok(Task {
            url: task.url,
            status: status.into(),
            assigned_user_id: task.assigned_user_id,
            price: task.price,
        })
    }
}
