//! Protobuf messages of `taskdesk.v1.TaskService`
//!
//! Mirrors `proto/taskdesk/v1/task_service.proto`; field tags must stay in
//! sync with it.

/// Every response of the service without payload
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Empty {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignUpRequest {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(string, tag = "2")]
    pub username: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateTaskRequest {
    #[prost(string, tag = "1")]
    pub url: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SetTaskPriceRequest {
    #[prost(string, tag = "1")]
    pub url: ::prost::alloc::string::String,
    #[prost(uint64, tag = "2")]
    pub price: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteTaskRequest {
    #[prost(string, tag = "1")]
    pub url: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AssignUserRequest {
    #[prost(string, tag = "1")]
    pub url: ::prost::alloc::string::String,
    #[prost(oneof = "assign_user_request::Assignee", tags = "2, 3")]
    pub assignee: ::core::option::Option<assign_user_request::Assignee>,
}

pub mod assign_user_request {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Assignee {
        #[prost(int64, tag = "2")]
        UserId(i64),
        #[prost(string, tag = "3")]
        Username(::prost::alloc::string::String),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CloseTaskRequest {
    #[prost(string, tag = "1")]
    pub url: ::prost::alloc::string::String,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct GetUnassignedTasksRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetUnassignedTasksResponse {
    #[prost(message, repeated, tag = "1")]
    pub tasks: ::prost::alloc::vec::Vec<Task>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ::prost::Enumeration)]
#[repr(i32)]
pub enum TaskStatus {
    Open = 0,
    Closed = 1,
    Declined = 2,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Task {
    #[prost(string, tag = "1")]
    pub url: ::prost::alloc::string::String,
    #[prost(enumeration = "TaskStatus", tag = "2")]
    pub status: i32,
    #[prost(int64, optional, tag = "3")]
    pub assigned_user_id: ::core::option::Option<i64>,
    #[prost(uint64, optional, tag = "4")]
    pub price: ::core::option::Option<u64>,
}
