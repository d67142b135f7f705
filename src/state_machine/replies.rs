//! User-facing reply texts

use super::state::UserId;

pub const ENTER_TASK_URL: &str = "Enter task URL";
pub const ENTER_TASK_PRICE: &str = "Enter task price";
pub const ENTER_ASSIGNEE: &str = "Enter worker user ID or @username";
pub const TASK_CREATED: &str = "Task was created";
pub const TASK_DELETED: &str = "Task was deleted";
pub const WORKER_ASSIGNED: &str = "Worker was assigned";
pub const TASK_CLOSED: &str = "Task was closed";
pub const EMPTY_TASK_LIST: &str = "Empty tasks list";
pub const OPEN_TASKS: &str = "Current open tasks:";
pub const UNKNOWN_COMMAND: &str = "Unknown command, choose an action from the menu";
pub const SESSION_LOST: &str = "Something went wrong, please start over";

pub fn signed_up(user_id: UserId, username: &str) -> String {
    if username.is_empty() {
        format!("User with id '{user_id}' signed up")
    } else {
        format!("User with id '{user_id}' signed up as @{username}")
    }
}

/// Label of the `index`-th (zero-based) entry of a task listing
pub fn task_link_label(index: usize, price: Option<u64>) -> String {
    match price {
        Some(price) => format!("Task {} (price: {price})", index + 1),
        None => format!("Task {} (no price)", index + 1),
    }
}
