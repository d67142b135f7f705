//! Top-level commands
//!
//! Commands are recognized in every state, so a user can always leave a
//! half-finished workflow by issuing a new one.

use super::effect::{BackendRequest, Effect};
use super::replies;
use super::state::{DialogState, SessionContext};
use super::transition::TransitionResult;

/// The closed set of commands the bot understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    CreateTask,
    DeleteTask,
    AssignWorker,
    CloseTask,
    ListOpenTasks,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::Start,
        Command::CreateTask,
        Command::DeleteTask,
        Command::AssignWorker,
        Command::CloseTask,
        Command::ListOpenTasks,
    ];

    /// Commands shown on the main menu keyboard, row by row
    pub const MENU_ROWS: [[Command; 2]; 3] = [
        [Command::CreateTask, Command::DeleteTask],
        [Command::ListOpenTasks, Command::CloseTask],
        [Command::AssignWorker, Command::Start],
    ];

    /// Button label, also accepted as the command text
    pub fn label(self) -> &'static str {
        match self {
            Command::Start => "/start",
            Command::CreateTask => "Create task ➕",
            Command::DeleteTask => "Delete task ➖",
            Command::AssignWorker => "Assign worker 👨‍🔧",
            Command::CloseTask => "Close task ✔",
            Command::ListOpenTasks => "Get unassigned tasks 📃",
        }
    }

    /// ASCII spellings, matched case-insensitively
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Command::Start => &["start"],
            Command::CreateTask => &["createtask", "/create_task", "create_task"],
            Command::DeleteTask => &["deletetask", "/delete_task", "delete_task"],
            Command::AssignWorker => &["assignworker", "/assign_worker", "assign_worker"],
            Command::CloseTask => &["closetask", "/close_task", "close_task"],
            Command::ListOpenTasks => &[
                "listopentasks",
                "/list_open_tasks",
                "list_open_tasks",
                "/tasks",
            ],
        }
    }

    /// Recognize a command, `None` means the text is step input
    pub fn parse(text: &str) -> Option<Command> {
        let text = text.trim();
        Self::ALL.into_iter().find(|command| {
            command.label() == text
                || command
                    .aliases()
                    .iter()
                    .any(|alias| alias.eq_ignore_ascii_case(text))
        })
    }

    /// State the command moves into; `None` keeps the current one
    pub fn target_state(self) -> Option<DialogState> {
        match self {
            Command::Start => Some(DialogState::Idle),
            Command::CreateTask => Some(DialogState::AwaitingTaskUrlForCreate),
            Command::DeleteTask => Some(DialogState::AwaitingTaskUrlForDelete),
            Command::AssignWorker => Some(DialogState::AwaitingTaskUrlForAssign),
            Command::CloseTask => Some(DialogState::AwaitingTaskUrlForClose),
            Command::ListOpenTasks => None,
        }
    }

    /// Whether issuing the command abandons the workflow in progress
    pub fn resets_session(self) -> bool {
        !matches!(self, Command::ListOpenTasks)
    }
}

/// Transition for an issued command
///
/// Start only resets the session once sign-up succeeds; the other
/// workflow commands switch state immediately and prompt for a URL.
pub fn route(command: Command, context: &SessionContext, username: Option<&str>) -> TransitionResult {
    match command {
        Command::Start => TransitionResult::unchanged().with_effect(Effect::CallBackend(
            BackendRequest::SignUp {
                user_id: context.user_id,
                username: username.unwrap_or_default().to_string(),
            },
        )),
        Command::ListOpenTasks => {
            TransitionResult::unchanged().with_effect(Effect::CallBackend(BackendRequest::ListUnassigned))
        }
        Command::CreateTask | Command::DeleteTask | Command::AssignWorker | Command::CloseTask => {
            let state = command.target_state().unwrap_or_default();
            TransitionResult::unchanged()
                .with_effect(Effect::SetState {
                    state,
                    reset_pending: command.resets_session(),
                })
                .with_effect(Effect::reply(replies::ENTER_TASK_URL))
        }
    }
}
