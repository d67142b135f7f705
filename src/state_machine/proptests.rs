//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::effect::{BackendRequest, BackendResponse};
use super::state::*;
use super::transition::*;
use super::validate::{parse_assignee, parse_price, parse_url, Assignee, TaskUrl};
use super::*;
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> SessionContext {
    SessionContext::new(1001)
}

/// Whether `text` is acceptable input for the step `state` is waiting on
fn accepted_by(state: DialogState, text: &str) -> bool {
    match state {
        DialogState::Idle => false,
        DialogState::AwaitingTaskPriceForCreate => parse_price(text).is_ok(),
        DialogState::AwaitingAssigneeForAssign => parse_assignee(text).is_ok(),
        _ => parse_url(text).is_ok(),
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_state() -> impl Strategy<Value = DialogState> {
    proptest::sample::select(DialogState::ALL.to_vec())
}

fn arb_url() -> impl Strategy<Value = TaskUrl> {
    "https?://[a-z]{1,10}\\.test/[a-z0-9]{0,10}".prop_map(|s| parse_url(&s).unwrap())
}

fn arb_assignee() -> impl Strategy<Value = Assignee> {
    prop_oneof![
        any::<i64>().prop_map(Assignee::Id),
        "[a-z][a-z0-9_]{4,20}".prop_map(Assignee::Username),
    ]
}

/// Sessions whose pending data matches what their state requires
fn arb_consistent_session() -> impl Strategy<Value = Session> {
    (arb_state(), arb_url(), proptest::option::of(arb_assignee())).prop_map(
        |(state, url, assignee)| {
            let mut session = Session::new(state);
            if state.required_pending().is_some() {
                session.pending.insert(PendingValue::Url(url));
            }
            if let Some(assignee) = assignee {
                session.pending.insert(PendingValue::Assignee(assignee));
            }
            session
        },
    )
}

fn arb_workflow_command() -> impl Strategy<Value = Command> {
    proptest::sample::select(vec![
        Command::CreateTask,
        Command::DeleteTask,
        Command::AssignWorker,
        Command::CloseTask,
    ])
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 :/._@-]{0,30}",
        "[0-9]{1,25}",
        "-?[0-9]{1,5}",
        "https?://[a-z]{1,8}\\.test/[a-z]{0,8}",
        "@?[a-z_]{1,40}",
    ]
}

fn arb_completing_request() -> impl Strategy<Value = BackendRequest> {
    prop_oneof![
        (any::<i64>(), "[a-z]{0,10}")
            .prop_map(|(user_id, username)| BackendRequest::SignUp { user_id, username }),
        (arb_url(), any::<u64>()).prop_map(|(url, price)| BackendRequest::CreateTask { url, price }),
        arb_url().prop_map(|url| BackendRequest::DeleteTask { url }),
        (arb_url(), arb_assignee())
            .prop_map(|(url, assignee)| BackendRequest::AssignUser { url, assignee }),
        arb_url().prop_map(|url| BackendRequest::CloseTask { url }),
    ]
}

