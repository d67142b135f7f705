//! `reply_markup` rendering

use crate::state_machine::{Command, Reply, ReplyMarkup, TaskLink};
use serde_json::{json, Value};

const MAX_BUTTON_CHARS: usize = 64;

/// Message text and `reply_markup` for `reply`
///
/// Inline buttons only open http(s) and `tg` links; tasks pointing anywhere
/// else are listed in the message text instead.
pub(super) fn compose(reply: &Reply) -> (String, Option<Value>) {
    match &reply.markup {
        ReplyMarkup::None => (reply.text.clone(), None),
        ReplyMarkup::MainMenu => (reply.text.clone(), Some(main_menu())),
        ReplyMarkup::TaskLinks(links) => {
            let (buttons, plain): (Vec<&TaskLink>, Vec<&TaskLink>) =
                links.iter().partition(|link| opens_from_button(&link.url));

            let mut text = reply.text.clone();
            for link in plain {
                text.push_str(&format!("\n{}: {}", link.label, link.url));
            }
            let markup = (!buttons.is_empty()).then(|| task_links(&buttons));
            (text, markup)
        }
    }
}

fn opens_from_button(raw: &str) -> bool {
    url::Url::parse(raw).is_ok_and(|url| matches!(url.scheme(), "http" | "https" | "tg"))
}

fn main_menu() -> Value {
    let keyboard: Vec<Vec<&str>> = Command::MENU_ROWS
        .iter()
        .map(|row| row.iter().map(|command| command.label()).collect())
        .collect();
    json!({
        "keyboard": keyboard,
        "resize_keyboard": true,
    })
}

/// One URL button per row
fn task_links(links: &[&TaskLink]) -> Value {
    let inline_keyboard: Vec<Vec<Value>> = links
        .iter()
        .map(|link| {
            vec![json!({
                "text": truncate(&link.label, MAX_BUTTON_CHARS),
                "url": link.url,
            })]
        })
        .collect();
    json!({ "inline_keyboard": inline_keyboard })
}

pub(super) fn truncate(raw: &str, max_chars: usize) -> String {
    if raw.chars().count() <= max_chars {
        return raw.to_owned();
    }
    let mut out: String = raw.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
