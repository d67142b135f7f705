//! Telegram Bot API client
//!
//! Long-polls `getUpdates` for text messages and answers with
//! `sendMessage`. Only private text messages with a known sender are turned
//! into [`InboundMessage`]s; everything else is skipped.

use super::keyboard;
use super::types::{InboundMessage, OutboundMessage, TransportError};
use crate::runtime::{MessageSink, UpdateSource};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

/// Telegram rejects longer texts
const MAX_MESSAGE_CHARS: usize = 4096;

/// Slack on top of the long-poll timeout before the HTTP request gives up
const REQUEST_TIMEOUT_SLACK: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct TelegramApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: T,
    #[serde(default)]
    error_code: Option<u16>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TelegramGetMeResult {
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramUpdate {
    update_id: i64,
    #[serde(default)]
    message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
struct TelegramMessage {
    chat: TelegramChat,
    #[serde(default)]
    from: Option<TelegramUser>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramChat {
    id: i64,
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct TelegramUser {
    id: i64,
    #[serde(default)]
    is_bot: bool,
    #[serde(default)]
    username: Option<String>,
}

impl TelegramUpdate {
    fn into_inbound(self) -> Option<InboundMessage> {
        let message = self.message.filter(|m| m.chat.kind == "private")?;
        let from = message.from.filter(|user| !user.is_bot)?;
        let text = message.text?;
        Some(InboundMessage {
            user_id: from.id,
            chat_id: message.chat.id,
            username: from.username.filter(|name| !name.is_empty()),
            text,
        })
    }
}

/// Offset acknowledging every update in `updates`
fn next_offset(current: i64, updates: &[TelegramUpdate]) -> i64 {
    updates
        .iter()
        .fold(current, |offset, update| offset.max(update.update_id.saturating_add(1)))
}

pub struct TelegramClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
    poll_timeout: Duration,
    offset: AtomicI64,
}

impl TelegramClient {
    pub fn new(
        api_base: impl Into<String>,
        token: impl Into<String>,
        poll_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(poll_timeout + REQUEST_TIMEOUT_SLACK)
            .build()
            .map_err(|e| TransportError::http("client", e))?;
        Ok(Self {
            http,
            api_base: api_base.into(),
            token: token.into(),
            poll_timeout,
            offset: AtomicI64::new(0),
        })
    }

    /// Username of the bot account the token belongs to
    pub async fn get_me(&self) -> Result<String, TransportError> {
        let me: TelegramGetMeResult = self.call("getMe", &json!({})).await?;
        me.username
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| TransportError::Api {
                method: "getMe",
                description: "bot username is missing".to_string(),
            })
    }

    async fn call<T>(&self, method: &'static str, body: &Value) -> Result<T, TransportError>
    where
        T: DeserializeOwned + Default,
    {
        let url = format!(
            "{}/bot{}/{method}",
            self.api_base.trim_end_matches('/'),
            self.token
        );
        let parsed = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::http(method, e))?
            .json::<TelegramApiResponse<T>>()
            .await
            .map_err(|e| TransportError::http(method, e))?;

        if !parsed.ok {
            let description = parsed
                .description
                .unwrap_or_else(|| "no description".to_string());
            return Err(match parsed.error_code {
                Some(401 | 404) => TransportError::Unauthorized(description),
                _ => TransportError::Api {
                    method,
                    description,
                },
            });
        }
        Ok(parsed.result)
    }
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn next_batch(&self) -> Result<Vec<InboundMessage>, TransportError> {
        let offset = self.offset.load(Ordering::Acquire);
        let body = json!({
            "offset": offset,
            "timeout": self.poll_timeout.as_secs(),
            "allowed_updates": ["message"],
        });
        let updates: Vec<TelegramUpdate> = self.call("getUpdates", &body).await?;
        self.offset
            .store(next_offset(offset, &updates), Ordering::Release);

        let total = updates.len();
        let messages: Vec<_> = updates
            .into_iter()
            .filter_map(TelegramUpdate::into_inbound)
            .collect();
        if messages.len() < total {
            tracing::debug!(skipped = total - messages.len(), "Ignored updates");
        }
        Ok(messages)
    }
}

#[async_trait]
impl MessageSink for TelegramClient {
    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        let (text, markup) = keyboard::compose(&message.reply);
        let mut body = json!({
            "chat_id": message.chat_id,
            "text": keyboard::truncate(&text, MAX_MESSAGE_CHARS),
            "disable_web_page_preview": true,
        });
        if let Some(markup) = markup {
            body["reply_markup"] = markup;
        }
        let _: Value = self.call("sendMessage", &body).await?;
        Ok(())
    }
}
