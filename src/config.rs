//! Process configuration from the environment

use crate::transport::telegram::DEFAULT_API_BASE_URL;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_GRPC_HOST: &str = "127.0.0.1";
const DEFAULT_GRPC_PORT: u16 = 50051;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Configuration of the bot process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub bot_token: String,
    /// Log at debug level unless `RUST_LOG` says otherwise
    pub debug: bool,
    pub telegram_api_base_url: String,
    pub poll_timeout: Duration,
    pub grpc_host: String,
    pub grpc_port: u16,
    /// Deadline for one backend request; unset means wait forever
    pub call_timeout: Option<Duration>,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Blank values count as unset
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let bot_token = var("BOT_TOKEN").ok_or(ConfigError::Missing("BOT_TOKEN"))?;
        let debug = var("BOT_DEBUG").is_some_and(|v| is_truthy(&v));
        let telegram_api_base_url =
            var("TELEGRAM_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned());
        let poll_timeout = Duration::from_secs(
            parse_var("TELEGRAM_POLL_TIMEOUT_SECS", var("TELEGRAM_POLL_TIMEOUT_SECS"))?
                .unwrap_or(DEFAULT_POLL_TIMEOUT_SECS),
        );
        let grpc_host = var("GRPC_SERVER_HOST").unwrap_or_else(|| DEFAULT_GRPC_HOST.to_owned());
        let grpc_port =
            parse_var("GRPC_SERVER_PORT", var("GRPC_SERVER_PORT"))?.unwrap_or(DEFAULT_GRPC_PORT);
        let call_timeout = match parse_var::<u64>(
            "BACKEND_CALL_TIMEOUT_SECS",
            var("BACKEND_CALL_TIMEOUT_SECS"),
        )? {
            Some(0) => {
                return Err(ConfigError::Invalid {
                    name: "BACKEND_CALL_TIMEOUT_SECS",
                    value: "0".to_owned(),
                })
            }
            secs => secs.map(Duration::from_secs),
        };

        Ok(Self {
            bot_token,
            debug,
            telegram_api_base_url,
            poll_timeout,
            grpc_host,
            grpc_port,
            call_timeout,
        })
    }

    pub fn grpc_endpoint(&self) -> String {
        format!("http://{}:{}", self.grpc_host, self.grpc_port)
    }
}

fn parse_var<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| v.parse().map_err(|_| ConfigError::Invalid { name, value: v }))
        .transpose()
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
