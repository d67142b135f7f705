//! Taskdesk bot - chat front end for the task service
//!
//! Users drive task workflows (create, delete, assign, close, list) through
//! a per-user dialog state machine; the tasks themselves live in a remote
//! gRPC backend.

mod backend;
mod config;
mod runtime;
mod session;
mod state_machine;
mod transport;

use backend::{GrpcTaskBackend, LoggingBackend};
use config::BotConfig;
use runtime::ProductionDispatcher;
use session::InMemorySessionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transport::TelegramClient;

/// How long in-flight messages may take to finish after Ctrl-C
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = BotConfig::from_env()?;

    // Initialize logging
    let default_filter = if config.debug {
        "taskdesk_bot=debug"
    } else {
        "taskdesk_bot=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let endpoint = config.grpc_endpoint();
    tracing::info!(endpoint = %endpoint, "Using task backend");
    let backend = LoggingBackend::new(GrpcTaskBackend::connect_lazy(endpoint)?);

    let telegram = Arc::new(TelegramClient::new(
        &config.telegram_api_base_url,
        &config.bot_token,
        config.poll_timeout,
    )?);
    let bot_name = telegram.get_me().await?;
    tracing::info!(bot = %bot_name, "Authorized on account");

    let dispatcher: ProductionDispatcher = ProductionDispatcher::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(backend),
        Arc::clone(&telegram),
    )
    .with_call_timeout(config.call_timeout);

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                return;
            }
            tracing::info!("Shutdown requested");
            shutdown.cancel();
        }
    });

    let result = dispatcher.run(&*telegram, shutdown).await;

    if tokio::time::timeout(SHUTDOWN_GRACE, dispatcher.shutdown())
        .await
        .is_err()
    {
        tracing::warn!("Sessions still busy, exiting anyway");
    }

    result?;
    Ok(())
}
