//! AI-Powered Chatbot UI server.
//!
//! Entry point: loads configuration, initializes tracing and serves the chat
//! page.

use std::sync::Arc;

use chatbot_ui::config::AppConfig;
use chatbot_ui::server;
use dotenvy::dotenv;
use mimalloc::MiMalloc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    // Initialize tracing (M-LOG-STRUCTURED)
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Arc::new(AppConfig::load()?);

    info!(
        name: "config.loaded",
        host = %config.server.host,
        port = config.server.port,
        endpoint = %config.endpoint.base_url,
        "Configuration loaded"
    );

    server::start_server(config).await
}
