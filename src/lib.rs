//! AI-Powered Chatbot UI
//!
//! A minimal browser chat interface: one input, a submit action, a loading
//! indicator, an error banner and a scrolling history of query/response
//! pairs. Queries are forwarded to an external Chat Endpoint over HTTP.
//!
//! # Architecture
//!
//! - **Server**: Axum HTTP server rendering HTML on every request
//! - **Session**: one controller per page load, one request in flight at a time
//! - **Endpoint**: reqwest client for `POST {base}/chatbot`
//! - **UI**: pure state-to-HTML rendering plus a small enhancement script
//!
//! # Modules
//!
//! - [`config`]: layered configuration (defaults, file, env, CLI)
//! - [`endpoint`]: Chat Endpoint trait and HTTP driver
//! - [`error`]: submission errors
//! - [`server`]: router, handlers and startup
//! - [`session`]: session state, controller and store
//! - [`ui`]: HTML rendering

pub mod config;
pub mod endpoint;
pub mod error;
pub mod server;
pub mod session;
pub mod ui;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::endpoint::ChatEndpoint;
use crate::session::SessionStore;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Live page sessions.
    pub sessions: SessionStore,
    /// Where queries are sent.
    pub endpoint: Arc<dyn ChatEndpoint>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Arc<AppConfig>, endpoint: Arc<dyn ChatEndpoint>) -> Self {
        Self {
            sessions: SessionStore::new(),
            endpoint,
            config,
        }
    }
}
