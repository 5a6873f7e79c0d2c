use std::sync::Arc;
use std::time::Duration;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::config::AppConfig;
use crate::endpoint::HttpChatEndpoint;
use crate::error::ErrorKind;
use crate::session::{Phase, SessionState, SessionStore};
use crate::ui;

/// Request header asking for the chat panel fragment instead of a redirect.
pub const FRAGMENT_HEADER: &str = "x-chat-fragment";

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let endpoint = HttpChatEndpoint::new(&config.endpoint)?;

    info!(
        name: "endpoint.configured",
        url = %endpoint.url(),
        timeout_secs = ?config.endpoint.timeout_secs,
        "Chat endpoint configured"
    );

    let state = AppState::new(Arc::clone(&config), Arc::new(endpoint));

    let sweeper = spawn_session_sweeper(
        state.sessions.clone(),
        config.session.idle_timeout(),
        config.session.sweep_interval(),
    );

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!(name: "server.stopped", "Server stopped");
    Ok(())
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let static_dir = state.config.server.static_dir.clone();

    Router::new()
        // HTML pages
        .route("/", get(index_handler))
        .route("/sessions/{id}", get(session_page_handler))
        .route("/sessions/{id}/query", post(submit_query))
        .route("/sessions/{id}/close", post(close_session))
        // JSON
        .route("/api/sessions/{id}", get(api_get_session))
        // Static assets
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Periodically drop sessions idle longer than `idle_timeout`.
pub fn spawn_session_sweeper(
    sessions: SessionStore,
    idle_timeout: Duration,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = sessions.cleanup_expired_with_timeout(idle_timeout);
            if removed > 0 {
                tracing::debug!(
                    removed = removed,
                    remaining = sessions.len(),
                    "Swept idle sessions"
                );
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET / - Every page load starts a fresh session.
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let session = state.sessions.create();
    tracing::debug!(
        session_id = %session.id(),
        active_sessions = state.sessions.len(),
        "Created session"
    );
    Html(ui::chat_page(session.id(), &session.snapshot()))
}

/// GET /sessions/:id - Page for an existing session (used after form posts).
async fn session_page_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.sessions.get(&id) {
        Some(session) => Html(ui::chat_page(session.id(), &session.snapshot())).into_response(),
        None => Redirect::to("/").into_response(),
    }
}

/// Form body for a submission.
#[derive(Debug, Deserialize)]
struct QueryForm {
    #[serde(default)]
    query: String,
}

/// POST /sessions/:id/query - Submit the draft to the chat endpoint.
///
/// Validation and transport failures are part of the rendered state, so they
/// still answer 200; only a refused concurrent submission answers 409.
async fn submit_query(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Form(form): Form<QueryForm>,
) -> Response {
    let wants_fragment = headers.contains_key(FRAGMENT_HEADER);

    let Some(session) = state.sessions.get(&id) else {
        tracing::debug!(session_id = %id, "Submission for unknown session");
        return if wants_fragment {
            (StatusCode::NOT_FOUND, Html(ui::session_expired_panel())).into_response()
        } else {
            Redirect::to("/").into_response()
        };
    };

    let status = match session.submit(form.query, Arc::clone(&state.endpoint)).await {
        Err(e) if e.kind() == ErrorKind::Busy => {
            tracing::debug!(session_id = %session.id(), "Submission refused while in flight");
            StatusCode::CONFLICT
        }
        _ => StatusCode::OK,
    };

    if wants_fragment {
        let html = ui::chat_panel(session.id(), &session.snapshot());
        (status, Html(html)).into_response()
    } else {
        Redirect::to(&format!("/sessions/{}", session.id())).into_response()
    }
}

/// POST /sessions/:id/close - Drop a session when its page goes away.
async fn close_session(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    match state.sessions.remove(&id) {
        Some(_) => {
            tracing::debug!(session_id = %id, "Closed session");
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Session snapshot for API responses.
#[derive(Debug, Serialize)]
struct SessionDto {
    id: String,
    phase: Phase,
    #[serde(flatten)]
    state: SessionState,
}

/// GET /api/sessions/:id - Current session state as JSON.
async fn api_get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionDto>, StatusCode> {
    let session = state.sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let snapshot = session.snapshot();
    Ok(Json(SessionDto {
        id: session.id().to_string(),
        phase: snapshot.phase(),
        state: snapshot,
    }))
}
