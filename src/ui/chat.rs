//! Chat panel markup.

use std::fmt::Write as _;

use super::{attr, text};
use crate::session::{Phase, SessionState, Turn};

/// DOM id of the panel replaced after each submission.
pub const CHAT_PANEL_ID: &str = "chat-panel";

/// Shown in place of the history until the first turn completes.
pub const EMPTY_HISTORY_MESSAGE: &str = "No queries yet. Start by asking a question!";

/// Render the chat panel for `state`.
///
/// The panel is a complete `<section>` so it can be swapped in place.
#[must_use]
pub fn chat_panel(session_id: &str, state: &SessionState) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<section id="{CHAT_PANEL_ID}" class="chat-panel" data-session-id="{id}" data-phase="{phase}" aria-busy="{busy}">"#,
        id = attr(session_id),
        phase = phase_name(state.phase()),
        busy = state.is_loading(),
    );
    html.push_str(&query_form(session_id, state));
    html.push_str(&error_banner(state.error_message()));
    html.push_str(&history(state.history()));
    html.push_str("</section>");
    html
}

/// Panel shown when the page refers to a session that no longer exists.
#[must_use]
pub fn session_expired_panel() -> String {
    format!(
        r#"<section id="{CHAT_PANEL_ID}" class="chat-panel">{}<p class="chat-hint"><a href="/">Start a new chat</a></p></section>"#,
        error_banner(Some("This chat session has expired. Reload the page to start again."))
    )
}

fn query_form(session_id: &str, state: &SessionState) -> String {
    let loading = state.is_loading();
    let input_disabled = if loading { " disabled" } else { "" };
    let button_disabled = if state.can_submit() { "" } else { " disabled" };
    let button_label = if loading {
        r#"<span class="spinner" role="progressbar" aria-label="Loading"></span>"#
    } else {
        "Submit"
    };
    let indicator_hidden = if loading { "" } else { " hidden" };

    format!(
        r#"<form class="chat-form" method="post" action="/sessions/{id}/query" autocomplete="off">
    <label class="chat-label" for="chat-query">Enter your query</label>
    <input id="chat-query" class="chat-input" type="text" name="query" value="{draft}"{input_disabled}>
    <button class="chat-submit" type="submit"{button_disabled}>{button_label}</button>
    <div class="chat-loading" role="status"{indicator_hidden}>Waiting for a response&hellip;</div>
</form>"#,
        id = attr(session_id),
        draft = attr(state.draft_query()),
    )
}

fn error_banner(message: Option<&str>) -> String {
    match message {
        Some(message) => format!(
            r#"<div class="chat-error" role="alert">{}</div>"#,
            text(message)
        ),
        None => String::new(),
    }
}

fn history(turns: &[Turn]) -> String {
    let mut html = String::from(
        r#"<div class="chat-history"><h2 class="chat-history-title">Chat History</h2>"#,
    );

    if turns.is_empty() {
        let _ = write!(
            html,
            r#"<p class="chat-empty">{EMPTY_HISTORY_MESSAGE}</p>"#
        );
    } else {
        html.push_str(r#"<ol class="chat-turns">"#);
        for turn in turns {
            let _ = write!(
                html,
                r#"<li class="chat-turn"><p class="chat-query">You: {}</p><p class="chat-response">Bot: {}</p></li>"#,
                text(turn.query()),
                text(turn.response()),
            );
        }
        html.push_str("</ol>");
    }

    html.push_str("</div>");
    html
}

fn phase_name(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "idle",
        Phase::Submitting => "submitting",
        Phase::IdleWithError => "error",
    }
}
