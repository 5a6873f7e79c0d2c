//! HTML document shell.

use super::{attr, chat_panel};
use crate::session::{Phase, SessionState};

/// Render the full chat page for one session.
#[must_use]
pub fn chat_page(session_id: &str, state: &SessionState) -> String {
    html_shell(
        "Chat",
        session_id,
        status_label(state.phase()),
        &chat_panel(session_id, state),
    )
}

fn status_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "Ready",
        Phase::Submitting => "Thinking",
        Phase::IdleWithError => "Error",
    }
}

fn html_shell(title: &str, session_id: &str, status: &str, content: &str) -> String {
    let session_id = attr(session_id);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="AI-Powered Chatbot">
    <title>{title} - AI-Powered Chatbot</title>
    <link rel="stylesheet" href="/static/app.css">
    <script defer src="/static/app.js"></script>
</head>
<body data-session-id="{session_id}">
    <div id="app-shell" class="app-shell">
        <header class="app-header">
            <h1 class="app-title">AI-Powered Chatbot</h1>
            <span id="chat-status" class="badge">{status}</span>
        </header>
        <main id="app" class="app-main">
            {content}
        </main>
        <footer class="app-footer">
            <p>Press Enter to send.</p>
        </footer>
    </div>
</body>
</html>"#
    )
}
