//! Server-side rendering of the chat interface.
//!
//! Every function here is a pure function of a [`SessionState`] snapshot, so
//! the same state always produces the same markup.
//!
//! # Structure
//!
//! - [`page`]: the HTML document shell
//! - [`chat`]: the swappable chat panel (input, loading, error, history)
//!
//! [`SessionState`]: crate::session::SessionState

pub mod chat;
pub mod page;

pub use chat::{CHAT_PANEL_ID, EMPTY_HISTORY_MESSAGE, chat_panel, session_expired_panel};
pub use page::chat_page;

/// Escape text placed between tags.
fn text(raw: &str) -> std::borrow::Cow<'_, str> {
    html_escape::encode_text(raw)
}

/// Escape text placed inside a double-quoted attribute.
fn attr(raw: &str) -> std::borrow::Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(raw)
}
