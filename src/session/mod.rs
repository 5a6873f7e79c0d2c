//! Chat session state and storage.
//!
//! Each page load owns one [`ChatSession`]. The session holds a
//! [`SessionState`] that only changes through the pure
//! [`SessionState::apply`] update, and admits one request to the Chat
//! Endpoint at a time.
//!
//! # Architecture
//!
//! - [`SessionState`]: draft, history, loading flag, error message
//! - [`ChatSession`]: the controller driving submissions
//! - [`SessionStore`]: thread-safe store for all live sessions
//!
//! # Example
//!
//! ```rust
//! use chatbot_ui::session::{SessionEvent, SessionState, Turn};
//!
//! let state = SessionState::new()
//!     .apply(SessionEvent::DraftEdited("hello".into()))
//!     .apply(SessionEvent::SubmitStarted)
//!     .apply(SessionEvent::Succeeded(Turn::new("hello", "hi there")));
//!
//! assert_eq!(state.history().len(), 1);
//! assert!(!state.is_loading());
//! ```

mod state;
mod store;

pub use state::{Phase, SessionEvent, SessionState, Turn};
pub use store::{ChatSession, DEFAULT_SESSION_TIMEOUT, SessionStore};
