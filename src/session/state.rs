//! Session state and its pure update function.

use serde::Serialize;

/// One completed query/response exchange.
///
/// Turns are only created after a successful round trip and are never
/// changed afterwards, so the fields are read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    query: String,
    response: String,
}

impl Turn {
    /// Create a turn from the submitted query and the endpoint's reply.
    #[must_use]
    pub fn new(query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
        }
    }

    /// The query exactly as it was submitted.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The endpoint's reply.
    #[must_use]
    pub fn response(&self) -> &str {
        &self.response
    }
}

/// Inputs to [`SessionState::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The text in the input field changed.
    DraftEdited(String),
    /// A submission was refused locally with the given message.
    Rejected(String),
    /// A request to the endpoint was sent.
    SubmitStarted,
    /// The in-flight request produced a turn.
    Succeeded(Turn),
    /// The in-flight request failed with the given message.
    Failed(String),
}

/// Where the session sits in the per-submission state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Ready for input.
    Idle,
    /// A request is in flight.
    Submitting,
    /// Ready for input; the last submission failed.
    IdleWithError,
}

/// Everything the rendering layer needs to draw one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    draft_query: String,
    history: Vec<Turn>,
    is_loading: bool,
    error_message: Option<String>,
}

impl SessionState {
    /// Fresh, idle state with an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the state.
    ///
    /// History is append-only: only [`SessionEvent::Succeeded`] touches it,
    /// and only by pushing to the end.
    #[must_use]
    pub fn apply(mut self, event: SessionEvent) -> Self {
        match event {
            SessionEvent::DraftEdited(text) => {
                self.draft_query = text;
            }
            SessionEvent::Rejected(message) => {
                self.error_message = Some(message);
            }
            SessionEvent::SubmitStarted => {
                self.is_loading = true;
                self.error_message = None;
            }
            SessionEvent::Succeeded(turn) => {
                self.history.push(turn);
                self.draft_query.clear();
                self.error_message = None;
                self.is_loading = false;
            }
            SessionEvent::Failed(message) => {
                self.error_message = Some(message);
                self.is_loading = false;
            }
        }
        self
    }

    /// Current contents of the input field.
    #[must_use]
    pub fn draft_query(&self) -> &str {
        &self.draft_query
    }

    /// Completed turns in submission order.
    #[must_use]
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Whether a request is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Message of the last failed submission, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Whether the submit control should be enabled.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.is_loading && !self.draft_query.trim().is_empty()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.is_loading {
            Phase::Submitting
        } else if self.error_message.is_some() {
            Phase::IdleWithError
        } else {
            Phase::Idle
        }
    }
}
