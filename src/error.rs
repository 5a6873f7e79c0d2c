//! Error types for chat submissions.

use thiserror::Error;

/// Message shown when the user submits an empty or whitespace-only query.
pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a query.";

/// Message shown for every transport failure.
pub const TRANSPORT_FAILURE_MESSAGE: &str =
    "An error occurred while fetching the response. Please try again.";

/// Message for a submission refused while another one is pending.
pub const BUSY_MESSAGE: &str = "A query is already being processed.";

/// Error returned by a chat submission.
#[derive(Error, Debug)]
pub enum ChatError {
    /// The trimmed query was empty. Never reaches the endpoint.
    #[error("Please enter a query.")]
    EmptyQuery,

    /// A request from the same session is still in flight.
    #[error("A query is already being processed.")]
    InFlight,

    /// The request could not be sent or its body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("chat endpoint returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The endpoint answered with a body that is not `{"response": <string>}`.
    #[error("malformed chat endpoint response: {0}")]
    Payload(#[from] serde_json::Error),

    /// The task running the request panicked or was cancelled.
    #[error("chat request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Coarse classification of a [`ChatError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected locally before any network call.
    Validation,
    /// The round trip to the endpoint failed; retrying may succeed.
    Transport,
    /// Refused because another request is pending.
    Busy,
}

impl ChatError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyQuery => ErrorKind::Validation,
            Self::InFlight => ErrorKind::Busy,
            Self::Http(_) | Self::Status { .. } | Self::Payload(_) | Self::Task(_) => {
                ErrorKind::Transport
            }
        }
    }

    /// Text shown to the user in the error banner.
    ///
    /// Transport failures all collapse to one generic message; the detail only
    /// goes to the logs.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Validation => EMPTY_QUERY_MESSAGE,
            ErrorKind::Transport => TRANSPORT_FAILURE_MESSAGE,
            ErrorKind::Busy => BUSY_MESSAGE,
        }
    }
}
