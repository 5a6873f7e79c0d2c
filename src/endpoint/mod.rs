//! Chat Endpoint client.
//!
//! The Chat Endpoint is the external service that turns a query into a
//! response. This module defines the [`ChatEndpoint`] seam the session talks
//! to and the HTTP implementation used in production.
//!
//! # Wire format
//!
//! ```text
//! POST {base_url}/chatbot
//! {"query": "hello"}
//!
//! 200 OK
//! {"response": "hi there"}
//! ```
//!
//! Anything other than a 2xx status carrying a string `response` field is a
//! failure.

pub mod http;

pub use http::HttpChatEndpoint;

use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Path of the chat route, relative to the endpoint base URL.
pub const CHATBOT_PATH: &str = "/chatbot";

/// Request body sent to the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatbotRequest {
    /// The user's query, unmodified.
    pub query: String,
}

/// Success body returned by the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatbotResponse {
    /// The bot's reply.
    pub response: String,
}

/// Something that answers queries.
///
/// Implementations perform exactly one attempt per call; retrying is left to
/// the user.
#[async_trait::async_trait]
pub trait ChatEndpoint: Send + Sync + std::fmt::Debug {
    /// Send `query` and return the endpoint's reply.
    async fn ask(&self, query: &str) -> Result<String, ChatError>;
}
