//! HTTP driver for the Chat Endpoint.

use std::time::Duration;

use anyhow::Context;
use url::Url;

use super::{CHATBOT_PATH, ChatEndpoint, ChatbotRequest, ChatbotResponse};
use crate::config::EndpointConfig;
use crate::error::ChatError;

/// Chat Endpoint reached over HTTP with reqwest.
#[derive(Clone)]
pub struct HttpChatEndpoint {
    http: reqwest::Client,
    url: Url,
}

impl std::fmt::Debug for HttpChatEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpChatEndpoint")
            .field("url", &self.url.as_str())
            .finish()
    }
}

impl HttpChatEndpoint {
    /// Build a client for the endpoint described by `config`.
    ///
    /// No timeout is applied unless `timeout_secs` is set.
    pub fn new(config: &EndpointConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().context("failed to build HTTP client")?;
        Self::with_client(&config.base_url, http)
    }

    /// Build on top of an existing reqwest client.
    pub fn with_client(base_url: &str, http: reqwest::Client) -> anyhow::Result<Self> {
        let url = chatbot_url(base_url)?;
        Ok(Self { http, url })
    }

    /// Full URL requests are posted to.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait::async_trait]
impl ChatEndpoint for HttpChatEndpoint {
    async fn ask(&self, query: &str) -> Result<String, ChatError> {
        let body = ChatbotRequest {
            query: query.to_string(),
        };

        tracing::debug!(url = %self.url, query_length = query.len(), "Sending query");

        let response = self.http.post(self.url.clone()).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        let parsed: ChatbotResponse = serde_json::from_slice(&bytes)?;

        tracing::debug!(
            status = status.as_u16(),
            response_length = parsed.response.len(),
            "Received response"
        );

        Ok(parsed.response)
    }
}

fn chatbot_url(base_url: &str) -> anyhow::Result<Url> {
    let base = base_url.trim();
    if base.is_empty() {
        anyhow::bail!("endpoint base URL cannot be empty");
    }
    let joined = format!("{}{CHATBOT_PATH}", base.trim_end_matches('/'));
    Url::parse(&joined).with_context(|| format!("invalid endpoint base URL: {base_url}"))
}
