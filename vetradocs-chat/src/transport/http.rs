//! HTTP transport over `reqwest`.
//!
//! Paths from the configuration (`/search-index.json`, `/api/chat`) are
//! resolved against the site's base URL. An absolute endpoint URL replaces
//! the base entirely, so the chat backend may live on another origin.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use super::{ChatBackend, ChatReply, ChatRequest, IndexSource};
use crate::error::{ChatError, Result};

const USER_AGENT: &str = concat!("vetradocs-chat/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Transport for the site at `base_url`, e.g. `http://localhost:5173`.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| ChatError::InvalidUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for a configured path.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| ChatError::InvalidUrl {
            url: path.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl IndexSource for HttpTransport {
    async fn fetch_index(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let url = self.resolve(path)?;
        debug!("Fetching search index from {}", url);

        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            warn!("Search index request to {} returned {}", url, response.status());
            return Ok(None);
        }
        Ok(Some(response.bytes().await?.to_vec()))
    }
}

#[async_trait]
impl ChatBackend for HttpTransport {
    async fn post_chat(&self, endpoint: &str, request: &ChatRequest) -> Result<ChatReply> {
        let url = self.resolve(endpoint)?;
        debug!(
            "Posting {} messages with {} bytes of context to {}",
            request.messages.len(),
            request.context.len(),
            url
        );

        let response = self.client.post(url).json(request).send().await?;
        let status = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ChatError::from));
        Ok(ChatReply::new(status, Box::pin(body)))
    }
}
