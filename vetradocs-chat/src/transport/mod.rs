//! Network seams of the chat front end.
//!
//! A session talks to the outside world through two traits:
//!
//! - [`IndexSource`] fetches the search index artifact
//! - [`ChatBackend`] posts the conversation and hands back a streamed body
//!
//! [`HttpTransport`] implements both over `reqwest`. [`FileIndexSource`]
//! reads the artifact from a local directory, and the [`mock`] module holds
//! scripted implementations for tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::error::Result;
use crate::store::Message;

pub mod file;
pub mod http;
pub mod mock;

pub use file::FileIndexSource;
pub use http::HttpTransport;

/// A response body arriving as raw byte chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Body of a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Full conversation history, including the message being sent
    pub messages: Vec<Message>,
    /// Retrieved documentation, see [`vetradocs_context::build_context`]
    pub context: String,
}

/// Status and streamed body of a chat response.
pub struct ChatReply {
    pub status: u16,
    pub body: ByteStream,
}

impl ChatReply {
    pub fn new(status: u16, body: ByteStream) -> Self {
        Self { status, body }
    }

    /// A reply whose body is the given chunks, in order.
    pub fn from_chunks<I, B>(status: u16, chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        let chunks: Vec<Result<Bytes>> = chunks.into_iter().map(|c| Ok(c.into())).collect();
        Self::new(status, Box::pin(futures::stream::iter(chunks)))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for ChatReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatReply")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Where the search index artifact comes from.
#[async_trait]
pub trait IndexSource: Send + Sync {
    /// Artifact bytes at `path`, or `None` when nothing is published there.
    async fn fetch_index(&self, path: &str) -> Result<Option<Vec<u8>>>;
}

/// The chat endpoint.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Post `request` to `endpoint`. Any status is returned as a reply;
    /// only failures to send at all are errors.
    async fn post_chat(&self, endpoint: &str, request: &ChatRequest) -> Result<ChatReply>;
}

#[async_trait]
impl<T: IndexSource + ?Sized> IndexSource for std::sync::Arc<T> {
    async fn fetch_index(&self, path: &str) -> Result<Option<Vec<u8>>> {
        (**self).fetch_index(path).await
    }
}

#[async_trait]
impl<T: ChatBackend + ?Sized> ChatBackend for std::sync::Arc<T> {
    async fn post_chat(&self, endpoint: &str, request: &ChatRequest) -> Result<ChatReply> {
        (**self).post_chat(endpoint, request).await
    }
}
