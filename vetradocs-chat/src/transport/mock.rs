//! Scripted transports for tests.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::{ChatBackend, ChatReply, ChatRequest, IndexSource};
use crate::error::{ChatError, Result};

/// Serves fixed artifact bytes and counts how often it was asked.
#[derive(Debug, Default)]
pub struct StaticIndexSource {
    bytes: Option<Vec<u8>>,
    fetches: AtomicUsize,
}

impl StaticIndexSource {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Some(bytes),
            fetches: AtomicUsize::new(0),
        }
    }

    /// A source with nothing published.
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IndexSource for StaticIndexSource {
    async fn fetch_index(&self, _path: &str) -> Result<Option<Vec<u8>>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.bytes.clone())
    }
}

/// One scripted response of [`MockBackend`].
pub enum MockReply {
    /// The whole body, already chunked
    Chunks { status: u16, chunks: Vec<Bytes> },
    /// A body fed by the test through a channel
    Channel {
        status: u16,
        receiver: mpsc::Receiver<Result<Bytes>>,
    },
    /// The request itself fails
    Fail(String),
}

impl MockReply {
    pub fn ok<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        MockReply::Chunks {
            status: 200,
            chunks: chunks.into_iter().map(Into::into).collect(),
        }
    }

    pub fn status(status: u16) -> Self {
        MockReply::Chunks {
            status,
            chunks: Vec::new(),
        }
    }

    /// A 200 reply plus the sender that feeds its body.
    pub fn channel() -> (mpsc::Sender<Result<Bytes>>, Self) {
        let (tx, receiver) = mpsc::channel(16);
        (
            tx,
            MockReply::Channel {
                status: 200,
                receiver,
            },
        )
    }
}

/// Records every request and answers with the queued replies in order.
/// With the queue empty it answers 200 with an empty body.
#[derive(Default, Clone)]
pub struct MockBackend {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<(String, ChatRequest)>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, reply: MockReply) -> Self {
        self.push_reply(reply);
        self
    }

    pub fn push_reply(&self, reply: MockReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Every `(endpoint, request)` received so far.
    pub fn requests(&self) -> Vec<(String, ChatRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn post_chat(&self, endpoint: &str, request: &ChatRequest) -> Result<ChatReply> {
        self.requests
            .lock()
            .unwrap()
            .push((endpoint.to_string(), request.clone()));

        let reply = self.replies.lock().unwrap().pop_front();
        match reply.unwrap_or_else(|| MockReply::status(200)) {
            MockReply::Chunks { status, chunks } => Ok(ChatReply::from_chunks(status, chunks)),
            MockReply::Channel { status, receiver } => Ok(ChatReply::new(
                status,
                Box::pin(ReceiverStream::new(receiver)),
            )),
            MockReply::Fail(message) => Err(ChatError::transport(message)),
        }
    }
}
