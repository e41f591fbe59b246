//! Observable chat session state.
//!
//! The state lives in a `tokio::sync::watch` channel. Any number of
//! subscribers (a panel, a floating input, a terminal printer) observe the
//! same value; every mutation goes through [`SessionStore::update`] and wakes
//! all of them. A subscriber always reads the latest state. Updates made
//! faster than it reads coalesce, so intermediate states may be skipped.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the conversation history, in the shape the chat endpoint expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Where the current exchange is.
///
/// ```text
/// Idle → Retrieving → Sending → Streaming → Idle
///             └──────────┴──────────┴──→ Failed
/// ```
///
/// `Failed` accepts a new message just like `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangePhase {
    #[default]
    Idle,
    Retrieving,
    Sending,
    Streaming,
    Failed,
}

impl ExchangePhase {
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            ExchangePhase::Retrieving | ExchangePhase::Sending | ExchangePhase::Streaming
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    pub is_open: bool,
    pub is_focused: bool,
    /// Text currently typed into the input
    pub input: String,
    pub messages: Vec<Message>,
    /// True while an exchange is in flight
    pub loading: bool,
    /// Message of the last failed exchange, cleared by the next one
    pub error: Option<String>,
    pub phase: ExchangePhase,
}

/// Shared handle to the session state.
#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<ChatState>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ChatState::default());
        Self { tx }
    }

    /// A new subscriber. It sees the current state immediately and is
    /// notified after every later update; rapid updates may coalesce.
    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.tx.subscribe()
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> ChatState {
        self.tx.borrow().clone()
    }

    /// Mutate the state in place and notify every subscriber.
    pub fn update(&self, f: impl FnOnce(&mut ChatState)) {
        self.tx.send_modify(f);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
