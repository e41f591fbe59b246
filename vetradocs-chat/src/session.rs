//! One chat session: the exchange state machine plus panel state.
//!
//! An exchange runs through
//!
//! ```text
//! append user message → retrieve context → POST → stream assistant reply
//! ```
//!
//! At most one exchange is in flight per session. A second submission while
//! one runs is rejected without touching the history. Any failure appends a
//! single fallback assistant message and records the error; the loading flag
//! is cleared on every path out of an exchange.

use futures::StreamExt;
use std::sync::Mutex as StdMutex;
use tokio::sync::{Mutex, MutexGuard, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use vetradocs_context::{SearchResult, build_context};
use vetradocs_index::engine::{Bm25Index, SearchIndex};

use crate::config::VetradocsConfig;
use crate::decode::Utf8StreamDecoder;
use crate::error::ChatError;
use crate::keyboard::{KeyAction, KeyEvent, resolve_key};
use crate::retrieval::RetrievalClient;
use crate::store::{ChatState, ExchangePhase, Message, Role, SessionStore};
use crate::transport::{ChatBackend, ChatRequest, IndexSource};

/// Assistant message shown when an exchange fails.
pub const FALLBACK_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The message was blank
    Empty,
    /// Another exchange is in flight
    Busy,
    /// The plugin is disabled in the configuration
    Disabled,
}

/// How a call to [`ChatSession::send_message`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The reply was streamed completely
    Completed,
    /// Nothing was sent
    Rejected(RejectReason),
    /// The exchange failed; the fallback message was appended
    Failed(String),
}

/// Held for the duration of an exchange. Dropping it clears the loading
/// flag, whichever way the exchange ended.
struct ExchangeGuard<'a> {
    _lock: MutexGuard<'a, ()>,
    store: &'a SessionStore,
}

impl Drop for ExchangeGuard<'_> {
    fn drop(&mut self) {
        self.store.update(|s| {
            s.loading = false;
            if s.phase.is_busy() {
                s.phase = ExchangePhase::Idle;
            }
        });
    }
}

pub struct ChatSession<S, B, I = Bm25Index> {
    config: VetradocsConfig,
    store: SessionStore,
    retrieval: RetrievalClient<S, I>,
    backend: B,
    exchange_lock: Mutex<()>,
    cancel_token: StdMutex<CancellationToken>,
}

impl<S: IndexSource, B: ChatBackend> ChatSession<S, B, Bm25Index> {
    pub fn new(config: VetradocsConfig, source: S, backend: B) -> Self {
        Self::with_engine(config, source, backend)
    }
}

impl<S: IndexSource, B: ChatBackend, I: SearchIndex> ChatSession<S, B, I> {
    /// Session restoring the index with engine `I`.
    pub fn with_engine(config: VetradocsConfig, source: S, backend: B) -> Self {
        let retrieval = RetrievalClient::with_engine(source, config.index_path.clone());
        Self {
            config,
            store: SessionStore::new(),
            retrieval,
            backend,
            exchange_lock: Mutex::new(()),
            cancel_token: StdMutex::new(CancellationToken::new()),
        }
    }

    pub fn config(&self) -> &VetradocsConfig {
        &self.config
    }

    pub fn retrieval(&self) -> &RetrievalClient<S, I> {
        &self.retrieval
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.store.subscribe()
    }

    pub fn state(&self) -> ChatState {
        self.store.snapshot()
    }

    pub fn is_busy(&self) -> bool {
        self.exchange_lock.try_lock().is_err()
    }

    /// Load the search index. See [`RetrievalClient::load_index`].
    pub async fn load_index(&self) -> bool {
        self.retrieval.load_index().await
    }

    /// Search the documentation directly, outside of an exchange.
    pub async fn search_docs(&self, term: &str, limit: usize) -> Vec<SearchResult> {
        self.retrieval.search(term, limit).await
    }

    pub fn open_chat(&self) {
        self.store.update(|s| s.is_open = true);
    }

    pub fn close_chat(&self) {
        self.store.update(|s| s.is_open = false);
    }

    pub fn toggle_chat(&self) {
        self.store.update(|s| s.is_open = !s.is_open);
    }

    pub fn set_focused(&self, focused: bool) {
        self.store.update(|s| s.is_focused = focused);
    }

    pub fn set_input(&self, input: impl Into<String>) {
        let input = input.into();
        self.store.update(|s| s.input = input);
    }

    /// Drop the history and any recorded error.
    pub fn clear_chat(&self) {
        self.store.update(|s| {
            s.messages.clear();
            s.error = None;
        });
    }

    /// Apply the global shortcuts to a key press.
    pub fn handle_key(&self, event: &KeyEvent) -> KeyAction {
        if !self.config.enabled {
            return KeyAction::Ignore;
        }
        let action = resolve_key(event, &self.config.shortcut, self.store.snapshot().is_open);
        match action {
            KeyAction::Toggle => self.toggle_chat(),
            KeyAction::Close => self.close_chat(),
            KeyAction::Ignore => {}
        }
        action
    }

    /// Abort the exchange in flight, if any. It ends as a failure.
    pub fn cancel(&self) {
        self.current_token().cancel();
    }

    /// Send the current input.
    pub async fn submit_input(&self) -> SendOutcome {
        let input = self.store.snapshot().input;
        self.send_message(input).await
    }

    /// Run one exchange for `text`.
    pub async fn send_message(&self, text: impl Into<String>) -> SendOutcome {
        let text = text.into();
        if !self.config.enabled {
            return SendOutcome::Rejected(RejectReason::Disabled);
        }
        if text.trim().is_empty() {
            return SendOutcome::Rejected(RejectReason::Empty);
        }
        let Ok(lock) = self.exchange_lock.try_lock() else {
            debug!("Exchange in flight; rejecting message");
            return SendOutcome::Rejected(RejectReason::Busy);
        };
        let _guard = ExchangeGuard {
            _lock: lock,
            store: &self.store,
        };
        let token = self.fresh_token();

        self.store.update(|s| {
            s.messages.push(Message::user(text.clone()));
            s.input.clear();
            s.loading = true;
            s.error = None;
            s.phase = ExchangePhase::Retrieving;
        });

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(ChatError::Cancelled),
            result = self.run_exchange(&text) => result,
        };

        match result {
            Ok(()) => {
                self.store.update(|s| s.phase = ExchangePhase::Idle);
                SendOutcome::Completed
            }
            Err(e) => {
                error!("Chat error: {}", e);
                let message = e.to_string();
                self.store.update(|s| {
                    s.error = Some(message.clone());
                    s.messages.push(Message::assistant(FALLBACK_MESSAGE));
                    s.phase = ExchangePhase::Failed;
                });
                SendOutcome::Failed(message)
            }
        }
    }

    /// Await `fut`, failing if it stays pending longer than the configured
    /// timeout. Each wait gets the full timeout on its own.
    async fn bounded<F: Future>(&self, fut: F) -> Result<F::Output, ChatError> {
        match self.config.request_timeout() {
            Some(after) => tokio::time::timeout(after, fut)
                .await
                .map_err(|_| ChatError::Timeout { after }),
            None => Ok(fut.await),
        }
    }

    async fn run_exchange(&self, text: &str) -> Result<(), ChatError> {
        let results = self
            .bounded(async {
                if !self.retrieval.is_loaded().await {
                    self.retrieval.load_index().await;
                }
                self.retrieval.search(text, self.config.context_limit).await
            })
            .await?;
        debug!("Retrieved {} sources for the message", results.len());

        let request = ChatRequest {
            messages: self.store.snapshot().messages,
            context: build_context(&results),
        };
        self.store.update(|s| s.phase = ExchangePhase::Sending);

        let mut reply = self
            .bounded(self.backend.post_chat(&self.config.api_endpoint, &request))
            .await??;
        if !reply.is_success() {
            return Err(ChatError::Status {
                status: reply.status,
            });
        }

        let mut slot = 0;
        self.store.update(|s| {
            s.messages.push(Message::assistant(""));
            slot = s.messages.len() - 1;
            s.phase = ExchangePhase::Streaming;
        });

        let mut decoder = Utf8StreamDecoder::new();
        let mut content = String::new();
        while let Some(chunk) = self.bounded(reply.body.next()).await? {
            content.push_str(&decoder.decode(&chunk?));
            self.publish_reply(slot, &content);
        }
        let tail = decoder.finish();
        if !tail.is_empty() {
            content.push_str(&tail);
            self.publish_reply(slot, &content);
        }

        info!("Streamed reply of {} bytes", content.len());
        Ok(())
    }

    /// Replace the streamed assistant message with the text so far. A
    /// history cleared mid-stream is left alone.
    fn publish_reply(&self, slot: usize, content: &str) {
        self.store.update(|s| {
            if let Some(message) = s
                .messages
                .get_mut(slot)
                .filter(|m| m.role == Role::Assistant)
            {
                message.content.clear();
                message.content.push_str(content);
            }
        });
    }

    fn fresh_token(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self
            .cancel_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = token.clone();
        token
    }

    fn current_token(&self) -> CancellationToken {
        self.cancel_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{MockBackend, MockReply, StaticIndexSource};
    use bytes::Bytes;
    use std::sync::Arc;
    use std::time::Duration;
    use tracing_test::traced_test;
    use vetradocs_context::DocRecord;
    use vetradocs_index::engine::MockIndex;

    type TestSession = ChatSession<StaticIndexSource, MockBackend, MockIndex>;

    fn docs_artifact() -> Vec<u8> {
        let mut index = MockIndex::new();
        for (title, url, content) in [
            ("Install", "/install", "Install the chat plugin."),
            ("Configure", "/configure", "Configure the chat endpoint."),
            ("Theming", "/theming", "Pick an accent colour."),
        ] {
            index
                .insert(DocRecord {
                    title: title.to_string(),
                    url: url.to_string(),
                    content: content.to_string(),
                })
                .unwrap();
        }
        index.serialize().unwrap()
    }

    fn session(backend: MockBackend) -> TestSession {
        ChatSession::with_engine(
            VetradocsConfig::default(),
            StaticIndexSource::new(docs_artifact()),
            backend,
        )
    }

    #[tokio::test]
    async fn test_successful_exchange() {
        let backend = MockBackend::new().with_reply(MockReply::ok(["Run ", "the installer."]));
        let session = session(backend.clone());

        let outcome = session.send_message("install").await;
        assert_eq!(outcome, SendOutcome::Completed);

        let state = session.state();
        assert_eq!(
            state.messages,
            vec![
                Message::user("install"),
                Message::assistant("Run the installer.")
            ]
        );
        assert!(!state.loading);
        assert_eq!(state.error, None);
        assert_eq!(state.phase, ExchangePhase::Idle);
    }

    #[tokio::test]
    async fn test_request_carries_history_and_ranked_context() {
        let backend = MockBackend::new()
            .with_reply(MockReply::ok(["first"]))
            .with_reply(MockReply::ok(["second"]));
        let session = session(backend.clone());

        session.send_message("hello").await;
        session.send_message("chat").await;

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        let (endpoint, request) = &requests[1];
        assert_eq!(endpoint, "/api/chat");
        assert_eq!(
            request.messages,
            vec![
                Message::user("hello"),
                Message::assistant("first"),
                Message::user("chat"),
            ]
        );
        assert_eq!(
            request.context,
            "Source: Install\nContent: Install the chat plugin.\n---\nSource: Configure\nContent: Configure the chat endpoint."
        );
    }

    #[tokio::test]
    async fn test_context_is_empty_without_matches() {
        let backend = MockBackend::new();
        let session = session(backend.clone());

        session.send_message("kubernetes").await;
        assert_eq!(backend.requests()[0].1.context, "");
    }

    #[tokio::test]
    async fn test_context_limit_bounds_sources() {
        let backend = MockBackend::new();
        let session: TestSession = ChatSession::with_engine(
            VetradocsConfig::default().with_context_limit(1),
            StaticIndexSource::new(docs_artifact()),
            backend.clone(),
        );

        session.send_message("chat").await;
        assert_eq!(
            backend.requests()[0].1.context,
            "Source: Install\nContent: Install the chat plugin."
        );
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected() {
        let backend = MockBackend::new();
        let session = session(backend.clone());

        assert_eq!(
            session.send_message("   \n").await,
            SendOutcome::Rejected(RejectReason::Empty)
        );
        assert!(backend.requests().is_empty());
        assert!(session.state().messages.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_session_rejects_messages_and_keys() {
        let session: TestSession = ChatSession::with_engine(
            VetradocsConfig {
                enabled: false,
                ..VetradocsConfig::default()
            },
            StaticIndexSource::missing(),
            MockBackend::new(),
        );
        assert_eq!(
            session.send_message("hi").await,
            SendOutcome::Rejected(RejectReason::Disabled)
        );
        let action = session.handle_key(&KeyEvent::new("i").with_ctrl());
        assert_eq!(action, KeyAction::Ignore);
        assert!(!session.state().is_open);
    }

    #[tokio::test]
    async fn test_second_message_while_busy_is_rejected() {
        let (tx, reply) = MockReply::channel();
        let backend = MockBackend::new().with_reply(reply);
        let session = Arc::new(session(backend.clone()));
        let mut rx = session.subscribe();

        let first = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.send_message("install").await }
        });
        rx.wait_for(|s| s.phase == ExchangePhase::Streaming)
            .await
            .unwrap();
        assert!(session.is_busy());

        let history = session.state().messages.clone();
        assert_eq!(
            session.send_message("another").await,
            SendOutcome::Rejected(RejectReason::Busy)
        );
        assert_eq!(session.state().messages, history);
        assert_eq!(backend.requests().len(), 1);

        tx.send(Ok(Bytes::from("done"))).await.unwrap();
        drop(tx);
        assert_eq!(first.await.unwrap(), SendOutcome::Completed);
        assert!(!session.is_busy());
        assert_eq!(
            session.state().messages.last(),
            Some(&Message::assistant("done"))
        );
    }

    #[tokio::test]
    async fn test_multibyte_characters_split_across_chunks() {
        let text = "café 😀";
        let bytes = text.as_bytes();
        let backend = MockBackend::new().with_reply(MockReply::ok([
            Bytes::copy_from_slice(&bytes[..4]),
            Bytes::copy_from_slice(&bytes[4..7]),
            Bytes::copy_from_slice(&bytes[7..]),
        ]));
        let session = session(backend);

        session.send_message("unicode").await;
        assert_eq!(
            session.state().messages.last().unwrap().content,
            "café 😀"
        );
    }

    #[tokio::test]
    async fn test_reply_grows_while_streaming() {
        let (tx, reply) = MockReply::channel();
        let session = Arc::new(session(MockBackend::new().with_reply(reply)));
        let mut rx = session.subscribe();

        let exchange = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.send_message("install").await }
        });

        tx.send(Ok(Bytes::from("Hello"))).await.unwrap();
        rx.wait_for(|s| s.messages.last().is_some_and(|m| m.content == "Hello"))
            .await
            .unwrap();
        assert!(session.state().loading);

        tx.send(Ok(Bytes::from(", world"))).await.unwrap();
        drop(tx);
        exchange.await.unwrap();
        assert_eq!(
            session.state().messages.last().unwrap().content,
            "Hello, world"
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn test_error_status_appends_one_fallback() {
        let backend = MockBackend::new().with_reply(MockReply::status(500));
        let session = session(backend);

        let outcome = session.send_message("install").await;
        assert_eq!(outcome, SendOutcome::Failed("API error: 500".to_string()));

        let state = session.state();
        assert_eq!(
            state.messages,
            vec![Message::user("install"), Message::assistant(FALLBACK_MESSAGE)]
        );
        assert_eq!(state.error.as_deref(), Some("API error: 500"));
        assert!(!state.loading);
        assert_eq!(state.phase, ExchangePhase::Failed);
        assert!(logs_contain("Chat error: API error: 500"));
    }

    #[tokio::test]
    async fn test_transport_failure_appends_fallback() {
        let backend = MockBackend::new().with_reply(MockReply::Fail("connection refused".into()));
        let session = session(backend);

        let outcome = session.send_message("install").await;
        assert!(matches!(outcome, SendOutcome::Failed(_)));
        let fallbacks = session
            .state()
            .messages
            .iter()
            .filter(|m| m.content == FALLBACK_MESSAGE)
            .count();
        assert_eq!(fallbacks, 1);
    }

    #[tokio::test]
    async fn test_body_error_mid_stream_keeps_partial_reply() {
        let (tx, reply) = MockReply::channel();
        let session = session(MockBackend::new().with_reply(reply));

        tx.send(Ok(Bytes::from("Partial"))).await.unwrap();
        tx.send(Err(ChatError::transport("reset by peer")))
            .await
            .unwrap();
        drop(tx);

        let outcome = session.send_message("install").await;
        assert!(matches!(outcome, SendOutcome::Failed(_)));

        let messages = session.state().messages;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], Message::assistant("Partial"));
        assert_eq!(messages[2], Message::assistant(FALLBACK_MESSAGE));
    }

    #[tokio::test]
    async fn test_error_is_cleared_by_next_exchange() {
        let backend = MockBackend::new()
            .with_reply(MockReply::status(502))
            .with_reply(MockReply::ok(["ok"]));
        let session = session(backend);

        session.send_message("first").await;
        assert!(session.state().error.is_some());

        assert_eq!(session.send_message("second").await, SendOutcome::Completed);
        let state = session.state();
        assert_eq!(state.error, None);
        assert_eq!(state.phase, ExchangePhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_stream_times_out() {
        let (_tx, reply) = MockReply::channel();
        let session: TestSession = ChatSession::with_engine(
            VetradocsConfig::default().with_request_timeout_secs(5),
            StaticIndexSource::new(docs_artifact()),
            MockBackend::new().with_reply(reply),
        );

        let outcome = session.send_message("install").await;
        assert_eq!(
            outcome,
            SendOutcome::Failed("Request timed out after 5s".to_string())
        );
        assert!(!session.state().loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_stream_within_per_chunk_timeout_completes() {
        let (tx, reply) = MockReply::channel();
        let session: TestSession = ChatSession::with_engine(
            VetradocsConfig::default().with_request_timeout_secs(5),
            StaticIndexSource::new(docs_artifact()),
            MockBackend::new().with_reply(reply),
        );

        tokio::spawn(async move {
            for word in ["one ", "two ", "three"] {
                tokio::time::sleep(Duration::from_secs(3)).await;
                if tx.send(Ok(Bytes::from(word))).await.is_err() {
                    break;
                }
            }
        });

        let started = tokio::time::Instant::now();
        let outcome = session.send_message("install").await;
        assert_eq!(outcome, SendOutcome::Completed);
        assert!(started.elapsed() >= Duration::from_secs(9));
        assert_eq!(
            session.state().messages.last(),
            Some(&Message::assistant("one two three"))
        );
    }

    #[tokio::test]
    async fn test_cancel_ends_exchange() {
        let (_tx, reply) = MockReply::channel();
        let session = Arc::new(session(MockBackend::new().with_reply(reply)));
        let mut rx = session.subscribe();

        let exchange = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.send_message("install").await }
        });
        rx.wait_for(|s| s.phase == ExchangePhase::Streaming)
            .await
            .unwrap();

        session.cancel();
        let outcome = tokio::time::timeout(Duration::from_secs(5), exchange)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome, SendOutcome::Failed("Request cancelled".to_string()));
        assert!(!session.state().loading);
    }

    #[tokio::test]
    async fn test_cancel_without_exchange_does_not_poison_next() {
        let session = session(MockBackend::new().with_reply(MockReply::ok(["fine"])));
        session.cancel();
        assert_eq!(session.send_message("install").await, SendOutcome::Completed);
    }

    #[tokio::test]
    async fn test_index_is_loaded_once_across_exchanges() {
        let session = session(MockBackend::new());
        session.send_message("one").await;
        session.send_message("two").await;
        assert_eq!(session.retrieval().source().fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_index_still_chats() {
        let backend = MockBackend::new().with_reply(MockReply::ok(["no docs"]));
        let session: TestSession = ChatSession::with_engine(
            VetradocsConfig::default(),
            StaticIndexSource::missing(),
            backend.clone(),
        );

        assert_eq!(session.send_message("hi").await, SendOutcome::Completed);
        assert_eq!(backend.requests()[0].1.context, "");
    }

    #[tokio::test]
    async fn test_submit_input_clears_it() {
        let session = session(MockBackend::new());
        session.set_input("install");
        assert_eq!(session.submit_input().await, SendOutcome::Completed);
        let state = session.state();
        assert_eq!(state.input, "");
        assert_eq!(state.messages[0], Message::user("install"));
    }

    #[tokio::test]
    async fn test_clear_chat() {
        let session = session(MockBackend::new().with_reply(MockReply::status(500)));
        session.send_message("install").await;

        session.clear_chat();
        let state = session.state();
        assert!(state.messages.is_empty());
        assert_eq!(state.error, None);
    }

    #[test]
    fn test_panel_state_and_shortcuts() {
        let session = session(MockBackend::new());

        assert_eq!(
            session.handle_key(&KeyEvent::new("i").with_ctrl()),
            KeyAction::Toggle
        );
        assert!(session.state().is_open);

        assert_eq!(session.handle_key(&KeyEvent::new("Escape")), KeyAction::Close);
        assert!(!session.state().is_open);
        assert_eq!(session.handle_key(&KeyEvent::new("Escape")), KeyAction::Ignore);

        session.open_chat();
        session.toggle_chat();
        assert!(!session.state().is_open);

        session.set_focused(true);
        assert!(session.state().is_focused);
    }
}
