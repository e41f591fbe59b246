//! # vetradocs-chat
//!
//! Query-time side of vetradocs: restores the search index published by
//! `vetradocs-build`, retrieves documentation relevant to each question and
//! streams the chat backend's answer into an observable session state.
//!
//! ## Modules
//!
//! - **[`config`]**: plugin options, defaults and TOML loading
//! - **[`session`]**: the exchange state machine
//! - **[`retrieval`]**: lazy index loading and bounded queries
//! - **[`transport`]**: the [`IndexSource`](transport::IndexSource) and
//!   [`ChatBackend`](transport::ChatBackend) seams, with an HTTP implementation
//! - **[`store`]**: multi-subscriber session state
//! - **[`decode`]**: incremental UTF-8 decoding of the response body
//! - **[`keyboard`]**: global shortcut handling
//!
//! ## Quick Start
//!
//! ```no_run
//! use vetradocs_chat::{ChatSession, HttpTransport, VetradocsConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let transport = HttpTransport::new("http://localhost:5173")?;
//! let session = ChatSession::new(VetradocsConfig::default(), transport.clone(), transport);
//!
//! session.load_index().await;
//! session.send_message("How do I change the keyboard shortcut?").await;
//!
//! for message in session.state().messages {
//!     println!("{:?}: {}", message.role, message.content);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod decode;
pub mod error;
pub mod keyboard;
pub mod retrieval;
pub mod session;
pub mod store;
pub mod transport;

pub use config::{PartialConfig, Position, VetradocsConfig, load_config};
pub use error::{ChatError, Result};
pub use keyboard::{KeyAction, KeyEvent};
pub use retrieval::RetrievalClient;
pub use session::{ChatSession, FALLBACK_MESSAGE, RejectReason, SendOutcome};
pub use store::{ChatState, ExchangePhase, Message, Role, SessionStore};
pub use transport::{ChatBackend, FileIndexSource, HttpTransport, IndexSource};
