//! Error types for the chat front end

use std::path::PathBuf;
use std::time::Duration;

/// Result type for chat operations.
pub type Result<T> = std::result::Result<T, ChatError>;

/// Errors that can occur while configuring a session or running an exchange.
///
/// None of these reach the person chatting: an exchange that fails is
/// reported through the session state and a fallback assistant message.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The chat endpoint answered with a non-2xx status
    #[error("API error: {status}")]
    Status { status: u16 },

    /// The request could not be sent or the response body broke off
    #[error("HTTP error: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    /// A base URL or endpoint that does not form a valid URL
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// The exchange did not finish within the configured timeout
    #[error("Request timed out after {}s", .after.as_secs())]
    Timeout { after: Duration },

    /// The exchange was cancelled by the caller
    #[error("Request cancelled")]
    Cancelled,

    /// A configuration value failed validation
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// The configuration file could not be read
    #[error("Failed to read config {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for the option set
    #[error("Failed to parse config: {source}")]
    ConfigParse {
        #[from]
        source: toml::de::Error,
    },

    /// A scripted transport failure, used by the mock backend
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// IO errors while reading a local index artifact
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl ChatError {
    /// Create a configuration error with a custom message.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a transport error with a custom message.
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}
