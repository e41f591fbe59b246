//! Plugin configuration
//!
//! Every option has a default; a partial set supplied by the host (or read
//! from a TOML file) is laid over those defaults. Keys use the same
//! camelCase names the documentation site's config file uses:
//!
//! ```toml
//! indexPath = "/search-index.json"
//! apiEndpoint = "/api/chat"
//! title = "Docs Assistant"
//! position = "bottom-right"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{ChatError, Result};

pub const DEFAULT_INDEX_PATH: &str = "/search-index.json";
pub const DEFAULT_API_ENDPOINT: &str = "/api/chat";
pub const DEFAULT_PLACEHOLDER: &str = "Ask a question...";
pub const DEFAULT_TITLE: &str = "AI Assistant";
pub const DEFAULT_SHORTCUT: &str = "i";
pub const DEFAULT_ACCENT_COLOR: &str = "#f97316";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONTEXT_LIMIT: usize = 3;

/// Where the chat surface is anchored on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    #[default]
    BottomCenter,
    BottomRight,
    BottomLeft,
}

/// Fully resolved configuration. Every field holds a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VetradocsConfig {
    /// Path of the index artifact, relative to the site origin
    pub index_path: String,
    /// Path (or absolute URL) of the chat endpoint
    pub api_endpoint: String,
    pub placeholder: String,
    pub title: String,
    /// Key that toggles the chat together with Ctrl or Meta
    pub shortcut: String,
    pub accent_color: String,
    pub position: Position,
    pub enabled: bool,
    /// Upper bound on each wait within an exchange (index load, response
    /// headers, every body chunk); 0 disables the timeout
    pub request_timeout_secs: u64,
    /// Number of search results sent as context
    pub context_limit: usize,
}

impl Default for VetradocsConfig {
    fn default() -> Self {
        Self {
            index_path: DEFAULT_INDEX_PATH.to_string(),
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            title: DEFAULT_TITLE.to_string(),
            shortcut: DEFAULT_SHORTCUT.to_string(),
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
            position: Position::default(),
            enabled: true,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            context_limit: DEFAULT_CONTEXT_LIMIT,
        }
    }
}

/// Options as supplied by the host; absent keys keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialConfig {
    pub index_path: Option<String>,
    pub api_endpoint: Option<String>,
    pub placeholder: Option<String>,
    pub title: Option<String>,
    pub shortcut: Option<String>,
    pub accent_color: Option<String>,
    pub position: Option<Position>,
    pub enabled: Option<bool>,
    pub request_timeout_secs: Option<u64>,
    pub context_limit: Option<usize>,
}

impl VetradocsConfig {
    /// Defaults overlaid with every option present in `partial`.
    pub fn merged(partial: PartialConfig) -> Self {
        Self::default().merge(partial)
    }

    /// Overlay `partial` onto this configuration.
    pub fn merge(mut self, partial: PartialConfig) -> Self {
        if let Some(v) = partial.index_path {
            self.index_path = v;
        }
        if let Some(v) = partial.api_endpoint {
            self.api_endpoint = v;
        }
        if let Some(v) = partial.placeholder {
            self.placeholder = v;
        }
        if let Some(v) = partial.title {
            self.title = v;
        }
        if let Some(v) = partial.shortcut {
            self.shortcut = v;
        }
        if let Some(v) = partial.accent_color {
            self.accent_color = v;
        }
        if let Some(v) = partial.position {
            self.position = v;
        }
        if let Some(v) = partial.enabled {
            self.enabled = v;
        }
        if let Some(v) = partial.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = partial.context_limit {
            self.context_limit = v;
        }
        self
    }

    pub fn with_index_path(mut self, path: impl Into<String>) -> Self {
        self.index_path = path.into();
        self
    }

    pub fn with_api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = endpoint.into();
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn with_context_limit(mut self, limit: usize) -> Self {
        self.context_limit = limit;
        self
    }

    /// The per-wait timeout, or `None` when disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Reject values the session cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.index_path.trim().is_empty() {
            return Err(ChatError::config("indexPath must not be empty"));
        }
        if self.api_endpoint.trim().is_empty() {
            return Err(ChatError::config("apiEndpoint must not be empty"));
        }
        if self.shortcut.chars().count() != 1 {
            return Err(ChatError::config(format!(
                "shortcut must be a single key, got {:?}",
                self.shortcut
            )));
        }
        if self.accent_color.trim().is_empty() {
            return Err(ChatError::config("accentColor must not be empty"));
        }
        if self.context_limit == 0 {
            return Err(ChatError::config("contextLimit must be at least 1"));
        }
        Ok(())
    }
}

/// Read a TOML config file and merge it over the defaults.
pub fn load_config(path: &Path) -> Result<VetradocsConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| ChatError::ConfigFile {
        path: path.to_path_buf(),
        source,
    })?;
    let config = VetradocsConfig::merged(toml::from_str(&text)?);
    config.validate()?;
    Ok(config)
}
