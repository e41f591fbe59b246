//! Retrieval context assembly for chat requests.
//!
//! Ranked search results are flattened into one string that the chat backend
//! receives next to the conversation history:
//!
//! ```text
//! Source: Installation
//! Content: Run the installer...
//! ---
//! Source: Configuration
//! Content: Set `enabled`...
//! ```

use serde::{Deserialize, Serialize};

/// Line placed between two sources in the assembled context.
pub const SOURCE_SEPARATOR: &str = "\n---\n";

/// A single ranked hit returned to the chat front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
}

impl SearchResult {
    /// The block this result contributes to the context string.
    pub fn to_source_block(&self) -> String {
        format!("Source: {}\nContent: {}", self.title, self.content)
    }
}

/// Join results into the context string, keeping their rank order.
pub fn build_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(SearchResult::to_source_block)
        .collect::<Vec<_>>()
        .join(SOURCE_SEPARATOR)
}
