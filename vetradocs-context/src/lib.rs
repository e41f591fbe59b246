//! vetradocs-context: turns markdown documentation into searchable records and
//! turns ranked search results back into a retrieval context for chat.
//!
//! - **[`document`]**: frontmatter splitting, title extraction, URL derivation
//! - **[`prompt`]**: assembly of the context string sent alongside a chat request

pub mod document;
pub mod error;
pub mod prompt;

pub use document::{DocRecord, Frontmatter, clean_content, derive_url, extract_title, is_markdown};
pub use error::{DocumentError, Result};
pub use prompt::{SOURCE_SEPARATOR, SearchResult, build_context};
