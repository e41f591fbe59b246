//! Error types for document processing

use std::path::PathBuf;

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Errors raised while turning a markdown file into a [`DocRecord`](crate::DocRecord).
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The document does not live under the documentation root, so no URL can be derived
    #[error("{path} is not inside the documentation root {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    /// The relative path contains components that cannot be expressed as a URL
    #[error("path {path} is not valid UTF-8")]
    NonUtf8Path { path: PathBuf },
}
