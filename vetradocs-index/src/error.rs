//! Error types for index building and restoring

use std::path::PathBuf;

/// Result type for index operations.
///
/// Used throughout the crate for operations that can fail.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors that can occur while building, persisting or querying a search index.
///
/// # Error Categories
///
/// - **Setup Errors**: missing documentation root, unwritable output path.
///   These abort a build.
/// - **Artifact Errors**: a persisted index that cannot be decoded or was
///   written by an incompatible engine.
/// - **Query Errors**: failures inside the search engine while answering a query.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The documentation root does not exist
    #[error("Directory not found: {path}")]
    DocsDirNotFound { path: PathBuf },

    /// The documentation root exists but is not a directory
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// A markdown file could not be read
    #[error("Failed to read {path}: {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact could not be written to disk
    #[error("Failed to write index to {path}: {source}")]
    WriteArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be derived from a document
    #[error("Invalid document: {source}")]
    Document {
        #[from]
        source: vetradocs_context::DocumentError,
    },

    /// The artifact is not valid JSON or does not match the snapshot layout
    #[error("Malformed index artifact: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// The artifact was produced by a different engine or engine version
    #[error("Incompatible index artifact: {message}")]
    IncompatibleArtifact { message: String },

    /// The engine failed while answering a query
    #[error("Search failed: {message}")]
    Search { message: String },

    /// IO errors during directory traversal
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl IndexError {
    /// Create an incompatible-artifact error with a custom message.
    pub fn incompatible<S: Into<String>>(message: S) -> Self {
        Self::IncompatibleArtifact {
            message: message.into(),
        }
    }

    /// Create a query error with a custom message.
    pub fn search<S: Into<String>>(message: S) -> Self {
        Self::Search {
            message: message.into(),
        }
    }

    /// Whether this error belongs to the fatal setup category.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::DocsDirNotFound { .. } | Self::NotADirectory { .. } | Self::WriteArtifact { .. }
        )
    }
}
