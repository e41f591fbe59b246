//! Build-time pipeline producing the search artifact.
//!
//! ```text
//! docs/ → collect_markdown_files → DocRecord::from_markdown → SearchIndex::insert
//!                                                                   ↓
//!                                   output file ← write_artifact ← serialize
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use vetradocs_index::indexing::{Indexer, IndexerConfig};
//!
//! # async fn example() -> vetradocs_index::Result<()> {
//! let config = IndexerConfig::default()
//!     .with_docs_dir("./docs")
//!     .with_output_path("./docs/public/search-index.json");
//! let report = Indexer::new(config).build().await?;
//! println!("Indexed {} documents.", report.indexed);
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use vetradocs_context::DocRecord;

use super::scanner::collect_markdown_files;
use crate::engine::{Bm25Index, SearchIndex};
use crate::error::{IndexError, Result};

/// Default documentation root.
pub const DEFAULT_DOCS_DIR: &str = "./docs";

/// Default location of the artifact, inside the site's public directory.
pub const DEFAULT_OUTPUT_PATH: &str = "./docs/public/search-index.json";

/// Configuration for an indexer run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerConfig {
    /// Root directory scanned for markdown files
    pub docs_dir: PathBuf,
    /// File the serialized index is written to
    pub output_path: PathBuf,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from(DEFAULT_DOCS_DIR),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }
}

impl IndexerConfig {
    pub fn new(docs_dir: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            docs_dir: docs_dir.into(),
            output_path: output_path.into(),
        }
    }

    pub fn with_docs_dir(mut self, docs_dir: impl Into<PathBuf>) -> Self {
        self.docs_dir = docs_dir.into();
        self
    }

    pub fn with_output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = output_path.into();
        self
    }

    /// Anchor relative paths at `cwd`. Absolute paths are kept as they are.
    pub fn resolve(&self, cwd: &Path) -> Self {
        Self {
            docs_dir: cwd.join(&self.docs_dir),
            output_path: cwd.join(&self.output_path),
        }
    }
}

/// Outcome of a successful build
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Number of records inserted, one per markdown file
    pub indexed: usize,
    pub output_path: PathBuf,
    pub bytes_written: usize,
    pub elapsed: Duration,
}

/// Walks a documentation tree and writes its search artifact.
///
/// Every [`build`](Self::build) fills a freshly created index, so running it
/// again on the same indexer never duplicates records.
#[derive(Debug)]
pub struct Indexer<I: SearchIndex + Default = Bm25Index> {
    config: IndexerConfig,
    index: I,
}

impl Indexer<Bm25Index> {
    /// Create an indexer building [`Bm25Index`] artifacts.
    pub fn new(config: IndexerConfig) -> Self {
        Self::with_engine(config)
    }
}

impl<I: SearchIndex + Default> Indexer<I> {
    /// Create an indexer building artifacts with engine `I`.
    pub fn with_engine(config: IndexerConfig) -> Self {
        Self {
            config,
            index: I::default(),
        }
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// The index produced by the last build.
    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn into_index(self) -> I {
        self.index
    }

    /// Scan, insert every markdown file into a new index and write the
    /// artifact.
    ///
    /// An empty documentation tree is not an error: a warning is logged and
    /// an empty index is still written.
    ///
    /// # Errors
    /// - Missing documentation root
    /// - Unreadable markdown files
    /// - Serialization or write failures for the artifact
    pub async fn build(&mut self) -> Result<BuildReport> {
        let start_time = Instant::now();
        let root = &self.config.docs_dir;
        info!("Building search index from {}", root.display());

        let files = collect_markdown_files(root).await?;
        if files.is_empty() {
            warn!("No markdown files found in {}", root.display());
        }

        let mut index = I::default();
        let mut indexed = 0;
        for file in &files {
            let bytes = tokio::fs::read(file)
                .await
                .map_err(|source| IndexError::ReadDocument {
                    path: file.clone(),
                    source,
                })?;
            let text = String::from_utf8_lossy(&bytes);
            let record = DocRecord::from_markdown(root, file, &text)?;
            debug!("Indexing {} as {}", file.display(), record.url);

            index.insert(record)?;
            indexed += 1;
        }

        let artifact = index.serialize()?;
        write_artifact(&self.config.output_path, &artifact).await?;
        self.index = index;

        let report = BuildReport {
            indexed,
            output_path: self.config.output_path.clone(),
            bytes_written: artifact.len(),
            elapsed: start_time.elapsed(),
        };
        info!(
            "Indexed {} documents into {} ({} bytes in {:?})",
            report.indexed,
            report.output_path.display(),
            report.bytes_written,
            report.elapsed
        );
        Ok(report)
    }
}

/// Write `bytes` to `path`, creating missing parent directories and
/// replacing any existing file.
pub async fn write_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    let write_error = |source| IndexError::WriteArtifact {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
    }
    tokio::fs::write(path, bytes).await.map_err(write_error)
}

/// Read an artifact from disk and restore it.
pub async fn read_artifact<I: SearchIndex>(path: &Path) -> Result<I> {
    let bytes = tokio::fs::read(path).await?;
    I::deserialize(&bytes)
}
