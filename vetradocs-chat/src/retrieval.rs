//! Query-time access to the search index.
//!
//! The artifact is fetched and restored once, on first use. Until that has
//! succeeded every query answers with an empty list; a missing or broken
//! artifact is logged and never surfaces as an error.

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};
use vetradocs_context::SearchResult;
use vetradocs_index::engine::{Bm25Index, SearchIndex};

use crate::transport::IndexSource;

pub struct RetrievalClient<S, I = Bm25Index> {
    source: S,
    index_path: String,
    index: RwLock<Option<I>>,
    /// Serializes loads so concurrent callers fetch at most once
    load_lock: Mutex<()>,
}

impl<S: IndexSource> RetrievalClient<S, Bm25Index> {
    pub fn new(source: S, index_path: impl Into<String>) -> Self {
        Self::with_engine(source, index_path)
    }
}

impl<S: IndexSource, I: SearchIndex> RetrievalClient<S, I> {
    /// Client restoring the artifact with engine `I`.
    pub fn with_engine(source: S, index_path: impl Into<String>) -> Self {
        Self {
            source,
            index_path: index_path.into(),
            index: RwLock::new(None),
            load_lock: Mutex::new(()),
        }
    }

    pub fn index_path(&self) -> &str {
        &self.index_path
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn is_loaded(&self) -> bool {
        self.index.read().await.is_some()
    }

    /// Fetch and restore the artifact unless already loaded.
    ///
    /// Returns whether an index is available afterwards. Once a load has
    /// succeeded later calls return immediately; a failed load is retried
    /// on the next call.
    pub async fn load_index(&self) -> bool {
        let _loading = self.load_lock.lock().await;
        if self.is_loaded().await {
            return true;
        }

        let bytes = match self.source.fetch_index(&self.index_path).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                warn!(
                    "Search index not found at {}. Run `vetradocs-build` before serving the site.",
                    self.index_path
                );
                return false;
            }
            Err(e) => {
                error!("Failed to fetch search index: {}", e);
                return false;
            }
        };

        match I::deserialize(&bytes) {
            Ok(index) => {
                info!(
                    "Loaded search index with {} documents from {}",
                    index.len(),
                    self.index_path
                );
                *self.index.write().await = Some(index);
                true
            }
            Err(e) => {
                error!("Failed to load search index: {}", e);
                false
            }
        }
    }

    /// Up to `limit` results for `term`, most relevant first. Empty when the
    /// index is not loaded or the engine fails.
    pub async fn search(&self, term: &str, limit: usize) -> Vec<SearchResult> {
        let guard = self.index.read().await;
        let Some(index) = guard.as_ref() else {
            debug!("Search index not loaded; returning no results");
            return Vec::new();
        };

        match index.search(term, limit) {
            Ok(hits) => hits.into_iter().map(SearchResult::from).collect(),
            Err(e) => {
                error!("Search failed: {}", e);
                Vec::new()
            }
        }
    }
}
