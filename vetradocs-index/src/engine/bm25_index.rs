//! BM25 keyword index over documentation records.
//!
//! This module wraps the [`bm25`](https://crates.io/crates/bm25) crate. Each
//! record is indexed as the concatenation of its `title`, `url` and `content`
//! fields so that a term found in any of them produces a hit.
//!
//! # Artifact
//!
//! The bm25 structure is not serializable, so the artifact stores the corpus
//! together with engine metadata and the structure is rebuilt on restore:
//!
//! ```json
//! {
//!   "engine": "bm25",
//!   "version": 1,
//!   "language": "english",
//!   "schema": { "title": "string", "url": "string", "content": "string" },
//!   "documents": [ { "title": "...", "url": "...", "content": "..." } ]
//! }
//! ```
//!
//! Restoring an artifact with another `engine` or `version` fails: the writer
//! and the reader must agree on the format.

use bm25::{Document, Language, SearchEngine, SearchEngineBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, instrument};
use vetradocs_context::DocRecord;

use super::{IndexSchema, SearchHit, SearchIndex};
use crate::error::{IndexError, Result};

/// Engine name written into every artifact.
pub const ENGINE_NAME: &str = "bm25";

/// Artifact layout version. Bump when the snapshot format changes.
pub const FORMAT_VERSION: u32 = 1;

const LANGUAGE: &str = "english";

#[derive(Serialize, Deserialize)]
struct Snapshot {
    engine: String,
    version: u32,
    language: String,
    schema: IndexSchema,
    documents: Vec<DocRecord>,
}

/// Keyword index ranking documents with BM25.
///
/// Inserts are buffered; the bm25 structure is (re)built on the first search
/// after the corpus changed, so average document length statistics always
/// cover the whole corpus.
#[derive(Default)]
pub struct Bm25Index {
    documents: Vec<DocRecord>,
    engine: OnceLock<SearchEngine<u32>>,
}

impl Bm25Index {
    /// Creates a new empty index with the fixed three-field schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// The records in insertion order.
    pub fn documents(&self) -> &[DocRecord] {
        &self.documents
    }

    fn engine(&self) -> &SearchEngine<u32> {
        self.engine.get_or_init(|| {
            debug!("Building BM25 structure over {} documents", self.documents.len());
            let docs: Vec<Document<u32>> = self
                .documents
                .iter()
                .enumerate()
                .map(|(id, record)| Document {
                    id: id as u32,
                    contents: record.searchable_text(),
                })
                .collect();
            SearchEngineBuilder::<u32>::with_documents(Language::English, docs).build()
        })
    }
}

impl fmt::Debug for Bm25Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bm25Index")
            .field("documents", &self.documents.len())
            .field("built", &self.engine.get().is_some())
            .finish()
    }
}

impl SearchIndex for Bm25Index {
    fn insert(&mut self, record: DocRecord) -> Result<()> {
        if self.documents.len() >= u32::MAX as usize {
            return Err(IndexError::search("index is full"));
        }
        self.documents.push(record);
        self.engine = OnceLock::new();
        Ok(())
    }

    #[instrument(skip(self), fields(documents = self.documents.len()))]
    fn search(&self, term: &str, limit: usize) -> Result<Vec<SearchHit>> {
        if term.trim().is_empty() || limit == 0 || self.documents.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits = Vec::new();
        for result in self.engine().search(term, limit) {
            let record = self
                .documents
                .get(result.document.id as usize)
                .ok_or_else(|| {
                    IndexError::search(format!("unknown document id {}", result.document.id))
                })?;
            hits.push(SearchHit {
                record: record.clone(),
                score: result.score,
            });
        }

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }

    fn len(&self) -> usize {
        self.documents.len()
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        let snapshot = Snapshot {
            engine: ENGINE_NAME.to_string(),
            version: FORMAT_VERSION,
            language: LANGUAGE.to_string(),
            schema: IndexSchema::default(),
            documents: self.documents.clone(),
        };
        Ok(serde_json::to_vec(&snapshot)?)
    }

    fn deserialize(bytes: &[u8]) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_slice(bytes)?;

        if snapshot.engine != ENGINE_NAME {
            return Err(IndexError::incompatible(format!(
                "artifact was written by engine '{}', expected '{ENGINE_NAME}'",
                snapshot.engine
            )));
        }
        if snapshot.version != FORMAT_VERSION {
            return Err(IndexError::incompatible(format!(
                "artifact format version {} is not supported (expected {FORMAT_VERSION})",
                snapshot.version
            )));
        }
        if snapshot.language != LANGUAGE {
            return Err(IndexError::incompatible(format!(
                "unsupported language '{}'",
                snapshot.language
            )));
        }

        debug!("Restored {} documents from artifact", snapshot.documents.len());
        Ok(Self {
            documents: snapshot.documents,
            engine: OnceLock::new(),
        })
    }
}
