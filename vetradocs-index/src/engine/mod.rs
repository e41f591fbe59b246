//! Search engine abstraction for vetradocs-index
//!
//! The indexer and the retrieval client never look inside the search
//! structure. They talk to it through [`SearchIndex`], a narrow seam of four
//! operations:
//!
//! ```text
//! insert(record)        build time, once per markdown file
//! serialize()           build time, produces the artifact bytes
//! deserialize(bytes)    query time, restores the structure
//! search(term, limit)   query time, ranked hits
//! ```
//!
//! Swapping the engine means adding another implementation of the trait; the
//! pipeline does not change. The artifact layout belongs to the implementation
//! and is opaque to everything else.
//!
//! ## Implementations
//!
//! - **[`Bm25Index`]**: keyword ranking over the `bm25` crate
//! - **[`MockIndex`]**: records inserted documents, for tests

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use vetradocs_context::{DocRecord, SearchResult};

use crate::error::{IndexError, Result};

pub mod bm25_index;

pub use bm25_index::Bm25Index;

/// Type of a schema field. Every field of the document schema is free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
}

/// The fixed three-field schema every index is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSchema {
    pub title: FieldType,
    pub url: FieldType,
    pub content: FieldType,
}

impl Default for IndexSchema {
    fn default() -> Self {
        Self {
            title: FieldType::String,
            url: FieldType::String,
            content: FieldType::String,
        }
    }
}

/// A ranked match. Higher scores are more relevant.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub record: DocRecord,
    pub score: f32,
}

impl From<SearchHit> for SearchResult {
    fn from(hit: SearchHit) -> Self {
        SearchResult {
            title: hit.record.title,
            url: hit.record.url,
            content: hit.record.content,
        }
    }
}

/// Capability interface over a full-text search engine.
pub trait SearchIndex: Send + Sync {
    /// Add one document record.
    fn insert(&mut self, record: DocRecord) -> Result<()>;

    /// Up to `limit` hits for `term`, most relevant first.
    fn search(&self, term: &str, limit: usize) -> Result<Vec<SearchHit>>;

    /// Number of inserted records.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot the structure into its portable artifact.
    fn serialize(&self) -> Result<Vec<u8>>;

    /// Restore a structure from an artifact produced by [`serialize`](Self::serialize).
    fn deserialize(bytes: &[u8]) -> Result<Self>
    where
        Self: Sized;
}

/// A mock index for testing.
/// It records every inserted record in a shared vector and answers queries
/// with a case-insensitive substring match in insertion order.
#[derive(Debug, Default, Clone)]
pub struct MockIndex {
    pub records: Arc<Mutex<Vec<DocRecord>>>,
    /// When set, every search fails with this message
    pub fail_searches: Option<String>,
}

impl MockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_searches: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn inserted(&self) -> Vec<DocRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl SearchIndex for MockIndex {
    fn insert(&mut self, record: DocRecord) -> Result<()> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }

    fn search(&self, term: &str, limit: usize) -> Result<Vec<SearchHit>> {
        if let Some(message) = &self.fail_searches {
            return Err(IndexError::search(message.clone()));
        }
        let needle = term.to_lowercase();
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.searchable_text().to_lowercase().contains(&needle))
            .take(limit)
            .map(|r| SearchHit {
                record: r.clone(),
                score: 1.0,
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&*self.records.lock().unwrap())?)
    }

    fn deserialize(bytes: &[u8]) -> Result<Self> {
        let records: Vec<DocRecord> = serde_json::from_slice(bytes)?;
        Ok(Self {
            records: Arc::new(Mutex::new(records)),
            fail_searches: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_serializes_as_text_fields() {
        let json = serde_json::to_value(IndexSchema::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"title": "string", "url": "string", "content": "string"})
        );
    }

    #[test]
    fn test_hit_maps_to_search_result() {
        let hit = SearchHit {
            record: DocRecord {
                title: "Intro".to_string(),
                url: "/".to_string(),
                content: "Welcome".to_string(),
            },
            score: 2.5,
        };

        let result = SearchResult::from(hit);
        assert_eq!(result.title, "Intro");
        assert_eq!(result.url, "/");
        assert_eq!(result.content, "Welcome");
    }

    #[test]
    fn test_mock_index_round_trips_records() {
        let mut index = MockIndex::new();
        index
            .insert(DocRecord {
                title: "A".to_string(),
                url: "/a".to_string(),
                content: "alpha".to_string(),
            })
            .unwrap();

        let restored = MockIndex::deserialize(&index.serialize().unwrap()).unwrap();
        assert_eq!(restored.inserted(), index.inserted());
        assert_eq!(restored.search("ALPHA", 5).unwrap().len(), 1);
    }
}
