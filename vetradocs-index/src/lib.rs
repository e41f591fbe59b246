//! vetradocs-index: build-time full-text index for markdown documentation
//!
//! This crate walks a documentation tree, turns every markdown file into a
//! searchable record and persists the resulting search structure as a single
//! JSON artifact that the chat front end restores at run time.
//!
//! ## Key Modules
//!
//! - **[`engine`]**: The [`SearchIndex`](engine::SearchIndex) seam and its BM25 implementation
//! - **[`indexing`]**: Directory scanning and the build pipeline
//! - **[`error`]**: Error taxonomy shared by build and restore
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vetradocs_index::engine::{Bm25Index, SearchIndex};
//! use vetradocs_index::indexing::{Indexer, IndexerConfig, read_artifact};
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = IndexerConfig::new("./docs", "./docs/public/search-index.json");
//! Indexer::new(config).build().await?;
//!
//! let index: Bm25Index = read_artifact(Path::new("./docs/public/search-index.json")).await?;
//! for hit in index.search("keyboard shortcut", 3)? {
//!     println!("{} ({})", hit.record.title, hit.record.url);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! docs/**/*.md → Scanner → DocRecord → SearchIndex::insert
//!                                           ↓
//!            search-index.json ← SearchIndex::serialize
//! ```

pub mod engine;
pub mod error;
pub mod indexing;

pub use error::{IndexError, Result};
