pub mod indexer;
pub mod scanner;

pub use indexer::{
    BuildReport, DEFAULT_DOCS_DIR, DEFAULT_OUTPUT_PATH, Indexer, IndexerConfig, read_artifact,
    write_artifact,
};
pub use scanner::collect_markdown_files;
