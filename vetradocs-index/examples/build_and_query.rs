//! Build an index for a small generated docs site and query it.
//!
//! ```bash
//! cargo run -p vetradocs-index --example build_and_query -- "keyboard shortcut"
//! ```

use anyhow::Result;
use tempfile::tempdir;
use vetradocs_index::engine::{Bm25Index, SearchIndex};
use vetradocs_index::indexing::{Indexer, IndexerConfig, read_artifact};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let query = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "keyboard shortcut".to_string());

    let temp_dir = tempdir()?;
    let docs = temp_dir.path().join("docs");
    for (relative, text) in [
        ("index.md", "# Welcome\n\nThis site documents the vetradocs plugin."),
        (
            "guide/install.md",
            "---\ntitle: Installation\n---\nAdd the plugin, then run vetradocs-build.",
        ),
        (
            "guide/shortcuts.md",
            "# Keyboard shortcuts\n\nCtrl+I toggles the chat, Escape closes it.",
        ),
    ] {
        let path = docs.join(relative);
        tokio::fs::create_dir_all(path.parent().unwrap_or(&docs)).await?;
        tokio::fs::write(path, text).await?;
    }

    let output = docs.join("public/search-index.json");
    let report = Indexer::new(IndexerConfig::new(&docs, &output)).build().await?;
    println!(
        "Indexed {} documents into {} bytes in {:?}",
        report.indexed, report.bytes_written, report.elapsed
    );

    let index: Bm25Index = read_artifact(&output).await?;
    println!("\nResults for {query:?}:");
    for hit in index.search(&query, 3)? {
        println!("  {:>6.3}  {} ({})", hit.score, hit.record.title, hit.record.url);
    }
    Ok(())
}
