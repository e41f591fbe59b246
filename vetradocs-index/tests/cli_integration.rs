use anyhow::Result;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;
use vetradocs_index::engine::{Bm25Index, SearchIndex};

/// Helper to run the build binary inside `cwd` with given args
fn run_cli(cwd: &Path, args: &[&str]) -> Result<std::process::Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_vetradocs-build"))
        .current_dir(cwd)
        .args(args)
        .env("RUST_LOG", "error") // Reduce log noise
        .output()?;
    Ok(output)
}

/// Helper to lay out a small documentation site
fn populate_docs(root: &Path) -> Result<()> {
    let files = [
        ("docs/index.md", "# Welcome\n\nStart here."),
        ("docs/guide/index.md", "# Guide\n\nOverview of the guide."),
        (
            "docs/guide/setup.md",
            "---\ntitle: Setup\n---\nInstall the plugin and run the build.",
        ),
        ("docs/public/logo.svg", "<svg/>"),
    ];

    for (relative, content) in files {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap())?;
        std::fs::write(path, content)?;
    }
    Ok(())
}

/// Test basic CLI functionality - check that binary can be run and shows help
#[test]
fn test_cli_help() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output = run_cli(temp_dir.path(), &["--help"])?;

    assert!(
        output.status.success(),
        "CLI help command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("--docs"));
    assert!(stdout.contains("--output"));
    Ok(())
}

/// Default paths are relative to the working directory
#[test]
fn test_cli_defaults_build_index() -> Result<()> {
    let temp_dir = TempDir::new()?;
    populate_docs(temp_dir.path())?;

    let output = run_cli(temp_dir.path(), &[])?;
    assert!(
        output.status.success(),
        "build failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("Indexed 3 documents."));

    let artifact = std::fs::read(temp_dir.path().join("docs/public/search-index.json"))?;
    let index = Bm25Index::deserialize(&artifact)?;
    assert_eq!(index.len(), 3);
    Ok(())
}

#[test]
fn test_cli_custom_paths() -> Result<()> {
    let temp_dir = TempDir::new()?;
    populate_docs(temp_dir.path())?;

    let output = run_cli(
        temp_dir.path(),
        &["--docs", "docs/guide", "--output", "build/assets/index.json"],
    )?;
    assert!(output.status.success());

    let artifact = std::fs::read(temp_dir.path().join("build/assets/index.json"))?;
    let index = Bm25Index::deserialize(&artifact)?;
    let urls: Vec<_> = index.documents().iter().map(|d| d.url.as_str()).collect();
    assert_eq!(urls, vec!["/", "/setup"]);
    Ok(())
}

#[test]
fn test_cli_missing_docs_dir_exits_with_error() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let output = run_cli(temp_dir.path(), &["--docs", "does-not-exist"])?;
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("Directory not found"));
    assert!(!temp_dir.path().join("docs/public/search-index.json").exists());
    Ok(())
}

#[test]
fn test_cli_empty_docs_dir_succeeds() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::create_dir_all(temp_dir.path().join("docs"))?;

    let output = run_cli(temp_dir.path(), &[])?;
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("Indexed 0 documents."));

    let artifact = std::fs::read(temp_dir.path().join("docs/public/search-index.json"))?;
    assert!(Bm25Index::deserialize(&artifact)?.is_empty());
    Ok(())
}

#[test]
fn test_cli_unwritable_output_exits_with_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    populate_docs(temp_dir.path())?;
    std::fs::write(temp_dir.path().join("blocker"), "a file, not a directory")?;

    let output = run_cli(temp_dir.path(), &["--output", "blocker/index.json"])?;
    assert_eq!(output.status.code(), Some(1));
    Ok(())
}
