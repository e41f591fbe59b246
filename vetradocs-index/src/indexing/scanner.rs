//! Discovery of markdown documents below a documentation root.

use std::path::{Path, PathBuf};
use tokio::fs::DirEntry;
use tracing::{debug, warn};
use vetradocs_context::is_markdown;

use crate::error::{IndexError, Result};

/// Recursively collect every markdown file under `root`.
///
/// The walk is depth-first and unbounded in depth. Every directory is
/// traversed; only files whose name ends in `.md` are returned. Symlinks to
/// files are followed, symlinks to directories are not. The result is sorted
/// so repeated runs see the same order.
///
/// # Errors
/// - [`IndexError::DocsDirNotFound`] when `root` does not exist
/// - [`IndexError::NotADirectory`] when `root` is a file
///
/// Subdirectories that cannot be read are logged and skipped.
pub async fn collect_markdown_files(root: &Path) -> Result<Vec<PathBuf>> {
    match tokio::fs::metadata(root).await {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => {
            return Err(IndexError::NotADirectory {
                path: root.to_path_buf(),
            });
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(IndexError::DocsDirNotFound {
                path: root.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    }

    let mut files = Vec::new();
    let mut dir_stack = vec![root.to_path_buf()];

    while let Some(current_dir) = dir_stack.pop() {
        let mut read_dir = match tokio::fs::read_dir(&current_dir).await {
            Ok(rd) => rd,
            Err(e) => {
                warn!("Failed to read directory {}: {}", current_dir.display(), e);
                continue;
            }
        };

        loop {
            let entry = match read_dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(
                        "Failed to list directory {}, skipping the rest of it: {}",
                        current_dir.display(),
                        e
                    );
                    break;
                }
            };
            visit_entry(entry, &mut files, &mut dir_stack).await;
        }
    }

    files.sort();
    debug!("Found {} markdown files under {}", files.len(), root.display());
    Ok(files)
}

async fn visit_entry(entry: DirEntry, files: &mut Vec<PathBuf>, dir_stack: &mut Vec<PathBuf>) {
    let path = entry.path();
    let file_type = match entry.file_type().await {
        Ok(t) => t,
        Err(e) => {
            warn!("Failed to get file type for {}: {}", path.display(), e);
            return;
        }
    };

    if file_type.is_dir() {
        dir_stack.push(path);
    } else if is_markdown(&path) {
        if file_type.is_symlink() && !points_to_file(&path).await {
            debug!("Skipping {} (link target is not a file)", path.display());
            return;
        }
        files.push(path);
    }
}

async fn points_to_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
