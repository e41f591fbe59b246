//! Index source backed by a local directory, typically the site's `public/`.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::IndexSource;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct FileIndexSource {
    public_dir: PathBuf,
}

impl FileIndexSource {
    pub fn new(public_dir: impl Into<PathBuf>) -> Self {
        Self {
            public_dir: public_dir.into(),
        }
    }

    /// File that serves the site-relative `path`.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.public_dir.join(path.trim_start_matches('/'))
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }
}

#[async_trait]
impl IndexSource for FileIndexSource {
    async fn fetch_index(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let file = self.resolve(path);
        debug!("Reading search index from {}", file.display());
        match tokio::fs::read(&file).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
