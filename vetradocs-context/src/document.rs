//! Extraction of searchable records from markdown documentation files.
//!
//! Every markdown file under a documentation root becomes exactly one
//! [`DocRecord`] made of three text fields:
//!
//! - **title**: the first level-1 heading, else the `title:` field of the
//!   frontmatter block, else the file name without its extension
//! - **url**: the site path the page is served under, derived from the file's
//!   location relative to the documentation root
//! - **content**: the raw markdown with the leading frontmatter block removed
//!
//! # Frontmatter
//!
//! Only a block that opens at the very first byte of the file is treated as
//! frontmatter:
//!
//! ```text
//! ---
//! title: "Getting Started"
//! layout: doc
//! ---
//! # Installation
//! ```
//!
//! Lines that merely look like YAML further down the document are body text;
//! the `title:` lookup never scans outside the frontmatter segment.
//!
//! # URL derivation
//!
//! | file (relative to root) | url             |
//! |-------------------------|-----------------|
//! | `index.md`              | `/`             |
//! | `guide/index.md`        | `/guide/`       |
//! | `guide/setup.md`        | `/guide/setup`  |
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use vetradocs_context::DocRecord;
//!
//! let text = "---\ntitle: Setup\n---\n# Installing\n\nRun the installer.\n";
//! let record = DocRecord::from_markdown(
//!     Path::new("docs"),
//!     Path::new("docs/guide/setup.md"),
//!     text,
//! )
//! .unwrap();
//!
//! assert_eq!(record.title, "Installing");
//! assert_eq!(record.url, "/guide/setup");
//! assert_eq!(record.content, "# Installing\n\nRun the installer.");
//! ```

use crate::error::{DocumentError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

/// File extension of indexable documents.
pub const MARKDOWN_EXTENSION: &str = ".md";

static FRONTMATTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A---(?s:(.*?))---\r?\n?").expect("valid frontmatter regex"));

static H1_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(\S.*)$").expect("valid heading regex"));

static TITLE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^title:[ \t]*(.*)$").expect("valid title regex"));

/// A single document as stored in the search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocRecord {
    pub title: String,
    pub url: String,
    pub content: String,
}

impl DocRecord {
    /// Build the record for `path`, a markdown file somewhere below `root`.
    ///
    /// # Errors
    /// Returns [`DocumentError::OutsideRoot`] when `path` is not under `root`.
    pub fn from_markdown(root: &Path, path: &Path, text: &str) -> Result<Self> {
        Ok(Self {
            title: extract_title(text, path),
            url: derive_url(root, path)?,
            content: clean_content(text),
        })
    }

    /// All searchable text of the record, one field per line.
    pub fn searchable_text(&self) -> String {
        format!("{}\n{}\n{}", self.title, self.url, self.content)
    }
}

/// The metadata block at the top of a markdown file, without its delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frontmatter<'a> {
    pub raw: &'a str,
}

impl<'a> Frontmatter<'a> {
    /// Split `text` into its leading frontmatter block (if any) and the body.
    ///
    /// The block must start at byte 0 with `---` and runs to the next `---`.
    /// At most one newline after the closing delimiter is consumed. An
    /// unterminated block is not frontmatter and the whole text is body.
    pub fn split(text: &'a str) -> (Option<Self>, &'a str) {
        match FRONTMATTER.captures(text) {
            Some(caps) => {
                let whole = caps.get(0).map_or(0, |m| m.end());
                let raw = caps.get(1).map_or("", |m| m.as_str());
                (Some(Self { raw }), &text[whole..])
            }
            None => (None, text),
        }
    }

    /// The value of the first `title:` field, with one pair of surrounding
    /// quotes removed. Empty values count as absent.
    pub fn title(&self) -> Option<String> {
        let caps = TITLE_FIELD.captures(self.raw)?;
        let value = strip_quotes(caps.get(1)?.as_str().trim());
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Whether `path` names a markdown document.
pub fn is_markdown(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(MARKDOWN_EXTENSION))
}

/// Pick the display title of a document.
///
/// First match wins: a `# Heading` line, then the frontmatter `title:` field,
/// then the file stem of `path`.
pub fn extract_title(text: &str, path: &Path) -> String {
    if let Some(heading) = H1_HEADING
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
    {
        return heading.to_string();
    }

    if let Some(title) = Frontmatter::split(text).0.and_then(|fm| fm.title()) {
        return title;
    }

    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Remove the leading frontmatter block and surrounding whitespace.
///
/// Everything else, code fences included, is kept verbatim.
pub fn clean_content(text: &str) -> String {
    Frontmatter::split(text).1.trim().to_string()
}

/// Derive the site URL of the document at `path` below `root`.
///
/// # Errors
/// Fails when `path` is outside `root` or contains non UTF-8 components.
pub fn derive_url(root: &Path, path: &Path) -> Result<String> {
    let root_dir = without_cur_dir(root);
    let file = without_cur_dir(path);
    let relative = file
        .strip_prefix(&root_dir)
        .map_err(|_| DocumentError::OutsideRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str().ok_or_else(|| DocumentError::NonUtf8Path {
                    path: path.to_path_buf(),
                })?;
                segments.push(part.replace('\\', "/"));
            }
            Component::CurDir => {}
            _ => {
                return Err(DocumentError::OutsideRoot {
                    path: path.to_path_buf(),
                    root: root.to_path_buf(),
                });
            }
        }
    }

    let mut joined = segments.join("/");
    if let Some(stripped) = joined.strip_suffix(MARKDOWN_EXTENSION) {
        joined.truncate(stripped.len());
    }

    // `guide/index` is served as the directory page `guide/`
    let last_segment = joined.rsplit('/').next().unwrap_or_default();
    if last_segment == "index" {
        joined.truncate(joined.len() - "index".len());
    }

    Ok(format!("/{joined}"))
}

/// `./docs` and `docs` name the same directory.
fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
