//! Concurrent filesystem tree crawler for cached repository snapshots.
//!
//! The crawler descends a directory tree, spawning one task per child
//! directory and joining them, so sibling directories are listed concurrently
//! with no ordering guarantee. The result is a flat, complete, duplicate-free
//! list of files matching the filter.
//!
//! Symlinks are followed via `metadata`, so a cyclic link under the root can
//! make a crawl non-terminating. Cached snapshots come from shallow clones of
//! vetted repositories, which is why no cycle detection is attempted here.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::task::JoinSet;
use tracing::{debug, instrument};

use docshelf_shared::{DocshelfError, Result};

// ---------------------------------------------------------------------------
// ExtensionFilter
// ---------------------------------------------------------------------------

/// File filter matching on extension, case-insensitive.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
}

impl ExtensionFilter {
    /// Build a filter accepting the given extensions (without leading dots).
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|s| s.into().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Filter for markdown-family documentation files (`md`, `mdx`).
    pub fn markdown() -> Self {
        Self::new(["md", "mdx"])
    }

    /// Whether a path's extension is accepted.
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|e| *e == ext))
    }
}

// ---------------------------------------------------------------------------
// Crawl
// ---------------------------------------------------------------------------

/// Recursively enumerate files under `root` matching `filter`.
///
/// Every matching file under the root appears exactly once; sibling order is
/// unspecified. A root that is itself a regular file yields a single-entry
/// (or empty, if filtered out) result.
#[instrument(skip(filter), fields(root = %root.display()))]
pub async fn crawl(root: &Path, filter: Option<&ExtensionFilter>) -> Result<Vec<PathBuf>> {
    let meta = tokio::fs::metadata(root)
        .await
        .map_err(|e| DocshelfError::io(root, e))?;

    if meta.is_file() {
        let included = filter.is_none_or(|f| f.matches(root));
        return Ok(if included {
            vec![root.to_path_buf()]
        } else {
            vec![]
        });
    }

    let files = walk_dir(root.to_path_buf(), filter.cloned()).await?;
    debug!(count = files.len(), "crawl complete");
    Ok(files)
}

/// Walk one directory, spawning a task per child directory.
///
/// Boxed because the recursion goes through `JoinSet::spawn`.
fn walk_dir(
    dir: PathBuf,
    filter: Option<ExtensionFilter>,
) -> Pin<Box<dyn Future<Output = Result<Vec<PathBuf>>> + Send>> {
    Box::pin(async move {
        let mut files = Vec::new();
        let mut subdirs: JoinSet<Result<Vec<PathBuf>>> = JoinSet::new();

        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| DocshelfError::io(&dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DocshelfError::io(&dir, e))?
        {
            let path = entry.path();
            let meta = tokio::fs::metadata(&path)
                .await
                .map_err(|e| DocshelfError::io(&path, e))?;

            if meta.is_dir() {
                subdirs.spawn(walk_dir(path, filter.clone()));
            } else if filter.as_ref().is_none_or(|f| f.matches(&path)) {
                files.push(path);
            }
        }

        while let Some(joined) = subdirs.join_next().await {
            let child = joined
                .map_err(|e| DocshelfError::Acquisition(format!("crawl task panicked: {e}")))??;
            files.extend(child);
        }

        Ok(files)
    })
}
