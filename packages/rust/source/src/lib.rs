//! Repository source resolution and caching for docshelf.
//!
//! [`resolve`] maps a library id to the remote coordinates of its
//! documentation; [`RepositoryCache`] materializes shallow, single-branch
//! snapshots of those repositories into per-key local slots.

mod cache;

use std::path::{Path, PathBuf};

use docshelf_shared::{AppConfig, RepoKey};

pub use cache::{GitFetcher, RepoFetcher, RepositoryCache};

// ---------------------------------------------------------------------------
// CrawlTarget
// ---------------------------------------------------------------------------

/// Remote coordinates of one library's documentation, ready for acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// Repository coordinate in `owner/name` form.
    pub repo: String,
    /// Branch to fetch.
    pub branch: String,
    /// Subdirectory within the repository; empty means the repository root.
    pub dir: String,
}

impl CrawlTarget {
    /// The cache slot this target resolves to. Depends only on repo + branch,
    /// so targets differing only in `dir` share one slot.
    pub fn repo_key(&self) -> RepoKey {
        RepoKey::new(&self.repo, &self.branch)
    }

    /// Entry point for crawling, under a materialized cache slot.
    pub fn entry_path(&self, cache_slot: &Path) -> PathBuf {
        if self.dir.is_empty() {
            cache_slot.to_path_buf()
        } else {
            cache_slot.join(&self.dir)
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve a library id to its documentation source, or `None` if the library
/// is unknown or has no docs configuration.
///
/// Absence is not an error: callers treat it as "nothing to fetch for this
/// library". Defaults (branch `main`, repository root) are applied when the
/// registry omits them. Pure function of the config snapshot; performs no I/O.
pub fn resolve(config: &AppConfig, library_id: &str) -> Option<CrawlTarget> {
    let entry = config.library(library_id)?;
    let docs = entry.docs.as_ref()?;

    Some(CrawlTarget {
        repo: docs.repo.clone(),
        branch: docs.branch.clone(),
        dir: docs.dir.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docshelf_shared::{LibraryDocs, LibraryEntry};

    fn config_with(entries: Vec<LibraryEntry>) -> AppConfig {
        AppConfig {
            cache_dir: None,
            libraries: entries,
        }
    }

    #[test]
    fn resolve_unknown_library_is_absent() {
        let config = config_with(vec![]);
        assert!(resolve(&config, "motion").is_none());
    }

    #[test]
    fn resolve_library_without_docs_is_absent() {
        let config = config_with(vec![LibraryEntry {
            id: "motion".into(),
            docs: None,
        }]);
        assert!(resolve(&config, "motion").is_none());
    }

    #[test]
    fn resolve_applies_configured_coordinates() {
        let config = config_with(vec![LibraryEntry {
            id: "motion".into(),
            docs: Some(LibraryDocs {
                repo: "motiondivision/motion".into(),
                branch: "main".into(),
                dir: "dev/docs".into(),
            }),
        }]);

        let target = resolve(&config, "motion").expect("resolved");
        assert_eq!(target.repo, "motiondivision/motion");
        assert_eq!(target.branch, "main");
        assert_eq!(target.dir, "dev/docs");
    }

    #[test]
    fn targets_differing_in_dir_share_a_cache_slot() {
        let a = CrawlTarget {
            repo: "owner/repo".into(),
            branch: "main".into(),
            dir: "docs".into(),
        };
        let b = CrawlTarget {
            repo: "owner/repo".into(),
            branch: "main".into(),
            dir: "guides".into(),
        };
        assert_eq!(a.repo_key(), b.repo_key());
    }

    #[test]
    fn entry_path_defaults_to_slot_root() {
        let target = CrawlTarget {
            repo: "owner/repo".into(),
            branch: "main".into(),
            dir: String::new(),
        };
        let slot = Path::new("/cache/owner-repo-main");
        assert_eq!(target.entry_path(slot), slot);

        let nested = CrawlTarget {
            dir: "docs".into(),
            ..target
        };
        assert_eq!(nested.entry_path(slot), slot.join("docs"));
    }
}
