//! Local repository cache backed by shallow git clones.
//!
//! Each repo+branch key occupies a disjoint subtree under the cache root, so
//! concurrent acquisitions for different keys never contend on the same path.
//! Keys already materialized in this process are not fetched again.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use url::Url;

use docshelf_shared::{DocshelfError, RepoKey, Result};

// ---------------------------------------------------------------------------
// RepoFetcher
// ---------------------------------------------------------------------------

/// Transport seam for materializing a repository snapshot.
///
/// The production implementation shells out to `git`; tests substitute a
/// recording double so cache behavior is observable without the network.
#[async_trait::async_trait]
pub trait RepoFetcher: Send + Sync {
    /// Fetch a shallow, single-branch snapshot of `repo` at `branch` into
    /// `dest`. `dest` does not exist when this is called.
    async fn fetch(&self, repo: &str, branch: &str, dest: &Path) -> Result<()>;
}

/// Fetches via `git clone --depth 1 --single-branch` over HTTPS.
#[derive(Debug, Default)]
pub struct GitFetcher;

#[async_trait::async_trait]
impl RepoFetcher for GitFetcher {
    async fn fetch(&self, repo: &str, branch: &str, dest: &Path) -> Result<()> {
        let url = Url::parse(&format!("https://github.com/{repo}"))
            .map_err(|e| DocshelfError::Acquisition(format!("bad repo coordinate {repo}: {e}")))?;

        let output = tokio::process::Command::new("git")
            .arg("clone")
            .arg("--depth")
            .arg("1")
            .arg("--single-branch")
            .arg("--branch")
            .arg(branch)
            .arg(url.as_str())
            .arg(dest)
            .output()
            .await
            .map_err(|e| DocshelfError::Acquisition(format!("failed to launch git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DocshelfError::Acquisition(format!(
                "git clone of {repo}@{branch} failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        info!(repo, branch, dest = %dest.display(), "cloned repository snapshot");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RepositoryCache
// ---------------------------------------------------------------------------

/// Process-scoped cache of repository snapshots, one slot per [`RepoKey`].
///
/// The cache is an explicitly passed handle, not ambient state: acquisition
/// code receives it as a parameter so tests can swap the fetcher and the root.
/// Contents are ephemeral; no eviction is performed for the process lifetime.
pub struct RepositoryCache {
    root: PathBuf,
    fetcher: Arc<dyn RepoFetcher>,
    /// Per-key slot guards; the boolean records whether the slot has been
    /// materialized by this process.
    slots: Mutex<HashMap<RepoKey, Arc<Mutex<bool>>>>,
}

impl RepositoryCache {
    /// Create a cache rooted at `root`, cloning with the system `git`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_fetcher(root, Arc::new(GitFetcher))
    }

    /// Create a cache with a custom fetcher implementation.
    pub fn with_fetcher(root: impl Into<PathBuf>, fetcher: Arc<dyn RepoFetcher>) -> Self {
        Self {
            root: root.into(),
            fetcher,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// The cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ensure a snapshot of `repo`@`branch` exists locally, returning the
    /// slot path. Idempotent per key within this process: a second call for
    /// an already-materialized key returns without fetching.
    ///
    /// A slot directory that exists on disk but was not materialized by this
    /// process is treated as a stale partial clone and wiped first. Failures
    /// propagate to the caller; no retries.
    #[instrument(skip(self))]
    pub async fn ensure_cloned(&self, repo: &str, branch: &str) -> Result<PathBuf> {
        let key = RepoKey::new(repo, branch);
        let slot = self.root.join(key.as_str());

        // The registry lock covers only the guard lookup; the fetch runs
        // under the per-key guard, so concurrent calls for the same key
        // serialize on one slot path while distinct keys clone in parallel.
        let guard = {
            let mut slots = self.slots.lock().await;
            slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(false)))
                .clone()
        };

        let mut materialized = guard.lock().await;
        if *materialized {
            debug!(%key, "cache slot already materialized, skipping fetch");
            return Ok(slot);
        }

        if slot.exists() {
            debug!(%key, "removing stale cache slot");
            tokio::fs::remove_dir_all(&slot)
                .await
                .map_err(|e| DocshelfError::io(&slot, e))?;
        }

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| DocshelfError::io(&self.root, e))?;

        self.fetcher.fetch(repo, branch, &slot).await?;

        *materialized = true;
        Ok(slot)
    }
}
