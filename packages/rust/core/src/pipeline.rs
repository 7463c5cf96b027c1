//! Per-library and all-libraries acquisition workflows.
//!
//! `build_library` runs resolve → clone → crawl → parse for one library and
//! aggregates the result into a [`DocumentSet`]. `build_all` fans out across
//! every configured library concurrently; a failing library contributes an
//! empty result and an error entry rather than aborting the others.
//!
//! Acquisition rebuilds document sets fully on every call — there is no
//! incremental update. Compilation is decoupled and happens per document via
//! [`hydrate`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use docshelf_compiler::Compiler;
use docshelf_crawler::ExtensionFilter;
use docshelf_docs::DocumentSet;
use docshelf_shared::{AppConfig, CompiledDoc, DocshelfError, Document, Result};
use docshelf_source::RepositoryCache;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Summary of one library's acquisition.
#[derive(Debug, Clone)]
pub struct AcquireStats {
    /// Documents successfully parsed and inserted.
    pub documents: usize,
    /// Files skipped because parsing failed.
    pub skipped: usize,
    /// Total acquisition duration for this library.
    pub elapsed: Duration,
}

/// Outcome of building one library's document set.
#[derive(Debug)]
pub struct LibraryBuild {
    /// Library id the set was built for.
    pub library: String,
    /// The aggregated documents, keyed by slug.
    pub documents: DocumentSet,
    /// Acquisition summary.
    pub stats: AcquireStats,
}

/// Outcome of building every configured library.
#[derive(Debug)]
pub struct BuildAllReport {
    /// Flattened documents across all libraries that built successfully.
    pub documents: Vec<Document>,
    /// Libraries whose acquisition failed, with the error.
    pub failures: Vec<(String, DocshelfError)>,
    /// Total wall-clock duration of the fan-out.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Per-library build
// ---------------------------------------------------------------------------

/// Build the document set for one library.
///
/// A library that is unknown or has no docs configuration yields an empty
/// set — that is "nothing to fetch", not an error. Clone and crawl failures
/// propagate. A file that fails to parse is skipped with a warning so one
/// bad document cannot discard the library.
#[instrument(skip(config, cache))]
pub async fn build_library(
    config: &AppConfig,
    cache: &RepositoryCache,
    library_id: &str,
) -> Result<LibraryBuild> {
    let start = Instant::now();
    let mut documents = DocumentSet::new();
    let mut skipped = 0usize;

    let Some(target) = docshelf_source::resolve(config, library_id) else {
        debug!(library = library_id, "no docs configured, nothing to fetch");
        return Ok(LibraryBuild {
            library: library_id.to_string(),
            documents,
            stats: AcquireStats {
                documents: 0,
                skipped: 0,
                elapsed: start.elapsed(),
            },
        });
    };

    let slot = cache.ensure_cloned(&target.repo, &target.branch).await?;
    let entry = target.entry_path(&slot);

    let files = docshelf_crawler::crawl(&entry, Some(&ExtensionFilter::markdown())).await?;
    debug!(library = library_id, files = files.len(), "crawl complete");

    for file in files {
        let bytes = tokio::fs::read(&file)
            .await
            .map_err(|e| DocshelfError::io(&file, e))?;

        match docshelf_docs::parse(&bytes, &file, &entry, library_id) {
            Ok(document) => documents.insert(document),
            Err(e) => {
                warn!(path = %file.display(), error = %e, "skipping unparseable document");
                skipped += 1;
            }
        }
    }

    let stats = AcquireStats {
        documents: documents.len(),
        skipped,
        elapsed: start.elapsed(),
    };

    info!(
        library = library_id,
        documents = stats.documents,
        skipped = stats.skipped,
        elapsed_ms = stats.elapsed.as_millis(),
        "library build complete"
    );

    Ok(LibraryBuild {
        library: library_id.to_string(),
        documents,
        stats,
    })
}

// ---------------------------------------------------------------------------
// All-libraries build
// ---------------------------------------------------------------------------

/// Build every configured library concurrently and flatten the results.
///
/// Libraries acquire independently; one failure never aborts the rest. The
/// flattened document order across libraries is unspecified.
#[instrument(skip_all, fields(libraries = config.libraries.len()))]
pub async fn build_all(config: Arc<AppConfig>, cache: Arc<RepositoryCache>) -> BuildAllReport {
    let start = Instant::now();
    let mut tasks: JoinSet<(String, Result<LibraryBuild>)> = JoinSet::new();

    for entry in &config.libraries {
        let id = entry.id.clone();
        let config = config.clone();
        let cache = cache.clone();
        tasks.spawn(async move {
            let result = build_library(&config, &cache, &id).await;
            (id, result)
        });
    }

    let mut documents = Vec::new();
    let mut failures = Vec::new();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(build))) => documents.extend(build.documents),
            Ok((id, Err(e))) => {
                warn!(library = %id, error = %e, "library acquisition failed, contributing nothing");
                failures.push((id, e));
            }
            Err(e) => {
                warn!(error = %e, "library build task panicked");
                failures.push((
                    "unknown".to_string(),
                    DocshelfError::Acquisition(format!("build task panicked: {e}")),
                ));
            }
        }
    }

    let report = BuildAllReport {
        documents,
        failures,
        elapsed: start.elapsed(),
    };

    info!(
        documents = report.documents.len(),
        failures = report.failures.len(),
        elapsed_ms = report.elapsed.as_millis(),
        "build-all complete"
    );

    report
}

// ---------------------------------------------------------------------------
// Compile step
// ---------------------------------------------------------------------------

/// Compile one acquired document into its render tree and outline.
///
/// Only documents that came through the acquisition pipeline should be fed
/// here; the compile step is per-document and its failure is surfaced to the
/// caller, never swallowed.
pub fn hydrate(document: &Document) -> Result<CompiledDoc> {
    Compiler::new().compile(&document.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use docshelf_shared::{LibraryDocs, LibraryEntry};
    use docshelf_source::RepoFetcher;

    /// Writes a small fixture docs tree instead of cloning.
    struct FixtureFetcher;

    #[async_trait::async_trait]
    impl RepoFetcher for FixtureFetcher {
        async fn fetch(&self, repo: &str, _branch: &str, dest: &Path) -> docshelf_shared::Result<()> {
            if repo.ends_with("broken") {
                return Err(DocshelfError::Acquisition(format!("{repo}: no such repo")));
            }

            let docs = dest.join("docs");
            std::fs::create_dir_all(docs.join("guide")).unwrap();
            std::fs::write(docs.join("index.md"), "---\ntitle: Home\n---\n# Home\n").unwrap();
            std::fs::write(
                docs.join("guide/intro.md"),
                "---\ntitle: Intro\n---\n# Intro\n\nWelcome.\n",
            )
            .unwrap();
            // Present but filtered out by extension.
            std::fs::write(dest.join("docs/notes.txt"), "scratch").unwrap();
            Ok(())
        }
    }

    fn config(entries: Vec<LibraryEntry>) -> Arc<AppConfig> {
        Arc::new(AppConfig {
            cache_dir: None,
            libraries: entries,
        })
    }

    fn library(id: &str, repo: &str) -> LibraryEntry {
        LibraryEntry {
            id: id.into(),
            docs: Some(LibraryDocs {
                repo: repo.into(),
                branch: "main".into(),
                dir: "docs".into(),
            }),
        }
    }

    fn cache(root: &Path) -> Arc<RepositoryCache> {
        Arc::new(RepositoryCache::with_fetcher(root, Arc::new(FixtureFetcher)))
    }

    #[tokio::test]
    async fn build_library_produces_slugged_documents() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(vec![library("motion", "owner/motion")]);
        let cache = cache(dir.path());

        let build = build_library(&config, &cache, "motion").await.unwrap();

        assert_eq!(build.documents.len(), 2);
        assert!(build.documents.get("motion/index").is_some());

        let intro = build.documents.get("motion/guide/intro").unwrap();
        assert!(intro.content.contains("Welcome."));
        assert_eq!(build.stats.skipped, 0);
    }

    #[tokio::test]
    async fn build_library_without_docs_is_empty_and_never_fetches() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingFetcher(AtomicUsize);

        #[async_trait::async_trait]
        impl RepoFetcher for CountingFetcher {
            async fn fetch(
                &self,
                _repo: &str,
                _branch: &str,
                _dest: &Path,
            ) -> docshelf_shared::Result<()> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let config = config(vec![LibraryEntry {
            id: "plain".into(),
            docs: None,
        }]);
        let fetcher = Arc::new(CountingFetcher(AtomicUsize::new(0)));
        let cache = RepositoryCache::with_fetcher(dir.path(), fetcher.clone());

        let build = build_library(&config, &cache, "plain").await.unwrap();
        assert!(build.documents.is_empty());

        let unknown = build_library(&config, &cache, "missing").await.unwrap();
        assert!(unknown.documents.is_empty());

        assert_eq!(fetcher.0.load(Ordering::SeqCst), 0, "no clone may occur");
    }

    #[tokio::test]
    async fn build_all_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(vec![
            library("good", "owner/good"),
            library("bad", "owner/broken"),
        ]);
        let cache = cache(dir.path());

        let report = build_all(config, cache).await;

        assert_eq!(report.documents.len(), 2);
        assert!(report.documents.iter().all(|d| d.library == "good"));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "bad");
    }

    #[tokio::test]
    async fn hydrate_compiles_acquired_documents() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(vec![library("motion", "owner/motion")]);
        let cache = cache(dir.path());

        let build = build_library(&config, &cache, "motion").await.unwrap();
        let doc = build.documents.get("motion/guide/intro").unwrap();

        let compiled = hydrate(doc).unwrap();
        assert_eq!(compiled.outline[0].text, "Intro");
        assert_eq!(compiled.outline[0].level, 1);
    }
}
