//! Acquisition pipeline orchestration for docshelf.
//!
//! Ties source resolution, repository caching, tree crawling, and document
//! parsing into per-library and all-libraries workflows, and exposes the
//! on-demand compile step.

pub mod pipeline;

pub use pipeline::{AcquireStats, BuildAllReport, LibraryBuild, build_all, build_library, hydrate};
