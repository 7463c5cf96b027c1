//! Shared types, error model, and configuration for docshelf.
//!
//! This crate is the foundation depended on by all other docshelf crates.
//! It provides:
//! - [`DocshelfError`] — the unified error type
//! - Domain types ([`Document`], [`Slug`], [`RepoKey`], [`CompiledDoc`])
//! - Configuration ([`AppConfig`], library registry loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, LibraryDocs, LibraryEntry, config_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{DocshelfError, Result};
pub use types::{CompiledDoc, Document, FrontMatter, Node, OutlineEntry, RepoKey, Slug};
