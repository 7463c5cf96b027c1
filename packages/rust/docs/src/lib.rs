//! Document parsing and aggregation for docshelf.
//!
//! [`parse`] turns the raw bytes of one crawled file into a [`Document`]:
//! relative path, library-prefixed slug, front matter, and a sanitized body.
//! [`DocumentSet`] aggregates parsed documents per library, keyed by slug.

mod parser;
mod set;

pub use parser::parse;
pub use set::DocumentSet;
