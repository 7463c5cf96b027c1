//! Core domain types for docshelf document sets.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RepoKey
// ---------------------------------------------------------------------------

/// Identifies a repository cache slot, derived from repo coordinate + branch.
///
/// Two requests with the same coordinate and branch always resolve to the same
/// slot, regardless of which source directory within the repo they target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoKey(String);

impl RepoKey {
    /// Derive the cache-slot name for an `owner/name` coordinate and branch.
    pub fn new(repo: &str, branch: &str) -> Self {
        Self(format!("{}-{branch}", repo.replace('/', "-")))
    }

    /// The slot name as a path-safe string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RepoKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Slug
// ---------------------------------------------------------------------------

/// Stable hierarchical identifier for a document within a library.
///
/// The first segment is always the library id; the rest are the document's
/// path segments with the file extension stripped from the last one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(Vec<String>);

impl Slug {
    /// Build a slug from pre-split segments. Empty segments are dropped.
    pub fn from_segments(segments: impl IntoIterator<Item = String>) -> Self {
        Self(segments.into_iter().filter(|s| !s.is_empty()).collect())
    }

    /// The ordered segments.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The joined `a/b/c` form used as the document-set key.
    pub fn joined(&self) -> String {
        self.0.join("/")
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.joined())
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Arbitrary key/value metadata parsed from a document's front-matter block.
pub type FrontMatter = BTreeMap<String, serde_yaml::Value>;

/// One parsed documentation file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Owning library id.
    pub library: String,
    /// Path relative to the crawl entry point (extension kept).
    pub path: String,
    /// Stable slug, library-prefixed.
    pub slug: Slug,
    /// Parsed front matter; empty when the file has no block.
    #[serde(default)]
    pub front_matter: FrontMatter,
    /// Sanitized body text.
    pub content: String,
    /// SHA-256 of the sanitized body, for change detection.
    pub content_hash: String,
    /// When the document was parsed from the cached snapshot.
    pub fetched_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Render tree
// ---------------------------------------------------------------------------

/// A node in the compiled render tree.
///
/// This is the structured, framework-consumable output of compilation. It is
/// plain data: rendering it is the view layer's job, never this crate's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// Section heading with its assigned anchor.
    Heading {
        level: u8,
        anchor: String,
        children: Vec<Node>,
    },
    /// Paragraph of inline content.
    Paragraph { children: Vec<Node> },
    /// Plain text run.
    Text { value: String },
    /// Emphasized (italic) span.
    Emphasis { children: Vec<Node> },
    /// Strong (bold) span.
    Strong { children: Vec<Node> },
    /// Inline code span.
    Code { value: String },
    /// Fenced or indented code block.
    CodeBlock {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lang: Option<String>,
        value: String,
    },
    /// Hyperlink.
    Link { href: String, children: Vec<Node> },
    /// Image reference.
    Image { src: String, alt: String },
    /// Ordered or unordered list.
    List {
        ordered: bool,
        items: Vec<Vec<Node>>,
    },
    /// Block quote.
    BlockQuote { children: Vec<Node> },
    /// Resolved embed (bare URL promoted by the embed transform).
    Embed { url: String },
    /// Thematic break.
    Rule,
}

/// A single entry in a compiled document's outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// Heading level, 1-6.
    pub level: u8,
    /// Plain text of the heading.
    pub text: String,
    /// Anchor id assigned during compilation, unique within the document.
    pub anchor: String,
}

/// Output of compiling one document body: render tree plus outline.
///
/// Ephemeral; produced per compile call and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledDoc {
    /// Heading hierarchy in document order.
    pub outline: Vec<OutlineEntry>,
    /// The compiled render tree.
    pub tree: Vec<Node>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_key_replaces_separator() {
        let key = RepoKey::new("motiondivision/motion", "main");
        assert_eq!(key.as_str(), "motiondivision-motion-main");
    }

    #[test]
    fn repo_key_ignores_source_dir() {
        // Only coordinate + branch participate in the key.
        let a = RepoKey::new("owner/repo", "main");
        let b = RepoKey::new("owner/repo", "main");
        assert_eq!(a, b);
    }

    #[test]
    fn slug_joins_segments() {
        let slug = Slug::from_segments(["lib".into(), "guide".into(), "intro".into()]);
        assert_eq!(slug.joined(), "lib/guide/intro");
        assert_eq!(slug.segments().len(), 3);
    }

    #[test]
    fn slug_drops_empty_segments() {
        let slug = Slug::from_segments(["lib".into(), String::new()]);
        assert_eq!(slug.joined(), "lib");
    }

    #[test]
    fn node_tree_serializes_tagged() {
        let node = Node::Heading {
            level: 1,
            anchor: "overview".into(),
            children: vec![Node::Text {
                value: "Overview".into(),
            }],
        };
        let json = serde_json::to_string(&node).expect("serialize");
        assert!(json.contains("\"type\":\"heading\""));
        let parsed: Node = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, node);
    }
}
