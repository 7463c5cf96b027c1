//! Built-in transforms: outline extraction, syntax-highlight normalization,
//! and embed resolution. Each is a pluggable pass over the render tree;
//! the compiler runs them in a fixed order.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use docshelf_shared::{Node, OutlineEntry, Result};

use crate::{CompileContext, Transform};

// ---------------------------------------------------------------------------
// OutlineExtractor
// ---------------------------------------------------------------------------

/// Assigns anchors to headings and appends `{level, text, anchor}` entries to
/// the compile context's outline accumulator, in document order.
#[derive(Debug, Default)]
pub struct OutlineExtractor;

impl Transform for OutlineExtractor {
    fn name(&self) -> &'static str {
        "outline"
    }

    fn apply(&self, mut nodes: Vec<Node>, ctx: &mut CompileContext) -> Result<Vec<Node>> {
        let mut used: HashMap<String, usize> = HashMap::new();
        visit_headings(&mut nodes, &mut used, ctx);
        Ok(nodes)
    }
}

fn visit_headings(nodes: &mut [Node], used: &mut HashMap<String, usize>, ctx: &mut CompileContext) {
    for node in nodes {
        match node {
            Node::Heading {
                level,
                anchor,
                children,
            } => {
                let text = collect_text(children);
                *anchor = unique_anchor(&text, used);
                ctx.outline.push(OutlineEntry {
                    level: *level,
                    text,
                    anchor: anchor.clone(),
                });
            }
            Node::BlockQuote { children } => visit_headings(children, used, ctx),
            Node::List { items, .. } => {
                for item in items {
                    visit_headings(item, used, ctx);
                }
            }
            _ => {}
        }
    }
}

/// Concatenate the plain text of inline children.
fn collect_text(children: &[Node]) -> String {
    let mut out = String::new();
    for child in children {
        match child {
            Node::Text { value } | Node::Code { value } => out.push_str(value),
            Node::Emphasis { children }
            | Node::Strong { children }
            | Node::Link { children, .. } => out.push_str(&collect_text(children)),
            _ => {}
        }
    }
    out
}

/// Slug-safe anchor from heading text: lowercase, dashes, alphanumerics only.
fn anchor_from_text(text: &str) -> String {
    let slug: String = text
        .to_lowercase()
        .replace([' ', '_'], "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect();

    if slug.is_empty() { "section".into() } else { slug }
}

/// De-duplicate anchors within one document by appending `-1`, `-2`, ...
fn unique_anchor(text: &str, used: &mut HashMap<String, usize>) -> String {
    let base = anchor_from_text(text);
    let count = used.entry(base.clone()).or_insert(0);
    let anchor = if *count == 0 {
        base.clone()
    } else {
        format!("{base}-{count}")
    };
    *count += 1;
    anchor
}

// ---------------------------------------------------------------------------
// SyntaxHighlighter
// ---------------------------------------------------------------------------

/// Normalizes code-block language hints so the view layer's highlighter
/// receives plain identifiers.
///
/// Handles class-style prefixes like `language-js`, `lang-python`,
/// `highlight-rust`.
#[derive(Debug, Default)]
pub struct SyntaxHighlighter;

static LANG_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:language-|lang-|highlight-)(\w+)$").expect("valid regex"));

impl Transform for SyntaxHighlighter {
    fn name(&self) -> &'static str {
        "syntax-highlight"
    }

    fn apply(&self, mut nodes: Vec<Node>, _ctx: &mut CompileContext) -> Result<Vec<Node>> {
        visit_code_blocks(&mut nodes);
        Ok(nodes)
    }
}

fn visit_code_blocks(nodes: &mut [Node]) {
    for node in nodes {
        match node {
            Node::CodeBlock { lang, .. } => {
                if let Some(hint) = lang.as_deref() {
                    if let Some(caps) = LANG_PREFIX_RE.captures(hint) {
                        *lang = Some(caps[1].to_lowercase());
                    }
                }
            }
            Node::BlockQuote { children } => visit_code_blocks(children),
            Node::List { items, .. } => {
                for item in items {
                    visit_code_blocks(item);
                }
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// EmbedResolver
// ---------------------------------------------------------------------------

/// Promotes paragraphs consisting of a single bare URL to [`Node::Embed`],
/// so the view layer can render players/frames instead of a text link.
#[derive(Debug, Default)]
pub struct EmbedResolver;

impl Transform for EmbedResolver {
    fn name(&self) -> &'static str {
        "embed"
    }

    fn apply(&self, mut nodes: Vec<Node>, _ctx: &mut CompileContext) -> Result<Vec<Node>> {
        visit_embeds(&mut nodes);
        Ok(nodes)
    }
}

fn visit_embeds(nodes: &mut [Node]) {
    for node in nodes {
        match node {
            Node::Paragraph { children } => {
                if let Some(url) = bare_url(children) {
                    *node = Node::Embed { url };
                }
            }
            Node::BlockQuote { children } => visit_embeds(children),
            Node::List { items, .. } => {
                for item in items {
                    visit_embeds(item);
                }
            }
            _ => {}
        }
    }
}

/// A paragraph is a bare URL when its only content is one http(s) link or one
/// text run that is itself a URL.
fn bare_url(children: &[Node]) -> Option<String> {
    let [only] = children else {
        return None;
    };

    let candidate = match only {
        Node::Text { value } => value.trim(),
        Node::Link { href, children } => {
            // Autolinks and `[url](url)` style self-links.
            let text = collect_text(children);
            if text.trim() == href.as_str() {
                href.as_str()
            } else {
                return None;
            }
        }
        _ => return None,
    };

    let is_url = (candidate.starts_with("https://") || candidate.starts_with("http://"))
        && !candidate.contains(char::is_whitespace);

    is_url.then(|| candidate.to_string())
}
