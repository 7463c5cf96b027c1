//! Single-document parser: slug derivation, front matter, comment sanitation.
//!
//! Sanitation runs in two sequential passes. The first removes comment
//! markers used to hide the front-matter delimiters in plain (non-MDX)
//! markdown sources, so the block becomes parseable; the second strips every
//! remaining HTML comment from the body. Unmatched comment opens are left
//! alone rather than recovered.

use std::path::Path;
use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::trace;

use docshelf_shared::{Document, DocshelfError, FrontMatter, Result, Slug};

/// Comment markers at the start of the file that hide the leading
/// front-matter delimiter: zero or more whole comments, then an optional
/// bare open, each separated from the `---` by whitespace only. The
/// delimiter itself is captured and kept on replacement.
static HIDDEN_DELIM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A\s*(?:<!--.*?-->\s*)*(?:<!--\s*)?(---)").expect("valid regex")
});

/// Any remaining HTML comment block, matched non-greedily.
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));

// ---------------------------------------------------------------------------
// Parse
// ---------------------------------------------------------------------------

/// Parse one crawled file into a [`Document`].
///
/// `absolute_path` must live under `entry_path`; the remainder becomes the
/// document's relative path and, with the extension stripped from the last
/// segment and `library_id` prepended, its slug.
pub fn parse(
    bytes: &[u8],
    absolute_path: &Path,
    entry_path: &Path,
    library_id: &str,
) -> Result<Document> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        DocshelfError::parse(format!("{}: not valid UTF-8: {e}", absolute_path.display()))
    })?;

    let relative = absolute_path.strip_prefix(entry_path).map_err(|_| {
        DocshelfError::parse(format!(
            "{} is not under entry path {}",
            absolute_path.display(),
            entry_path.display()
        ))
    })?;

    let rel_str = relative.to_str().ok_or_else(|| {
        DocshelfError::parse(format!("{}: non-UTF-8 path", absolute_path.display()))
    })?;

    let slug = derive_slug(library_id, rel_str);

    // Pass 1, then front matter, then pass 2 over what remains.
    let unhidden = unhide_front_matter(text);
    let (front_matter, body) = split_front_matter(&unhidden, absolute_path)?;
    let content = strip_comments(body).trim().to_string();

    trace!(slug = %slug, path = rel_str, "parsed document");

    Ok(Document {
        library: library_id.to_string(),
        path: rel_str.to_string(),
        slug,
        front_matter,
        content_hash: content_hash(&content),
        content,
        fetched_at: Utc::now(),
    })
}

// ---------------------------------------------------------------------------
// Slug derivation
// ---------------------------------------------------------------------------

/// Split the relative path on separators, strip the extension from the last
/// segment, and prepend the library id. A last segment that is only an
/// extension (e.g. `.md`) leaves an empty segment, which is dropped.
fn derive_slug(library_id: &str, relative_path: &str) -> Slug {
    let mut segments: Vec<String> = vec![library_id.to_string()];
    let mut parts = relative_path.split('/').peekable();

    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            let stem = part.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(part);
            segments.push(stem.to_string());
        } else {
            segments.push(part.to_string());
        }
    }

    Slug::from_segments(segments)
}

// ---------------------------------------------------------------------------
// Sanitation pass 1: unhide front-matter delimiters
// ---------------------------------------------------------------------------

/// Remove comment markers wrapping the leading front-matter block: a comment
/// open (or complete comment) immediately preceding the first `---`, and any
/// stray `-->` left without a matching open.
fn unhide_front_matter(text: &str) -> String {
    let opened = HIDDEN_DELIM_RE.replace(text, "$1");
    strip_stray_closes(&opened)
}

/// Drop every `-->` that has no unmatched `<!--` before it.
fn strip_stray_closes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut open_depth = 0usize;

    loop {
        let next_open = rest.find("<!--");
        let next_close = rest.find("-->");

        match (next_open, next_close) {
            (Some(o), Some(c)) if o < c => {
                out.push_str(&rest[..o + 4]);
                open_depth += 1;
                rest = &rest[o + 4..];
            }
            (_, Some(c)) => {
                if open_depth > 0 {
                    out.push_str(&rest[..c + 3]);
                    open_depth -= 1;
                } else {
                    // Stray close: keep the text before it, drop the marker.
                    out.push_str(&rest[..c]);
                }
                rest = &rest[c + 3..];
            }
            (Some(o), None) => {
                out.push_str(&rest[..o + 4]);
                open_depth += 1;
                rest = &rest[o + 4..];
            }
            (None, None) => {
                out.push_str(rest);
                break;
            }
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Front matter
// ---------------------------------------------------------------------------

/// Split a leading `---` delimited YAML block from the body. A document
/// without the block yields an empty mapping and the full text as body.
fn split_front_matter<'a>(text: &'a str, origin: &Path) -> Result<(FrontMatter, &'a str)> {
    let Some(after_open) = text.strip_prefix("---") else {
        return Ok((FrontMatter::new(), text));
    };

    // The opening delimiter must be a full line.
    let Some(after_open) = after_open.strip_prefix('\n') else {
        return Ok((FrontMatter::new(), text));
    };

    let Some(close) = find_closing_delimiter(after_open) else {
        // Unterminated block: treat the whole text as body.
        return Ok((FrontMatter::new(), text));
    };

    let block = &after_open[..close.block_end];
    let body = after_open[close.body_start..].trim_start_matches('\n');

    let front_matter = if block.trim().is_empty() {
        FrontMatter::new()
    } else {
        serde_yaml::from_str(block).map_err(|e| {
            DocshelfError::parse(format!("{}: bad front matter: {e}", origin.display()))
        })?
    };

    Ok((front_matter, body))
}

struct ClosingDelimiter {
    block_end: usize,
    body_start: usize,
}

/// Locate the closing `---` line within the text following the opening one.
fn find_closing_delimiter(after_open: &str) -> Option<ClosingDelimiter> {
    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some(ClosingDelimiter {
                block_end: offset,
                body_start: offset + line.len(),
            });
        }
        offset += line.len();
    }

    None
}

// ---------------------------------------------------------------------------
// Sanitation pass 2: strip remaining comments
// ---------------------------------------------------------------------------

/// Remove all remaining HTML comment blocks, same-line ones included.
fn strip_comments(body: &str) -> String {
    COMMENT_RE.replace_all(body, "").to_string()
}

/// SHA-256 of the sanitized body, hex-encoded.
fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(text: &str, abs: &str, entry: &str, library: &str) -> Result<Document> {
        parse(text.as_bytes(), Path::new(abs), Path::new(entry), library)
    }

    #[test]
    fn slug_derivation_matches_contract() {
        let doc = parse_str(
            "# Intro",
            "/repo-main/docs/guide/intro.md",
            "/repo-main/docs",
            "lib",
        )
        .unwrap();

        assert_eq!(doc.slug.joined(), "lib/guide/intro");
        assert_eq!(doc.path, "guide/intro.md");
    }

    #[test]
    fn slug_drops_empty_trailing_segment() {
        // A file named only by its extension leaves an empty last segment;
        // the slug ends at the parent instead.
        let doc = parse_str("x", "/root/guide/.md", "/root", "lib").unwrap();
        assert_eq!(doc.slug.joined(), "lib/guide");
    }

    #[test]
    fn front_matter_round_trip() {
        let doc = parse_str("---\ntitle: X\n---\nBody", "/r/a.md", "/r", "lib").unwrap();

        assert_eq!(
            doc.front_matter.get("title"),
            Some(&serde_yaml::Value::String("X".into()))
        );
        assert_eq!(doc.content, "Body");
    }

    #[test]
    fn missing_front_matter_yields_empty_mapping() {
        let doc = parse_str("Just a body", "/r/a.md", "/r", "lib").unwrap();
        assert!(doc.front_matter.is_empty());
        assert_eq!(doc.content, "Just a body");
    }

    #[test]
    fn comment_sanitation_unhides_front_matter() {
        let doc = parse_str(
            "<!-- --> \n---\ntitle: A\n---\n<!-- hidden -->Visible",
            "/r/a.md",
            "/r",
            "lib",
        )
        .unwrap();

        assert_eq!(
            doc.front_matter.get("title"),
            Some(&serde_yaml::Value::String("A".into()))
        );
        assert!(doc.content.contains("Visible"));
        assert!(!doc.content.contains("<!--"));
        assert!(!doc.content.contains("-->"));
    }

    #[test]
    fn comment_wrap_around_front_matter() {
        // Plain-markdown sources hide the whole block inside one comment.
        let doc = parse_str(
            "<!--\n---\ntitle: Wrapped\n---\n-->\nBody text",
            "/r/a.md",
            "/r",
            "lib",
        )
        .unwrap();

        assert_eq!(
            doc.front_matter.get("title"),
            Some(&serde_yaml::Value::String("Wrapped".into()))
        );
        assert_eq!(doc.content, "Body text");
    }

    #[test]
    fn leading_comment_with_later_rule_keeps_prose() {
        // A comment followed by prose must not be folded into a later
        // thematic break; the prose is body text, not front matter.
        let doc = parse_str(
            "<!-- note -->\nIntro prose.\n\n---\n\nMore prose.",
            "/r/a.md",
            "/r",
            "lib",
        )
        .unwrap();

        assert!(doc.front_matter.is_empty());
        assert!(doc.content.contains("Intro prose."));
        assert!(doc.content.contains("More prose."));
        assert!(!doc.content.contains("note"));
    }

    #[test]
    fn thematic_breaks_are_not_front_matter() {
        let doc = parse_str("Alpha\n\n---\n\nBeta\n\n---\n\nGamma", "/r/a.md", "/r", "lib")
            .unwrap();

        assert!(doc.front_matter.is_empty());
        assert!(doc.content.contains("Alpha"));
        assert!(doc.content.contains("Beta"));
        assert!(doc.content.contains("Gamma"));
    }

    #[test]
    fn same_line_comments_are_stripped() {
        let doc = parse_str("Before <!-- note --> after", "/r/a.md", "/r", "lib").unwrap();
        assert_eq!(doc.content, "Before  after");
    }

    #[test]
    fn unmatched_open_is_left_alone() {
        let doc = parse_str("text <!-- dangling", "/r/a.md", "/r", "lib").unwrap();
        assert!(doc.content.contains("<!--"));
    }

    #[test]
    fn empty_file() {
        let doc = parse_str("", "/r/a.md", "/r", "lib").unwrap();
        assert!(doc.content.is_empty());
        assert!(doc.front_matter.is_empty());
        assert_eq!(doc.slug.joined(), "lib/a");
    }

    #[test]
    fn malformed_front_matter_is_a_parse_error() {
        let err = parse_str("---\n{not: [valid\n---\nBody", "/r/a.md", "/r", "lib").unwrap_err();
        assert!(err.to_string().contains("front matter"));
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let err = parse(
            &[0xff, 0xfe, 0x00],
            Path::new("/r/a.md"),
            Path::new("/r"),
            "lib",
        )
        .unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn path_outside_entry_is_a_parse_error() {
        assert!(parse_str("x", "/elsewhere/a.md", "/r", "lib").is_err());
    }

    #[test]
    fn content_hash_is_stable() {
        let a = parse_str("Body", "/r/a.md", "/r", "lib").unwrap();
        let b = parse_str("Body", "/r/b.md", "/r", "lib").unwrap();
        assert_eq!(a.content_hash, b.content_hash);
        assert_eq!(a.content_hash.len(), 64);
    }
}
