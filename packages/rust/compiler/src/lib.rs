//! Content compilation: sanitized markdown → render tree + outline.
//!
//! Compilation is side-effect-free and per-document. The body is parsed into
//! a structured [`Node`] tree, then run through a pipeline of transforms in a
//! fixed order: outline extraction, syntax-highlight normalization, embed
//! resolution. Custom transforms can be appended after the built-ins.
//!
//! The output tree is inert data for a view layer; this crate never evaluates
//! document content as code, so compiling content from an unvetted source
//! cannot execute anything. Acquisition (which repositories are fetched at
//! all) remains the trust boundary.

mod transforms;
mod tree;

use tracing::{debug, instrument};

use docshelf_shared::{CompiledDoc, Node, OutlineEntry, Result};

pub use transforms::{EmbedResolver, OutlineExtractor, SyntaxHighlighter};

// ---------------------------------------------------------------------------
// Transform contract
// ---------------------------------------------------------------------------

/// Shared state threaded through the transform pipeline.
///
/// The outline accumulator is fully populated by the time [`Compiler::compile`]
/// returns.
#[derive(Debug, Default)]
pub struct CompileContext {
    /// Heading entries appended in document order by the outline transform.
    pub outline: Vec<OutlineEntry>,
}

/// A single pass over the render tree.
///
/// Transforms take ownership of the node list and return the (possibly
/// rewritten) list; they may record side-channel data on the context.
pub trait Transform: Send + Sync {
    /// Short identifier used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Apply this transform to the tree.
    fn apply(&self, nodes: Vec<Node>, ctx: &mut CompileContext) -> Result<Vec<Node>>;
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

/// Compiles document bodies through the transform pipeline.
pub struct Compiler {
    transforms: Vec<Box<dyn Transform>>,
}

impl Compiler {
    /// Compiler with the standard pipeline: outline extraction, then
    /// syntax-highlight normalization, then embed resolution.
    pub fn new() -> Self {
        Self {
            transforms: vec![
                Box::new(OutlineExtractor),
                Box::new(SyntaxHighlighter),
                Box::new(EmbedResolver),
            ],
        }
    }

    /// Append a custom transform after the built-in pipeline.
    pub fn with_transform(mut self, transform: Box<dyn Transform>) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Compile one sanitized document body.
    ///
    /// Deterministic for a given input: the same content always yields the
    /// same outline sequence and tree. A transform failure fails the whole
    /// call; no partial outline is returned.
    #[instrument(skip_all, fields(bytes = content.len()))]
    pub fn compile(&self, content: &str) -> Result<CompiledDoc> {
        let mut nodes = tree::build_tree(content);
        let mut ctx = CompileContext::default();

        for transform in &self.transforms {
            nodes = transform.apply(nodes, &mut ctx)?;
            debug!(transform = transform.name(), nodes = nodes.len(), "transform applied");
        }

        Ok(CompiledDoc {
            outline: ctx.outline,
            tree: nodes,
        })
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_extracts_outline_in_document_order() {
        let compiled = Compiler::new().compile("# A\n\nintro\n\n## B\n\nmore").unwrap();

        let pairs: Vec<(u8, &str)> = compiled
            .outline
            .iter()
            .map(|e| (e.level, e.text.as_str()))
            .collect();
        assert_eq!(pairs, [(1, "A"), (2, "B")]);
    }

    #[test]
    fn compile_is_deterministic() {
        let content = "# Animation\n\n## Keyframes\n\n```language-js\nanimate()\n```\n";
        let compiler = Compiler::new();

        let first = compiler.compile(content).unwrap();
        let second = compiler.compile(content).unwrap();

        let levels_and_text = |doc: &CompiledDoc| {
            doc.outline
                .iter()
                .map(|e| (e.level, e.text.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(levels_and_text(&first), levels_and_text(&second));
        assert_eq!(first.tree, second.tree);
    }

    #[test]
    fn compile_runs_full_pipeline() {
        let content = "# Demo\n\n```language-python\nprint('hi')\n```\n\nhttps://example.com/clip.mp4\n";
        let compiled = Compiler::new().compile(content).unwrap();

        assert_eq!(compiled.outline[0].anchor, "demo");
        assert!(compiled.tree.iter().any(|n| matches!(
            n,
            Node::CodeBlock { lang: Some(l), .. } if l == "python"
        )));
        assert!(compiled
            .tree
            .iter()
            .any(|n| matches!(n, Node::Embed { .. })));
    }

    #[test]
    fn compile_empty_content() {
        let compiled = Compiler::new().compile("").unwrap();
        assert!(compiled.outline.is_empty());
        assert!(compiled.tree.is_empty());
    }

    #[test]
    fn custom_transform_runs_after_builtins() {
        struct Uppercase;

        impl Transform for Uppercase {
            fn name(&self) -> &'static str {
                "uppercase"
            }

            fn apply(
                &self,
                mut nodes: Vec<Node>,
                _ctx: &mut CompileContext,
            ) -> Result<Vec<Node>> {
                for node in &mut nodes {
                    if let Node::Paragraph { children } = node {
                        for child in children {
                            if let Node::Text { value } = child {
                                *value = value.to_uppercase();
                            }
                        }
                    }
                }
                Ok(nodes)
            }
        }

        let compiled = Compiler::new()
            .with_transform(Box::new(Uppercase))
            .compile("hello world")
            .unwrap();

        assert!(matches!(
            &compiled.tree[0],
            Node::Paragraph { children } if matches!(
                &children[0],
                Node::Text { value } if value == "HELLO WORLD"
            )
        ));
    }

    #[test]
    fn failing_transform_fails_the_compile() {
        struct Failing;

        impl Transform for Failing {
            fn name(&self) -> &'static str {
                "failing"
            }

            fn apply(&self, _nodes: Vec<Node>, _ctx: &mut CompileContext) -> Result<Vec<Node>> {
                Err(docshelf_shared::DocshelfError::compile("unsupported embed"))
            }
        }

        let result = Compiler::new()
            .with_transform(Box::new(Failing))
            .compile("# Heading");
        assert!(result.is_err());
    }
}
