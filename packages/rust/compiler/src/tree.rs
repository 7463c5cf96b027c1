//! Markdown event stream to render-tree construction.
//!
//! The compiled tree is plain data; nothing here evaluates document text.
//! Raw inline HTML that survived sanitation is dropped, matching the
//! leftover-HTML stripping done during normalization.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag};

use docshelf_shared::Node;

/// Build a render tree from a sanitized markdown body.
pub(crate) fn build_tree(content: &str) -> Vec<Node> {
    let parser = Parser::new(content);
    let mut builder = TreeBuilder::new();

    for event in parser {
        builder.handle(event);
    }

    builder.finish()
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

// ---------------------------------------------------------------------------
// TreeBuilder
// ---------------------------------------------------------------------------

/// One open container on the builder stack.
enum Container {
    Heading { level: u8, children: Vec<Node> },
    Paragraph { children: Vec<Node> },
    Emphasis { children: Vec<Node> },
    Strong { children: Vec<Node> },
    BlockQuote { children: Vec<Node> },
    Link { href: String, children: Vec<Node> },
    Image { src: String, alt: String },
    List { ordered: bool, items: Vec<Vec<Node>> },
    Item { children: Vec<Node> },
    CodeBlock { lang: Option<String>, value: String },
}

struct TreeBuilder {
    root: Vec<Node>,
    stack: Vec<Container>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            root: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.push_node(Node::Code {
                value: code.to_string(),
            }),
            Event::SoftBreak => self.text(" "),
            Event::HardBreak => self.text("\n"),
            Event::Rule => self.push_node(Node::Rule),
            // Inline/block HTML and footnote markers are dropped from the tree.
            Event::Html(_) | Event::FootnoteReference(_) | Event::TaskListMarker(_) => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let container = match tag {
            Tag::Heading(level, _, _) => Container::Heading {
                level: heading_level(level),
                children: Vec::new(),
            },
            Tag::Paragraph => Container::Paragraph {
                children: Vec::new(),
            },
            Tag::Emphasis => Container::Emphasis {
                children: Vec::new(),
            },
            Tag::Strong => Container::Strong {
                children: Vec::new(),
            },
            Tag::BlockQuote => Container::BlockQuote {
                children: Vec::new(),
            },
            Tag::Link(_, href, _) => Container::Link {
                href: href.to_string(),
                children: Vec::new(),
            },
            Tag::Image(_, src, _) => Container::Image {
                src: src.to_string(),
                alt: String::new(),
            },
            Tag::List(start) => Container::List {
                ordered: start.is_some(),
                items: Vec::new(),
            },
            Tag::Item => Container::Item {
                children: Vec::new(),
            },
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => {
                        let lang = info.split_whitespace().next().unwrap_or("").to_string();
                        (!lang.is_empty()).then_some(lang)
                    }
                    CodeBlockKind::Indented => None,
                };
                Container::CodeBlock {
                    lang,
                    value: String::new(),
                }
            }
            // Tables, footnote definitions, strikethrough: not parsed without
            // the matching extensions, but match them defensively as a
            // transparent container.
            _ => Container::Paragraph {
                children: Vec::new(),
            },
        };

        self.stack.push(container);
    }

    fn end(&mut self, _tag: Tag<'_>) {
        let Some(container) = self.stack.pop() else {
            return;
        };

        match container {
            Container::Heading { level, children } => self.push_node(Node::Heading {
                level,
                anchor: String::new(),
                children,
            }),
            Container::Paragraph { children } => self.push_node(Node::Paragraph { children }),
            Container::Emphasis { children } => self.push_node(Node::Emphasis { children }),
            Container::Strong { children } => self.push_node(Node::Strong { children }),
            Container::BlockQuote { children } => self.push_node(Node::BlockQuote { children }),
            Container::Link { href, children } => self.push_node(Node::Link { href, children }),
            Container::Image { src, alt } => self.push_node(Node::Image { src, alt }),
            Container::List { ordered, items } => self.push_node(Node::List { ordered, items }),
            Container::Item { children } => {
                if let Some(Container::List { items, .. }) = self.stack.last_mut() {
                    items.push(children);
                } else {
                    self.root.extend(children);
                }
            }
            Container::CodeBlock { lang, value } => self.push_node(Node::CodeBlock {
                lang,
                value: value.trim_end_matches('\n').to_string(),
            }),
        }
    }

    fn text(&mut self, text: &str) {
        match self.stack.last_mut() {
            Some(Container::CodeBlock { value, .. }) => value.push_str(text),
            Some(Container::Image { alt, .. }) => alt.push_str(text),
            _ => self.push_node(Node::Text {
                value: text.to_string(),
            }),
        }
    }

    fn push_node(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(
                Container::Heading { children, .. }
                | Container::Paragraph { children }
                | Container::Emphasis { children }
                | Container::Strong { children }
                | Container::BlockQuote { children }
                | Container::Link { children, .. }
                | Container::Item { children },
            ) => children.push(node),
            Some(Container::List { items, .. }) => {
                // A loose node directly under a list becomes its own item.
                items.push(vec![node]);
            }
            Some(Container::CodeBlock { .. } | Container::Image { .. }) | None => {
                self.root.push(node)
            }
        }
    }

    fn finish(self) -> Vec<Node> {
        self.root
    }
}
