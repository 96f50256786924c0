//! Document skeleton
//!
//!     The skeleton is the ordered block list produced by the template pass. Placeholder
//!     blocks stand in for content that is resolved later; text blocks hold their content
//!     as spans, where a [`Span::Token`] is an unresolved `${key}` reference.
//!
//!     Tokens are found once, when a text block is created, by [`tokenize`]. Substitution
//!     only ever replaces `Token` spans with `Literal` spans, so a resolved value that
//!     happens to contain `${...}` is never scanned again, and running substitution twice
//!     changes nothing.
//!
//!     Lifecycle: built by [`crate::template::TemplateBuilder`], serialized to the skeleton
//!     artifact, read back, mutated in place by [`crate::substitute`], then handed to the
//!     document writer.

use crate::markdown::ImageRef;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skeleton {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A heading with its numbering label already applied.
    Heading { level: u8, text: String },
    Placeholder(PlaceholderBlock),
    Text(TextBlock),
    /// A resolved table. The first row is the header.
    Table(TableBlock),
    /// A resolved inline picture, sized in EMU.
    Picture(PictureBlock),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderKind {
    Table,
    Image,
    Chart,
    Mermaid,
}

impl PlaceholderKind {
    pub fn name(self) -> &'static str {
        match self {
            PlaceholderKind::Table => "table",
            PlaceholderKind::Image => "image",
            PlaceholderKind::Chart => "chart",
            PlaceholderKind::Mermaid => "mermaid",
        }
    }

    /// Placeholder key for the `n`th block of this kind (1-based).
    pub fn key(self, n: usize) -> String {
        format!("{}{n}", self.name())
    }
}

impl fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw Markdown a placeholder was built from, kept so resolution needs no second scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PlaceholderSource {
    Table { raw: String },
    Image(ImageRef),
    Chart { body: String, terminated: bool },
    Mermaid { body: String, terminated: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderBlock {
    pub kind: PlaceholderKind,
    pub key: String,
    /// 1-based source line of the construct.
    pub line: usize,
    pub payload: PlaceholderSource,
}

impl PlaceholderBlock {
    pub fn token(&self) -> String {
        format!("${{{}}}", self.key)
    }

    /// Label shown in place of a placeholder whose value could not be materialized.
    pub fn fallback_label(&self) -> String {
        fallback_label(self.kind.name(), &self.key)
    }
}

pub fn fallback_label(kind: &str, key: &str) -> String {
    format!("[{kind} placeholder not resolved: {key}]")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextRole {
    /// Centered bold document title.
    Title,
    /// Centered bold caption above a table, chart or image.
    Caption,
    Body,
    /// Preformatted source kept as written, one line per output line.
    Code,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "span", content = "value", rename_all = "snake_case")]
pub enum Span {
    Literal(String),
    /// An unresolved `${key}` reference, holding the key.
    Token(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub role: TextRole,
    pub spans: Vec<Span>,
}

impl TextBlock {
    pub fn new(role: TextRole, text: &str) -> Self {
        Self {
            role,
            spans: tokenize(text),
        }
    }

    pub fn literal(role: TextRole, text: impl Into<String>) -> Self {
        Self {
            role,
            spans: vec![Span::Literal(text.into())],
        }
    }

    /// The text with unresolved tokens written back as `${key}`.
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|span| match span {
                Span::Literal(s) => s.clone(),
                Span::Token(key) => format!("${{{key}}}"),
            })
            .collect()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.spans.iter().filter_map(|span| match span {
            Span::Token(key) => Some(key.as_str()),
            Span::Literal(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(|span| matches!(span, Span::Literal(s) if s.is_empty()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableBlock {
    pub key: String,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PictureBlock {
    pub key: String,
    /// PNG (or other raster) bytes.
    pub bytes: Vec<u8>,
    pub width_emu: u32,
    pub height_emu: u32,
}

fn is_key_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// Split `text` into literal spans and `${identifier}` tokens.
///
/// An identifier is `[A-Za-z][A-Za-z0-9]*`. Anything that does not form a
/// complete token, such as `${}` or `${1x}` or an unclosed `${abc`, stays literal.
pub fn tokenize(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let ident_len = after
            .char_indices()
            .take_while(|(i, c)| {
                if *i == 0 {
                    is_key_start(*c)
                } else {
                    c.is_ascii_alphanumeric()
                }
            })
            .count();

        if ident_len > 0 && after[ident_len..].starts_with('}') {
            literal.push_str(&rest[..start]);
            if !literal.is_empty() {
                spans.push(Span::Literal(std::mem::take(&mut literal)));
            }
            spans.push(Span::Token(after[..ident_len].to_string()));
            rest = &after[ident_len + 1..];
        } else {
            literal.push_str(&rest[..start + 2]);
            rest = after;
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() || spans.is_empty() {
        spans.push(Span::Literal(literal));
    }
    spans
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &PlaceholderBlock> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Placeholder(p) => Some(p),
            _ => None,
        })
    }

    /// Placeholder keys and inline text tokens, in document order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Placeholder(p) => keys.push(p.key.clone()),
                Block::Text(t) => keys.extend(t.tokens().map(str::to_string)),
                _ => {}
            }
        }
        keys
    }

    pub fn is_resolved(&self) -> bool {
        self.blocks.iter().all(|block| match block {
            Block::Placeholder(_) => false,
            Block::Text(t) => t.tokens().next().is_none(),
            _ => true,
        })
    }

    /// One line per block, for diagnostics and snapshot tests.
    pub fn outline(&self) -> String {
        self.blocks
            .iter()
            .map(|block| match block {
                Block::Heading { level, text } => format!("H{level} {text}"),
                Block::Placeholder(p) => format!("[{}] {}", p.kind, p.token()),
                Block::Text(t) => {
                    let role = match t.role {
                        TextRole::Title => "title",
                        TextRole::Caption => "caption",
                        TextRole::Body => "text",
                        TextRole::Code => "code",
                    };
                    format!("{role}: {}", t.text())
                }
                Block::Table(t) => format!(
                    "table {} ({}x{})",
                    t.key,
                    t.rows.len(),
                    t.rows.iter().map(Vec::len).max().unwrap_or(0)
                ),
                Block::Picture(p) => {
                    format!("picture {} ({}x{} emu)", p.key, p.width_emu, p.height_emu)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
