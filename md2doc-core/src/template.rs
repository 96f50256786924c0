//! Template pass: Markdown to skeleton
//!
//!     One walk over the scanned elements, left to right, emitting blocks:
//!
//!     - heading           numbered heading block (the numberer is advanced first)
//!     - chart fence       caption + `${chartN}` placeholder
//!     - mermaid fence     `${mermaidN}` placeholder
//!     - table run         caption + `${tableN}` placeholder
//!     - image reference   caption + `${imageN}` placeholder, one per occurrence
//!     - other text        body paragraph, numbers grouped by thousands
//!
//!     Each kind keeps its own counter, so `table2` is the second table in the source no
//!     matter how many charts or images came before it. Resolution relies on this: the jobs
//!     it runs are read from the placeholders themselves, in the same order.
//!
//!     The skeleton always opens with a `${title}` paragraph and one empty line.

use crate::error::ParseError;
use crate::markdown::{scan, Element, FenceMarkers};
use crate::numbering::NumberingStyle;
use crate::skeleton::{
    Block, PlaceholderBlock, PlaceholderKind, PlaceholderSource, Skeleton, Span, TextBlock,
    TextRole,
};
use crate::text::format_thousands;

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateOptions {
    pub markers: FenceMarkers,
    pub numbering: NumberingStyle,
    /// Emit "表格 N：" style caption paragraphs before placeholders.
    pub captions: bool,
    /// Group digits by thousands in body text.
    pub group_digits: bool,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            markers: FenceMarkers::default(),
            numbering: NumberingStyle::default(),
            captions: true,
            group_digits: true,
        }
    }
}

/// Result of the template pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub skeleton: Skeleton,
    /// Text of the first non-empty heading, before numbering.
    pub first_heading: Option<String>,
    /// Recoverable problems found while building.
    pub warnings: Vec<ParseError>,
}

#[derive(Debug, Default)]
struct Counters {
    table: usize,
    image: usize,
    chart: usize,
    mermaid: usize,
}

impl Counters {
    fn next(&mut self, kind: PlaceholderKind) -> usize {
        let slot = match kind {
            PlaceholderKind::Table => &mut self.table,
            PlaceholderKind::Image => &mut self.image,
            PlaceholderKind::Chart => &mut self.chart,
            PlaceholderKind::Mermaid => &mut self.mermaid,
        };
        *slot += 1;
        *slot
    }
}

pub struct TemplateBuilder {
    options: TemplateOptions,
}

impl TemplateBuilder {
    pub fn new(options: TemplateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TemplateOptions {
        &self.options
    }

    pub fn build(&self, source: &str) -> Template {
        let mut skeleton = Skeleton::new();
        let mut numberer = self.options.numbering.numberer();
        let mut counters = Counters::default();
        let mut first_heading = None;
        let mut warnings = Vec::new();

        skeleton.push(Block::Text(TextBlock::new(TextRole::Title, "${title}")));
        skeleton.push(Block::Text(TextBlock::literal(TextRole::Body, "")));

        for element in scan(source, &self.options.markers) {
            match element {
                Element::Heading { level, text, .. } => {
                    numberer.enter(level);
                    if first_heading.is_none() && !text.is_empty() {
                        first_heading = Some(text.clone());
                    }
                    skeleton.push(Block::Heading {
                        level,
                        text: numberer.numbered(level, &text),
                    });
                }
                Element::Chart {
                    line,
                    body,
                    terminated,
                } => {
                    if !terminated {
                        warnings.push(ParseError::UnterminatedFence { line, kind: "chart" });
                    }
                    let n = counters.next(PlaceholderKind::Chart);
                    self.caption(&mut skeleton, format!("图表 {n}："));
                    skeleton.push(placeholder(
                        PlaceholderKind::Chart,
                        n,
                        line,
                        PlaceholderSource::Chart { body, terminated },
                    ));
                }
                Element::Mermaid {
                    line,
                    body,
                    terminated,
                } => {
                    if !terminated {
                        warnings.push(ParseError::UnterminatedFence {
                            line,
                            kind: "mermaid",
                        });
                    }
                    let n = counters.next(PlaceholderKind::Mermaid);
                    skeleton.push(placeholder(
                        PlaceholderKind::Mermaid,
                        n,
                        line,
                        PlaceholderSource::Mermaid { body, terminated },
                    ));
                }
                Element::Table { line, raw } => {
                    let n = counters.next(PlaceholderKind::Table);
                    self.caption(&mut skeleton, format!("表格 {n}："));
                    skeleton.push(placeholder(
                        PlaceholderKind::Table,
                        n,
                        line,
                        PlaceholderSource::Table { raw },
                    ));
                }
                Element::Images { line, images, rest } => {
                    if !rest.is_empty() {
                        skeleton.push(Block::Text(self.body(&rest)));
                    }
                    for image in images {
                        let n = counters.next(PlaceholderKind::Image);
                        self.caption(&mut skeleton, format!("图片 {n}：{}", image.title));
                        skeleton.push(placeholder(
                            PlaceholderKind::Image,
                            n,
                            line,
                            PlaceholderSource::Image(image),
                        ));
                    }
                }
                Element::Text { text, .. } => {
                    skeleton.push(Block::Text(self.body(text.trim())));
                }
            }
        }

        for warning in &warnings {
            log::warn!("{warning}");
        }

        Template {
            skeleton,
            first_heading,
            warnings,
        }
    }

    fn caption(&self, skeleton: &mut Skeleton, text: String) {
        if self.options.captions {
            skeleton.push(Block::Text(TextBlock::literal(TextRole::Caption, text)));
        }
    }

    /// Body paragraph; digit grouping touches literal text only, never token keys.
    fn body(&self, text: &str) -> TextBlock {
        let mut block = TextBlock::new(TextRole::Body, text);
        if self.options.group_digits {
            for span in &mut block.spans {
                if let Span::Literal(s) = span {
                    *s = format_thousands(s);
                }
            }
        }
        block
    }
}

fn placeholder(kind: PlaceholderKind, n: usize, line: usize, payload: PlaceholderSource) -> Block {
    Block::Placeholder(PlaceholderBlock {
        kind,
        key: kind.key(n),
        line,
        payload,
    })
}
