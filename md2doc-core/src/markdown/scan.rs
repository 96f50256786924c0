//! Element scanner
//!
//! One left-to-right pass over the document that groups lines into block
//! elements. The template builder and the block extractors both consume this
//! stream, so placeholder numbering and extraction order can never drift apart.

use super::classify::{self, FenceMarkers, ImageRef, LineKind};
use serde::Serialize;

/// A block-level Markdown element with the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    Heading {
        line: usize,
        level: u8,
        text: String,
    },
    Chart {
        line: usize,
        body: String,
        terminated: bool,
    },
    Mermaid {
        line: usize,
        body: String,
        terminated: bool,
    },
    Table {
        line: usize,
        raw: String,
    },
    Images {
        line: usize,
        images: Vec<ImageRef>,
        /// Text left on the line once the image references are removed.
        rest: String,
    },
    Text {
        line: usize,
        text: String,
    },
}

/// Scan `source` into elements. Blank lines produce nothing.
pub fn scan(source: &str, markers: &FenceMarkers) -> Vec<Element> {
    let lines: Vec<&str> = source
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect();
    let mut elements = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let line_no = i + 1;

        match classify::classify_line(line, markers) {
            LineKind::Blank => {
                i += 1;
            }
            LineKind::Heading { level, text } => {
                elements.push(Element::Heading {
                    line: line_no,
                    level,
                    text: text.to_string(),
                });
                i += 1;
            }
            kind @ (LineKind::ChartOpen | LineKind::MermaidOpen) => {
                let (body, terminated, next) = collect_fence(&lines, i + 1, markers);
                elements.push(if kind == LineKind::ChartOpen {
                    Element::Chart {
                        line: line_no,
                        body,
                        terminated,
                    }
                } else {
                    Element::Mermaid {
                        line: line_no,
                        body,
                        terminated,
                    }
                });
                i = next;
            }
            LineKind::TableRow => {
                let end = table_run_end(&lines, i);
                if end - i >= 2 {
                    elements.push(Element::Table {
                        line: line_no,
                        raw: lines[i..end].join("\n"),
                    });
                    i = end;
                } else {
                    push_text_line(&mut elements, line, line_no);
                    i += 1;
                }
            }
            LineKind::FenceClose | LineKind::Separator | LineKind::Image | LineKind::Text => {
                push_text_line(&mut elements, line, line_no);
                i += 1;
            }
        }
    }

    elements
}

/// Collects body lines up to the closing marker. Returns `(body, terminated, next_index)`.
fn collect_fence(lines: &[&str], start: usize, markers: &FenceMarkers) -> (String, bool, usize) {
    let mut body = Vec::new();
    let mut i = start;
    while i < lines.len() {
        if markers.is_close(lines[i]) {
            return (body.join("\n"), true, i + 1);
        }
        body.push(lines[i]);
        i += 1;
    }
    (body.join("\n"), false, i)
}

/// Index one past the last line of the table run starting at `start`.
fn table_run_end(lines: &[&str], start: usize) -> usize {
    let mut end = start + 1;
    while end < lines.len()
        && (classify::is_table_row(lines[end]) || classify::is_separator_line(lines[end]))
    {
        end += 1;
    }
    end
}

fn push_text_line(elements: &mut Vec<Element>, line: &str, line_no: usize) {
    let images = classify::find_images(line);
    if images.is_empty() {
        elements.push(Element::Text {
            line: line_no,
            text: line.to_string(),
        });
    } else {
        elements.push(Element::Images {
            line: line_no,
            rest: classify::strip_images(line).trim().to_string(),
            images,
        });
    }
}
