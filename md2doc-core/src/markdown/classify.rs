//! Line classification
//!
//! Pure functions deciding what Markdown element a single line belongs to.
//! Multi-line constructs (fences, table runs) are assembled by the scanner in
//! [`super::scan`]; this module only looks at one line at a time.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").unwrap());

static IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"!\[([^\]]*)\]\(([^\s)]+)(?:\s+"([^"]*)")?\)"#).unwrap());

/// Fence marker lines recognized by the scanner. Lines are compared after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FenceMarkers {
    pub chart_open: Vec<String>,
    pub close: String,
    pub mermaid_open: String,
}

impl Default for FenceMarkers {
    fn default() -> Self {
        Self {
            chart_open: vec!["```echarts".to_string(), "```chart".to_string()],
            close: "```".to_string(),
            mermaid_open: "```mermaid".to_string(),
        }
    }
}

impl FenceMarkers {
    pub fn is_chart_open(&self, line: &str) -> bool {
        let line = line.trim();
        self.chart_open.iter().any(|marker| marker == line)
    }

    pub fn is_mermaid_open(&self, line: &str) -> bool {
        line.trim() == self.mermaid_open
    }

    pub fn is_close(&self, line: &str) -> bool {
        line.trim() == self.close
    }
}

/// Kind of a single Markdown line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    Heading { level: u8, text: &'a str },
    ChartOpen,
    MermaidOpen,
    FenceClose,
    TableRow,
    Separator,
    Image,
    Text,
}

/// An inline image reference `![alt](url "title")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub alt: String,
    pub url: String,
    /// Explicit title, or the alt text when none was given.
    pub title: String,
}

/// Classify one line. Fence markers take precedence over table and image detection.
pub fn classify_line<'a>(line: &'a str, markers: &FenceMarkers) -> LineKind<'a> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if let Some((level, text)) = heading(line) {
        return LineKind::Heading { level, text };
    }
    if markers.is_chart_open(trimmed) {
        return LineKind::ChartOpen;
    }
    if markers.is_mermaid_open(trimmed) {
        return LineKind::MermaidOpen;
    }
    if markers.is_close(trimmed) {
        return LineKind::FenceClose;
    }
    if is_table_row(line) {
        return LineKind::TableRow;
    }
    if is_separator_line(line) {
        return LineKind::Separator;
    }
    if IMAGE.is_match(trimmed) {
        return LineKind::Image;
    }
    LineKind::Text
}

/// Returns `(level, text)` when the line is an ATX heading with 1-6 `#`.
pub fn heading(line: &str) -> Option<(u8, &str)> {
    let caps = HEADING.captures(line.trim())?;
    let level = caps.get(1)?.as_str().len() as u8;
    let text = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
    Some((level, text))
}

pub fn is_table_row(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

/// A pipe-table separator: only `-`, `|`, `:` and whitespace, with at least one `-`.
pub fn is_separator_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed.contains('-')
        && trimmed
            .chars()
            .all(|c| matches!(c, '-' | '|' | ':') || c.is_whitespace())
}

/// All image references in `text`, left to right, one per occurrence.
pub fn find_images(text: &str) -> Vec<ImageRef> {
    IMAGE
        .captures_iter(text)
        .map(|caps| {
            let alt = caps
                .get(1)
                .map(|m| m.as_str().trim())
                .unwrap_or_default()
                .to_string();
            let url = caps
                .get(2)
                .map(|m| m.as_str().trim())
                .unwrap_or_default()
                .to_string();
            let title = caps
                .get(3)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_else(|| alt.clone());
            ImageRef { alt, url, title }
        })
        .collect()
}

/// `text` with every image reference removed.
pub fn strip_images(text: &str) -> String {
    IMAGE.replace_all(text, "").into_owned()
}
