//! Placeholder substitution
//!
//!     Walks the skeleton once and replaces, in place:
//!
//!     - placeholder blocks with the materialized value: a [`TableBlock`] for grids, a
//!       [`PictureBlock`] for images, code text for mermaid sources;
//!     - `Token` spans in text blocks with the resolved text.
//!
//!     Anything that cannot be materialized becomes a visible fallback label and a
//!     [`SubstitutionError`] in the report; the rest of the document is still processed.
//!     Replaced blocks and spans are no longer placeholders, so a second run is a no-op.

use crate::error::SubstitutionError;
use crate::resolve::{ResolvedValue, ValueMap};
use crate::skeleton::{
    fallback_label, Block, PictureBlock, PlaceholderBlock, PlaceholderKind, Skeleton, Span,
    TableBlock, TextBlock, TextRole,
};
use crate::text::{format_cell, format_thousands};

pub const EMU_PER_INCH: f64 = 914_400.0;

/// Print-area bounds for inline pictures.
#[derive(Debug, Clone, PartialEq)]
pub struct PictureLayout {
    pub max_width_in: f64,
    pub max_height_in: f64,
    pub min_width_in: f64,
    /// Pixels per inch assumed for raster sizes.
    pub dpi: u32,
}

impl Default for PictureLayout {
    fn default() -> Self {
        Self {
            max_width_in: 6.0,
            max_height_in: 8.0,
            min_width_in: 1.5,
            dpi: 96,
        }
    }
}

/// Picture size in EMU for a `width_px x height_px` raster.
///
/// The aspect ratio is kept. Pictures larger than the maximum box are shrunk
/// into it; pictures narrower than the minimum width are enlarged up to it,
/// unless that would break the maximum box, which always wins.
pub fn fit_picture(width_px: u32, height_px: u32, layout: &PictureLayout) -> (u32, u32) {
    let dpi = layout.dpi.max(1) as f64;
    let w_in = width_px.max(1) as f64 / dpi;
    let h_in = height_px.max(1) as f64 / dpi;

    let ceiling = (layout.max_width_in / w_in).min(layout.max_height_in / h_in);
    let mut scale = ceiling.min(1.0);
    if w_in * scale < layout.min_width_in {
        scale = (layout.min_width_in / w_in).min(ceiling);
    }

    let emu = |inches: f64| (inches * scale * EMU_PER_INCH).round() as u32;
    (emu(w_in).max(1), emu(h_in).max(1))
}

#[derive(Debug, Default, PartialEq)]
pub struct SubstitutionReport {
    /// Placeholders and tokens replaced with their value.
    pub resolved: usize,
    /// Placeholders and tokens replaced with a fallback label.
    pub errors: Vec<SubstitutionError>,
}

pub struct Substituter {
    layout: PictureLayout,
    group_digits: bool,
}

impl Substituter {
    pub fn new(layout: PictureLayout, group_digits: bool) -> Self {
        Self {
            layout,
            group_digits,
        }
    }

    pub fn apply(&self, skeleton: &mut Skeleton, values: &ValueMap) -> SubstitutionReport {
        let mut report = SubstitutionReport::default();

        for block in &mut skeleton.blocks {
            match block {
                Block::Placeholder(placeholder) => {
                    let replacement = self.materialize(placeholder, values, &mut report);
                    *block = replacement;
                }
                Block::Text(text) => self.fill_tokens(text, values, &mut report),
                _ => {}
            }
        }

        for error in &report.errors {
            log::warn!("{error}");
        }
        report
    }

    fn materialize(
        &self,
        placeholder: &PlaceholderBlock,
        values: &ValueMap,
        report: &mut SubstitutionReport,
    ) -> Block {
        let key = placeholder.key.clone();
        let Some(value) = values.get(&key) else {
            report.errors.push(SubstitutionError::Unresolved { key });
            return fallback(placeholder);
        };

        let block = match (placeholder.kind, value) {
            (PlaceholderKind::Table | PlaceholderKind::Chart, ResolvedValue::Grid(rows)) => {
                Block::Table(TableBlock {
                    key,
                    rows: rows
                        .iter()
                        .map(|row| row.iter().map(|cell| format_cell(cell)).collect())
                        .collect(),
                })
            }
            (
                PlaceholderKind::Image | PlaceholderKind::Chart,
                ResolvedValue::Image {
                    bytes,
                    width,
                    height,
                },
            ) => {
                let (width_emu, height_emu) = fit_picture(*width, *height, &self.layout);
                Block::Picture(PictureBlock {
                    key,
                    bytes: bytes.clone(),
                    width_emu,
                    height_emu,
                })
            }
            (PlaceholderKind::Mermaid, ResolvedValue::Text(code)) => {
                Block::Text(TextBlock::literal(TextRole::Code, code.clone()))
            }
            (kind, found) => {
                report.errors.push(SubstitutionError::KindMismatch {
                    key,
                    expected: expected_value(kind),
                    found: found.kind_name(),
                });
                return fallback(placeholder);
            }
        };
        report.resolved += 1;
        block
    }

    fn fill_tokens(&self, text: &mut TextBlock, values: &ValueMap, report: &mut SubstitutionReport) {
        let group = self.group_digits;
        for span in &mut text.spans {
            let Span::Token(key) = span else {
                continue;
            };
            match values.get(key) {
                Some(ResolvedValue::Text(value)) => {
                    let value = if group {
                        format_thousands(value)
                    } else {
                        value.clone()
                    };
                    *span = Span::Literal(value);
                    report.resolved += 1;
                }
                Some(other) => {
                    report.errors.push(SubstitutionError::KindMismatch {
                        key: key.clone(),
                        expected: "text",
                        found: other.kind_name(),
                    });
                    *span = Span::Literal(fallback_label("text", key));
                }
                None => log::debug!("leaving unknown token ${{{key}}} as written"),
            }
        }
    }
}

fn expected_value(kind: PlaceholderKind) -> &'static str {
    match kind {
        PlaceholderKind::Table => "grid",
        PlaceholderKind::Image => "image",
        PlaceholderKind::Chart => "image or grid",
        PlaceholderKind::Mermaid => "text",
    }
}

fn fallback(placeholder: &PlaceholderBlock) -> Block {
    Block::Text(TextBlock::literal(
        TextRole::Body,
        placeholder.fallback_label(),
    ))
}

/// Substitute with default picture layout.
pub fn substitute(
    skeleton: &mut Skeleton,
    values: &ValueMap,
    group_digits: bool,
) -> SubstitutionReport {
    Substituter::new(PictureLayout::default(), group_digits).apply(skeleton, values)
}
