//! Block extractors
//!
//! Document-order lists of headings, chart bodies, table blocks and images.
//! Headings, charts and tables come from the element scanner; images are
//! matched anywhere in the raw text.

use super::classify::{self, FenceMarkers, ImageRef};
use super::scan::{scan, Element};
use crate::error::ParseError;
use serde::Serialize;

/// A heading as written in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// Every heading in document order.
pub fn extract_headings(source: &str, markers: &FenceMarkers) -> Vec<Heading> {
    scan(source, markers)
        .into_iter()
        .filter_map(|element| match element {
            Element::Heading { level, text, .. } => Some(Heading { level, text }),
            _ => None,
        })
        .collect()
}

/// Bodies of every chart fence, without the marker lines.
///
/// A fence that is never closed yields `Err(ParseError::UnterminatedFence)`
/// in its position; later fences are unaffected.
pub fn extract_chart_blocks(
    source: &str,
    markers: &FenceMarkers,
) -> Vec<Result<String, ParseError>> {
    scan(source, markers)
        .into_iter()
        .filter_map(|element| match element {
            Element::Chart {
                body: _,
                terminated: false,
                line,
            } => Some(Err(ParseError::UnterminatedFence {
                line,
                kind: "chart",
            })),
            Element::Chart { body, .. } => Some(Ok(body)),
            _ => None,
        })
        .collect()
}

/// Raw text of every pipe-table run of at least two lines.
pub fn extract_tables(source: &str, markers: &FenceMarkers) -> Vec<String> {
    scan(source, markers)
        .into_iter()
        .filter_map(|element| match element {
            Element::Table { raw, .. } => Some(raw),
            _ => None,
        })
        .collect()
}

/// Every image reference anywhere in the text, left to right.
pub fn extract_images(source: &str) -> Vec<ImageRef> {
    classify::find_images(source)
}

/// Text of the first heading, if any.
pub fn first_heading(source: &str, markers: &FenceMarkers) -> Option<String> {
    extract_headings(source, markers)
        .into_iter()
        .map(|h| h.text)
        .find(|text| !text.is_empty())
}
