//! Document writers
//!
//! A writer takes a fully substituted [`Skeleton`] and produces the bytes of the
//! output file. Only DOCX is implemented; the trait keeps the orchestrator
//! independent of the file format library.

pub mod docx;
pub mod styles;

use crate::error::ConvertError;
use crate::skeleton::Skeleton;
use serde::{Deserialize, Serialize};

pub use docx::DocxWriter;

/// Output format backend.
pub trait DocumentWriter: Send + Sync {
    /// Short name, e.g. "docx".
    fn name(&self) -> &str;

    /// File extension without the leading dot.
    fn extension(&self) -> &str;

    /// Serialize a resolved skeleton. Leftover placeholders are written as their fallback label.
    fn write(&self, skeleton: &Skeleton) -> Result<Vec<u8>, ConvertError>;
}

/// Fonts, sizes and colours used by the writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Typography {
    pub body_font: String,
    pub title_font: String,
    pub table_font: String,
    pub body_size_pt: f32,
    pub title_size_pt: f32,
    /// Hex fill of the table header row, without `#`.
    pub header_fill: String,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            body_font: "仿宋".to_string(),
            title_font: "宋体".to_string(),
            table_font: "宋体".to_string(),
            body_size_pt: 14.0,
            title_size_pt: 22.0,
            header_fill: "B4C6E7".to_string(),
        }
    }
}

/// Point size to the half-point units used by DOCX run sizes.
pub fn half_points(pt: f32) -> usize {
    (pt * 2.0).round().max(1.0) as usize
}
