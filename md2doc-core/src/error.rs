//! Error types for conversion operations
//!
//! Errors fall into two groups. Block-level errors ([`ParseError`],
//! [`ResolutionError`], [`SubstitutionError`]) are recovered where they occur:
//! the offending block gets a default or a visible fallback and the rest of the
//! document is still processed. [`ConvertError`] is fatal and aborts the whole
//! conversion without leaving an output file behind.

use std::path::PathBuf;
use thiserror::Error;

/// Malformed Markdown construct. Recovered locally by skipping or defaulting the block.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// A fenced block was opened but never closed before end of input.
    #[error("unterminated {kind} fence opened at line {line}")]
    UnterminatedFence { line: usize, kind: &'static str },
    /// The chart body could not be read as a chart specification.
    #[error("invalid chart specification: {0}")]
    InvalidChart(String),
    /// A table run contained no data rows after separator removal.
    #[error("table at line {line} has no rows")]
    EmptyTable { line: usize },
}

/// A placeholder value could not be produced by an external collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    #[error("image source not found: {0}")]
    NotFound(String),
    #[error("fetching {source_url} failed after {attempts} attempt(s): {reason}")]
    Network {
        source_url: String,
        attempts: u32,
        reason: String,
    },
    #[error("could not decode image data: {0}")]
    Decode(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("chart rendering failed: {0}")]
    Render(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("resolution cancelled")]
    Cancelled,
}

/// Materializing one placeholder into the document failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubstitutionError {
    #[error("placeholder {key} expects {expected} but the resolved value is {found}")]
    KindMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("placeholder {key} has no resolved value")]
    Unresolved { key: String },
}

/// Fatal conversion failure.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("markdown input is empty")]
    EmptyInput,
    #[error("unsupported input file {0} (expected .md or .markdown)")]
    UnsupportedInput(PathBuf),
    #[error("could not read {path}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("skeleton artifact I/O failed at {path}")]
    TemplateIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("skeleton artifact could not be encoded")]
    TemplateEncoding(#[from] serde_json::Error),
    #[error("document writer failed: {0}")]
    Render(String),
    #[error("could not write {path}")]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("conversion cancelled")]
    Cancelled,
}

impl ConvertError {
    /// Formats this error and every `source()` below it, one cause per line.
    pub fn cause_chain(&self) -> String {
        let mut out = self.to_string();
        let mut current = std::error::Error::source(self);
        while let Some(cause) = current {
            out.push_str("\n  caused by: ");
            out.push_str(&cause.to_string());
            current = cause.source();
        }
        out
    }
}
