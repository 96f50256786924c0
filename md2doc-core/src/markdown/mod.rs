//! Markdown subset reader
//!
//!     Only the constructs a report needs are recognized: ATX headings, pipe tables, fenced
//!     chart and mermaid blocks, inline images and plain paragraphs. Everything else is text.
//!
//!     - classify.rs   per-line classification, image matching
//!     - scan.rs       groups lines into block elements (fences, table runs)
//!     - extract.rs    document-order lists built on the scanner
//!     - table.rs      pipe-table cell parser

pub mod classify;
pub mod extract;
pub mod scan;
pub mod table;

pub use classify::{FenceMarkers, ImageRef, LineKind};
pub use extract::{
    extract_chart_blocks, extract_headings, extract_images, extract_tables, first_heading,
    Heading,
};
pub use scan::{scan, Element};
pub use table::parse_table;
