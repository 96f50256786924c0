//! Markdown to Word report conversion
//!
//!     This crate turns a Markdown report into a DOCX document with numbered headings, captioned
//!     tables, rendered charts and embedded images. It is a pure lib: it powers md2doc-cli but
//!     makes no assumption about a shell, so nothing here prints, reads env vars or exits.
//!
//!     TLDR:
//!         - Markdown is never parsed into a full AST. A line classifier and a block scanner
//!           recognize only what a report needs (headings, pipe tables, chart and mermaid fences,
//!           images) and everything else is text.
//!         - Conversion is two-phase: build a skeleton with `${key}` placeholders, then resolve
//!           every key and substitute the values back.
//!         - Every recoverable failure becomes a visible fallback label in the document plus a
//!           warning in the report. Only input, template and output I/O errors abort.
//!
//! Architecture
//!
//!     The pipeline (see ./convert.rs) runs in strict phases:
//!
//!         markdown ──► template ──► skeleton artifact ──► resolve ──► substitute ──► writer
//!
//!     - template: scans the source once, numbers headings, emits captions and placeholder
//!       blocks. Placeholders carry the raw Markdown they stand for, so resolution never
//!       rescans the source.
//!     - resolve: turns each placeholder into a value (table grid, chart picture or grid,
//!       image raster, text). Work items are independent and may run on the rayon pool; the
//!       results land in a write-once value map.
//!     - substitute: replaces placeholder blocks and inline tokens. Tokens are found once at
//!       template time, so substitution is idempotent and values are never rescanned.
//!     - writer: the DocumentWriter trait, with docx-rs behind it.
//!
//!     The file structure :
//!     .
//!     ├── error.rs                # Error enums per phase
//!     ├── markdown
//!     │   ├── classify.rs         # Line classification, image matching
//!     │   ├── scan.rs             # Block scanner shared by template and extractors
//!     │   ├── extract.rs          # Document-order extractors
//!     │   └── table.rs            # Pipe-table cell parser
//!     ├── numbering.rs            # Heading numbering schemes
//!     ├── text.rs                 # Thousands separators
//!     ├── skeleton.rs             # Block model, tokens, placeholders
//!     ├── template.rs             # Markdown -> skeleton
//!     ├── chart
//!     │   ├── mod.rs              # Chart data model and relaxed-JSON parsing
//!     │   └── render.rs           # SVG charts rasterized with resvg
//!     ├── resolve
//!     │   ├── mod.rs              # Value map, resolver, cancellation
//!     │   ├── image.rs            # Local and remote image loading
//!     │   └── cache.rs            # Content-addressed asset cache
//!     ├── substitute.rs           # Placeholder and token substitution
//!     ├── writer                  # DocumentWriter trait and the DOCX writer
//!     └── convert.rs              # The orchestrator
//!
//! Testing
//!     tests
//!     ├── lib.rs                  # Aggregates the modules below
//!     ├── support/mod.rs          # Stub image sources and chart renderers
//!     ├── <area>/mod.rs
//!     └── fixtures
//!         └── report.md
//!
//!     Note that rust does not by default discover tests in subdirectories, so they are included
//!     from tests/lib.rs.
//!
//! Features
//!
//!     - network: remote images over reqwest (blocking, rustls). Without it remote URLs resolve
//!       to an Unsupported error and their fallback label.
//!     - chart-render: chart rasterization with resvg. Without it every chart becomes a data
//!       table.

pub mod chart;
pub mod convert;
pub mod error;
pub mod markdown;
pub mod numbering;
pub mod resolve;
pub mod skeleton;
pub mod substitute;
pub mod template;
pub mod text;
pub mod writer;

pub use convert::{ConvertOptions, ConvertReport, Converter};
pub use error::{ConvertError, ParseError, ResolutionError, SubstitutionError};
pub use numbering::{NumberingScheme, NumberingStyle};
pub use resolve::{CancelToken, ResolveOptions, ResolvedValue, Resolver, ValueMap};
pub use skeleton::{Block, PlaceholderKind, Skeleton};
pub use substitute::{substitute, PictureLayout, Substituter};
pub use template::{Template, TemplateBuilder, TemplateOptions};
pub use writer::{DocumentWriter, DocxWriter, Typography};

/// Features compiled into this build, as `(name, enabled)`.
pub fn features() -> Vec<(&'static str, bool)> {
    vec![
        ("network", cfg!(feature = "network")),
        ("chart-render", cfg!(feature = "chart-render")),
    ]
}
