//! Inspect views
//!
//! Each view runs one stage of the pipeline on a Markdown source and prints the
//! result as pretty JSON. Nothing is resolved and no file is written.
//!
//! - `headings`: every heading with its level, before numbering
//! - `charts`:   chart fence bodies, or the parse error for unterminated fences
//! - `tables`:   raw table blocks with their parsed cells
//! - `images`:   image references in document order
//! - `skeleton`: the template skeleton with placeholders (default)

use md2doc_core::markdown::{
    extract_chart_blocks, extract_headings, extract_images, extract_tables, parse_table,
};
use md2doc_core::{TemplateBuilder, TemplateOptions};
use serde_json::{json, Value};

pub const DEFAULT_VIEW: &str = "skeleton";

pub const AVAILABLE_VIEWS: &[&str] = &["headings", "charts", "tables", "images", "skeleton"];

/// Run `view` on `source` and render it as pretty JSON.
pub fn execute_view(source: &str, view: &str, options: &TemplateOptions) -> Result<String, String> {
    let markers = &options.markers;
    let value = match view {
        "headings" => to_value(extract_headings(source, markers))?,
        "charts" => Value::Array(
            extract_chart_blocks(source, markers)
                .into_iter()
                .enumerate()
                .map(|(i, block)| match block {
                    Ok(body) => json!({ "key": format!("chart{}", i + 1), "body": body }),
                    Err(e) => json!({ "key": format!("chart{}", i + 1), "error": e.to_string() }),
                })
                .collect(),
        ),
        "tables" => Value::Array(
            extract_tables(source, markers)
                .into_iter()
                .enumerate()
                .map(|(i, raw)| {
                    json!({
                        "key": format!("table{}", i + 1),
                        "rows": parse_table(&raw),
                        "raw": raw,
                    })
                })
                .collect(),
        ),
        "images" => to_value(extract_images(source))?,
        "skeleton" => {
            let template = TemplateBuilder::new(options.clone()).build(source);
            json!({
                "first_heading": template.first_heading,
                "warnings": template
                    .warnings
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>(),
                "skeleton": to_value(&template.skeleton)?,
            })
        }
        other => {
            return Err(format!(
                "Unknown view '{other}'. Available views: {}",
                AVAILABLE_VIEWS.join(", ")
            ))
        }
    };

    serde_json::to_string_pretty(&value)
        .map(|mut text| {
            text.push('\n');
            text
        })
        .map_err(|e| format!("JSON serialization failed: {e}"))
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| format!("JSON serialization failed: {e}"))
}
