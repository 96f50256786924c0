//! Chart data model
//!
//!     Chart fences hold an ECharts-style option object written in relaxed JSON: keys may be
//!     unquoted, strings may use single quotes and trailing commas are allowed. The body is
//!     normalized into strict JSON and read into a [`ChartTable`], one category axis plus
//!     any number of named numeric series.
//!
//!     A [`ChartTable`] is then either rendered to a picture (see [`render`]) or, when
//!     rendering is unavailable, laid out as a plain data table with [`ChartTable::to_grid`].

pub mod render;

use crate::error::ParseError;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_TITLE: &str = "默认标题";
pub const DEFAULT_SERIES_NAME: &str = "数据系列";
pub const CATEGORY_HEADER: &str = "类别";

static UNQUOTED_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([{,])\s*([a-zA-Z_$][a-zA-Z0-9_$]*)\s*:").unwrap());

static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*([}\]])").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    /// Any other series type.
    Other,
}

impl ChartKind {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "bar" => ChartKind::Bar,
            "line" => ChartKind::Line,
            "pie" => ChartKind::Pie,
            _ => ChartKind::Other,
        }
    }
}

/// Category labels plus named numeric series aligned to them by index.
///
/// Series may be shorter or longer than the category axis; out-of-range
/// values read as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartTable {
    pub title: String,
    pub kind: ChartKind,
    pub categories: Vec<String>,
    pub series: IndexMap<String, Vec<f64>>,
    pub y_axis_name: Option<String>,
}

impl Default for ChartTable {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            kind: ChartKind::Bar,
            categories: Vec::new(),
            series: IndexMap::new(),
            y_axis_name: None,
        }
    }
}

impl ChartTable {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_series(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.series.insert(name.into(), values);
        self
    }

    /// Longest of the category axis and every series.
    pub fn point_count(&self) -> usize {
        self.series
            .values()
            .map(Vec::len)
            .chain(std::iter::once(self.categories.len()))
            .max()
            .unwrap_or(0)
    }

    /// Largest value across all series, or 0 when there are none.
    pub fn max_value(&self) -> f64 {
        self.series
            .values()
            .flatten()
            .copied()
            .fold(0.0_f64, f64::max)
    }

    /// Data table layout: `["类别", series names...]` then one row per category.
    pub fn to_grid(&self) -> Vec<Vec<String>> {
        let mut header = vec![CATEGORY_HEADER.to_string()];
        header.extend(self.series.keys().cloned());

        let mut rows = vec![header];
        for i in 0..self.point_count() {
            let mut row = vec![self.categories.get(i).cloned().unwrap_or_default()];
            for values in self.series.values() {
                row.push(values.get(i).map(|v| format_value(*v)).unwrap_or_default());
            }
            rows.push(row);
        }
        rows
    }
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

/// Rewrite relaxed option syntax as strict JSON.
///
/// Unquoted keys get quoted, single quotes become double quotes and commas
/// before a closing bracket are dropped. Quote replacement is blind to context,
/// so an apostrophe inside a double-quoted string breaks the result.
pub fn normalize_relaxed_json(body: &str) -> String {
    let quoted = UNQUOTED_KEY.replace_all(body, "${1}\"${2}\":");
    let doubled = quoted.replace('\'', "\"");
    TRAILING_COMMA.replace_all(&doubled, "${1}").into_owned()
}

/// Parse a chart fence body into a [`ChartTable`].
pub fn parse_chart(body: &str) -> Result<ChartTable, ParseError> {
    if body.trim().is_empty() {
        return Err(ParseError::InvalidChart("empty chart body".to_string()));
    }
    let json = normalize_relaxed_json(body);
    let root: Value =
        serde_json::from_str(&json).map_err(|e| ParseError::InvalidChart(e.to_string()))?;
    if !root.is_object() {
        return Err(ParseError::InvalidChart(
            "chart option must be an object".to_string(),
        ));
    }
    Ok(chart_from_value(&root))
}

fn first_of(value: Option<&Value>) -> Option<&Value> {
    match value? {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

fn chart_from_value(root: &Value) -> ChartTable {
    let title = root
        .get("title")
        .and_then(|t| t.get("text"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_TITLE);
    let mut chart = ChartTable::new(title);

    if let Some(data) = first_of(root.get("xAxis"))
        .and_then(|axis| axis.get("data"))
        .and_then(Value::as_array)
    {
        chart.categories = data.iter().map(label_of).collect();
    }

    let series = root
        .get("series")
        .map(|s| match s {
            Value::Array(items) => items.clone(),
            single => vec![single.clone()],
        })
        .unwrap_or_default();

    chart.kind = series
        .first()
        .and_then(|s| s.get("type"))
        .and_then(Value::as_str)
        .map(ChartKind::from_name)
        .unwrap_or(ChartKind::Bar);

    for entry in &series {
        let Some(data) = entry.get("data").and_then(Value::as_array) else {
            continue;
        };
        if data.is_empty() {
            continue;
        }
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_SERIES_NAME);

        if chart.categories.is_empty() {
            let names: Vec<String> = data
                .iter()
                .filter_map(|item| item.get("name").map(label_of))
                .collect();
            if names.len() == data.len() {
                chart.categories = names;
            }
        }

        chart
            .series
            .insert(name.to_string(), data.iter().map(number_of).collect());
    }

    chart.y_axis_name = first_of(root.get("yAxis"))
        .and_then(|axis| axis.get("name"))
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    chart
}

fn label_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(_) => value
            .get("value")
            .or_else(|| value.get("name"))
            .map(label_of)
            .unwrap_or_default(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn number_of(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        Value::Object(_) => value.get("value").map(number_of).unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BAR: &str = r#"{
        title: { text: '季度销售额' },
        xAxis: { type: 'category', data: ['Q1', 'Q2', 'Q3', ] },
        yAxis: [{ name: '万元' }],
        series: [
            { name: '华东', type: 'bar', data: [120, '200.5', 'n/a'] },
            { name: '华南', type: 'bar', data: [80, 90] },
        ],
    }"#;

    #[test]
    fn normalizes_relaxed_syntax() {
        assert_eq!(
            normalize_relaxed_json("{a: 1, b_c: 'x', d: [1,2,],}"),
            r#"{"a": 1,"b_c": "x","d": [1,2]}"#
        );
    }

    #[test]
    fn parses_bar_chart() {
        let chart = parse_chart(BAR).unwrap();
        assert_eq!(chart.title, "季度销售额");
        assert_eq!(chart.kind, ChartKind::Bar);
        assert_eq!(chart.categories, vec!["Q1", "Q2", "Q3"]);
        assert_eq!(chart.series["华东"], vec![120.0, 200.5, 0.0]);
        assert_eq!(chart.y_axis_name.as_deref(), Some("万元"));
        assert_eq!(chart.series["华南"].get(2), None);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let chart = parse_chart("{series: [{data: [1, 2]}]}").unwrap();
        assert_eq!(chart.title, DEFAULT_TITLE);
        assert_eq!(chart.series.keys().collect::<Vec<_>>(), vec![DEFAULT_SERIES_NAME]);
    }

    #[test]
    fn pie_items_provide_categories() {
        let chart = parse_chart(
            "{series: [{type: 'pie', name: '占比', data: [{name: '甲', value: 3}, {name: '乙', value: 7}]}]}",
        )
        .unwrap();
        assert_eq!(chart.kind, ChartKind::Pie);
        assert_eq!(chart.categories, vec!["甲", "乙"]);
        assert_eq!(chart.series["占比"], vec![3.0, 7.0]);
    }

    #[test]
    fn invalid_body_is_a_parse_error() {
        assert!(matches!(parse_chart("not json"), Err(ParseError::InvalidChart(_))));
        assert!(matches!(parse_chart("  "), Err(ParseError::InvalidChart(_))));
        assert!(matches!(parse_chart("[1, 2]"), Err(ParseError::InvalidChart(_))));
    }

    #[test]
    fn grid_pads_short_series() {
        let grid = parse_chart(BAR).unwrap().to_grid();
        assert_eq!(
            grid,
            vec![
                vec!["类别", "华东", "华南"],
                vec!["Q1", "120", "80"],
                vec!["Q2", "200.5", "90"],
                vec!["Q3", "0", ""],
            ]
        );
    }

    #[test]
    fn chart_kind_defaults_to_bar() {
        let line = parse_chart("{series: [{type: 'line', data: [1]}]}").unwrap();
        assert_eq!(line.kind, ChartKind::Line);
        let untyped = parse_chart("{series: [{data: [1]}]}").unwrap();
        assert_eq!(untyped.kind, ChartKind::Bar);
    }
}
