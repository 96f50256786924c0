//! Chart rendering
//!
//!     [`SvgChartRenderer`] draws bar, line and pie charts as SVG and rasterizes them to PNG
//!     with resvg (feature `chart-render`). Other chart kinds are reported as unsupported so
//!     the caller can fall back to a data table.

use super::{ChartKind, ChartTable};
use crate::error::ResolutionError;
use crate::resolve::cache::AssetCache;
use crate::resolve::Raster;
use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt::{self, Write as _};

const PALETTE: [&str; 9] = [
    "#5470c6", "#91cc75", "#fac858", "#ee6666", "#73c0de", "#3ba272", "#fc8452", "#9a60b4",
    "#ea7ccc",
];

const MARGIN_LEFT: f64 = 72.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 56.0;
const MARGIN_BOTTOM: f64 = 72.0;
const GRID_LINES: usize = 5;
const PIE_LEGEND_WIDTH: f64 = 120.0;
const PIE_OUTER_RADIUS: f64 = 0.75;
const PIE_INNER_RADIUS: f64 = 0.3;

/// Produces a picture for a chart.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, chart: &ChartTable) -> Result<Raster, ResolutionError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartRenderOptions {
    pub width_px: u32,
    pub height_px: u32,
    pub font_family: String,
}

impl Default for ChartRenderOptions {
    fn default() -> Self {
        Self {
            width_px: 800,
            height_px: 500,
            font_family: "SimSun, Songti SC, Noto Sans CJK SC, sans-serif".to_string(),
        }
    }
}

pub struct SvgChartRenderer {
    options: ChartRenderOptions,
    cache: Option<AssetCache>,
}

impl SvgChartRenderer {
    pub fn new(options: ChartRenderOptions) -> Self {
        Self {
            options,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: AssetCache) -> Self {
        self.cache = Some(cache);
        self
    }

    fn cache_key(&self, chart: &ChartTable) -> Option<String> {
        let spec = serde_json::to_vec(chart).ok()?;
        let size = format!("{}x{}", self.options.width_px, self.options.height_px);
        Some(AssetCache::key(&[&spec, size.as_bytes()]))
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn render(&self, chart: &ChartTable) -> Result<Raster, ResolutionError> {
        let svg = to_svg(chart, &self.options)?;
        let key = self.cache.as_ref().and_then(|_| self.cache_key(chart));

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(bytes) = cache.get(key, "png") {
                return Ok(Raster {
                    bytes,
                    width: self.options.width_px,
                    height: self.options.height_px,
                });
            }
        }

        let raster = rasterize(&svg, &self.options)?;

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Err(e) = cache.put(key, "png", &raster.bytes) {
                log::debug!("could not cache chart {key}: {e}");
            }
        }
        Ok(raster)
    }
}

#[cfg(feature = "chart-render")]
fn rasterize(svg: &str, options: &ChartRenderOptions) -> Result<Raster, ResolutionError> {
    use resvg::tiny_skia::{Pixmap, Transform};
    use resvg::usvg::{Options, Tree};

    let mut opt = Options::default();
    opt.fontdb_mut().load_system_fonts();

    let tree = Tree::from_str(svg, &opt)
        .map_err(|e| ResolutionError::Render(format!("SVG parsing error: {e}")))?;
    let mut pixmap = Pixmap::new(options.width_px, options.height_px)
        .ok_or_else(|| ResolutionError::Render("unable to create pixel buffer".to_string()))?;
    resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

    let bytes = pixmap
        .encode_png()
        .map_err(|e| ResolutionError::Render(format!("PNG encoding error: {e}")))?;
    Ok(Raster {
        bytes,
        width: options.width_px,
        height: options.height_px,
    })
}

#[cfg(not(feature = "chart-render"))]
fn rasterize(_svg: &str, _options: &ChartRenderOptions) -> Result<Raster, ResolutionError> {
    Err(ResolutionError::Unsupported(
        "chart rendering is not compiled in (feature `chart-render`)".to_string(),
    ))
}

/// Round `max` up to 1, 2, 2.5, 5 or 10 times a power of ten.
fn nice_ceiling(max: f64) -> f64 {
    if max <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powi(max.log10().floor() as i32);
    let scaled = max / magnitude;
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .into_iter()
        .find(|s| scaled <= *s)
        .unwrap_or(10.0);
    step * magnitude
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn axis_label(v: f64) -> String {
    if v.fract() == 0.0 {
        crate::text::format_thousands(&format!("{}", v as i64))
    } else {
        format!("{v:.1}")
    }
}

fn color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Draw `chart` as an SVG document.
///
/// Bar and line charts share a category axis; pie charts draw the first series as
/// a ring of sectors. Any other kind is unsupported.
pub fn to_svg(chart: &ChartTable, options: &ChartRenderOptions) -> Result<String, ResolutionError> {
    if chart.kind == ChartKind::Other {
        return Err(ResolutionError::Unsupported(format!(
            "{:?} charts",
            chart.kind
        )));
    }
    if chart.point_count() == 0 || chart.series.is_empty() {
        return Err(ResolutionError::Render("chart has no data".to_string()));
    }

    let mut svg = String::new();
    let written = match chart.kind {
        ChartKind::Pie => {
            let slices = pie_slices(chart);
            if slices.iter().map(|(_, v)| v).sum::<f64>() <= 0.0 {
                return Err(ResolutionError::Render(
                    "pie chart has no positive values".to_string(),
                ));
            }
            write_pie(&mut svg, chart, &slices, options)
        }
        _ => write_cartesian(&mut svg, chart, options),
    };
    written.map_err(|e| ResolutionError::Render(format!("SVG formatting error: {e}")))?;
    Ok(svg)
}

fn write_header(svg: &mut String, chart: &ChartTable, options: &ChartRenderOptions) -> fmt::Result {
    let width = options.width_px as f64;
    let height = options.height_px as f64;
    write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="{}">"#,
        escape(&options.font_family)
    )?;
    write!(svg, r##"<rect width="100%" height="100%" fill="#ffffff"/>"##)?;
    write!(
        svg,
        r#"<text x="{}" y="32" font-size="20" font-weight="bold" text-anchor="middle">{}</text>"#,
        width / 2.0,
        escape(&chart.title)
    )
}

fn write_cartesian(svg: &mut String, chart: &ChartTable, options: &ChartRenderOptions) -> fmt::Result {
    let width = options.width_px as f64;
    let height = options.height_px as f64;
    let points = chart.point_count();
    let plot_w = width - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = height - MARGIN_TOP - MARGIN_BOTTOM;
    let top = nice_ceiling(chart.max_value());
    let y_of = |v: f64| MARGIN_TOP + plot_h - (v.max(0.0) / top) * plot_h;
    let group_w = plot_w / points as f64;

    write_header(svg, chart, options)?;

    for i in 0..=GRID_LINES {
        let v = top * i as f64 / GRID_LINES as f64;
        let y = y_of(v);
        write!(
            svg,
            r##"<line x1="{MARGIN_LEFT}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#e0e6f1"/><text x="{:.1}" y="{:.1}" font-size="12" text-anchor="end" fill="#6e7079">{}</text>"##,
            MARGIN_LEFT + plot_w,
            MARGIN_LEFT - 8.0,
            y + 4.0,
            axis_label(v)
        )?;
    }
    if let Some(name) = &chart.y_axis_name {
        write!(
            svg,
            r##"<text x="{MARGIN_LEFT}" y="{:.1}" font-size="12" text-anchor="middle" fill="#6e7079">{}</text>"##,
            MARGIN_TOP - 12.0,
            escape(name)
        )?;
    }

    for (i, label) in chart.categories.iter().enumerate().take(points) {
        let x = MARGIN_LEFT + group_w * (i as f64 + 0.5);
        write!(
            svg,
            r##"<text x="{x:.1}" y="{:.1}" font-size="12" text-anchor="middle" fill="#6e7079">{}</text>"##,
            MARGIN_TOP + plot_h + 20.0,
            escape(label)
        )?;
    }

    let series_count = chart.series.len() as f64;
    for (s, values) in chart.series.values().enumerate() {
        let fill = color(s);
        if chart.kind == ChartKind::Line {
            let coords: Vec<(f64, f64)> = values
                .iter()
                .enumerate()
                .take(points)
                .map(|(i, v)| (MARGIN_LEFT + group_w * (i as f64 + 0.5), y_of(*v)))
                .collect();
            let line: Vec<String> = coords.iter().map(|(x, y)| format!("{x:.1},{y:.1}")).collect();
            write!(
                svg,
                r#"<polyline points="{}" fill="none" stroke="{fill}" stroke-width="2"/>"#,
                line.join(" ")
            )?;
            for (x, y) in &coords {
                write!(svg, r#"<circle cx="{x:.1}" cy="{y:.1}" r="3" fill="{fill}"/>"#)?;
            }
        } else {
            let bar_w = group_w * 0.7 / series_count;
            for (i, v) in values.iter().enumerate().take(points) {
                let x = MARGIN_LEFT + group_w * i as f64 + group_w * 0.15 + bar_w * s as f64;
                let y = y_of(*v);
                write!(
                    svg,
                    r#"<rect x="{x:.1}" y="{y:.1}" width="{bar_w:.1}" height="{:.1}" fill="{fill}"/>"#,
                    MARGIN_TOP + plot_h - y
                )?;
            }
        }
    }

    let legend_y = height - 20.0;
    let legend_step = width / (series_count + 1.0);
    for (s, name) in chart.series.keys().enumerate() {
        let x = legend_step * (s as f64 + 1.0);
        write!(
            svg,
            r#"<rect x="{:.1}" y="{:.1}" width="14" height="10" fill="{}"/><text x="{x:.1}" y="{legend_y:.1}" font-size="12">{}</text>"#,
            x - 20.0,
            legend_y - 9.0,
            color(s),
            escape(name)
        )?;
    }

    svg.push_str("</svg>");
    Ok(())
}

/// Labelled values of the first series. Unnamed slices are called `项目N`;
/// negative values count as zero.
fn pie_slices(chart: &ChartTable) -> Vec<(String, f64)> {
    let Some(values) = chart.series.values().next() else {
        return Vec::new();
    };
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let label = chart
                .categories
                .get(i)
                .filter(|c| !c.is_empty())
                .cloned()
                .unwrap_or_else(|| format!("项目{}", i + 1));
            (label, v.max(0.0))
        })
        .collect()
}

fn write_pie(
    svg: &mut String,
    chart: &ChartTable,
    slices: &[(String, f64)],
    options: &ChartRenderOptions,
) -> fmt::Result {
    let width = options.width_px as f64;
    let height = options.height_px as f64;
    let total: f64 = slices.iter().map(|(_, v)| v).sum();
    let cx = width / 2.0;
    let cy = MARGIN_TOP + (height - MARGIN_TOP - 24.0) / 2.0;
    let room = (width - 2.0 * PIE_LEGEND_WIDTH).min(height - MARGIN_TOP - 24.0) / 2.0;
    let outer = room * PIE_OUTER_RADIUS;
    let inner = room * PIE_INNER_RADIUS;
    let at = |r: f64, angle: f64| (cx + r * angle.cos(), cy + r * angle.sin());

    write_header(svg, chart, options)?;

    let mut start = -FRAC_PI_2;
    for (i, (label, value)) in slices.iter().enumerate() {
        let sweep = value / total * TAU;
        if sweep <= 0.0 {
            continue;
        }
        // Each sector is drawn as two half arcs so no arc spans more than half a turn.
        let mid = start + sweep / 2.0;
        let end = start + sweep;
        let (x0, y0) = at(outer, start);
        let (x1, y1) = at(outer, mid);
        let (x2, y2) = at(outer, end);
        let (x3, y3) = at(inner, end);
        let (x4, y4) = at(inner, mid);
        let (x5, y5) = at(inner, start);
        write!(
            svg,
            r##"<path d="M{x0:.2},{y0:.2} A{outer:.2},{outer:.2} 0 0 1 {x1:.2},{y1:.2} A{outer:.2},{outer:.2} 0 0 1 {x2:.2},{y2:.2} L{x3:.2},{y3:.2} A{inner:.2},{inner:.2} 0 0 0 {x4:.2},{y4:.2} A{inner:.2},{inner:.2} 0 0 0 {x5:.2},{y5:.2} Z" fill="{}" stroke="#ffffff"/>"##,
            color(i)
        )?;

        let (lx, ly) = at(outer + 16.0, mid);
        let anchor = if lx >= cx { "start" } else { "end" };
        write!(
            svg,
            r##"<text x="{lx:.1}" y="{:.1}" font-size="12" text-anchor="{anchor}" fill="#6e7079">{}: {} ({:.1}%)</text>"##,
            ly + 4.0,
            escape(label),
            axis_label(*value),
            value / total * 100.0
        )?;
        start = end;
    }

    for (i, (label, _)) in slices.iter().enumerate() {
        let y = MARGIN_TOP + 20.0 * i as f64;
        write!(
            svg,
            r#"<rect x="24" y="{y:.1}" width="14" height="10" fill="{}"/><text x="44" y="{:.1}" font-size="12">{}</text>"#,
            color(i),
            y + 9.0,
            escape(label)
        )?;
    }

    svg.push_str("</svg>");
    Ok(())
}
