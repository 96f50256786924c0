//! Value resolution
//!
//!     Between the template pass and substitution, every placeholder in the skeleton is turned
//!     into a [`ResolvedValue`] and stored in a [`ValueMap`] under its key. The work per key is
//!     independent (one table parse, one image load, one chart render), so jobs run on the
//!     rayon pool when `parallel` is set. Each job only produces its own value; the map is
//!     filled after the parallel phase, which keeps every key written exactly once.
//!
//!     Failures do not stop the run. A failed key is simply absent from the map, recorded in
//!     [`Resolution::failures`], and later shown as a fallback label.

pub mod cache;
pub mod image;

use crate::chart::render::ChartRenderer;
use crate::chart::{parse_chart, ChartKind};
use crate::error::{ParseError, ResolutionError};
use crate::markdown::parse_table;
use crate::skeleton::{PlaceholderBlock, PlaceholderSource, Skeleton};
use self::image::ImageSource;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub const TITLE_KEY: &str = "title";
pub const DEFAULT_TITLE: &str = "默认标题";

/// Raster picture bytes with pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    Text(String),
    Grid(Vec<Vec<String>>),
    Image {
        bytes: Vec<u8>,
        width: u32,
        height: u32,
    },
}

impl ResolvedValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ResolvedValue::Text(_) => "text",
            ResolvedValue::Grid(_) => "grid",
            ResolvedValue::Image { .. } => "image",
        }
    }
}

impl From<Raster> for ResolvedValue {
    fn from(raster: Raster) -> Self {
        ResolvedValue::Image {
            bytes: raster.bytes,
            width: raster.width,
            height: raster.height,
        }
    }
}

/// Placeholder key to resolved value. A key, once written, is never replaced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap {
    values: HashMap<String, ResolvedValue>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`. Returns false, leaving the map untouched, if the key is taken.
    pub fn insert(&mut self, key: impl Into<String>, value: ResolvedValue) -> bool {
        match self.values.entry(key.into()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&ResolvedValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

/// Shared flag for aborting a conversion from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolveOptions {
    pub parallel: bool,
    /// Render charts to pictures; otherwise charts become data tables.
    pub render_charts: bool,
    /// Explicit document title. Empty means "use the first heading".
    pub title: String,
    pub default_title: String,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            render_charts: true,
            title: String::new(),
            default_title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// Output of a resolution run.
#[derive(Debug, Default)]
pub struct Resolution {
    pub values: ValueMap,
    /// Keys that could not be resolved, in document order.
    pub failures: Vec<(String, ResolutionError)>,
}

pub struct Resolver {
    images: Arc<dyn ImageSource>,
    charts: Option<Arc<dyn ChartRenderer>>,
    options: ResolveOptions,
}

impl Resolver {
    pub fn new(images: Arc<dyn ImageSource>, options: ResolveOptions) -> Self {
        Self {
            images,
            charts: None,
            options,
        }
    }

    pub fn with_chart_renderer(mut self, renderer: Arc<dyn ChartRenderer>) -> Self {
        self.charts = Some(renderer);
        self
    }

    /// Document title: configured title, else the first heading, else the default.
    pub fn title(&self, first_heading: Option<&str>) -> String {
        let configured = self.options.title.trim();
        if !configured.is_empty() {
            return configured.to_string();
        }
        first_heading
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .unwrap_or(self.options.default_title.as_str())
            .to_string()
    }

    /// Resolve every placeholder of `skeleton` plus the title.
    ///
    /// Returns `Err(ResolutionError::Cancelled)` when `cancel` fires before
    /// all jobs complete; no partial map is returned in that case.
    pub fn resolve(
        &self,
        skeleton: &Skeleton,
        first_heading: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<Resolution, ResolutionError> {
        let started = Instant::now();
        let jobs: Vec<&PlaceholderBlock> = skeleton.placeholders().collect();

        let run = |job: &&PlaceholderBlock| {
            let result = if cancel.is_cancelled() {
                Err(ResolutionError::Cancelled)
            } else {
                self.resolve_one(job)
            };
            (job.key.clone(), result)
        };
        let results: Vec<(String, Result<ResolvedValue, ResolutionError>)> = if self.options.parallel
        {
            jobs.par_iter().map(run).collect()
        } else {
            jobs.iter().map(run).collect()
        };

        if cancel.is_cancelled() {
            return Err(ResolutionError::Cancelled);
        }

        let mut resolution = Resolution::default();
        resolution
            .values
            .insert(TITLE_KEY, ResolvedValue::Text(self.title(first_heading)));

        for (key, result) in results {
            match result {
                Ok(value) => {
                    log::debug!("resolved {key} as {}", value.kind_name());
                    if !resolution.values.insert(key.clone(), value) {
                        log::warn!("duplicate placeholder key {key}; keeping the first value");
                    }
                }
                Err(e) => {
                    log::warn!("could not resolve {key}: {e}");
                    resolution.failures.push((key, e));
                }
            }
        }

        log::info!(
            "resolved {}/{} placeholders in {:.2?}",
            jobs.len() - resolution.failures.len(),
            jobs.len(),
            started.elapsed()
        );
        Ok(resolution)
    }

    fn resolve_one(&self, job: &PlaceholderBlock) -> Result<ResolvedValue, ResolutionError> {
        match &job.payload {
            PlaceholderSource::Table { raw } => {
                let grid = parse_table(raw);
                if grid.is_empty() {
                    return Err(ParseError::EmptyTable { line: job.line }.into());
                }
                Ok(ResolvedValue::Grid(grid))
            }
            PlaceholderSource::Image(image) => Ok(self.images.load(&image.url)?.into()),
            PlaceholderSource::Chart { body, .. } => {
                let chart = parse_chart(body)?;
                match (&self.charts, self.options.render_charts) {
                    (Some(renderer), true) => match renderer.render(&chart) {
                        Ok(raster) => Ok(raster.into()),
                        Err(e) => {
                            if chart.kind != ChartKind::Other {
                                log::warn!("{}: {e}; using a data table instead", job.key);
                            } else {
                                log::debug!("{}: {e}; using a data table instead", job.key);
                            }
                            Ok(ResolvedValue::Grid(chart.to_grid()))
                        }
                    },
                    _ => Ok(ResolvedValue::Grid(chart.to_grid())),
                }
            }
            PlaceholderSource::Mermaid { body, .. } => Ok(ResolvedValue::Text(format!(
                "【Mermaid 图表源码】\n{body}"
            ))),
        }
    }
}
