//! Shared configuration loader for the md2doc toolchain.
//!
//! `defaults/md2doc.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`Md2docConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use md2doc_core::chart::render::ChartRenderOptions;
use md2doc_core::markdown::FenceMarkers;
use md2doc_core::resolve::image::ImageOptions;
use md2doc_core::{
    ConvertOptions, NumberingStyle, PictureLayout, ResolveOptions, TemplateOptions, Typography,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod overrides;

pub use overrides::{setting, Override, OverrideValue, Setting, SettingKind};

const DEFAULT_TOML: &str = include_str!("../defaults/md2doc.default.toml");

/// File picked up from the working directory when present.
pub const LOCAL_CONFIG_FILE: &str = "md2doc.toml";

/// Top-level configuration consumed by md2doc applications.
#[derive(Debug, Clone, Deserialize)]
pub struct Md2docConfig {
    pub numbering: NumberingConfig,
    pub template: TemplateConfig,
    pub typography: TypographyConfig,
    pub layout: LayoutConfig,
    pub images: ImagesConfig,
    pub charts: ChartsConfig,
    pub resolve: ResolveConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NumberingConfig {
    pub style: NumberingStyle,
}

/// Markdown recognition and skeleton knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    pub chart_open_markers: Vec<String>,
    pub chart_close_marker: String,
    pub mermaid_open_marker: String,
    pub captions: bool,
    pub group_digits: bool,
    pub title: String,
    pub default_title: String,
}

impl From<&TemplateConfig> for FenceMarkers {
    fn from(config: &TemplateConfig) -> Self {
        FenceMarkers {
            chart_open: config.chart_open_markers.clone(),
            close: config.chart_close_marker.clone(),
            mermaid_open: config.mermaid_open_marker.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypographyConfig {
    pub body_font: String,
    pub title_font: String,
    pub table_font: String,
    pub body_size_pt: f32,
    pub title_size_pt: f32,
    pub header_fill: String,
}

impl From<&TypographyConfig> for Typography {
    fn from(config: &TypographyConfig) -> Self {
        Typography {
            body_font: config.body_font.clone(),
            title_font: config.title_font.clone(),
            table_font: config.table_font.clone(),
            body_size_pt: config.body_size_pt,
            title_size_pt: config.title_size_pt,
            header_fill: config.header_fill.trim_start_matches('#').to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    pub max_width_in: f64,
    pub max_height_in: f64,
    pub min_width_in: f64,
    pub dpi: u32,
}

impl From<&LayoutConfig> for PictureLayout {
    fn from(config: &LayoutConfig) -> Self {
        PictureLayout {
            max_width_in: config.max_width_in,
            max_height_in: config.max_height_in,
            min_width_in: config.min_width_in,
            dpi: config.dpi,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImagesConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_ms: u64,
    pub max_width_px: u32,
    pub max_height_px: u32,
    pub cache_dir: String,
}

impl ImagesConfig {
    /// Configured cache directory; `None` when left empty.
    pub fn cache_dir(&self) -> Option<PathBuf> {
        let dir = self.cache_dir.trim();
        (!dir.is_empty()).then(|| PathBuf::from(dir))
    }
}

impl From<&ImagesConfig> for ImageOptions {
    fn from(config: &ImagesConfig) -> Self {
        ImageOptions {
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries.max(1),
            backoff: Duration::from_millis(config.backoff_ms),
            max_width_px: config.max_width_px,
            max_height_px: config.max_height_px,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartsConfig {
    pub render: bool,
    pub width_px: u32,
    pub height_px: u32,
    pub font_family: String,
}

impl From<&ChartsConfig> for ChartRenderOptions {
    fn from(config: &ChartsConfig) -> Self {
        ChartRenderOptions {
            width_px: config.width_px,
            height_px: config.height_px,
            font_family: config.font_family.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveConfig {
    pub parallel: bool,
}

impl Md2docConfig {
    pub fn template_options(&self) -> TemplateOptions {
        TemplateOptions {
            markers: FenceMarkers::from(&self.template),
            numbering: self.numbering.style,
            captions: self.template.captions,
            group_digits: self.template.group_digits,
        }
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            parallel: self.resolve.parallel,
            render_charts: self.charts.render,
            title: self.template.title.clone(),
            default_title: self.template.default_title.clone(),
        }
    }

    /// Everything a conversion needs, in core option types.
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            template: self.template_options(),
            resolve: self.resolve_options(),
            layout: PictureLayout::from(&self.layout),
            typography: Typography::from(&self.typography),
            images: ImageOptions::from(&self.images),
            charts: ChartRenderOptions::from(&self.charts),
            cache_dir: self.images.cache_dir(),
        }
    }
}

impl From<&Md2docConfig> for ConvertOptions {
    fn from(config: &Md2docConfig) -> Self {
        config.convert_options()
    }
}

/// Layers configuration sources over the embedded defaults.
///
/// Later layers win: defaults, then files in the order added, then overrides.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start from the embedded defaults.
    pub fn new() -> Self {
        Self {
            builder: Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml)),
        }
    }

    fn layer(mut self, path: &Path, required: bool) -> Self {
        let source = File::from(path).format(FileFormat::Toml).required(required);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer a TOML file that must exist.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), true)
    }

    /// Layer a TOML file if it exists.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), false)
    }

    /// Layer `md2doc.toml` from `dir` if present.
    pub fn with_local_file(self, dir: impl AsRef<Path>) -> Self {
        self.with_optional_file(dir.as_ref().join(LOCAL_CONFIG_FILE))
    }

    /// Set a single configuration path.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Apply validated command-line overrides.
    pub fn with_overrides<'a>(
        self,
        overrides: impl IntoIterator<Item = &'a Override>,
    ) -> Result<Self, ConfigError> {
        overrides
            .into_iter()
            .try_fold(self, |loader, o| loader.set_override(o.path, o.value.clone()))
    }

    /// Merge every layer and deserialize.
    pub fn build(self) -> Result<Md2docConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<Md2docConfig, ConfigError> {
    Loader::new().build()
}
