//! Conversion pipeline
//!
//! Runs the whole Markdown to document conversion:
//!
//!     validate -> template -> skeleton artifact -> resolve -> read back -> substitute -> write
//!
//! The phases are strictly ordered. The skeleton is written to a temporary
//! `*.skeleton.json` file beside the output and read back before substitution; the
//! file is removed when the call returns, whatever the outcome. The output itself is
//! written to a temporary file in the target directory and only persisted once
//! everything succeeded, so a failed or cancelled conversion leaves nothing behind.
//!
//! ```ignore
//! let converter = Converter::new(ConvertOptions::default());
//! let report = converter.convert_file("report.md", "report.docx", &CancelToken::new())?;
//! ```

use crate::chart::render::{ChartRenderOptions, ChartRenderer, SvgChartRenderer};
use crate::error::{ConvertError, ResolutionError};
use crate::resolve::cache::AssetCache;
use crate::resolve::image::{ImageFetcher, ImageOptions, ImageSource};
use crate::resolve::{CancelToken, ResolveOptions, Resolver};
use crate::skeleton::Skeleton;
use crate::substitute::{PictureLayout, Substituter};
use crate::template::{TemplateBuilder, TemplateOptions};
use crate::writer::{DocumentWriter, DocxWriter, Typography};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Every knob of a conversion. Built from the configuration layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertOptions {
    pub template: TemplateOptions,
    pub resolve: ResolveOptions,
    pub layout: PictureLayout,
    pub typography: Typography,
    pub images: ImageOptions,
    pub charts: ChartRenderOptions,
    /// Asset cache directory; `None` uses the system temp dir.
    pub cache_dir: Option<PathBuf>,
}

/// Summary of a finished conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertReport {
    pub output: PathBuf,
    pub placeholders: usize,
    /// Placeholders and tokens replaced with real content.
    pub resolved: usize,
    /// Every recovered problem, in the order it was found.
    pub warnings: Vec<String>,
}

pub struct Converter {
    options: ConvertOptions,
    images: Option<Arc<dyn ImageSource>>,
    charts: Option<Arc<dyn ChartRenderer>>,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            images: None,
            charts: None,
        }
    }

    /// Use `source` instead of the network/filesystem image fetcher.
    pub fn with_image_source(mut self, source: Arc<dyn ImageSource>) -> Self {
        self.images = Some(source);
        self
    }

    /// Use `renderer` instead of the built-in SVG chart renderer.
    pub fn with_chart_renderer(mut self, renderer: Arc<dyn ChartRenderer>) -> Self {
        self.charts = Some(renderer);
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    fn cache(&self) -> Option<AssetCache> {
        let opened = match &self.options.cache_dir {
            Some(dir) => AssetCache::open(dir),
            None => AssetCache::in_temp_dir(),
        };
        opened
            .map_err(|e| log::warn!("asset cache unavailable, continuing without it: {e}"))
            .ok()
    }

    fn resolver(&self, base_dir: Option<&Path>) -> Resolver {
        let cache = self.cache();

        let images = match &self.images {
            Some(source) => source.clone(),
            None => {
                let mut fetcher = ImageFetcher::new(self.options.images.clone());
                if let Some(dir) = base_dir {
                    fetcher = fetcher.with_base_dir(dir);
                }
                if let Some(cache) = cache.clone() {
                    fetcher = fetcher.with_cache(cache);
                }
                Arc::new(fetcher) as Arc<dyn ImageSource>
            }
        };

        let charts = match &self.charts {
            Some(renderer) => renderer.clone(),
            None => {
                let mut renderer = SvgChartRenderer::new(self.options.charts.clone());
                if let Some(cache) = cache {
                    renderer = renderer.with_cache(cache);
                }
                Arc::new(renderer) as Arc<dyn ChartRenderer>
            }
        };

        Resolver::new(images, self.options.resolve.clone()).with_chart_renderer(charts)
    }

    /// Convert a Markdown file. Relative image paths resolve against its directory.
    pub fn convert_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        cancel: &CancelToken,
    ) -> Result<ConvertReport, ConvertError> {
        let input = input.as_ref();
        let source = read_markdown(input)?;
        let base_dir = input.parent().filter(|p| !p.as_os_str().is_empty());
        self.convert_str(&source, base_dir, output, cancel)
    }

    /// Convert Markdown text. `base_dir` anchors relative image paths.
    pub fn convert_str(
        &self,
        source: &str,
        base_dir: Option<&Path>,
        output: impl AsRef<Path>,
        cancel: &CancelToken,
    ) -> Result<ConvertReport, ConvertError> {
        let output = output.as_ref();
        if source.trim().is_empty() {
            return Err(ConvertError::EmptyInput);
        }
        check(cancel)?;

        let out_dir = match output.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&out_dir).map_err(|source| ConvertError::WriteOutput {
            path: output.to_path_buf(),
            source,
        })?;

        let started = Instant::now();
        let template = TemplateBuilder::new(self.options.template.clone()).build(source);
        let placeholders = template.skeleton.placeholders().count();
        log::info!(
            "built skeleton: {} blocks, {} placeholders in {:.2?}",
            template.skeleton.blocks.len(),
            placeholders,
            started.elapsed()
        );
        let mut warnings: Vec<String> = template.warnings.iter().map(ToString::to_string).collect();

        let artifact = write_artifact(&template.skeleton, &out_dir)?;
        log::debug!("skeleton artifact at {}", artifact.path().display());

        let resolution = self
            .resolver(base_dir)
            .resolve(&template.skeleton, template.first_heading.as_deref(), cancel)
            .map_err(|e| match e {
                ResolutionError::Cancelled => ConvertError::Cancelled,
                other => ConvertError::Render(other.to_string()),
            })?;
        warnings.extend(
            resolution
                .failures
                .iter()
                .map(|(key, e)| format!("{key}: {e}")),
        );

        let mut skeleton = read_artifact(artifact.path())?;
        check(cancel)?;

        let started = Instant::now();
        let report = Substituter::new(
            self.options.layout.clone(),
            self.options.template.group_digits,
        )
        .apply(&mut skeleton, &resolution.values);
        warnings.extend(report.errors.iter().map(ToString::to_string));
        log::info!(
            "substituted {} values ({} fallbacks) in {:.2?}",
            report.resolved,
            report.errors.len(),
            started.elapsed()
        );

        let started = Instant::now();
        let writer = DocxWriter::new(self.options.typography.clone());
        let bytes = writer.write(&skeleton)?;
        check(cancel)?;
        persist_output(&bytes, &out_dir, output)?;
        log::info!(
            "wrote {} ({} bytes, {}) in {:.2?}",
            output.display(),
            bytes.len(),
            writer.name(),
            started.elapsed()
        );

        drop(artifact);
        Ok(ConvertReport {
            output: output.to_path_buf(),
            placeholders,
            resolved: report.resolved,
            warnings,
        })
    }
}

fn check(cancel: &CancelToken) -> Result<(), ConvertError> {
    if cancel.is_cancelled() {
        Err(ConvertError::Cancelled)
    } else {
        Ok(())
    }
}

/// Read and validate a Markdown input file.
pub fn read_markdown(path: &Path) -> Result<String, ConvertError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !MARKDOWN_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ConvertError::UnsupportedInput(path.to_path_buf()));
    }
    let source = fs::read_to_string(path).map_err(|source| ConvertError::ReadInput {
        path: path.to_path_buf(),
        source,
    })?;
    if source.trim().is_empty() {
        return Err(ConvertError::EmptyInput);
    }
    Ok(source)
}

/// `input` with its extension replaced by `docx`.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("docx")
}

fn write_artifact(skeleton: &Skeleton, dir: &Path) -> Result<tempfile::NamedTempFile, ConvertError> {
    let io_error = |source: std::io::Error| ConvertError::TemplateIo {
        path: dir.to_path_buf(),
        source,
    };
    let artifact = tempfile::Builder::new()
        .prefix(".md2doc-")
        .suffix(".skeleton.json")
        .tempfile_in(dir)
        .map_err(io_error)?;

    encode_artifact(skeleton, artifact.as_file(), artifact.path())?;
    Ok(artifact)
}

fn encode_artifact(skeleton: &Skeleton, out: impl Write, path: &Path) -> Result<(), ConvertError> {
    let io_error = |source: std::io::Error| ConvertError::TemplateIo {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::new(out);
    serde_json::to_writer(&mut writer, skeleton).map_err(|e| {
        if e.is_io() {
            io_error(e.into())
        } else {
            ConvertError::TemplateEncoding(e)
        }
    })?;
    writer.flush().map_err(io_error)
}

fn read_artifact(path: &Path) -> Result<Skeleton, ConvertError> {
    let bytes = fs::read(path).map_err(|source| ConvertError::TemplateIo {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn persist_output(bytes: &[u8], dir: &Path, output: &Path) -> Result<(), ConvertError> {
    let write_error = |source: std::io::Error| ConvertError::WriteOutput {
        path: output.to_path_buf(),
        source,
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
    tmp.write_all(bytes).map_err(write_error)?;
    tmp.persist(output).map_err(|e| write_error(e.error))?;
    Ok(())
}
