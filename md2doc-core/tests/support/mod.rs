//! Shared fixtures and stub collaborators.

use md2doc_core::chart::render::ChartRenderer;
use md2doc_core::chart::ChartTable;
use md2doc_core::error::ResolutionError;
use md2doc_core::resolve::image::ImageSource;
use md2doc_core::resolve::{CancelToken, Raster};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const REPORT: &str = include_str!("../fixtures/report.md");

/// A real PNG of the given size, so the DOCX writer can embed it.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([200, 60, 60]),
    ));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Serves a fixed raster for every URL except those containing "missing".
#[derive(Default)]
pub struct StubImages {
    pub calls: AtomicUsize,
}

impl ImageSource for StubImages {
    fn load(&self, source: &str) -> Result<Raster, ResolutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if source.contains("missing") {
            return Err(ResolutionError::NotFound(source.to_string()));
        }
        Ok(Raster {
            bytes: png(64, 48),
            width: 64,
            height: 48,
        })
    }
}

/// Renders every chart to the same small raster.
pub struct StubCharts;

impl ChartRenderer for StubCharts {
    fn render(&self, _chart: &ChartTable) -> Result<Raster, ResolutionError> {
        Ok(Raster {
            bytes: png(80, 50),
            width: 80,
            height: 50,
        })
    }
}

/// Always fails, so charts fall back to data tables.
pub struct BrokenCharts;

impl ChartRenderer for BrokenCharts {
    fn render(&self, _chart: &ChartTable) -> Result<Raster, ResolutionError> {
        Err(ResolutionError::Render("no backend".to_string()))
    }
}

/// Cancels the shared token the first time an image is requested.
pub struct CancellingImages(pub CancelToken);

impl ImageSource for CancellingImages {
    fn load(&self, _source: &str) -> Result<Raster, ResolutionError> {
        self.0.cancel();
        Err(ResolutionError::Cancelled)
    }
}

pub fn stub_images() -> Arc<StubImages> {
    Arc::new(StubImages::default())
}

/// Outline with trailing whitespace removed from each line.
pub fn outline(skeleton: &md2doc_core::Skeleton) -> String {
    skeleton
        .outline()
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}
