//! Image resolution
//!
//!     Image references are either `http(s)` URLs, fetched with a blocking reqwest client
//!     (feature `network`), or local paths resolved against the Markdown file's directory.
//!     Whatever the source, the bytes are decoded, shrunk to fit the configured pixel box,
//!     flattened onto white and re-encoded as PNG so the writer only ever sees one format.

use super::cache::AssetCache;
use super::Raster;
use crate::error::ResolutionError;
use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Loads the picture behind an image reference.
pub trait ImageSource: Send + Sync {
    fn load(&self, source: &str) -> Result<Raster, ResolutionError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageOptions {
    pub timeout: Duration,
    /// Total attempts for a remote fetch, at least 1.
    pub max_retries: u32,
    /// Delay before retry `n` is `backoff * n`.
    pub backoff: Duration,
    pub max_width_px: u32,
    pub max_height_px: u32,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff: Duration::from_millis(1000),
            max_width_px: 1200,
            max_height_px: 1600,
        }
    }
}

pub struct ImageFetcher {
    options: ImageOptions,
    base_dir: Option<PathBuf>,
    cache: Option<AssetCache>,
    #[cfg(feature = "network")]
    client: Option<reqwest::blocking::Client>,
}

impl ImageFetcher {
    pub fn new(options: ImageOptions) -> Self {
        #[cfg(feature = "network")]
        let client = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!("md2doc/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| log::warn!("HTTP client unavailable, remote images disabled: {e}"))
            .ok();

        Self {
            options,
            base_dir: None,
            cache: None,
            #[cfg(feature = "network")]
            client,
        }
    }

    /// Directory relative image paths are resolved against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn with_cache(mut self, cache: AssetCache) -> Self {
        self.cache = Some(cache);
        self
    }

    fn fetch_remote_cached(&self, url: &str) -> Result<Vec<u8>, ResolutionError> {
        let key = AssetCache::key(&[url.as_bytes()]);
        if let Some(bytes) = self.cache.as_ref().and_then(|c| c.get(&key, "img")) {
            return Ok(bytes);
        }
        let bytes = self.fetch_remote(url)?;
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(&key, "img", &bytes) {
                log::debug!("could not cache {url}: {e}");
            }
        }
        Ok(bytes)
    }

    #[cfg(feature = "network")]
    fn fetch_remote(&self, url: &str) -> Result<Vec<u8>, ResolutionError> {
        let client = self.client.as_ref().ok_or_else(|| ResolutionError::Network {
            source_url: url.to_string(),
            attempts: 0,
            reason: "HTTP client unavailable".to_string(),
        })?;

        let attempts = self.options.max_retries.max(1);
        let mut last_error = String::new();
        for attempt in 1..=attempts {
            log::debug!("fetching {url} (attempt {attempt}/{attempts})");
            let result = client
                .get(url)
                .send()
                .and_then(|response| response.error_for_status())
                .and_then(|response| response.bytes());
            match result {
                Ok(bytes) => return Ok(bytes.to_vec()),
                Err(e) => {
                    last_error = e.to_string();
                    log::debug!("fetching {url} failed: {last_error}");
                    if attempt < attempts {
                        std::thread::sleep(self.options.backoff * attempt);
                    }
                }
            }
        }
        Err(ResolutionError::Network {
            source_url: url.to_string(),
            attempts,
            reason: last_error,
        })
    }

    #[cfg(not(feature = "network"))]
    fn fetch_remote(&self, url: &str) -> Result<Vec<u8>, ResolutionError> {
        Err(ResolutionError::Unsupported(format!(
            "remote image {url}: network support is not compiled in (feature `network`)"
        )))
    }

    fn read_local(&self, source: &str) -> Result<Vec<u8>, ResolutionError> {
        let path = self.local_path(source);
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ResolutionError::Unsupported(format!(
                "image format of {}",
                path.display()
            )));
        }
        std::fs::read(&path).map_err(|_| ResolutionError::NotFound(path.display().to_string()))
    }

    fn local_path(&self, source: &str) -> PathBuf {
        let source = source.strip_prefix("file://").unwrap_or(source);
        let path = Path::new(source);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ImageSource for ImageFetcher {
    fn load(&self, source: &str) -> Result<Raster, ResolutionError> {
        let bytes = if is_remote(source) {
            self.fetch_remote_cached(source)?
        } else {
            self.read_local(source)?
        };
        normalize(&bytes, self.options.max_width_px, self.options.max_height_px)
    }
}

pub fn is_remote(source: &str) -> bool {
    let lower = source.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Decode, fit within `max_w x max_h` (never enlarging), flatten alpha on white, encode PNG.
pub fn normalize(bytes: &[u8], max_w: u32, max_h: u32) -> Result<Raster, ResolutionError> {
    let mut img =
        image::load_from_memory(bytes).map_err(|e| ResolutionError::Decode(e.to_string()))?;

    let (w, h) = img.dimensions();
    if w > max_w || h > max_h {
        img = img.resize(max_w, max_h, FilterType::Lanczos3);
    }

    let flattened = if img.color().has_alpha() {
        DynamicImage::ImageRgb8(flatten_on_white(&img))
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };

    let (width, height) = flattened.dimensions();
    let mut out = Vec::new();
    flattened
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|e| ResolutionError::Decode(e.to_string()))?;

    Ok(Raster {
        bytes: out,
        width,
        height,
    })
}

fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| ((c as u32 * a as u32 + 255 * (255 - a as u32)) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}
