//! Downscales a photo and bakes its orientation tag into the pixels.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vistext_ocr::Orientation;

/// Longest edge shown on screen unless configured otherwise.
pub const DEFAULT_MAX_DIMENSION: u32 = 640;

/// An image as it came from acquisition: stored pixels plus orientation tag.
///
/// `width` and `height` are the advertised stored dimensions. The pixel
/// backing may be missing, e.g. when a raw buffer did not match them.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientedImage {
    pub width: u32,
    pub height: u32,
    pub orientation: Orientation,
    pixels: Option<RgbaImage>,
}

impl OrientedImage {
    pub fn new(pixels: RgbaImage, orientation: Orientation) -> Self {
        let (width, height) = pixels.dimensions();
        let pixels = (width > 0 && height > 0).then_some(pixels);
        Self {
            width,
            height,
            orientation,
            pixels,
        }
    }

    /// Wraps a raw RGBA8 buffer; a buffer too short for the dimensions leaves no backing.
    pub fn from_raw(width: u32, height: u32, buffer: Vec<u8>, orientation: Orientation) -> Self {
        let pixels = RgbaImage::from_raw(width, height, buffer).filter(|_| width > 0 && height > 0);
        if pixels.is_none() {
            warn!("Raw buffer does not back a {}x{} RGBA image", width, height);
        }
        Self {
            width,
            height,
            orientation,
            pixels,
        }
    }

    /// Dimensions-only image with no pixel backing.
    pub fn unbacked(width: u32, height: u32, orientation: Orientation) -> Self {
        Self {
            width,
            height,
            orientation,
            pixels: None,
        }
    }

    pub fn pixels(&self) -> Option<&RgbaImage> {
        self.pixels.as_ref()
    }

    pub fn into_pixels(self) -> Option<RgbaImage> {
        self.pixels
    }

    pub fn has_backing(&self) -> bool {
        self.pixels.is_some()
    }
}

/// Resampling filter used when scaling down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Stored dimensions after limiting the longer edge to `max_dimension`.
pub fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }
    let max = max_dimension as f64;
    let ratio = width as f64 / height as f64;
    if width > height {
        (max_dimension, ((max / ratio).round() as u32).max(1))
    } else {
        (((max * ratio).round() as u32).max(1), max_dimension)
    }
}

/// Normalizes with the default bilinear filter.
pub fn normalize(image: &OrientedImage, max_dimension: u32) -> OrientedImage {
    normalize_with(image, max_dimension, ResizeFilter::default())
}

/// Returns an upright copy of `image` no larger than `max_dimension` on either edge.
///
/// Left/right orientations come back with width and height swapped. An
/// image without pixel backing is returned unchanged.
pub fn normalize_with(image: &OrientedImage, max_dimension: u32, filter: ResizeFilter) -> OrientedImage {
    let Some(pixels) = image.pixels() else {
        warn!("Image has no pixel backing; leaving it as is");
        return image.clone();
    };

    let (width, height) = pixels.dimensions();
    let (scaled_width, scaled_height) = scaled_dimensions(width, height, max_dimension);

    if image.orientation == Orientation::Up && (scaled_width, scaled_height) == (width, height) {
        return image.clone();
    }

    let scaled = if (scaled_width, scaled_height) == (width, height) {
        pixels.clone()
    } else {
        imageops::resize(pixels, scaled_width, scaled_height, filter.into())
    };
    let upright = image.orientation.apply(&scaled);

    debug!(
        "Normalized {}x{} {:?} to {}x{}",
        width,
        height,
        image.orientation,
        upright.width(),
        upright.height()
    );

    OrientedImage::new(upright, Orientation::Up)
}
