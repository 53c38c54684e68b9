//! Connected-component text detection for dark text on a light background.
//!
//! Each 8-connected blob of dark pixels becomes a character box; boxes that
//! overlap vertically and sit close together horizontally are chained into a
//! line. It is intentionally simple and has no notion of script or font, but
//! it produces the same shape of output as a platform engine and runs
//! anywhere.

use std::collections::BTreeMap;

use async_trait::async_trait;
use image::{imageops, Luma, RgbaImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::region_labelling::{connected_components, Connectivity};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{DetectionError, DetectionRequest, TextDetector};
use crate::orientation::Orientation;
use crate::region::{NormalizedRegion, TextObservation};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentDetectorOptions {
    /// Blobs with fewer pixels are treated as noise.
    pub min_component_area: u32,
    /// Blobs taller than this fraction of the image are treated as background.
    pub max_line_height_fraction: f32,
    /// Largest horizontal gap inside a line, as a multiple of the line height.
    pub line_gap_factor: f32,
}

impl Default for ComponentDetectorOptions {
    fn default() -> Self {
        Self {
            min_component_area: 4,
            max_line_height_fraction: 0.5,
            line_gap_factor: 1.5,
        }
    }
}

pub struct ComponentDetector {
    options: ComponentDetectorOptions,
}

impl ComponentDetector {
    pub fn new(options: ComponentDetectorOptions) -> Self {
        Self { options }
    }
}

impl Default for ComponentDetector {
    fn default() -> Self {
        Self::new(ComponentDetectorOptions::default())
    }
}

#[async_trait]
impl TextDetector for ComponentDetector {
    fn name(&self) -> &'static str {
        "components"
    }

    async fn detect(&self, request: &DetectionRequest) -> Result<Vec<TextObservation>, DetectionError> {
        let (width, height) = request.image.dimensions();
        if width == 0 || height == 0 {
            return Err(DetectionError::InvalidInput(format!(
                "image has no pixels ({width}x{height})"
            )));
        }

        let image = request.image.clone();
        let orientation = request.orientation;
        let report_characters = request.report_character_boxes;
        let options = self.options.clone();

        tokio::task::spawn_blocking(move || {
            detect_lines(&image, orientation, &options, report_characters)
        })
        .await
        .map_err(|e| DetectionError::Engine(e.to_string()))
    }
}

/// Half-open pixel box in upright image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelBox {
    left: u32,
    top: u32,
    right: u32,
    bottom: u32,
}

impl PixelBox {
    fn at(x: u32, y: u32) -> Self {
        Self {
            left: x,
            top: y,
            right: x + 1,
            bottom: y + 1,
        }
    }

    fn width(&self) -> u32 {
        self.right - self.left
    }

    fn height(&self) -> u32 {
        self.bottom - self.top
    }

    fn union(&self, other: &PixelBox) -> PixelBox {
        PixelBox {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    fn vertical_overlap(&self, other: &PixelBox) -> u32 {
        self.bottom
            .min(other.bottom)
            .saturating_sub(self.top.max(other.top))
    }

    fn normalized(&self, image_width: u32, image_height: u32) -> NormalizedRegion {
        NormalizedRegion::from_pixel_box(
            self.left,
            self.top,
            self.width(),
            self.height(),
            image_width,
            image_height,
        )
    }
}

struct Line {
    bounds: PixelBox,
    characters: Vec<PixelBox>,
}

impl Line {
    fn accepts(&self, candidate: &PixelBox, gap_factor: f32) -> bool {
        let min_height = self.bounds.height().min(candidate.height());
        if self.bounds.vertical_overlap(candidate) * 2 < min_height {
            return false;
        }
        let gap = candidate.left.saturating_sub(self.bounds.right) as f32;
        let reach = self.bounds.height().max(candidate.height()) as f32 * gap_factor;
        gap <= reach
    }

    fn push(&mut self, candidate: PixelBox) {
        self.bounds = self.bounds.union(&candidate);
        self.characters.push(candidate);
    }
}

fn detect_lines(
    image: &RgbaImage,
    orientation: Orientation,
    options: &ComponentDetectorOptions,
    report_characters: bool,
) -> Vec<TextObservation> {
    let upright = orientation.apply(image);
    let (width, height) = upright.dimensions();
    let gray = imageops::grayscale(&upright);
    let level = otsu_level(&gray);
    let foreground = threshold(&gray, level, ThresholdType::BinaryInverted);
    let labels = connected_components(&foreground, Connectivity::Eight, Luma([0u8]));

    let mut blobs: BTreeMap<u32, (PixelBox, u32)> = BTreeMap::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label.0[0];
        if label == 0 {
            continue;
        }
        blobs
            .entry(label)
            .and_modify(|(bounds, area)| {
                *bounds = bounds.union(&PixelBox::at(x, y));
                *area += 1;
            })
            .or_insert((PixelBox::at(x, y), 1));
    }

    let max_height = height as f32 * options.max_line_height_fraction;
    let mut characters: Vec<PixelBox> = blobs
        .into_values()
        .filter(|(bounds, area)| {
            *area >= options.min_component_area && bounds.height() as f32 <= max_height
        })
        .map(|(bounds, _)| bounds)
        .collect();
    characters.sort_by_key(|b| (b.left, b.top));

    let mut lines: Vec<Line> = Vec::new();
    for candidate in characters {
        match lines
            .iter_mut()
            .find(|line| line.accepts(&candidate, options.line_gap_factor))
        {
            Some(line) => line.push(candidate),
            None => lines.push(Line {
                bounds: candidate,
                characters: vec![candidate],
            }),
        }
    }
    lines.sort_by_key(|line| (line.bounds.top, line.bounds.left));

    debug!(
        "Component detection on {}x{} (otsu level {}): {} lines",
        width,
        height,
        level,
        lines.len()
    );

    lines
        .into_iter()
        .map(|line| {
            let character_boxes = if report_characters {
                line.characters
                    .iter()
                    .map(|c| c.normalized(width, height))
                    .collect()
            } else {
                Vec::new()
            };
            TextObservation::new(line.bounds.normalized(width, height), character_boxes)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::sync::Arc;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn fill(img: &mut RgbaImage, left: u32, top: u32, w: u32, h: u32) {
        for y in top..top + h {
            for x in left..left + w {
                img.put_pixel(x, y, BLACK);
            }
        }
    }

    /// 60x40 page with one line of three 6x10 glyphs and a second line of two glyphs.
    fn page() -> RgbaImage {
        let mut img = RgbaImage::from_pixel(60, 40, WHITE);
        fill(&mut img, 5, 5, 6, 10);
        fill(&mut img, 20, 5, 6, 10);
        fill(&mut img, 35, 5, 6, 10);
        fill(&mut img, 5, 25, 6, 10);
        fill(&mut img, 18, 25, 6, 10);
        img
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[tokio::test]
    async fn groups_glyphs_into_lines() {
        let detector = ComponentDetector::default();
        let request = DetectionRequest::new(Arc::new(page()), Orientation::Up);
        let observations = detector.detect(&request).await.unwrap();

        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].character_boxes.len(), 3);
        assert_eq!(observations[1].character_boxes.len(), 2);

        let first = observations[0].bounding_box;
        assert!(close(first.x, 5.0 / 60.0));
        assert!(close(first.y, 1.0 - 15.0 / 40.0));
        assert!(close(first.width, 36.0 / 60.0));
        assert!(close(first.height, 10.0 / 40.0));

        let xs: Vec<f32> = observations[0].character_boxes.iter().map(|c| c.x).collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn applies_orientation_before_detecting() {
        let upright = page();
        // Stored pixels that need a clockwise quarter turn to be upright.
        let stored = imageops::rotate270(&upright);
        let detector = ComponentDetector::default();

        let expected = detector
            .detect(&DetectionRequest::new(Arc::new(upright), Orientation::Up))
            .await
            .unwrap();
        let actual = detector
            .detect(&DetectionRequest::new(Arc::new(stored), Orientation::Right))
            .await
            .unwrap();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn blank_page_has_no_text() {
        let detector = ComponentDetector::default();
        let request = DetectionRequest::new(Arc::new(RgbaImage::from_pixel(32, 32, WHITE)), Orientation::Up);
        assert!(detector.detect(&request).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn character_boxes_can_be_suppressed() {
        let detector = ComponentDetector::default();
        let request =
            DetectionRequest::new(Arc::new(page()), Orientation::Up).with_character_boxes(false);
        let observations = detector.detect(&request).await.unwrap();
        assert_eq!(observations.len(), 2);
        assert!(observations.iter().all(|o| o.character_boxes.is_empty()));
    }

    #[tokio::test]
    async fn empty_image_is_invalid_input() {
        let detector = ComponentDetector::default();
        let request = DetectionRequest::new(Arc::new(RgbaImage::new(0, 0)), Orientation::Up);
        assert!(matches!(
            detector.detect(&request).await,
            Err(DetectionError::InvalidInput(_))
        ));
    }
}
