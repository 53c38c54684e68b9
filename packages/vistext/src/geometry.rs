//! Screen-space geometry: aspect-fit display bounds and the mapping from
//! normalized, bottom-left-origin detection regions to top-left screen
//! rectangles.

use serde::{Deserialize, Serialize};
use vistext_ocr::NormalizedRegion;

/// Rectangle in display pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Intersection with `bounds`; empty rectangles collapse onto the nearest edge.
    pub fn clip_to(&self, bounds: &ScreenRect) -> ScreenRect {
        let left = self.x.max(bounds.x).min(bounds.right());
        let top = self.y.max(bounds.y).min(bounds.bottom());
        let right = self.right().min(bounds.right()).max(left);
        let bottom = self.bottom().min(bounds.bottom()).max(top);
        ScreenRect::new(left, top, right - left, bottom - top)
    }
}

/// Size and centering offsets of an aspect-fit image inside a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayBounds {
    pub width: f32,
    pub height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

/// Aspect-fit `image_width` x `image_height` into the viewport, centered.
///
/// The image is scaled by the stricter of the two ratios, so it touches the
/// viewport on at least one axis. Any non-positive dimension yields an empty
/// bounds at the viewport center.
pub fn compute_display_bounds(
    image_width: f32,
    image_height: f32,
    viewport_width: f32,
    viewport_height: f32,
) -> DisplayBounds {
    if image_width <= 0.0 || image_height <= 0.0 || viewport_width <= 0.0 || viewport_height <= 0.0
    {
        return DisplayBounds {
            width: 0.0,
            height: 0.0,
            offset_x: viewport_width.max(0.0) / 2.0,
            offset_y: viewport_height.max(0.0) / 2.0,
        };
    }

    let width_ratio = image_width / viewport_width;
    let height_ratio = image_height / viewport_height;
    let scale_down_ratio = width_ratio.max(height_ratio);

    let width = image_width / scale_down_ratio;
    let height = image_height / scale_down_ratio;

    DisplayBounds {
        width,
        height,
        offset_x: (viewport_width - width) / 2.0,
        offset_y: (viewport_height - height) / 2.0,
    }
}

/// The rectangle the currently shown image occupies on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayContext {
    pub viewport: ScreenRect,
    pub image_bounds: ScreenRect,
}

impl DisplayContext {
    pub fn fit(image_width: u32, image_height: u32, viewport: ScreenRect) -> Self {
        let fitted = compute_display_bounds(
            image_width as f32,
            image_height as f32,
            viewport.width,
            viewport.height,
        );
        Self {
            viewport,
            image_bounds: ScreenRect::new(
                viewport.x + fitted.offset_x,
                viewport.y + fitted.offset_y,
                fitted.width,
                fitted.height,
            ),
        }
    }

    pub fn map(&self, region: &NormalizedRegion) -> ScreenRect {
        map_to_screen(region, &self.image_bounds)
    }
}

/// Maps a normalized region onto `display_bounds`.
///
/// The region's bottom edge lands at `(1 - y) * height + bounds.y`; the
/// returned rectangle extends upward from there.
pub fn map_to_screen(region: &NormalizedRegion, display_bounds: &ScreenRect) -> ScreenRect {
    let width = region.width * display_bounds.width;
    let height = region.height * display_bounds.height;
    let bottom = (1.0 - region.y) * display_bounds.height + display_bounds.y;

    ScreenRect {
        x: region.x * display_bounds.width + display_bounds.x,
        y: bottom - height,
        width,
        height,
    }
}
