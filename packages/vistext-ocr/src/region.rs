use serde::{Deserialize, Serialize};

/// Box in fractions of the upright image size, origin at the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NormalizedRegion {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Converts a top-left pixel box inside an image of `image_width` x `image_height`.
    pub fn from_pixel_box(
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    ) -> Self {
        let iw = image_width.max(1) as f32;
        let ih = image_height.max(1) as f32;
        Self {
            x: left as f32 / iw,
            y: 1.0 - (top + height) as f32 / ih,
            width: width as f32 / iw,
            height: height as f32 / ih,
        }
    }

    /// Whether all four fields lie in `[0, 1]`.
    pub fn is_within_unit(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }
}

/// A detected line of text and the boxes of its characters, left to right.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextObservation {
    pub bounding_box: NormalizedRegion,
    #[serde(default)]
    pub character_boxes: Vec<NormalizedRegion>,
}

impl TextObservation {
    pub fn new(bounding_box: NormalizedRegion, character_boxes: Vec<NormalizedRegion>) -> Self {
        Self {
            bounding_box,
            character_boxes,
        }
    }
}
