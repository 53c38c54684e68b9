//! The overlay layer drawn above the displayed image.

use std::fmt;
use std::str::FromStr;

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};
use vistext_ocr::TextObservation;

use crate::geometry::{DisplayContext, ScreenRect};

/// Opaque RGB color written as `#RRGGBB` in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const RED: Color = Color([0xFF, 0x00, 0x00]);
    pub const PURPLE: Color = Color([0x80, 0x00, 0x80]);

    fn rgba(self, alpha: u8) -> Rgba<u8> {
        let [r, g, b] = self.0;
        Rgba([r, g, b, alpha])
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("expected #RRGGBB, got {s:?}"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| format!("expected #RRGGBB, got {s:?}"))
        };
        Ok(Color([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02X}{g:02X}{b:02X}")
    }
}

/// Lines of text are red, individual characters purple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub line_color: Color,
    pub line_border_width: u32,
    pub character_color: Color,
    pub character_border_width: u32,
    /// Opacity of the whole layer, 0.0 - 1.0.
    pub opacity: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            line_color: Color::RED,
            line_border_width: 2,
            character_color: Color::PURPLE,
            character_border_width: 1,
            opacity: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Line,
    Character,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayShape {
    pub kind: ShapeKind,
    pub rect: ScreenRect,
    pub color: Color,
    pub border_width: u32,
}

/// Counts of shapes added by one [`OverlayLayer::draw_text`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawSummary {
    pub lines: usize,
    pub characters: usize,
}

/// Transparent surface over the displayed image for one selection.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayer {
    generation: u64,
    context: DisplayContext,
    opacity: f32,
    shapes: Vec<OverlayShape>,
}

impl OverlayLayer {
    pub fn new(generation: u64, context: DisplayContext, opacity: f32) -> Self {
        Self {
            generation,
            context,
            opacity: opacity.clamp(0.0, 1.0),
            shapes: Vec::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn bounds(&self) -> ScreenRect {
        self.context.image_bounds
    }

    pub fn context(&self) -> &DisplayContext {
        &self.context
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn shapes(&self) -> &[OverlayShape] {
        &self.shapes
    }

    pub fn count(&self, kind: ShapeKind) -> usize {
        self.shapes.iter().filter(|s| s.kind == kind).count()
    }

    /// Adds a box per observed line followed by a box per character in it.
    pub fn draw_text(&mut self, observations: &[TextObservation], style: &OverlayStyle) -> DrawSummary {
        let mut summary = DrawSummary::default();
        for observation in observations {
            self.shapes.push(OverlayShape {
                kind: ShapeKind::Line,
                rect: self.context.map(&observation.bounding_box),
                color: style.line_color,
                border_width: style.line_border_width,
            });
            summary.lines += 1;

            for character in &observation.character_boxes {
                self.shapes.push(OverlayShape {
                    kind: ShapeKind::Character,
                    rect: self.context.map(character),
                    color: style.character_color,
                    border_width: style.character_border_width,
                });
                summary.characters += 1;
            }
        }
        summary
    }

    /// Alpha-blends the shapes onto `canvas`, whose top-left pixel sits at `origin` on screen.
    ///
    /// Shapes may extend far past the canvas; only the border lines that can
    /// reach it are drawn, clipped to one pixel beyond each edge.
    pub fn render_onto(&self, canvas: &mut RgbaImage, origin: (f32, f32)) {
        if self.shapes.is_empty() {
            return;
        }
        let (width, height) = canvas.dimensions();
        let mut layer = RgbaImage::new(width, height);
        let alpha = (self.opacity * 255.0).round() as u8;
        let (canvas_width, canvas_height) = (width as f32, height as f32);
        let drawable = ScreenRect::new(-1.0, -1.0, canvas_width + 2.0, canvas_height + 2.0);

        for shape in &self.shapes {
            let color = shape.color.rgba(alpha);
            let local = ScreenRect {
                x: shape.rect.x - origin.0,
                y: shape.rect.y - origin.1,
                ..shape.rect
            };
            for inset in visible_insets(&local, shape.border_width, width, height) {
                // Insets ascend, so once one collapses the rest do too.
                let Some(rect) = inset_rect(&local, inset) else {
                    break;
                };
                let off_canvas = rect.right() < 0.0
                    || rect.x > canvas_width
                    || rect.bottom() < 0.0
                    || rect.y > canvas_height;
                if off_canvas {
                    continue;
                }
                let clipped = rect.clip_to(&drawable);
                let pixels = Rect::at(clipped.x.round() as i32, clipped.y.round() as i32).of_size(
                    clipped.width.round().max(1.0) as u32,
                    clipped.height.round().max(1.0) as u32,
                );
                draw_hollow_rect_mut(&mut layer, pixels, color);
            }
        }

        image::imageops::overlay(canvas, &layer, 0, 0);
    }
}

/// Insets (in pixels from the outer edge) whose border line can land on a
/// `canvas_width` x `canvas_height` canvas, ascending.
///
/// At most `border_width` insets and never more than half the shorter side;
/// every inset yields one line per edge, so only those near the canvas matter.
fn visible_insets(rect: &ScreenRect, border_width: u32, canvas_width: u32, canvas_height: u32) -> Vec<u32> {
    let (x, y, w, h) = (rect.x as f64, rect.y as f64, rect.width as f64, rect.height as f64);
    if ![x, y, w, h].iter().all(|v| v.is_finite()) {
        return Vec::new();
    }
    let half = (w.min(h).max(0.0) / 2.0).ceil().max(1.0);
    let last = (border_width.max(1) as f64).min(half) - 1.0;
    let (cw, ch) = (canvas_width as f64, canvas_height as f64);

    // Inset ranges that put the left, right, top and bottom line within a pixel of the canvas.
    let ranges = [
        (-1.0 - x, cw + 1.0 - x),
        (x + w - cw - 1.0, x + w + 1.0),
        (-1.0 - y, ch + 1.0 - y),
        (y + h - ch - 1.0, y + h + 1.0),
    ];
    let mut insets = Vec::new();
    for (low, high) in ranges {
        let low = low.floor().max(0.0);
        let high = high.ceil().min(last);
        if low <= high {
            insets.extend(low as u32..=high as u32);
        }
    }
    insets.sort_unstable();
    insets.dedup();
    insets
}

/// `rect` shrunk by `inset` on every side and snapped to whole pixels; empty boxes still cover one pixel.
fn inset_rect(rect: &ScreenRect, inset: u32) -> Option<ScreenRect> {
    if !(rect.x.is_finite() && rect.y.is_finite() && rect.width.is_finite() && rect.height.is_finite()) {
        return None;
    }
    let inset = inset as f32;
    let width = rect.width.round() - 2.0 * inset;
    let height = rect.height.round() - 2.0 * inset;
    if inset > 0.0 && (width <= 0.0 || height <= 0.0) {
        return None;
    }
    Some(ScreenRect::new(
        (rect.x + inset).round(),
        (rect.y + inset).round(),
        width.max(1.0),
        height.max(1.0),
    ))
}
