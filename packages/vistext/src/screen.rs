//! Renders what the viewport shows: the aspect-fit image and its overlay.

use std::path::{Path, PathBuf};

use image::imageops;
use image::{Rgba, RgbaImage};
use thiserror::Error;

use crate::geometry::DisplayContext;
use crate::normalizer::ResizeFilter;
use crate::overlay::OverlayLayer;

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("viewport {width}x{height} is too small to render")]
    EmptyViewport { width: f32, height: f32 },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Draws `image` into its display bounds on a black viewport and blends `overlay` on top.
pub fn compose_screen(
    context: &DisplayContext,
    image: Option<&RgbaImage>,
    overlay: Option<&OverlayLayer>,
    filter: ResizeFilter,
) -> Result<RgbaImage, RenderError> {
    let viewport = context.viewport;
    let width = viewport.width.round();
    let height = viewport.height.round();
    if !(width >= 1.0 && height >= 1.0) {
        return Err(RenderError::EmptyViewport {
            width: viewport.width,
            height: viewport.height,
        });
    }
    let mut canvas = RgbaImage::from_pixel(width as u32, height as u32, BACKGROUND);

    let bounds = context.image_bounds;
    let shown_width = bounds.width.round() as u32;
    let shown_height = bounds.height.round() as u32;
    if let Some(image) = image.filter(|_| shown_width > 0 && shown_height > 0) {
        let shown = if image.dimensions() == (shown_width, shown_height) {
            image.clone()
        } else {
            imageops::resize(image, shown_width, shown_height, filter.into())
        };
        imageops::overlay(
            &mut canvas,
            &shown,
            (bounds.x - viewport.x).round() as i64,
            (bounds.y - viewport.y).round() as i64,
        );
    }

    if let Some(overlay) = overlay {
        overlay.render_onto(&mut canvas, (viewport.x, viewport.y));
    }

    Ok(canvas)
}

/// Writes `canvas` to `path`, format chosen by extension.
pub fn save_screen(canvas: &RgbaImage, path: &Path) -> Result<(), RenderError> {
    canvas.save(path).map_err(|source| RenderError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ScreenRect;
    use crate::overlay::OverlayStyle;
    use vistext_ocr::{NormalizedRegion, TextObservation};

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    #[test]
    fn letterboxes_the_image_inside_the_viewport() {
        let context = DisplayContext::fit(400, 200, ScreenRect::new(0.0, 0.0, 100.0, 100.0));
        let image = RgbaImage::from_pixel(400, 200, WHITE);
        let canvas = compose_screen(&context, Some(&image), None, ResizeFilter::Nearest).unwrap();

        assert_eq!(canvas.dimensions(), (100, 100));
        assert_eq!(canvas.get_pixel(50, 10), &BACKGROUND);
        assert_eq!(canvas.get_pixel(50, 50), &WHITE);
        assert_eq!(canvas.get_pixel(50, 90), &BACKGROUND);
    }

    #[test]
    fn overlay_is_drawn_relative_to_the_viewport_origin() {
        let viewport = ScreenRect::new(10.0, 20.0, 100.0, 100.0);
        let context = DisplayContext::fit(100, 100, viewport);
        let mut overlay = OverlayLayer::new(1, context, 1.0);
        overlay.draw_text(
            &[TextObservation::new(NormalizedRegion::new(0.0, 0.0, 1.0, 1.0), vec![])],
            &OverlayStyle::default(),
        );

        let canvas = compose_screen(&context, None, Some(&overlay), ResizeFilter::Nearest).unwrap();
        let corner = canvas.get_pixel(0, 0).0;
        assert!(corner[0] > 250 && corner[1] < 5 && corner[2] < 5, "{corner:?}");
        assert_eq!(canvas.get_pixel(50, 50), &BACKGROUND);
    }

    #[test]
    fn empty_viewport_is_an_error() {
        let context = DisplayContext::fit(10, 10, ScreenRect::new(0.0, 0.0, 0.0, 50.0));
        assert!(matches!(
            compose_screen(&context, None, None, ResizeFilter::Nearest),
            Err(RenderError::EmptyViewport { .. })
        ));
    }
}
