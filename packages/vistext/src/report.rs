//! JSON description of what a detection drew.

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::fs;
use vistext_ocr::Orientation;

use crate::controller::Displayed;
use crate::geometry::ScreenRect;
use crate::overlay::{OverlayShape, ShapeKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    pub version: String,
    pub generated_at: String,
    pub source: Option<String>,
    pub engine: String,
    pub orientation: Orientation,
    /// Dimensions of the upright, downscaled image.
    pub image_width: u32,
    pub image_height: u32,
    pub viewport: ScreenRect,
    pub display_bounds: ScreenRect,
    pub total_lines: usize,
    pub total_characters: usize,
    pub shapes: Vec<OverlayShape>,
}

impl DetectionReport {
    pub fn new(
        displayed: &Displayed,
        source: Option<&Path>,
        orientation: Orientation,
        engine: &str,
    ) -> Self {
        let overlay = &displayed.overlay;
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now().to_rfc3339(),
            source: source.map(|p| p.display().to_string()),
            engine: engine.to_string(),
            orientation,
            image_width: displayed.image.width,
            image_height: displayed.image.height,
            viewport: overlay.context().viewport,
            display_bounds: overlay.bounds(),
            total_lines: overlay.count(ShapeKind::Line),
            total_characters: overlay.count(ShapeKind::Character),
            shapes: overlay.shapes().to_vec(),
        }
    }

    pub async fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).await?;
        Ok(())
    }
}
