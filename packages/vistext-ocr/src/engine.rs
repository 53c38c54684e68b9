use std::sync::Arc;

use async_trait::async_trait;
use image::RgbaImage;
use thiserror::Error;

use crate::orientation::Orientation;
use crate::region::TextObservation;

/// Pixels in stored order plus the tag describing how to make them upright.
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    pub image: Arc<RgbaImage>,
    pub orientation: Orientation,
    /// Ask the engine for per-character boxes inside each line.
    pub report_character_boxes: bool,
}

impl DetectionRequest {
    pub fn new(image: Arc<RgbaImage>, orientation: Orientation) -> Self {
        Self {
            image,
            orientation,
            report_character_boxes: true,
        }
    }

    pub fn with_character_boxes(mut self, enabled: bool) -> Self {
        self.report_character_boxes = enabled;
        self
    }
}

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("engine error: {0}")]
    Engine(String),
    #[error("failed to read observations: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed observations: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[async_trait]
pub trait TextDetector: Send + Sync {
    /// Short engine name used in logs and reports.
    fn name(&self) -> &'static str;

    async fn detect(&self, request: &DetectionRequest) -> Result<Vec<TextObservation>, DetectionError>;
}
