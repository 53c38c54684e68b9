//! Replays observations recorded by an external engine run.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::engine::{DetectionError, DetectionRequest, TextDetector};
use crate::region::TextObservation;

/// Reads a JSON array of [`TextObservation`] each time detection is requested.
pub struct SidecarDetector {
    path: PathBuf,
}

impl SidecarDetector {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TextDetector for SidecarDetector {
    fn name(&self) -> &'static str {
        "sidecar"
    }

    async fn detect(&self, request: &DetectionRequest) -> Result<Vec<TextObservation>, DetectionError> {
        let raw = tokio::fs::read(&self.path).await?;
        let mut observations: Vec<TextObservation> = serde_json::from_slice(&raw)?;
        if !request.report_character_boxes {
            for observation in &mut observations {
                observation.character_boxes.clear();
            }
        }
        debug!(
            "Loaded {} observations from {}",
            observations.len(),
            self.path.display()
        );
        Ok(observations)
    }
}
