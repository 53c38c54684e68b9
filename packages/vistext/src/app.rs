//! The `detect` and `normalize` flows behind the binary.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::info;
use vistext_ocr::{ComponentDetector, SidecarDetector, TextDetector};

use crate::acquisition::{load_oriented, FileAcquirer, ImageAcquirer, ImageSource};
use crate::config::{AppConfig, DetectorSettings, EngineKind};
use crate::controller::{DetectionController, EventOutcome};
use crate::normalizer::{normalize_with, OrientedImage};
use crate::notify::Notifier;
use crate::overlay::DrawSummary;
use crate::report::DetectionReport;
use crate::screen::{compose_screen, save_screen};

pub struct DetectOptions {
    pub image: PathBuf,
    pub source: ImageSource,
    /// Rendered viewport PNG
    pub output: Option<PathBuf>,
    /// JSON report of the drawn shapes
    pub report: Option<PathBuf>,
    pub config: AppConfig,
}

#[derive(Debug)]
pub struct DetectOutcome {
    pub summary: DrawSummary,
    /// Whether the engine failed and a notification was presented.
    pub failed: bool,
    pub report: DetectionReport,
}

pub fn build_detector(settings: &DetectorSettings) -> Result<Arc<dyn TextDetector>> {
    match settings.engine {
        EngineKind::Components => Ok(Arc::new(ComponentDetector::new(settings.components.clone()))),
        EngineKind::Sidecar => {
            let path = settings
                .observations
                .as_ref()
                .ok_or_else(|| anyhow!("the sidecar engine needs an observations file"))?;
            Ok(Arc::new(SidecarDetector::new(path)))
        }
    }
}

/// Picks the image, detects text in it and renders the result.
///
/// Returns `None` when the pick was cancelled.
pub async fn run_detect<N: Notifier>(options: DetectOptions, notifier: N) -> Result<Option<DetectOutcome>> {
    let acquirer = FileAcquirer::new(&options.image);
    let Some(acquired) = acquirer.acquire(options.source).await? else {
        info!("Image selection cancelled");
        return Ok(None);
    };
    let orientation = acquired.image.orientation;

    let detector = build_detector(&options.config.detector)?;
    let engine = detector.name();
    let settings = options.config.controller_settings();
    let filter = settings.resize_filter;
    let mut controller = DetectionController::new(detector, notifier, settings);

    controller.show(acquired);
    let mut summary = DrawSummary::default();
    let mut failed = false;
    for outcome in controller.run_to_idle().await {
        match outcome {
            EventOutcome::Drawn(drawn) => summary = drawn,
            EventOutcome::Failed(_) => failed = true,
            EventOutcome::Stale { .. } => {}
        }
    }

    let displayed = controller
        .displayed()
        .ok_or_else(|| anyhow!("nothing was displayed"))?;

    if let Some(path) = &options.output {
        let canvas = compose_screen(
            displayed.overlay.context(),
            displayed.image.pixels(),
            Some(&displayed.overlay),
            filter,
        )?;
        save_screen(&canvas, path)?;
        info!("Wrote overlay to {}", path.display());
    }

    let report = DetectionReport::new(displayed, Some(&options.image), orientation, engine);
    if let Some(path) = &options.report {
        report.write(path).await?;
        info!("Wrote report to {}", path.display());
    }

    Ok(Some(DetectOutcome {
        summary,
        failed,
        report,
    }))
}

/// Writes an upright, downscaled copy of `input` to `output`.
pub async fn run_normalize(input: &Path, output: &Path, config: &AppConfig) -> Result<OrientedImage> {
    let input = input.to_path_buf();
    let image = tokio::task::spawn_blocking(move || load_oriented(&input)).await??;

    let normalized = normalize_with(&image, config.display.max_dimension, config.display.resize_filter);
    let pixels = normalized
        .pixels()
        .ok_or_else(|| anyhow!("image has no pixels to write"))?;
    pixels.save(output)?;
    info!(
        "Normalized {}x{} {:?} to {}x{}",
        image.width, image.height, image.orientation, normalized.width, normalized.height
    );
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidecar_without_observations_is_rejected() {
        let settings = DetectorSettings {
            engine: EngineKind::Sidecar,
            ..Default::default()
        };
        assert!(build_detector(&settings).is_err());
    }

    #[test]
    fn engines_are_chosen_by_kind() {
        let components = build_detector(&DetectorSettings::default()).unwrap();
        assert_eq!(components.name(), "components");

        let sidecar = build_detector(&DetectorSettings {
            engine: EngineKind::Sidecar,
            observations: Some(PathBuf::from("observations.json")),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(sidecar.name(), "sidecar");
    }
}
