//! Drives one detection per selected image and owns what is on screen.
//!
//! Every call to [`DetectionController::show`] starts a new generation: the
//! previous overlay is torn down, any detection still running is aborted, and
//! a fresh detection is spawned in the background. Results come back over a
//! channel and are applied by [`DetectionController::process_next`] on the
//! task that owns the controller; results tagged with an older generation are
//! dropped without touching the overlay.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vistext_ocr::{DetectionError, DetectionRequest, TextDetector, TextObservation};

use crate::acquisition::AcquiredImage;
use crate::geometry::{DisplayContext, ScreenRect};
use crate::normalizer::{normalize_with, OrientedImage, ResizeFilter, DEFAULT_MAX_DIMENSION};
use crate::notify::{Notification, Notifier, IMAGE_REQUEST_FAILED, TEXT_DETECTION_ERROR};
use crate::overlay::{DrawSummary, OverlayLayer, OverlayStyle};

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    pub viewport: ScreenRect,
    pub max_dimension: u32,
    pub resize_filter: ResizeFilter,
    pub style: OverlayStyle,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            viewport: ScreenRect::new(0.0, 0.0, 375.0, 667.0),
            max_dimension: DEFAULT_MAX_DIMENSION,
            resize_filter: ResizeFilter::default(),
            style: OverlayStyle::default(),
        }
    }
}

/// Result of one detection, tagged with the selection it was started for.
#[derive(Debug)]
pub struct DetectionEvent {
    pub generation: u64,
    pub outcome: Result<Vec<TextObservation>, DetectionError>,
}

/// What applying a [`DetectionEvent`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Drawn(DrawSummary),
    Stale { generation: u64 },
    Failed(Notification),
}

/// The normalized image on screen and the overlay above it.
#[derive(Debug, Clone)]
pub struct Displayed {
    pub image: OrientedImage,
    pub overlay: OverlayLayer,
}

pub struct DetectionController<N: Notifier> {
    detector: Arc<dyn TextDetector>,
    notifier: N,
    settings: ControllerSettings,
    generation: u64,
    displayed: Option<Displayed>,
    in_flight: Option<JoinHandle<()>>,
    events_tx: UnboundedSender<DetectionEvent>,
    events_rx: UnboundedReceiver<DetectionEvent>,
}

impl<N: Notifier> DetectionController<N> {
    pub fn new(detector: Arc<dyn TextDetector>, notifier: N, settings: ControllerSettings) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            detector,
            notifier,
            settings,
            generation: 0,
            displayed: None,
            in_flight: None,
            events_tx,
            events_rx,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn displayed(&self) -> Option<&Displayed> {
        self.displayed.as_ref()
    }

    pub fn overlay(&self) -> Option<&OverlayLayer> {
        self.displayed.as_ref().map(|d| &d.overlay)
    }

    /// Whether a detection for the current generation may still report back.
    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Shows a newly picked image and starts detecting text in it.
    ///
    /// Must be called from within a tokio runtime. Returns the new generation.
    pub fn show(&mut self, acquired: AcquiredImage) -> u64 {
        self.generation += 1;
        let generation = self.generation;

        if let Some(task) = self.in_flight.take() {
            task.abort();
            debug!("Cancelled detection superseded by generation {}", generation);
        }
        self.displayed = None;

        let normalized = normalize_with(
            &acquired.image,
            self.settings.max_dimension,
            self.settings.resize_filter,
        );
        let context = DisplayContext::fit(normalized.width, normalized.height, self.settings.viewport);
        debug!(
            "Generation {} displays {}x{} at {:?}",
            generation, normalized.width, normalized.height, context.image_bounds
        );
        self.displayed = Some(Displayed {
            image: normalized,
            overlay: OverlayLayer::new(generation, context, self.settings.style.opacity),
        });

        let orientation = acquired.image.orientation;
        let Some(pixels) = acquired.image.into_pixels() else {
            warn!("Selected image has no pixel backing; skipping text detection");
            return generation;
        };

        let request = DetectionRequest::new(Arc::new(pixels), orientation);
        let detector = self.detector.clone();
        let events_tx = self.events_tx.clone();
        info!("Running {} text detection for generation {}", detector.name(), generation);

        self.in_flight = Some(tokio::spawn(async move {
            let outcome = detector.detect(&request).await;
            // The receiver lives as long as the controller.
            let _ = events_tx.send(DetectionEvent { generation, outcome });
        }));

        generation
    }

    /// Waits for the next detection result and applies it.
    ///
    /// Returns `None` once nothing is pending.
    pub async fn process_next(&mut self) -> Option<EventOutcome> {
        if let Ok(event) = self.events_rx.try_recv() {
            return Some(self.apply(event));
        }

        let task = self.in_flight.take()?;
        if let Err(e) = task.await {
            let event = DetectionEvent {
                generation: self.generation,
                outcome: Err(DetectionError::Engine(format!("detection task failed: {e}"))),
            };
            return Some(self.apply(event));
        }

        self.events_rx.try_recv().ok().map(|event| self.apply(event))
    }

    /// Applies results until no detection is pending.
    pub async fn run_to_idle(&mut self) -> Vec<EventOutcome> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.process_next().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    fn apply(&mut self, event: DetectionEvent) -> EventOutcome {
        let current = self.generation;
        let Some(displayed) = self
            .displayed
            .as_mut()
            .filter(|_| event.generation == current)
        else {
            debug!(
                "Discarding results of generation {} (current is {})",
                event.generation, current
            );
            return EventOutcome::Stale {
                generation: event.generation,
            };
        };
        self.in_flight = None;

        match event.outcome {
            Ok(observations) => {
                let summary = displayed.overlay.draw_text(&observations, &self.settings.style);
                info!(
                    "Drew {} text lines and {} characters",
                    summary.lines, summary.characters
                );
                EventOutcome::Drawn(summary)
            }
            Err(e) => {
                let notification = Notification::new(failure_title(&e), e.to_string());
                self.notifier.present(&notification);
                EventOutcome::Failed(notification)
            }
        }
    }
}

/// Requests the engine refused outright are reported apart from failures while detecting.
fn failure_title(error: &DetectionError) -> &'static str {
    match error {
        DetectionError::InvalidInput(_) => IMAGE_REQUEST_FAILED,
        _ => TEXT_DETECTION_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::ImageSource;
    use crate::notify::RecordingNotifier;
    use crate::overlay::ShapeKind;
    use async_trait::async_trait;
    use image::RgbaImage;
    use std::time::Duration;
    use vistext_ocr::{NormalizedRegion, Orientation};

    /// One line whose character count equals the image width.
    struct WidthDetector {
        delay_when_width: Option<u32>,
    }

    #[async_trait]
    impl TextDetector for WidthDetector {
        fn name(&self) -> &'static str {
            "width"
        }

        async fn detect(&self, request: &DetectionRequest) -> Result<Vec<TextObservation>, DetectionError> {
            let width = request.image.width();
            if self.delay_when_width == Some(width) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            let chars = (0..width)
                .map(|i| NormalizedRegion::new(i as f32 * 0.1, 0.5, 0.1, 0.1))
                .collect();
            Ok(vec![TextObservation::new(
                NormalizedRegion::new(0.0, 0.5, 1.0, 0.1),
                chars,
            )])
        }
    }

    struct FixedDetector(Vec<TextObservation>);

    #[async_trait]
    impl TextDetector for FixedDetector {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn detect(&self, _: &DetectionRequest) -> Result<Vec<TextObservation>, DetectionError> {
            Ok(self.0.clone())
        }
    }

    struct FailingDetector;

    #[async_trait]
    impl TextDetector for FailingDetector {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn detect(&self, _: &DetectionRequest) -> Result<Vec<TextObservation>, DetectionError> {
            Err(DetectionError::Engine("request handler refused the image".into()))
        }
    }

    struct PanickingDetector;

    #[async_trait]
    impl TextDetector for PanickingDetector {
        fn name(&self) -> &'static str {
            "panicking"
        }

        async fn detect(&self, _: &DetectionRequest) -> Result<Vec<TextObservation>, DetectionError> {
            panic!("engine crashed")
        }
    }

    fn picked(width: u32, height: u32) -> AcquiredImage {
        AcquiredImage {
            image: OrientedImage::new(RgbaImage::new(width, height), Orientation::Up),
            source: ImageSource::PhotoLibrary,
            path: None,
        }
    }

    fn controller(detector: impl TextDetector + 'static) -> (DetectionController<RecordingNotifier>, RecordingNotifier) {
        let notifier = RecordingNotifier::new();
        let controller = DetectionController::new(
            Arc::new(detector),
            notifier.clone(),
            ControllerSettings::default(),
        );
        (controller, notifier)
    }

    #[tokio::test]
    async fn zero_observations_leave_an_empty_overlay() {
        let (mut controller, notifier) = controller(FixedDetector(vec![]));
        controller.show(picked(40, 20));

        let outcomes = controller.run_to_idle().await;
        assert_eq!(outcomes, vec![EventOutcome::Drawn(DrawSummary::default())]);
        assert!(controller.overlay().unwrap().shapes().is_empty());
        assert!(notifier.presented().is_empty());
        assert!(!controller.is_pending());
    }

    #[tokio::test]
    async fn one_line_with_three_characters_draws_four_boxes() {
        let observation = TextObservation::new(
            NormalizedRegion::new(0.1, 0.4, 0.6, 0.1),
            vec![
                NormalizedRegion::new(0.1, 0.4, 0.2, 0.1),
                NormalizedRegion::new(0.3, 0.4, 0.2, 0.1),
                NormalizedRegion::new(0.5, 0.4, 0.2, 0.1),
            ],
        );
        let (mut controller, _) = controller(FixedDetector(vec![observation]));
        controller.show(picked(40, 20));
        controller.run_to_idle().await;

        let overlay = controller.overlay().unwrap();
        assert_eq!(overlay.count(ShapeKind::Line), 1);
        assert_eq!(overlay.count(ShapeKind::Character), 3);
        assert_eq!(overlay.generation(), 1);
    }

    #[tokio::test]
    async fn engine_failure_is_presented_once() {
        let (mut controller, notifier) = controller(FailingDetector);
        controller.show(picked(40, 20));

        let outcomes = controller.run_to_idle().await;
        assert_eq!(outcomes.len(), 1);
        let presented = notifier.presented();
        assert_eq!(presented.len(), 1);
        assert_eq!(presented[0].title, TEXT_DETECTION_ERROR);
        assert!(presented[0].message.contains("refused"));
        assert!(controller.overlay().unwrap().shapes().is_empty());
    }

    struct RejectingDetector;

    #[async_trait]
    impl TextDetector for RejectingDetector {
        fn name(&self) -> &'static str {
            "rejecting"
        }

        async fn detect(&self, _: &DetectionRequest) -> Result<Vec<TextObservation>, DetectionError> {
            Err(DetectionError::InvalidInput("unsupported pixel format".into()))
        }
    }

    #[tokio::test]
    async fn rejected_request_is_presented_as_request_failure() {
        let (mut controller, notifier) = controller(RejectingDetector);
        controller.show(picked(40, 20));

        let outcomes = controller.run_to_idle().await;
        assert!(matches!(outcomes.as_slice(), [EventOutcome::Failed(_)]));
        let presented = notifier.presented();
        assert_eq!(presented.len(), 1);
        assert_eq!(presented[0].title, IMAGE_REQUEST_FAILED);
        assert!(presented[0].message.contains("unsupported pixel format"));
    }

    #[tokio::test]
    async fn panicking_engine_surfaces_as_failure() {
        let (mut controller, notifier) = controller(PanickingDetector);
        controller.show(picked(40, 20));

        let outcomes = controller.run_to_idle().await;
        assert!(matches!(outcomes.as_slice(), [EventOutcome::Failed(_)]));
        assert_eq!(notifier.presented().len(), 1);
    }

    #[tokio::test]
    async fn superseded_running_detection_is_cancelled() {
        let (mut controller, _) = controller(WidthDetector {
            delay_when_width: Some(2),
        });
        assert_eq!(controller.show(picked(2, 2)), 1);
        assert_eq!(controller.show(picked(3, 2)), 2);

        let outcomes = controller.run_to_idle().await;
        assert_eq!(
            outcomes,
            vec![EventOutcome::Drawn(DrawSummary {
                lines: 1,
                characters: 3
            })]
        );
        assert_eq!(controller.overlay().unwrap().generation(), 2);
    }

    #[tokio::test]
    async fn results_from_an_older_generation_are_discarded() {
        let (mut controller, _) = controller(WidthDetector {
            delay_when_width: None,
        });
        controller.show(picked(2, 2));
        // Let the first detection finish and report before the next pick.
        tokio::time::sleep(Duration::from_millis(20)).await;
        controller.show(picked(3, 2));

        let outcomes = controller.run_to_idle().await;
        assert_eq!(
            outcomes,
            vec![
                EventOutcome::Stale { generation: 1 },
                EventOutcome::Drawn(DrawSummary {
                    lines: 1,
                    characters: 3
                }),
            ]
        );
        assert_eq!(controller.overlay().unwrap().count(ShapeKind::Character), 3);
    }

    #[tokio::test]
    async fn image_without_backing_skips_detection() {
        let (mut controller, notifier) = controller(FailingDetector);
        controller.show(AcquiredImage {
            image: OrientedImage::unbacked(800, 600, Orientation::Right),
            source: ImageSource::Camera,
            path: None,
        });

        assert!(!controller.is_pending());
        assert!(controller.run_to_idle().await.is_empty());
        assert!(notifier.presented().is_empty());

        let displayed = controller.displayed().unwrap();
        assert_eq!((displayed.image.width, displayed.image.height), (800, 600));
        assert!(displayed.overlay.shapes().is_empty());
    }

    #[tokio::test]
    async fn display_bounds_follow_the_normalized_image() {
        let (mut controller, _) = controller(FixedDetector(vec![]));
        controller.show(AcquiredImage {
            image: OrientedImage::new(RgbaImage::new(1280, 960), Orientation::Right),
            source: ImageSource::PhotoLibrary,
            path: None,
        });
        controller.run_to_idle().await;

        let displayed = controller.displayed().unwrap();
        assert_eq!((displayed.image.width, displayed.image.height), (480, 640));
        let bounds = displayed.overlay.bounds();
        assert!((bounds.width - 375.0).abs() < 1e-3);
        assert!((bounds.height - 500.0).abs() < 1e-3);
        assert!((bounds.y - 83.5).abs() < 1e-3);
    }
}
