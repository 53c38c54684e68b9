//! # vistext
//!
//! Detects lines of text and their characters in a photo and draws their
//! bounding boxes over the photo as it appears on screen.
//!
//! ## Features
//!
//! - **Orientation Normalization**: Bake the EXIF orientation into the pixels and downscale to a bounded size
//! - **Aspect-Fit Display**: Compute where an image lands inside a viewport
//! - **Overlay Mapping**: Convert bottom-left normalized detection regions into top-left screen rectangles
//! - **Detection Orchestration**: Run one detection at a time, superseding stale requests
//! - **Rendering & Reports**: Write the viewport with its overlay as PNG and the drawn boxes as JSON
//!
//! ## Quick Start
//!
//! ```ignore
//! use vistext::prelude::*;
//!
//! let bounds = compute_display_bounds(480.0, 640.0, 375.0, 667.0);
//! let rect = map_to_screen(
//!     &NormalizedRegion::new(0.0, 0.0, 1.0, 1.0),
//!     &ScreenRect::new(bounds.offset_x, bounds.offset_y, bounds.width, bounds.height),
//! );
//! assert_eq!(rect.width, bounds.width);
//! ```

pub mod acquisition;
pub mod app;
pub mod config;
pub mod controller;
pub mod geometry;
pub mod normalizer;
pub mod notify;
pub mod overlay;
pub mod report;
pub mod screen;

// Re-export commonly used types at the root level
pub use acquisition::{load_oriented, AcquiredImage, AcquisitionError, FileAcquirer, ImageAcquirer, ImageSource};
pub use config::{load_or_default, AppConfig, ConfigError, DetectorSettings, DisplaySettings, EngineKind};
pub use controller::{ControllerSettings, DetectionController, DetectionEvent, Displayed, EventOutcome};
pub use geometry::{compute_display_bounds, map_to_screen, DisplayBounds, DisplayContext, ScreenRect};
pub use normalizer::{normalize, normalize_with, OrientedImage, ResizeFilter, DEFAULT_MAX_DIMENSION};
pub use notify::{ConsoleNotifier, Notification, Notifier, RecordingNotifier};
pub use overlay::{Color, DrawSummary, OverlayLayer, OverlayShape, OverlayStyle, ShapeKind};
pub use report::DetectionReport;
pub use screen::{compose_screen, save_screen, RenderError};
pub use vistext_ocr::{
    ComponentDetector, ComponentDetectorOptions, DetectionError, DetectionRequest, NormalizedRegion, Orientation,
    SidecarDetector, TextDetector, TextObservation,
};

/// Prelude module for convenient imports
///
/// ```ignore
/// use vistext::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        compose_screen, compute_display_bounds, load_oriented, map_to_screen, normalize, normalize_with,
        AcquiredImage, AppConfig, Color, ComponentDetector, ControllerSettings, DetectionController, DetectionError,
        DetectionRequest, DisplayBounds, DisplayContext, DrawSummary, EventOutcome, FileAcquirer, ImageAcquirer,
        ImageSource, NormalizedRegion, Notification, Notifier, Orientation, OrientedImage, OverlayLayer,
        OverlayStyle, RecordingNotifier, ScreenRect, ShapeKind, SidecarDetector, TextDetector, TextObservation,
    };
}
