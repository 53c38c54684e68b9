pub mod components;
pub mod engine;
pub mod orientation;
pub mod region;
pub mod sidecar;

pub use components::{ComponentDetector, ComponentDetectorOptions};
pub use engine::{DetectionError, DetectionRequest, TextDetector};
pub use orientation::{Orientation, OrientationTransform};
pub use region::{NormalizedRegion, TextObservation};
pub use sidecar::SidecarDetector;
