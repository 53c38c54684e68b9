//! Where photos come from.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use clap::ValueEnum;
use image::ImageReader;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use vistext_ocr::Orientation;

use crate::normalizer::OrientedImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    Camera,
    #[default]
    #[value(name = "library")]
    PhotoLibrary,
    #[value(name = "album")]
    SavedAlbum,
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageSource::Camera => "camera",
            ImageSource::PhotoLibrary => "photo library",
            ImageSource::SavedAlbum => "saved album",
        };
        f.write_str(name)
    }
}

/// One picked photo: stored pixels, their orientation tag and where they came from.
#[derive(Debug, Clone)]
pub struct AcquiredImage {
    pub image: OrientedImage,
    pub source: ImageSource,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("{0} is not available")]
    Unavailable(ImageSource),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[async_trait]
pub trait ImageAcquirer: Send + Sync {
    /// `Ok(None)` means the user cancelled.
    async fn acquire(&self, source: ImageSource) -> Result<Option<AcquiredImage>, AcquisitionError>;
}

/// Reads the photo at a fixed path, standing in for the library and album pickers.
pub struct FileAcquirer {
    path: PathBuf,
}

impl FileAcquirer {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ImageAcquirer for FileAcquirer {
    async fn acquire(&self, source: ImageSource) -> Result<Option<AcquiredImage>, AcquisitionError> {
        if source == ImageSource::Camera {
            return Err(AcquisitionError::Unavailable(source));
        }

        let path = self.path.clone();
        let image = tokio::task::spawn_blocking(move || load_oriented(&path))
            .await
            .map_err(|e| AcquisitionError::Io {
                path: self.path.clone(),
                source: std::io::Error::other(e),
            })??;

        info!(
            "Picked {}x{} image ({:?}) from {}",
            image.width, image.height, image.orientation, source
        );

        Ok(Some(AcquiredImage {
            image,
            source,
            path: Some(self.path.clone()),
        }))
    }
}

/// Decodes `path` in stored pixel order and tags it with its EXIF orientation.
pub fn load_oriented(path: &Path) -> Result<OrientedImage, AcquisitionError> {
    let io_error = |source| AcquisitionError::Io {
        path: path.to_path_buf(),
        source,
    };
    let decode_error = |source| AcquisitionError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let pixels = ImageReader::open(path)
        .map_err(io_error)?
        .with_guessed_format()
        .map_err(io_error)?
        .decode()
        .map_err(decode_error)?
        .into_rgba8();

    Ok(OrientedImage::new(pixels, read_exif_orientation(path)))
}

/// Orientation tag from the file's EXIF block; `Up` when absent or unreadable.
pub fn read_exif_orientation(path: &Path) -> Orientation {
    let Ok(file) = File::open(path) else {
        return Orientation::Up;
    };
    let mut reader = BufReader::new(file);
    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(e) => {
            debug!("No EXIF orientation in {}: {}", path.display(), e);
            return Orientation::Up;
        }
    };

    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .map(Orientation::from_exif)
        .unwrap_or_default()
}
