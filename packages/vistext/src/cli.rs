//! Command line arguments backing the `vistext` binary.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use vistext::acquisition::ImageSource;
use vistext::config::EngineKind;

#[derive(Parser, Debug)]
#[command(
    name = "vistext",
    about = "Detect text lines and characters in a photo and draw their boxes",
    version
)]
pub struct Args {
    /// Configuration file (defaults to the per-user config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print version information
    Version,
    /// Detect text in a photo and render the overlay
    Detect {
        /// Photo to analyze
        image: PathBuf,

        /// Where the photo is picked from
        #[arg(long, short = 's', value_enum, default_value_t = ImageSource::PhotoLibrary)]
        source: ImageSource,

        /// Detection engine
        #[arg(long, short = 'e', value_enum)]
        engine: Option<EngineKind>,

        /// Observations JSON for the sidecar engine
        #[arg(long)]
        observations: Option<PathBuf>,

        /// Rendered viewport with the overlay (PNG)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// JSON report of every drawn box
        #[arg(long, short = 'r')]
        report: Option<PathBuf>,

        /// Viewport size as WIDTHxHEIGHT
        #[arg(long, value_parser = parse_viewport)]
        viewport: Option<(f32, f32)>,

        /// Longest edge of the displayed image
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_dimension: Option<u32>,
    },
    /// Write an upright, downscaled copy of a photo
    Normalize {
        /// Photo to normalize
        image: PathBuf,

        /// Output image path
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// Longest edge of the output
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_dimension: Option<u32>,
    },
}

/// Parses `WIDTHxHEIGHT` with positive dimensions.
pub fn parse_viewport(value: &str) -> Result<(f32, f32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value:?}"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or_else(|| format!("invalid viewport dimension {s:?}"))
    };
    Ok((parse(width)?, parse(height)?))
}
