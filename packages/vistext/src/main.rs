mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Args, Commands};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vistext::app::{run_detect, run_normalize, DetectOptions};
use vistext::config::load_or_default;
use vistext::notify::ConsoleNotifier;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(args.verbose) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    match run(args).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Returns `false` when the command ran but did not succeed.
async fn run(args: Args) -> Result<bool> {
    let mut config = load_or_default(args.config.as_deref())?;

    match args.command {
        Commands::Version => {
            println!("vistext {}", env!("CARGO_PKG_VERSION"));
            Ok(true)
        }
        Commands::Detect {
            image,
            source,
            engine,
            observations,
            output,
            report,
            viewport,
            max_dimension,
        } => {
            if let Some(engine) = engine {
                config.detector.engine = engine;
            }
            if observations.is_some() {
                config.detector.observations = observations;
            }
            if let Some((width, height)) = viewport {
                config.display.viewport_width = width;
                config.display.viewport_height = height;
            }
            if let Some(max_dimension) = max_dimension {
                config.display.max_dimension = max_dimension;
            }

            let options = DetectOptions {
                image,
                source,
                output,
                report,
                config,
            };
            let Some(outcome) = run_detect(options, ConsoleNotifier).await? else {
                println!("Cancelled");
                return Ok(true);
            };

            println!(
                "Detected {} text lines ({} characters) in {}x{} image",
                outcome.summary.lines,
                outcome.summary.characters,
                outcome.report.image_width,
                outcome.report.image_height
            );
            Ok(!outcome.failed)
        }
        Commands::Normalize {
            image,
            output,
            max_dimension,
        } => {
            if let Some(max_dimension) = max_dimension {
                config.display.max_dimension = max_dimension;
            }
            let normalized = run_normalize(&image, &output, &config).await?;
            println!(
                "Wrote {}x{} image to {}",
                normalized.width,
                normalized.height,
                output.display()
            );
            Ok(true)
        }
    }
}
