// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Malwerk — command-line front end.
//
// Runs the capture session against a photo on disk (or the device camera,
// where the build has one), writing the rectified texture or the diagnostic
// images to files.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use malwerk_bridge::{FileTextureSink, FrameSource, StillImageSource, platform_camera};
use malwerk_core::error::{MalwerkError, Result};
use malwerk_core::human_errors::humanize_error;
use malwerk_core::types::TargetId;
use malwerk_core::{EdgeParams, PipelineConfig};
use malwerk_rectify::Diagnostics;
use malwerk_session::services::data_dir;
use malwerk_session::{CaptureOutcome, CaptureSession};

/// Malwerk - turn a photo of a colouring page into a model texture
#[derive(Parser, Debug)]
#[command(name = "malwerk", version)]
#[command(about = "Detect, straighten and export colouring pages")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rectify the page in a photo and write it out as a texture JPEG
    Rectify {
        /// Photo showing the colouring page (default: the device camera)
        input: Option<PathBuf>,

        /// Directory the texture is written to
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// AR target the page belongs to (default: first configured target)
        #[arg(long)]
        target: Option<String>,

        /// Directory for frame/edge diagnostic PNGs when no page is found
        #[arg(long)]
        diagnostics: Option<PathBuf>,

        /// Pipeline configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Use the low-contrast edge preset
        #[arg(long)]
        low_contrast: bool,
    },

    /// Print the effective configuration as JSON
    Config {
        /// Pipeline configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the default configuration to the settings file first
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Rectify {
            input,
            out_dir,
            target,
            diagnostics,
            config,
            low_contrast,
        } => {
            rectify(RectifyArgs {
                input,
                out_dir,
                target,
                diagnostics,
                config,
                low_contrast,
            })
            .await
        }
        Command::Config { config, init } => show_config(config, init),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            report(&e);
            ExitCode::from(2)
        }
    }
}

struct RectifyArgs {
    input: Option<PathBuf>,
    out_dir: PathBuf,
    target: Option<String>,
    diagnostics: Option<PathBuf>,
    config: Option<PathBuf>,
    low_contrast: bool,
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::load(path),
        None => Ok(PipelineConfig::load_or_default(data_dir::config_path())),
    }
}

async fn rectify(args: RectifyArgs) -> Result<ExitCode> {
    let mut config = load_config(args.config.as_deref())?;
    if args.low_contrast {
        config.edges = EdgeParams::low_contrast();
    }

    let target = match args.target {
        Some(id) => TargetId::new(id),
        None => config
            .targets
            .first()
            .map(|b| b.target.clone())
            .ok_or(MalwerkError::NoActiveTarget)?,
    };

    let frames: Arc<dyn FrameSource> = match &args.input {
        Some(path) => Arc::new(StillImageSource::open(path)?),
        None => platform_camera(),
    };
    let sink = Arc::new(FileTextureSink::new(&args.out_dir));
    let session = CaptureSession::new(config, frames, sink.clone())?;
    eprintln!("{}", session.target_found(&target)?);

    match session.capture().await {
        Ok(outcome) => {
            println!("{}", outcome.status_message());
            if let CaptureOutcome::Bound(bound) = outcome {
                if let Some(path) = sink.path_of(bound.handle) {
                    println!(
                        "{} ({}x{}, sha256 {})",
                        path.display(),
                        bound.width,
                        bound.height,
                        bound.digest
                    );
                }
                return Ok(ExitCode::SUCCESS);
            }
            Ok(ExitCode::FAILURE)
        }
        Err(failure) => {
            report(&failure.error);
            if let (Some(dir), Some(diagnostics)) = (&args.diagnostics, &failure.diagnostics) {
                write_diagnostics(dir, diagnostics)?;
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn write_diagnostics(dir: &Path, diagnostics: &Diagnostics) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let (frame, edges) = diagnostics.to_png_pair()?;
    let frame_path = dir.join("frame.png");
    let edges_path = dir.join("edges.png");
    std::fs::write(&frame_path, frame)?;
    std::fs::write(&edges_path, edges)?;
    eprintln!(
        "Diagnostics written to {} and {}",
        frame_path.display(),
        edges_path.display()
    );
    Ok(())
}

fn show_config(path: Option<PathBuf>, init: bool) -> Result<ExitCode> {
    let path = path.unwrap_or_else(data_dir::config_path);
    if init {
        PipelineConfig::default().save(&path)?;
        eprintln!("Default configuration written to {}", path.display());
    }
    let config = PipelineConfig::load_or_default(&path);
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(ExitCode::SUCCESS)
}

fn report(error: &MalwerkError) {
    let human = humanize_error(error);
    eprintln!("{}", human.message);
    eprintln!("  {}", human.suggestion);
    tracing::debug!(%error, retriable = human.retriable, "Reported error");
}
