// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use snapsight::backends::camera::FacingMode;
use snapsight::config::Config;
use snapsight::errors::{AppError, AppResult};
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;

#[derive(Parser)]
#[command(name = "snapsight")]
#[command(about = "Capture or pick an image and have it analyzed")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Analysis endpoint (overrides the config file)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run in terminal mode (default)
    Terminal,

    /// List available cameras
    List,

    /// Analyze a local image file
    Analyze {
        /// Image to submit
        file: PathBuf,
    },

    /// Ask the service to fetch and analyze an image URL
    AnalyzeUrl {
        /// Public image URL
        url: String,
    },

    /// Take one still from a camera and analyze it
    Capture {
        /// Serve this image file as the camera instead of real hardware
        #[arg(long)]
        camera_source: Option<PathBuf>,

        /// Which camera to prefer
        #[arg(long, value_enum)]
        facing: Option<FacingMode>,
    },
}

fn main() -> ExitCode {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=snapsight=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> AppResult<ExitCode> {
    let mut config = Config::load(cli.config.as_deref()).map_err(AppError::Config)?;
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }

    match cli.command {
        None | Some(Commands::Terminal) => {
            snapsight::terminal::run(config)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::List) => {
            cli::list_cameras(&config)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Analyze { file }) => cli::analyze_file(&config, file),
        Some(Commands::AnalyzeUrl { url }) => cli::analyze_url(&config, &url),
        Some(Commands::Capture {
            camera_source,
            facing,
        }) => {
            if let Some(facing) = facing {
                config.facing = facing;
            }
            cli::capture_and_analyze(&config, camera_source)
        }
    }
}
