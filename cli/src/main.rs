mod backend;
mod config;
mod error;
mod replay;

use std::path::PathBuf;

use canvas::doc::ImageStatus;
use canvas::geometry::{Quad, Size};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::backend::Backend;
use crate::config::{Config, HostArgs};
use crate::error::CliError;
use crate::replay::ImageSource;

#[derive(Parser, Debug)]
#[command(name = "keystone", about = "Perspective-crop editor host and backend CLI")]
struct Cli {
    #[command(flatten)]
    host: HostArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the backend is up.
    Health,
    /// Print an image's metadata.
    Info { filename: String },
    /// Run corner auto-detection and show the resulting crop area.
    Detect { filename: String },
    /// Drive the editor with a recorded event script.
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Local image path, or a filename known to the backend.
    #[arg(long)]
    image: String,

    /// JSON event script.
    #[arg(long)]
    script: PathBuf,

    /// Write every rendered frame to this file as JSON.
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Request a preview of the final crop and write the image here.
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Submit the final crop to the backend.
    #[arg(long, default_value_t = false)]
    submit: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_args(&cli.host)?;
    let backend = Backend::new(config.base_url.clone(), config.request_timeout)?;

    match cli.command {
        Command::Health => run_health(&backend).await,
        Command::Info { filename } => print_json(&backend.image_info(&filename).await?),
        Command::Detect { filename } => run_detect(&config, &backend, &filename).await,
        Command::Replay(args) => run_replay(&config, &backend, args).await,
    }
}

async fn run_health(backend: &Backend) -> Result<(), CliError> {
    let health = backend.health().await?;
    print_json(&health)?;
    if !health.is_healthy() {
        return Err(CliError::Unhealthy(health.status));
    }
    Ok(())
}

async fn run_detect(config: &Config, backend: &Backend, filename: &str) -> Result<(), CliError> {
    let info = backend.image_info(filename).await?;
    let source = ImageSource::Remote(filename.to_owned());
    let url = source.url(backend)?;
    let size = Size::new(f64::from(info.width), f64::from(info.height));
    let mut core = replay::session(config, filename, &url, Ok(size));

    let response = backend.auto_detect(filename).await?;
    print_json(&replay::apply_detection(&mut core, &response)?)
}

#[derive(Serialize)]
struct ReplaySummary {
    filename: String,
    zoom: f64,
    crop_area: Option<Quad>,
    points: Vec<[i64; 2]>,
    valid: bool,
    frames: usize,
    status: Option<ImageStatus>,
    processed_filename: Option<String>,
}

async fn run_replay(config: &Config, backend: &Backend, args: ReplayArgs) -> Result<(), CliError> {
    let script_bytes = tokio::fs::read(&args.script)
        .await
        .map_err(|error| CliError::io(&args.script, error))?;
    let events = replay::parse_script(&script_bytes)?;

    let source = ImageSource::resolve(&args.image);
    let filename = source.filename();
    let url = source.url(backend)?;
    let size = source
        .dimensions(backend, config.image_timeout)
        .await
        .map_err(|error| error.to_string());

    let mut core = replay::session(config, &filename, &url, size);
    let recorded = replay::run(&mut core, &events);

    if let Some(path) = &args.frames {
        let json = serde_json::to_vec_pretty(&recorded)?;
        tokio::fs::write(path, json)
            .await
            .map_err(|error| CliError::io(path, error))?;
        info!(path = %path.display(), frames = recorded.frames.len(), "wrote frames");
    }

    let request = core.crop_request()?;
    let valid = core.crop_area().is_some_and(|quad| quad.is_valid());
    if !valid {
        warn!("crop area has coincident corners; the backend may reject it");
    }

    if let Some(path) = &args.preview {
        let bytes = backend.preview(&filename, &request).await?;
        tokio::fs::write(path, &bytes)
            .await
            .map_err(|error| CliError::io(path, error))?;
        info!(path = %path.display(), len = bytes.len(), "wrote preview");
    }

    let mut processed_filename = None;
    if args.submit {
        core.set_status(ImageStatus::Processing, None)?;
        match backend.crop(&filename, &request).await {
            Ok(response) => {
                info!(message = %response.message, "crop accepted");
                core.set_status(ImageStatus::Completed, response.processed_filename.clone())?;
                processed_filename = response.processed_filename;
            }
            Err(error) => {
                core.set_status(ImageStatus::Error, None)?;
                return Err(error);
            }
        }
    }

    print_json(&ReplaySummary {
        filename,
        zoom: core.view.zoom(),
        crop_area: core.crop_area(),
        points: request.points,
        valid,
        frames: recorded.frames.len(),
        status: core.current().map(|record| record.status),
        processed_filename,
    })
}

fn print_json(value: &impl Serialize) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
