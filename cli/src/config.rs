//! Host configuration: command-line flags with `KEYSTONE_*` environment fallbacks.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use canvas::geometry::{Rect, Size};
use clap::Args;
use reqwest::Url;

use crate::error::CliError;

#[derive(Args, Debug, Clone)]
pub struct HostArgs {
    #[arg(long, env = "KEYSTONE_BASE_URL", default_value = "http://localhost:8000")]
    pub base_url: String,

    #[arg(long, env = "KEYSTONE_CANVAS_WIDTH", default_value_t = 800.0)]
    pub canvas_width: f64,

    #[arg(long, env = "KEYSTONE_CANVAS_HEIGHT", default_value_t = 600.0)]
    pub canvas_height: f64,

    #[arg(long, env = "KEYSTONE_VIEWPORT_WIDTH", default_value_t = 1280.0)]
    pub viewport_width: f64,

    #[arg(long, env = "KEYSTONE_VIEWPORT_HEIGHT", default_value_t = 800.0)]
    pub viewport_height: f64,

    #[arg(long, env = "KEYSTONE_IMAGE_TIMEOUT_MS", default_value_t = 10_000)]
    pub image_timeout_ms: u64,

    #[arg(long, env = "KEYSTONE_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

/// Validated host configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: Url,
    pub canvas: Size,
    pub viewport: Size,
    pub image_timeout: Duration,
    pub request_timeout: Duration,
}

impl Config {
    /// Validate raw flags.
    ///
    /// # Errors
    ///
    /// Rejects a base URL that is not absolute `http(s)`, non-positive
    /// surface sizes, and zero timeouts.
    pub fn from_args(args: &HostArgs) -> Result<Self, CliError> {
        let base_url = parse_base_url(&args.base_url)?;
        let canvas = positive_size("canvas", args.canvas_width, args.canvas_height)?;
        let viewport = positive_size("viewport", args.viewport_width, args.viewport_height)?;
        if args.image_timeout_ms == 0 {
            return Err(CliError::Config("image timeout must be positive".to_owned()));
        }
        if args.request_timeout_secs == 0 {
            return Err(CliError::Config("request timeout must be positive".to_owned()));
        }
        Ok(Self {
            base_url,
            canvas,
            viewport,
            image_timeout: Duration::from_millis(args.image_timeout_ms),
            request_timeout: Duration::from_secs(args.request_timeout_secs),
        })
    }

    /// The simulated canvas element, anchored at the page origin.
    #[must_use]
    pub fn canvas_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.canvas.width, self.canvas.height)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, CliError> {
    let url = Url::parse(raw).map_err(|_| CliError::InvalidBaseUrl(raw.to_owned()))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(CliError::InvalidBaseUrl(raw.to_owned()));
    }
    Ok(url)
}

fn positive_size(what: &str, width: f64, height: f64) -> Result<Size, CliError> {
    let size = Size::new(width, height);
    if size.is_empty() {
        return Err(CliError::Config(format!("{what} size must be positive, got {width}x{height}")));
    }
    Ok(size)
}
