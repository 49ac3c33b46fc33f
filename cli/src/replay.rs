//! Scripted sessions: load an image's metadata, then drive the engine with a
//! recorded list of pointer, wheel, and frame events.

#[cfg(test)]
#[path = "replay_test.rs"]
mod replay_test;

use std::path::{Path, PathBuf};
use std::time::Duration;

use canvas::engine::{Action, EngineCore, EngineError, Frame};
use canvas::geometry::{Quad, Size};
use canvas::input::InputEvent;
use canvas::transform::image_points_in_bounds;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wire::{AutoDetectResponse, Endpoint};

use crate::backend::Backend;
use crate::config::Config;
use crate::error::CliError;

/// Where the image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A file on disk; its header is read locally.
    Local(PathBuf),
    /// A filename known to the backend.
    Remote(String),
}

impl ImageSource {
    /// An existing file path is local; anything else names a backend image.
    #[must_use]
    pub fn resolve(arg: &str) -> Self {
        let path = Path::new(arg);
        if path.is_file() { Self::Local(path.to_owned()) } else { Self::Remote(arg.to_owned()) }
    }

    /// The name the backend knows this image by.
    #[must_use]
    pub fn filename(&self) -> String {
        match self {
            Self::Local(path) => path
                .file_name()
                .map_or_else(|| path.to_string_lossy().into_owned(), |n| n.to_string_lossy().into_owned()),
            Self::Remote(name) => name.clone(),
        }
    }

    /// The URL the engine tracks loads under.
    ///
    /// # Errors
    ///
    /// Fails when the backend base URL cannot carry a path.
    pub fn url(&self, backend: &Backend) -> Result<String, CliError> {
        match self {
            Self::Local(path) => Ok(format!("file://{}", path.display())),
            Self::Remote(name) => Ok(backend.url(Endpoint::Image(name))?.to_string()),
        }
    }

    /// Natural size of the image, bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Fails when the header cannot be read, the backend refuses, or the
    /// timeout elapses.
    pub async fn dimensions(&self, backend: &Backend, timeout: Duration) -> Result<Size, CliError> {
        let load = async {
            match self {
                Self::Local(path) => local_dimensions(path.clone()).await,
                Self::Remote(name) => {
                    let info = backend.image_info(name).await?;
                    Ok(Size::new(f64::from(info.width), f64::from(info.height)))
                }
            }
        };
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        tokio::time::timeout(timeout, load).await.map_err(|_| CliError::Timeout(millis))?
    }
}

async fn local_dimensions(path: PathBuf) -> Result<Size, CliError> {
    let (width, height) = tokio::task::spawn_blocking(move || image::image_dimensions(&path)).await??;
    Ok(Size::new(f64::from(width), f64::from(height)))
}

/// A script file: either a bare event array or `{"events": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScriptFile {
    Events(Vec<InputEvent>),
    Wrapped { events: Vec<InputEvent> },
}

/// Parse a script and check that its timestamps never run backwards.
///
/// # Errors
///
/// Fails on malformed JSON or out-of-order timestamps.
pub fn parse_script(bytes: &[u8]) -> Result<Vec<InputEvent>, CliError> {
    let events = match serde_json::from_slice::<ScriptFile>(bytes)? {
        ScriptFile::Events(events) | ScriptFile::Wrapped { events } => events,
    };
    let mut previous = f64::NEG_INFINITY;
    for (index, event) in events.iter().enumerate() {
        let t = event.timestamp();
        if t < previous {
            return Err(CliError::ScriptOrder { index, t, previous });
        }
        previous = t;
    }
    Ok(events)
}

/// Engine sized from `config` with one image added and its load resolved.
///
/// `size` is the image's natural size, or the reason it could not be read.
#[must_use]
pub fn session(config: &Config, name: &str, url: &str, size: Result<Size, String>) -> EngineCore {
    let mut core = EngineCore::new();
    core.set_canvas_rect(config.canvas_rect());
    core.set_viewport(config.viewport);
    core.add_image(name, url, 0.0);
    match size {
        Ok(size) => {
            core.on_image_loaded(url, size);
        }
        Err(reason) => {
            warn!(url, %reason, "image unavailable; replaying against placeholder");
            core.on_image_failed(url, &reason);
        }
    }
    core
}

/// Outcome of applying a corner detection to a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub confidence: f64,
    pub low_confidence: bool,
    /// Every detected corner lies on the image.
    pub in_bounds: bool,
    pub message: String,
    pub crop_area: Option<Quad>,
    pub points: Vec<[i64; 2]>,
}

/// Replace the session's quad with `response` and report what was applied.
///
/// Detections are applied as returned; corners off the image are only flagged.
///
/// # Errors
///
/// Fails when the detection is unusable or the image size is unknown.
pub fn apply_detection(core: &mut EngineCore, response: &AutoDetectResponse) -> Result<Detection, CliError> {
    let size = core.current().and_then(|record| record.size).ok_or(EngineError::ImageNotReady)?;
    let in_bounds = image_points_in_bounds(&response.corners()?, size);
    if !in_bounds {
        warn!("detected corners fall outside the image; they will be clamped on crop");
    }

    core.apply_auto_detect(response)?;
    if response.is_low_confidence() {
        warn!(confidence = response.confidence, "detection confidence is low; check the corners");
    }

    Ok(Detection {
        confidence: response.confidence,
        low_confidence: response.is_low_confidence(),
        in_bounds,
        message: response.message.clone(),
        crop_area: core.crop_area(),
        points: core.crop_request()?.points,
    })
}

/// One painted frame, stamped with the tick that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedFrame {
    pub t: f64,
    #[serde(flatten)]
    pub frame: Frame,
}

/// Everything a replay produced, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Replay {
    pub frames: Vec<RecordedFrame>,
    pub actions: Vec<Action>,
}

/// Feed `events` through `core`.
///
/// A trailing frame tick is issued after the last event when one is still
/// pending, as a browser's next animation frame would.
pub fn run(core: &mut EngineCore, events: &[InputEvent]) -> Replay {
    let mut replay = Replay::default();
    let mut last_t = 0.0;

    for event in events {
        last_t = event.timestamp();
        let tick = core.dispatch(event);
        replay.actions.extend(tick.actions);
        if let Some(frame) = tick.frame {
            replay.frames.push(RecordedFrame { t: last_t, frame });
        }
    }

    if core.has_pending_frame() {
        debug!(t = last_t, "flushing pending frame");
        let tick = core.on_frame(last_t);
        replay.actions.extend(tick.actions);
        if let Some(frame) = tick.frame {
            replay.frames.push(RecordedFrame { t: last_t, frame });
        }
    }

    info!(events = events.len(), frames = replay.frames.len(), "replay finished");
    replay
}
