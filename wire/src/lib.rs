//! Request and response shapes for the image-processing backend.
//!
//! The editor core never performs I/O. This crate owns the JSON bodies the
//! host exchanges with the backend, plus the endpoint table, so the `canvas`
//! engine can build requests and interpret detections without knowing how
//! they travel.
//!
//! All image-space coordinates here are in the source image's native pixel
//! grid, listed clockwise from top-left.


use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Number of corners in every crop request and detection.
pub const CORNER_COUNT: usize = 4;

/// Detections at or below this confidence should be reviewed by hand.
pub const LOW_CONFIDENCE: f64 = 0.3;

/// Error raised while validating or decoding a backend payload.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// A point list did not contain exactly four corners.
    #[error("expected {CORNER_COUNT} corner points, got {0}")]
    PointCount(usize),
    /// A coordinate was NaN or infinite.
    #[error("corner point {index} is not finite")]
    NonFinite { index: usize },
    /// `success` was true but no corners were attached.
    #[error("auto-detect response carried no corners")]
    MissingCorners,
    /// The backend answered with `success: false`.
    #[error("backend reported failure: {message}")]
    Backend { message: String, error: Option<String> },
    /// The body was not the JSON shape we expected.
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// HTTP verb for an [`Endpoint`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Backend routes, each carrying the filename it addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint<'a> {
    Health,
    ImageInfo(&'a str),
    Image(&'a str),
    AutoDetect(&'a str),
    Preview(&'a str),
    Crop(&'a str),
}

impl Endpoint<'_> {
    /// Path segments below the base URL. The filename is a single segment and
    /// must be percent-encoded by the caller's URL builder.
    #[must_use]
    pub fn segments(&self) -> Vec<&str> {
        match *self {
            Self::Health => vec!["api", "health"],
            Self::ImageInfo(f) => vec!["api", "image-info", f],
            Self::Image(f) => vec!["api", "image", f],
            Self::AutoDetect(f) => vec!["api", "auto-detect", f],
            Self::Preview(f) => vec!["api", "preview", f],
            Self::Crop(f) => vec!["api", "crop", f],
        }
    }

    #[must_use]
    pub fn method(&self) -> Method {
        match self {
            Self::Health | Self::ImageInfo(_) | Self::Image(_) => Method::Get,
            Self::AutoDetect(_) | Self::Preview(_) | Self::Crop(_) => Method::Post,
        }
    }
}

/// `GET /api/image-info/{filename}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_thumbnail: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// Body of `POST /api/crop/{filename}` and `POST /api/preview/{filename}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRequest {
    /// Integer image-space corners, clockwise from top-left.
    pub points: Vec<[i64; 2]>,
}

impl CropRequest {
    #[must_use]
    pub fn new(points: [[i64; 2]; CORNER_COUNT]) -> Self {
        Self { points: points.to_vec() }
    }

    /// Reject anything the backend would refuse for its point count.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::PointCount`] unless there are exactly four points.
    pub fn validate(&self) -> Result<(), WireError> {
        if self.points.len() == CORNER_COUNT {
            Ok(())
        } else {
            Err(WireError::PointCount(self.points.len()))
        }
    }
}

/// Response of `POST /api/crop/{filename}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropResponse {
    pub success: bool,
    #[serde(default)]
    pub filename: Option<String>,
    pub message: String,
    #[serde(default)]
    pub processed_filename: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl CropResponse {
    /// Turn a `success: false` body into an error.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Backend`] carrying the backend's message.
    pub fn into_result(self) -> Result<Self, WireError> {
        if self.success {
            Ok(self)
        } else {
            Err(WireError::Backend { message: self.message, error: self.error })
        }
    }
}

/// Response of `POST /api/auto-detect/{filename}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutoDetectResponse {
    pub success: bool,
    #[serde(default)]
    pub corners: Option<Vec<[f64; 2]>>,
    #[serde(default)]
    pub confidence: f64,
    pub message: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl AutoDetectResponse {
    /// The four detected image-space corners.
    ///
    /// # Errors
    ///
    /// Fails when the backend reported failure, sent no corners, sent the
    /// wrong number, or sent a non-finite coordinate.
    pub fn corners(&self) -> Result<[[f64; 2]; CORNER_COUNT], WireError> {
        if !self.success {
            return Err(WireError::Backend { message: self.message.clone(), error: self.error.clone() });
        }
        let corners = self.corners.as_deref().ok_or(WireError::MissingCorners)?;
        if let Some(index) = corners.iter().position(|[x, y]| !(x.is_finite() && y.is_finite())) {
            return Err(WireError::NonFinite { index });
        }
        <[[f64; 2]; CORNER_COUNT]>::try_from(corners).map_err(|_| WireError::PointCount(corners.len()))
    }

    #[must_use]
    pub fn is_low_confidence(&self) -> bool {
        self.confidence <= LOW_CONFIDENCE
    }
}

/// Response of `GET /api/health`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub timestamp: f64,
    /// Whether each backend storage directory exists.
    #[serde(default)]
    pub directories: BTreeMap<String, bool>,
}

impl HealthResponse {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy" && self.directories.values().all(|ok| *ok)
    }
}

/// Decode a JSON body into one of the payload types.
///
/// # Errors
///
/// Returns [`WireError::Json`] if the bytes do not match `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    Ok(serde_json::from_slice(bytes)?)
}
