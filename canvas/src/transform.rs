//! Coordinate transforms between screen, canvas, and image space.
//!
//! Three spaces are in play:
//!
//! - **screen**: raw pointer coordinates relative to the page.
//! - **canvas**: the editing surface's own pixels before zoom/pan. The image is
//!   drawn here at its aspect-fit [`ImageDisplayInfo`] rectangle and the crop
//!   quad lives here.
//! - **image**: the source image's native pixel grid, the space the backend
//!   crops in.
//!
//! Every function is pure and takes the view parameters explicitly, so the
//! renderer, the hit-tester, and the magnifier agree pixel-for-pixel.

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Quad, Rect, Size, clamp};

/// Tolerance, in canvas pixels, for [`validate_round_trip`].
pub const ROUND_TRIP_TOLERANCE: f64 = 1.0;

/// A transform that would divide by zero or produce non-finite values.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("canvas has no drawable area ({width}x{height})")]
    EmptyCanvas { width: f64, height: f64 },
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: f64, height: f64 },
}

/// Where the image sits inside the canvas before zoom/pan: aspect-fit and centered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageDisplayInfo {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Canvas pixels per image pixel.
    pub scale: f64,
}

impl ImageDisplayInfo {
    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Screen → canvas: remove the canvas's page origin and the pan offset, then undo zoom.
#[must_use]
pub fn screen_to_canvas(screen: Point, canvas_rect: Rect, zoom: f64, offset: Point) -> Point {
    (screen - canvas_rect.origin() - offset) / zoom
}

/// Canvas → screen: exact inverse of [`screen_to_canvas`].
#[must_use]
pub fn canvas_to_screen(canvas: Point, canvas_rect: Rect, zoom: f64, offset: Point) -> Point {
    canvas * zoom + offset + canvas_rect.origin()
}

/// Aspect-fit the image into the canvas and center it.
///
/// # Errors
///
/// Returns [`TransformError`] when either size has no area, so callers skip the
/// frame instead of pushing NaN into the crop quad.
pub fn image_display_info(canvas: Size, image: Size) -> Result<ImageDisplayInfo, TransformError> {
    if canvas.is_empty() {
        return Err(TransformError::EmptyCanvas { width: canvas.width, height: canvas.height });
    }
    if image.is_empty() {
        return Err(TransformError::EmptyImage { width: image.width, height: image.height });
    }

    let scale = (canvas.width / image.width).min(canvas.height / image.height);
    let width = image.width * scale;
    let height = image.height * scale;

    Ok(ImageDisplayInfo {
        x: (canvas.width - width) / 2.0,
        y: (canvas.height - height) / 2.0,
        width,
        height,
        scale,
    })
}

/// Canvas → image without clamping. Points outside the displayed image map
/// outside `[0, w] × [0, h]`.
#[must_use]
pub fn canvas_to_image_unclamped(canvas: Point, info: &ImageDisplayInfo) -> Point {
    (canvas - info.origin()) / info.scale
}

/// Canvas → image, clamped into the image bounds.
#[must_use]
pub fn canvas_to_image(canvas: Point, info: &ImageDisplayInfo, image: Size) -> Point {
    let p = canvas_to_image_unclamped(canvas, info);
    Point::new(clamp(p.x, 0.0, image.width), clamp(p.y, 0.0, image.height))
}

/// Image → canvas: exact inverse of [`canvas_to_image`], unclamped.
#[must_use]
pub fn image_to_canvas(image_pt: Point, info: &ImageDisplayInfo, _image: Size) -> Point {
    image_pt * info.scale + info.origin()
}

/// Convert a canvas-space quad into image-space points, clockwise from top-left,
/// rounded to whole pixels.
#[must_use]
pub fn quad_to_image_points(quad: &Quad, info: &ImageDisplayInfo, image: Size) -> [[i64; 2]; 4] {
    quad.points().map(|p| {
        let ip = canvas_to_image(p, info, image);
        [round_px(ip.x), round_px(ip.y)]
    })
}

/// Convert four image-space points (clockwise from top-left) into a canvas-space quad.
///
/// The result is not validated for duplicate corners; backend detections are
/// trusted as-is.
#[must_use]
pub fn image_points_to_quad(points: [[f64; 2]; 4], info: &ImageDisplayInfo, image: Size) -> Quad {
    let [tl, tr, br, bl] = points.map(|[x, y]| image_to_canvas(Point::new(x, y), info, image));
    Quad { top_left: tl, top_right: tr, bottom_right: br, bottom_left: bl }
}

/// Whether every image-space point lies inside `[0, w] × [0, h]`.
#[must_use]
pub fn image_points_in_bounds(points: &[[f64; 2]], image: Size) -> bool {
    points.iter().all(|&[x, y]| (0.0..=image.width).contains(&x) && (0.0..=image.height).contains(&y))
}

/// Canvas → image → canvas must come back within [`ROUND_TRIP_TOLERANCE`].
///
/// Only meaningful for points inside the displayed image; points outside are
/// clamped on the way in and will not return.
#[must_use]
pub fn validate_round_trip(canvas: Point, info: &ImageDisplayInfo, image: Size) -> bool {
    let back = image_to_canvas(canvas_to_image(canvas, info, image), info, image);
    (back.x - canvas.x).abs() < ROUND_TRIP_TOLERANCE && (back.y - canvas.y).abs() < ROUND_TRIP_TOLERANCE
}

#[allow(clippy::cast_possible_truncation)]
fn round_px(v: f64) -> i64 {
    v.round() as i64
}
