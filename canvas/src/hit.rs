#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::HANDLE_HIT_RADIUS_PX;
use crate::geometry::{Corner, Point, Quad};

/// Hit radius in canvas units for the current zoom.
///
/// Dividing by zoom keeps the handle's hit target a constant size on screen.
#[must_use]
pub fn hit_radius_canvas(zoom: f64) -> f64 {
    HANDLE_HIT_RADIUS_PX / zoom
}

/// Test which corner handle (if any) is under `canvas_pt`.
///
/// Corners are checked in index order and the first match wins, so when two
/// handles overlap the lower index takes the drag.
#[must_use]
pub fn hit_test(canvas_pt: Point, quad: &Quad, zoom: f64) -> Option<Corner> {
    let radius = hit_radius_canvas(zoom);
    Corner::ALL.into_iter().find(|&c| canvas_pt.is_near(quad.corner(c), radius))
}
