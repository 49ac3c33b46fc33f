//! View state: zoom, pan offset, and the current corner selection.
//!
//! Pure data with narrow mutators. Geometry and hit-testing live elsewhere;
//! only the engine's input handlers call the setters.

#[cfg(test)]
#[path = "view_test.rs"]
mod view_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_ZOOM, MIN_ZOOM};
use crate::geometry::{Corner, Point, clamp};

/// How canvas space is currently presented on screen.
///
/// `offset` is in screen pixels and unbounded. `zoom` is a scale factor kept
/// inside `[MIN_ZOOM, MAX_ZOOM]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    zoom: f64,
    pub offset: Point,
    pub is_dragging: bool,
    pub selected_corner: Option<Corner>,
    pub is_editing: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self { zoom: 1.0, offset: Point::default(), is_dragging: false, selected_corner: None, is_editing: false }
    }
}

impl ViewState {
    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the zoom factor, clamped to `[MIN_ZOOM, MAX_ZOOM]`. Non-finite input is ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if !zoom.is_finite() {
            return;
        }
        self.zoom = clamp(zoom, MIN_ZOOM, MAX_ZOOM);
    }

    pub fn set_offset(&mut self, offset: Point) {
        self.offset = offset;
    }

    pub fn set_selected_corner(&mut self, corner: Option<Corner>) {
        self.selected_corner = corner;
    }

    pub fn set_is_dragging(&mut self, dragging: bool) {
        self.is_dragging = dragging;
    }

    pub fn set_is_editing(&mut self, editing: bool) {
        self.is_editing = editing;
    }

    /// Restore every field to its default.
    pub fn reset_view(&mut self) {
        *self = Self::default();
    }

    /// Whether the magnifier should be shown: a corner is under active drag.
    #[must_use]
    pub fn is_corner_dragging(&self) -> bool {
        self.is_dragging && self.selected_corner.is_some()
    }
}
