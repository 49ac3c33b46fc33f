//! Input model: raw pointer/wheel events and the drag state machine.
//!
//! `InputEvent` is the message form of everything the host can feed the
//! engine, so a recorded session replays deterministically. `InputState` is
//! the active gesture between pointer-down and pointer-up, carrying what is
//! needed to compute the next update and to resolve the gesture on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::geometry::{Corner, Point};

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    #[serde(default)]
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down = zoom out).
    pub dy: f64,
}

/// One host event, timestamped in milliseconds on the host's monotonic clock.
///
/// Pointer positions are in screen space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    PointerDown { x: f64, y: f64, t: f64 },
    PointerMove { x: f64, y: f64, t: f64 },
    PointerUp { x: f64, y: f64, t: f64 },
    Wheel { x: f64, y: f64, dy: f64, t: f64 },
    /// An animation-frame tick.
    Frame { t: f64 },
    ZoomIn { t: f64 },
    ZoomOut { t: f64 },
    ResetView { t: f64 },
}

impl InputEvent {
    #[must_use]
    pub fn timestamp(&self) -> f64 {
        match *self {
            Self::PointerDown { t, .. }
            | Self::PointerMove { t, .. }
            | Self::PointerUp { t, .. }
            | Self::Wheel { t, .. }
            | Self::Frame { t }
            | Self::ZoomIn { t }
            | Self::ZoomOut { t }
            | Self::ResetView { t } => t,
        }
    }
}

/// The active gesture. Only one exists at a time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is panning the view.
    Panning {
        /// Screen-space pointer position at pointer-down.
        start_screen: Point,
        /// View offset at pointer-down; the pan is applied relative to it.
        start_offset: Point,
    },
    /// The user is dragging one corner of the crop quad.
    CornerDragging {
        corner: Corner,
        /// Whether any update has been committed to the quad in this session.
        moved: bool,
    },
}

impl InputState {
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// The corner under drag, if this is a corner gesture.
    #[must_use]
    pub fn dragged_corner(&self) -> Option<Corner> {
        match *self {
            Self::CornerDragging { corner, .. } => Some(corner),
            _ => None,
        }
    }
}
