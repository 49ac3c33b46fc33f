//! Magnifier: a pixel-exact loupe around the pointer while a corner is dragged.
//!
//! Read-only over engine state. Given the pointer, view state, image, and crop
//! quad it works out which image pixels sit under the cursor, which window of
//! them to blow up, where the loupe goes on screen, and whether the dragged
//! corner is visible inside it.

#[cfg(test)]
#[path = "magnifier_test.rs"]
mod magnifier_test;

use serde::Serialize;

use crate::consts::{
    MAGNIFIER_CROSSHAIR_RADIUS_PX, MAGNIFIER_MARKER_RADIUS_PX, MAGNIFIER_POINTER_GAP_PX, MAGNIFIER_SIZE_PX,
    MAGNIFIER_ZOOM,
};
use crate::geometry::{Corner, Point, Quad, Rect, Size};
use crate::render::{DrawCommand, DrawList, Stroke};
use crate::transform::{ImageDisplayInfo, canvas_to_image_unclamped, screen_to_canvas};
use crate::view::ViewState;

const LOUPE_BACKGROUND: &str = "#ffffff";
const LOUPE_BORDER: Stroke = Stroke { color: "#00ff00", width: 3.0 };
const CROSSHAIR_FILL: &str = "rgba(255, 0, 0, 0.1)";
const CROSSHAIR_RING: Stroke = Stroke { color: "#ff0000", width: 2.0 };
const CROSSHAIR_LINE: Stroke = Stroke { color: "#ff0000", width: 1.0 };
const MARKER_FILL: &str = "#ff0000";
const MARKER_STROKE: Stroke = Stroke { color: "#ffffff", width: 2.0 };
const MARKER_LABEL_COLOR: &str = "#ffffff";
const MARKER_LABEL_FONT: &str = "bold 12px Arial";
/// Baseline nudge so the label sits visually centered in the marker.
const MARKER_LABEL_DY: f64 = 4.0;

/// Everything the magnifier needs, borrowed from the engine.
#[derive(Debug, Clone, Copy)]
pub struct MagnifierInput<'a> {
    /// Pointer in screen space.
    pub pointer: Point,
    /// Canvas element bounds in screen space.
    pub canvas_rect: Rect,
    /// Size of the host window; the loupe must stay inside it.
    pub viewport: Size,
    pub view: &'a ViewState,
    pub image_url: &'a str,
    pub image: Size,
    pub info: &'a ImageDisplayInfo,
    pub crop_area: &'a Quad,
}

/// The dragged corner as it appears inside the loupe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Marker {
    pub corner: Corner,
    /// Position in loupe pixels.
    pub at: Point,
    /// One-based label, matching the corner index + 1.
    pub label: usize,
}

/// A projected loupe, ready to be placed and painted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MagnifierView {
    /// Top-left of the loupe in viewport coordinates.
    pub position: Point,
    /// Image-space pixel under the pointer, unclamped.
    pub cursor_image: Point,
    /// Image-space window shown in the loupe. `None` when it has no area.
    pub source: Option<Rect>,
    pub marker: Option<Marker>,
    pub draw: DrawList,
}

/// Project the loupe for the current drag, or `None` when it should be hidden.
#[must_use]
pub fn project(input: &MagnifierInput<'_>) -> Option<MagnifierView> {
    let corner = input.view.selected_corner?;
    if !input.view.is_corner_dragging() || input.image.is_empty() {
        return None;
    }

    let canvas_pt = screen_to_canvas(input.pointer, input.canvas_rect, input.view.zoom(), input.view.offset);
    let cursor_image = canvas_to_image_unclamped(canvas_pt, input.info);
    let source = source_window(cursor_image, input.image, input.info.scale);

    let corner_image = canvas_to_image_unclamped(input.crop_area.corner(corner), input.info);
    let marker = source
        .and_then(|src| marker_position(corner_image, src))
        .map(|at| Marker { corner, at, label: corner.index() + 1 });

    Some(MagnifierView {
        position: placement(input.pointer, input.viewport),
        cursor_image,
        source,
        marker,
        draw: draw_loupe(input.image_url, source, marker),
    })
}

/// Half-width, in image pixels, of the window shown at `base_scale`.
#[must_use]
pub fn sample_radius(base_scale: f64) -> f64 {
    MAGNIFIER_SIZE_PX / (2.0 * MAGNIFIER_ZOOM * base_scale)
}

/// Square source window centered on `cursor`, shifted (not shrunk) to stay inside
/// the image, then trimmed if the image is smaller than the window.
#[must_use]
pub fn source_window(cursor: Point, image: Size, base_scale: f64) -> Option<Rect> {
    let radius = sample_radius(base_scale);
    let side = radius * 2.0;
    let x = (image.width - side).min(cursor.x - radius).max(0.0);
    let y = (image.height - side).min(cursor.y - radius).max(0.0);
    let width = (image.width - x).min(side);
    let height = (image.height - y).min(side);
    if width > 0.0 && height > 0.0 { Some(Rect::new(x, y, width, height)) } else { None }
}

/// Where the corner lands inside the loupe, if it is inside `source`.
#[must_use]
pub fn marker_position(corner_image: Point, source: Rect) -> Option<Point> {
    if !source.contains(corner_image) {
        return None;
    }
    Some(Point::new(
        (corner_image.x - source.x) / source.width * MAGNIFIER_SIZE_PX,
        (corner_image.y - source.y) / source.height * MAGNIFIER_SIZE_PX,
    ))
}

/// Loupe top-left: up and to the right of the pointer, flipped left when it would
/// overflow the viewport's right edge and below when it would overflow the top.
#[must_use]
pub fn placement(pointer: Point, viewport: Size) -> Point {
    let mut x = pointer.x + MAGNIFIER_POINTER_GAP_PX;
    let mut y = pointer.y - MAGNIFIER_SIZE_PX - MAGNIFIER_POINTER_GAP_PX;
    if x + MAGNIFIER_SIZE_PX > viewport.width {
        x = pointer.x - MAGNIFIER_SIZE_PX - MAGNIFIER_POINTER_GAP_PX;
    }
    if y < 0.0 {
        y = pointer.y + MAGNIFIER_POINTER_GAP_PX;
    }
    Point::new(x, y)
}

fn draw_loupe(url: &str, source: Option<Rect>, marker: Option<Marker>) -> DrawList {
    let size = Size::new(MAGNIFIER_SIZE_PX, MAGNIFIER_SIZE_PX);
    let mut list = DrawList::new(size);
    let bounds = list.bounds();
    let center = Point::new(MAGNIFIER_SIZE_PX / 2.0, MAGNIFIER_SIZE_PX / 2.0);
    let radius = MAGNIFIER_SIZE_PX / 2.0;

    list.push(DrawCommand::Clear { rect: bounds });
    list.push(DrawCommand::Save);
    list.push(DrawCommand::ClipCircle { center, radius });
    list.push(DrawCommand::FillRect { rect: bounds, color: LOUPE_BACKGROUND });

    if let Some(src) = source {
        // Nearest-neighbour so individual pixels stay visible.
        list.push(DrawCommand::SetSmoothing { enabled: false });
        list.push(DrawCommand::DrawImage { url: url.to_owned(), src: Some(src), dst: bounds });
        list.push(DrawCommand::SetSmoothing { enabled: true });
    }

    if let Some(m) = marker {
        list.push(DrawCommand::Circle {
            center: m.at,
            radius: MAGNIFIER_MARKER_RADIUS_PX,
            fill: Some(MARKER_FILL),
            stroke: Some(MARKER_STROKE),
        });
        list.push(DrawCommand::Text {
            text: m.label.to_string(),
            at: Point::new(m.at.x, m.at.y + MARKER_LABEL_DY),
            color: MARKER_LABEL_COLOR,
            font: MARKER_LABEL_FONT,
        });
    }

    // Crosshair.
    let r = MAGNIFIER_CROSSHAIR_RADIUS_PX;
    list.push(DrawCommand::Circle {
        center,
        radius: r,
        fill: Some(CROSSHAIR_FILL),
        stroke: Some(CROSSHAIR_RING),
    });
    list.push(DrawCommand::Line {
        from: Point::new(center.x - r, center.y),
        to: Point::new(center.x + r, center.y),
        stroke: CROSSHAIR_LINE,
    });
    list.push(DrawCommand::Line {
        from: Point::new(center.x, center.y - r),
        to: Point::new(center.x, center.y + r),
        stroke: CROSSHAIR_LINE,
    });

    list.push(DrawCommand::Restore);
    list.push(DrawCommand::Circle { center, radius: radius - LOUPE_BORDER.width / 2.0, fill: None, stroke: Some(LOUPE_BORDER) });
    list
}
