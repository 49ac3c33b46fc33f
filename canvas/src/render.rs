//! Rendering: builds the editor scene as an ordered list of draw commands.
//!
//! Nothing here touches a real 2D context. [`draw_main`] receives read-only
//! views of the view state, the current image and its crop quad, and produces
//! a [`DrawList`] that any backend can replay: the `web` feature replays it onto
//! a browser canvas (see `crate::web`), the CLI serializes it to JSON, and the
//! tests assert against it directly.
//!
//! Layering, bottom first:
//!
//! 1. clear and background fill
//! 2. the image, drawn under the view's pan/zoom transform
//! 3. the mask with a quad-shaped hole, outline, and corner handles, drawn in
//!    surface pixels so stroke widths and handle radii stay constant on screen
//!
//! A failed or timed-out image replaces layers 2 and 3 with the error placeholder.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use serde::Serialize;

use crate::consts::{HANDLE_RADIUS_PX, OUTLINE_WIDTH_PX};
use crate::geometry::{Corner, Point, Quad, Rect, Size};
use crate::transform::{ImageDisplayInfo, canvas_to_screen};
use crate::view::ViewState;

pub const BACKGROUND_COLOR: &str = "#f8f9fa";
pub const MASK_COLOR: &str = "rgba(0, 0, 0, 0.3)";
pub const OUTLINE_COLOR: &str = "#00ff00";
pub const HANDLE_FILL: &str = "#00ff00";
pub const HANDLE_STROKE: &str = "#00cc00";
pub const SELECTED_HANDLE_FILL: &str = "#ff0000";
pub const SELECTED_HANDLE_STROKE: &str = "#cc0000";
pub const ERROR_FILL: &str = "#ef4444";
pub const ERROR_TEXT_COLOR: &str = "#ffffff";
pub const ERROR_TEXT: &str = "Error loading image";
pub const ERROR_FONT: &str = "16px Arial";

/// How a fill combines with what is already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Composite {
    SourceOver,
    /// Erase wherever the new shape is drawn.
    DestinationOut,
}

impl Composite {
    /// The 2D-context `globalCompositeOperation` name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SourceOver => "source-over",
            Self::DestinationOut => "destination-out",
        }
    }
}

/// A stroke applied after a fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stroke {
    pub color: &'static str,
    pub width: f64,
}

/// One primitive 2D-context operation.
///
/// Coordinates are in the current transform's space: surface pixels unless a
/// [`DrawCommand::Translate`] / [`DrawCommand::Scale`] pair is active.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear { rect: Rect },
    FillRect { rect: Rect, color: &'static str },
    Save,
    Restore,
    Translate { x: f64, y: f64 },
    Scale { factor: f64 },
    SetComposite { mode: Composite },
    SetSmoothing { enabled: bool },
    /// Draw the image behind `url`. `src` selects a sub-rectangle in image
    /// pixels; `None` draws the whole image.
    DrawImage { url: String, src: Option<Rect>, dst: Rect },
    FillPolygon { points: Vec<Point>, color: &'static str },
    /// Closed outline through `points`.
    StrokePolygon { points: Vec<Point>, stroke: Stroke },
    Circle { center: Point, radius: f64, fill: Option<&'static str>, stroke: Option<Stroke> },
    Line { from: Point, to: Point, stroke: Stroke },
    /// Text centered horizontally on `at`.
    Text { text: String, at: Point, color: &'static str, font: &'static str },
    /// Restrict later drawing to a circle until the matching `Restore`.
    ClipCircle { center: Point, radius: f64 },
}

/// A surface size plus the commands that paint it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawList {
    pub size: Size,
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self { size, commands: Vec::new() }
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Full-surface rectangle.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.size.width, self.size.height)
    }
}

/// What the renderer knows about the current image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageLayer<'a> {
    /// No image is selected.
    Empty,
    /// Still fetching or decoding; nothing to draw yet.
    Loading,
    /// Decoded and placed.
    Ready { url: &'a str, info: ImageDisplayInfo },
    /// Load failed or timed out.
    Failed,
}

/// Build the main editor scene.
///
/// Returns `None` when the surface has no area; there is nothing sensible to
/// draw and every transform would divide by zero.
#[must_use]
pub fn draw_main(surface: Size, view: &ViewState, image: ImageLayer<'_>, crop_area: Option<&Quad>) -> Option<DrawList> {
    if surface.is_empty() {
        return None;
    }
    let mut list = DrawList::new(surface);
    let bounds = list.bounds();

    // Layer 1: clear and background.
    list.push(DrawCommand::Clear { rect: bounds });
    list.push(DrawCommand::FillRect { rect: bounds, color: BACKGROUND_COLOR });

    // Layer 2: image under the view transform.
    match image {
        ImageLayer::Empty | ImageLayer::Loading => {}
        ImageLayer::Failed => {
            draw_error_placeholder(&mut list);
            return Some(list);
        }
        ImageLayer::Ready { url, info } => {
            list.push(DrawCommand::Save);
            list.push(DrawCommand::Translate { x: view.offset.x, y: view.offset.y });
            list.push(DrawCommand::Scale { factor: view.zoom() });
            list.push(DrawCommand::DrawImage { url: url.to_owned(), src: None, dst: info.rect() });
            list.push(DrawCommand::Restore);
        }
    }

    // Layer 3: crop overlay.
    if let Some(quad) = crop_area {
        draw_crop_area(&mut list, quad, view);
    }

    Some(list)
}

/// Map a canvas-space point onto the surface under the view transform.
fn to_surface(p: Point, view: &ViewState) -> Point {
    canvas_to_screen(p, Rect::default(), view.zoom(), view.offset)
}

fn draw_crop_area(list: &mut DrawList, quad: &Quad, view: &ViewState) {
    let points: Vec<Point> = quad.points().iter().map(|p| to_surface(*p, view)).collect();
    let bounds = list.bounds();

    list.push(DrawCommand::Save);

    // Dim everything, then punch the quad back out.
    list.push(DrawCommand::FillRect { rect: bounds, color: MASK_COLOR });
    list.push(DrawCommand::SetComposite { mode: Composite::DestinationOut });
    list.push(DrawCommand::FillPolygon { points: points.clone(), color: MASK_COLOR });
    list.push(DrawCommand::SetComposite { mode: Composite::SourceOver });

    list.push(DrawCommand::StrokePolygon {
        points: points.clone(),
        stroke: Stroke { color: OUTLINE_COLOR, width: OUTLINE_WIDTH_PX },
    });

    for (corner, center) in Corner::ALL.into_iter().zip(points) {
        let (fill, stroke) = if view.selected_corner == Some(corner) {
            (SELECTED_HANDLE_FILL, SELECTED_HANDLE_STROKE)
        } else {
            (HANDLE_FILL, HANDLE_STROKE)
        };
        list.push(DrawCommand::Circle {
            center,
            radius: HANDLE_RADIUS_PX,
            fill: Some(fill),
            stroke: Some(Stroke { color: stroke, width: 1.0 }),
        });
    }

    list.push(DrawCommand::Restore);
}

fn draw_error_placeholder(list: &mut DrawList) {
    let bounds = list.bounds();
    list.push(DrawCommand::FillRect { rect: bounds, color: ERROR_FILL });
    list.push(DrawCommand::Text {
        text: ERROR_TEXT.to_owned(),
        at: Point::new(bounds.width / 2.0, bounds.height / 2.0),
        color: ERROR_TEXT_COLOR,
        font: ERROR_FONT,
    });
}
