//! Browser surface: binds [`EngineCore`] to a `<canvas>` element and replays
//! its draw lists onto a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.

use std::collections::HashMap;
use std::f64::consts::TAU;

use tracing::debug;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::doc::ImageId;
use crate::engine::{Action, EngineCore};
use crate::geometry::{Point, Size};
use crate::render::{DrawCommand, DrawList, Stroke};

/// Engine bound to a canvas element, with the decoded images it may draw.
pub struct Engine {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    images: HashMap<String, HtmlImageElement>,
    pub core: EngineCore,
}

impl Engine {
    /// Bind to `canvas`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the element has no 2D context.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = context_2d(&canvas)?;
        Ok(Self { canvas, ctx, images: HashMap::new(), core: EngineCore::new() })
    }

    /// Hand over a decoded image for `url` and report its natural size.
    pub fn register_image(&mut self, url: &str, image: HtmlImageElement) -> Vec<Action> {
        let size = Size::new(f64::from(image.natural_width()), f64::from(image.natural_height()));
        self.images.insert(url.to_owned(), image);
        self.core.on_image_loaded(url, size)
    }

    /// Remove an image record, releasing its decoded element once no other
    /// record shares the URL.
    pub fn remove_image(&mut self, id: ImageId) -> Vec<Action> {
        let url = self.core.store.get(&id).map(|record| record.url.clone());
        let actions = self.core.remove_image(id);
        if let Some(url) = url {
            if !self.core.store.has_url(&url) {
                debug!(url, "releasing decoded image");
                self.images.remove(&url);
            }
        }
        actions
    }

    /// Animation-frame callback: tick the engine and paint any produced frame.
    ///
    /// The magnifier draw list is painted onto `loupe` when both exist; a
    /// frame without one clears the loupe.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any `Canvas2D` call fails.
    pub fn frame(&mut self, now_ms: f64, loupe: Option<&HtmlCanvasElement>) -> Result<Vec<Action>, JsValue> {
        let tick = self.core.on_frame(now_ms);
        if let Some(frame) = &tick.frame {
            fit_canvas(&self.canvas, frame.main.size);
            replay(&self.ctx, &self.images, &frame.main)?;
            if let Some(loupe) = loupe {
                let ctx = context_2d(loupe)?;
                match &frame.magnifier {
                    Some(view) => {
                        fit_canvas(loupe, view.draw.size);
                        replay(&ctx, &self.images, &view.draw)?;
                    }
                    None => ctx.clear_rect(0.0, 0.0, f64::from(loupe.width()), f64::from(loupe.height())),
                }
            }
        }
        Ok(tick.actions)
    }
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?;
    Ok(ctx.dyn_into::<CanvasRenderingContext2d>()?)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn fit_canvas(canvas: &HtmlCanvasElement, size: Size) {
    let (w, h) = (size.width.round() as u32, size.height.round() as u32);
    if canvas.width() != w {
        canvas.set_width(w);
    }
    if canvas.height() != h {
        canvas.set_height(h);
    }
}

/// Replay `list` onto `ctx`, in order.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails.
pub fn replay(
    ctx: &CanvasRenderingContext2d,
    images: &HashMap<String, HtmlImageElement>,
    list: &DrawList,
) -> Result<(), JsValue> {
    for cmd in &list.commands {
        apply(ctx, images, cmd)?;
    }
    Ok(())
}

fn apply(
    ctx: &CanvasRenderingContext2d,
    images: &HashMap<String, HtmlImageElement>,
    cmd: &DrawCommand,
) -> Result<(), JsValue> {
    match cmd {
        DrawCommand::Clear { rect } => ctx.clear_rect(rect.x, rect.y, rect.width, rect.height),
        DrawCommand::FillRect { rect, color } => {
            ctx.set_fill_style_str(color);
            ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
        }
        DrawCommand::Save => ctx.save(),
        DrawCommand::Restore => ctx.restore(),
        DrawCommand::Translate { x, y } => ctx.translate(*x, *y)?,
        DrawCommand::Scale { factor } => ctx.scale(*factor, *factor)?,
        DrawCommand::SetComposite { mode } => ctx.set_global_composite_operation(mode.as_str())?,
        DrawCommand::SetSmoothing { enabled } => ctx.set_image_smoothing_enabled(*enabled),
        DrawCommand::DrawImage { url, src, dst } => {
            let Some(image) = images.get(url) else {
                debug!(url, "image not registered; skipping draw");
                return Ok(());
            };
            match src {
                Some(s) => ctx.draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                    image, s.x, s.y, s.width, s.height, dst.x, dst.y, dst.width, dst.height,
                )?,
                None => ctx.draw_image_with_html_image_element_and_dw_and_dh(image, dst.x, dst.y, dst.width, dst.height)?,
            }
        }
        DrawCommand::FillPolygon { points, color } => {
            trace_polygon(ctx, points);
            ctx.set_fill_style_str(color);
            ctx.fill();
        }
        DrawCommand::StrokePolygon { points, stroke } => {
            trace_polygon(ctx, points);
            apply_stroke(ctx, *stroke);
            ctx.stroke();
        }
        DrawCommand::Circle { center, radius, fill, stroke } => {
            ctx.begin_path();
            ctx.arc(center.x, center.y, *radius, 0.0, TAU)?;
            if let Some(fill) = fill {
                ctx.set_fill_style_str(fill);
                ctx.fill();
            }
            if let Some(stroke) = stroke {
                apply_stroke(ctx, *stroke);
                ctx.stroke();
            }
        }
        DrawCommand::Line { from, to, stroke } => {
            ctx.begin_path();
            ctx.move_to(from.x, from.y);
            ctx.line_to(to.x, to.y);
            apply_stroke(ctx, *stroke);
            ctx.stroke();
        }
        DrawCommand::Text { text, at, color, font } => {
            ctx.set_fill_style_str(color);
            ctx.set_font(font);
            ctx.set_text_align("center");
            ctx.fill_text(text, at.x, at.y)?;
        }
        DrawCommand::ClipCircle { center, radius } => {
            ctx.begin_path();
            ctx.arc(center.x, center.y, *radius, 0.0, TAU)?;
            ctx.clip();
        }
    }
    Ok(())
}

fn trace_polygon(ctx: &CanvasRenderingContext2d, points: &[Point]) {
    ctx.begin_path();
    for (i, p) in points.iter().enumerate() {
        if i == 0 {
            ctx.move_to(p.x, p.y);
        } else {
            ctx.line_to(p.x, p.y);
        }
    }
    ctx.close_path();
}

fn apply_stroke(ctx: &CanvasRenderingContext2d, stroke: Stroke) {
    ctx.set_stroke_style_str(stroke.color);
    ctx.set_line_width(stroke.width);
}
