//! Editor engine: owns the session state and turns host events into actions.
//!
//! [`EngineCore`] is the single writer of the crop quad and the view state.
//! Every entry point is a plain function of (state, event, `now_ms`) that
//! mutates the core and returns [`Action`]s for the host: schedule a frame,
//! change the cursor, start an image load, persist a crop area. Rendering and
//! the magnifier only ever see shared references, on the frame tick.
//!
//! The host supplies the clock. Nothing here sleeps, spawns, or does I/O.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use serde::Serialize;
use tracing::{debug, warn};
use wire::{AutoDetectResponse, CropRequest, WireError};

use crate::consts::{
    CORNER_UPDATE_INTERVAL_MS, IMAGE_LOAD_TIMEOUT_MS, WHEEL_ZOOM_IN, WHEEL_ZOOM_OUT, ZOOM_BUTTON_STEP,
};
use crate::doc::{ImageCache, ImageId, ImageRecord, ImageStatus, ImageStore, LoadState};
use crate::geometry::{Corner, GeometryError, Point, Quad, Rect, Size, constrain_point};
use crate::hit;
use crate::input::{InputEvent, InputState, WheelDelta};
use crate::magnifier::{self, MagnifierInput, MagnifierView};
use crate::render::{self, DrawList, ImageLayer};
use crate::schedule::{CornerThrottle, FrameScheduler, Throttled};
use crate::transform::{
    ImageDisplayInfo, TransformError, image_display_info, image_points_to_quad, quad_to_image_points,
    screen_to_canvas, validate_round_trip,
};
use crate::view::ViewState;

const CURSOR_GRAB: &str = "grab";
const CURSOR_GRABBING: &str = "grabbing";
const CURSOR_CROSSHAIR: &str = "crosshair";

/// Error returned by engine queries that need a loaded image.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No image is current.
    #[error("no image is selected")]
    NoImage,
    /// The id does not name a record in the store.
    #[error("unknown image {0}")]
    UnknownImage(ImageId),
    /// The current image's native size is not known yet.
    #[error("image dimensions are not known yet")]
    ImageNotReady,
    /// The current image has no crop quad.
    #[error("current image has no crop area")]
    NoCropArea,
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Wire(#[from] WireError),
}

/// Actions returned from engine entry points for the host to process.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// A frame is now pending; call [`EngineCore::on_frame`] on the next tick.
    RenderNeeded,
    SetCursor(String),
    /// Start fetching and decoding `url`, then report back through
    /// [`EngineCore::on_image_loaded`] or [`EngineCore::on_image_failed`].
    LoadImage { url: String },
    /// The crop quad of `id` changed and should be persisted.
    CropAreaChanged { id: ImageId, crop_area: Quad },
    ImageFailed { id: ImageId, reason: String },
}

/// Output of one frame tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub main: DrawList,
    pub magnifier: Option<MagnifierView>,
}

/// What a tick or dispatched event produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tick {
    pub frame: Option<Frame>,
    pub actions: Vec<Action>,
}

/// Core engine state. Testable without a browser.
pub struct EngineCore {
    pub store: ImageStore,
    pub view: ViewState,
    pub input: InputState,
    canvas_rect: Rect,
    viewport: Size,
    throttle: CornerThrottle,
    frames: FrameScheduler,
    cache: ImageCache,
    /// Last pointer position in screen space, for the magnifier.
    pointer: Option<Point>,
    cursor: &'static str,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self {
            store: ImageStore::new(),
            view: ViewState::default(),
            input: InputState::default(),
            canvas_rect: Rect::default(),
            viewport: Size::default(),
            throttle: CornerThrottle::new(CORNER_UPDATE_INTERVAL_MS),
            frames: FrameScheduler::new(),
            cache: ImageCache::new(),
            pointer: None,
            cursor: CURSOR_GRAB,
        }
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Surface ---

    /// Position and size of the canvas element in screen space.
    pub fn set_canvas_rect(&mut self, rect: Rect) -> Vec<Action> {
        self.canvas_rect = rect;
        let mut actions: Vec<Action> = self.ensure_crop_area().into_iter().collect();
        actions.extend(self.request_render());
        actions
    }

    /// Size of the host window; bounds magnifier placement.
    pub fn set_viewport(&mut self, size: Size) {
        self.viewport = size;
    }

    #[must_use]
    pub fn canvas_rect(&self) -> Rect {
        self.canvas_rect
    }

    #[must_use]
    pub fn canvas_size(&self) -> Size {
        self.canvas_rect.size()
    }

    #[must_use]
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Tear down: no frame may fire and no gesture survives.
    pub fn unmount(&mut self) {
        self.frames.cancel();
        self.end_gesture();
        debug!("engine unmounted");
    }

    // --- Images ---

    /// Add an image and make it current.
    pub fn add_image(&mut self, name: impl Into<String>, url: impl Into<String>, now_ms: f64) -> (ImageId, Vec<Action>) {
        let record = ImageRecord::new(name, url);
        let id = record.id;
        self.store.insert(record);
        (id, self.activate_current(now_ms))
    }

    /// Switch to another image. The view is reset, never restored per image.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownImage`] if `id` is not in the store.
    pub fn select_image(&mut self, id: ImageId, now_ms: f64) -> Result<Vec<Action>, EngineError> {
        if !self.store.select(&id) {
            return Err(EngineError::UnknownImage(id));
        }
        Ok(self.activate_current(now_ms))
    }

    /// Drop an image. Removing the current one leaves nothing selected.
    pub fn remove_image(&mut self, id: ImageId) -> Vec<Action> {
        let was_current = self.store.current_id() == Some(id);
        if self.store.remove(&id).is_none() {
            return Vec::new();
        }
        if !was_current {
            return Vec::new();
        }
        self.reset_session();
        self.cache.clear();
        let mut actions: Vec<Action> = self.update_cursor().into_iter().collect();
        actions.extend(self.request_render());
        actions
    }

    /// The host finished decoding `url`. Stale URLs are ignored.
    pub fn on_image_loaded(&mut self, url: &str, size: Size) -> Vec<Action> {
        if !self.cache.resolve_loaded(url, size) {
            debug!(url, "ignoring stale image load");
            return Vec::new();
        }
        if size.is_empty() {
            return self.mark_failed("image decoded with zero dimensions");
        }
        debug!(url, width = size.width, height = size.height, "image loaded");
        self.adopt_size(size)
    }

    /// The host failed to fetch or decode `url`. Stale URLs are ignored.
    pub fn on_image_failed(&mut self, url: &str, reason: &str) -> Vec<Action> {
        if !self.cache.resolve_failed(url, reason) {
            debug!(url, "ignoring stale image failure");
            return Vec::new();
        }
        self.mark_failed(reason)
    }

    /// Load state of the current image, if one is tracked.
    #[must_use]
    pub fn load_state(&self) -> Option<&LoadState> {
        self.cache.current_state()
    }

    /// Aspect-fit placement of the current image.
    ///
    /// # Errors
    ///
    /// Fails without a current image, before its size is known, or when the
    /// canvas or image has no area.
    pub fn image_display_info(&self) -> Result<ImageDisplayInfo, EngineError> {
        let record = self.store.current().ok_or(EngineError::NoImage)?;
        let size = record.size.ok_or(EngineError::ImageNotReady)?;
        Ok(image_display_info(self.canvas_size(), size)?)
    }

    // --- Pointer input ---

    /// Start a gesture: a corner drag when a handle is hit, otherwise a pan.
    pub fn on_pointer_down(&mut self, screen_pt: Point, now_ms: f64) -> Vec<Action> {
        if self.input.is_active() {
            debug!("pointer down ignored, gesture already active");
            return Vec::new();
        }
        let Some(record) = self.store.current() else {
            return Vec::new();
        };

        let zoom = self.view.zoom();
        let canvas_pt = screen_to_canvas(screen_pt, self.canvas_rect, zoom, self.view.offset);
        let hit = record.crop_area.as_ref().and_then(|quad| hit::hit_test(canvas_pt, quad, zoom));

        self.pointer = Some(screen_pt);
        self.throttle.reset();
        self.view.set_is_dragging(true);
        self.view.set_selected_corner(hit);
        self.input = match hit {
            Some(corner) => {
                debug!(?corner, now_ms, "corner drag started");
                InputState::CornerDragging { corner, moved: false }
            }
            None => {
                debug!(now_ms, "pan started");
                InputState::Panning { start_screen: screen_pt, start_offset: self.view.offset }
            }
        };

        let mut actions: Vec<Action> = self.update_cursor().into_iter().collect();
        actions.extend(self.request_render());
        actions
    }

    /// Continue the active gesture. Corner updates are throttled; panning is not.
    pub fn on_pointer_move(&mut self, screen_pt: Point, now_ms: f64) -> Vec<Action> {
        match self.input {
            InputState::Idle => Vec::new(),
            InputState::Panning { start_screen, start_offset } => {
                self.pointer = Some(screen_pt);
                self.view.set_offset(start_offset + (screen_pt - start_screen));
                self.request_render().into_iter().collect()
            }
            InputState::CornerDragging { corner, .. } => {
                self.pointer = Some(screen_pt);
                let canvas = self.canvas_size();
                let canvas_pt = screen_to_canvas(screen_pt, self.canvas_rect, self.view.zoom(), self.view.offset);
                let clamped = constrain_point(canvas_pt, canvas.width, canvas.height);
                if let Throttled::Commit(p) = self.throttle.offer(clamped, now_ms) {
                    self.commit_corner(corner, p);
                }
                // Deferred samples are flushed on the frame tick, so a frame is needed either way.
                self.request_render().into_iter().collect()
            }
        }
    }

    /// End the active gesture, flushing any deferred corner sample first.
    pub fn on_pointer_up(&mut self, _screen_pt: Point, now_ms: f64) -> Vec<Action> {
        let mut actions = Vec::new();
        match self.input {
            InputState::Idle => return actions,
            InputState::Panning { .. } => debug!(now_ms, "pan ended"),
            InputState::CornerDragging { corner, .. } => {
                if let Some(p) = self.throttle.flush(now_ms) {
                    self.commit_corner(corner, p);
                }
                if let InputState::CornerDragging { moved: true, .. } = self.input {
                    actions.extend(self.crop_area_changed());
                }
                debug!(?corner, now_ms, "corner drag ended");
            }
        }
        self.end_gesture();
        actions.extend(self.update_cursor());
        actions.extend(self.request_render());
        actions
    }

    /// Zoom by one wheel tick, keeping the canvas point under the cursor fixed.
    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta) -> Vec<Action> {
        let factor = if delta.dy > 0.0 {
            WHEEL_ZOOM_OUT
        } else if delta.dy < 0.0 {
            WHEEL_ZOOM_IN
        } else {
            return Vec::new();
        };

        let old = self.view.zoom();
        self.view.set_zoom(old * factor);
        let ratio = self.view.zoom() / old;

        let cursor = screen_pt - self.canvas_rect.origin();
        self.view.set_offset(cursor - (cursor - self.view.offset) * ratio);
        self.request_render().into_iter().collect()
    }

    // --- View controls ---

    /// Zoom-in button: one fixed step, offset untouched.
    pub fn zoom_in(&mut self) -> Vec<Action> {
        self.view.set_zoom(self.view.zoom() + ZOOM_BUTTON_STEP);
        self.request_render().into_iter().collect()
    }

    /// Zoom-out button: one fixed step, offset untouched.
    pub fn zoom_out(&mut self) -> Vec<Action> {
        self.view.set_zoom(self.view.zoom() - ZOOM_BUTTON_STEP);
        self.request_render().into_iter().collect()
    }

    pub fn reset_view(&mut self) -> Vec<Action> {
        self.reset_session();
        let mut actions: Vec<Action> = self.update_cursor().into_iter().collect();
        actions.extend(self.request_render());
        actions
    }

    // --- Frame tick ---

    /// Animation-frame tick: expire slow loads, flush the deferred corner
    /// sample, and render if a frame is pending.
    ///
    /// While the current image is still loading, every rendered tick asks for
    /// another, so a host that only ticks on [`Action::RenderNeeded`] still
    /// reaches the load deadline.
    pub fn on_frame(&mut self, now_ms: f64) -> Tick {
        let mut actions = Vec::new();

        if let Some(url) = self.cache.expire(now_ms, IMAGE_LOAD_TIMEOUT_MS) {
            warn!(url, timeout_ms = IMAGE_LOAD_TIMEOUT_MS, "image load timed out");
            actions.extend(self.mark_failed("image load timed out"));
        }

        if let Some(corner) = self.input.dragged_corner() {
            if let Some(p) = self.throttle.flush(now_ms) {
                self.commit_corner(corner, p);
                self.frames.request();
            }
        }

        let ticked = self.frames.take();
        let frame = if ticked { self.render() } else { None };

        // A pending load needs ticks to reach its deadline.
        if ticked && matches!(self.cache.current_state(), Some(LoadState::Loading { .. })) {
            actions.extend(self.request_render());
        }
        Tick { frame, actions }
    }

    #[must_use]
    pub fn has_pending_frame(&self) -> bool {
        self.frames.is_pending()
    }

    /// Route a recorded event to its handler.
    pub fn dispatch(&mut self, event: &InputEvent) -> Tick {
        let actions = match *event {
            InputEvent::PointerDown { x, y, t } => self.on_pointer_down(Point::new(x, y), t),
            InputEvent::PointerMove { x, y, t } => self.on_pointer_move(Point::new(x, y), t),
            InputEvent::PointerUp { x, y, t } => self.on_pointer_up(Point::new(x, y), t),
            InputEvent::Wheel { x, y, dy, .. } => self.on_wheel(Point::new(x, y), WheelDelta { dx: 0.0, dy }),
            InputEvent::Frame { t } => return self.on_frame(t),
            InputEvent::ZoomIn { .. } => self.zoom_in(),
            InputEvent::ZoomOut { .. } => self.zoom_out(),
            InputEvent::ResetView { .. } => self.reset_view(),
        };
        Tick { frame: None, actions }
    }

    // --- Backend boundary ---

    /// Image-space crop request for the current quad.
    ///
    /// # Errors
    ///
    /// Fails without a current image, its size, or a crop area.
    pub fn crop_request(&self) -> Result<CropRequest, EngineError> {
        let record = self.store.current().ok_or(EngineError::NoImage)?;
        let size = record.size.ok_or(EngineError::ImageNotReady)?;
        let quad = record.crop_area.ok_or(EngineError::NoCropArea)?;
        let info = image_display_info(self.canvas_size(), size)?;
        if !quad.is_valid() {
            warn!(id = %record.id, "crop area has coincident corners");
        }
        for corner in Corner::ALL {
            if !validate_round_trip(quad.corner(corner), &info, size) {
                debug!(id = %record.id, ?corner, "corner lies outside the image; clamped to its edge");
            }
        }
        Ok(CropRequest::new(quad_to_image_points(&quad, &info, size)))
    }

    /// Replace the current quad with a backend detection.
    ///
    /// # Errors
    ///
    /// Fails when the detection is unusable or the image is not ready.
    pub fn apply_auto_detect(&mut self, response: &AutoDetectResponse) -> Result<Vec<Action>, EngineError> {
        let corners = response.corners()?;
        let info = self.image_display_info()?;
        let record = self.store.current_mut().ok_or(EngineError::NoImage)?;
        let size = record.size.ok_or(EngineError::ImageNotReady)?;

        let quad = image_points_to_quad(corners, &info, size);
        record.crop_area = Some(quad);
        if response.is_low_confidence() {
            warn!(id = %record.id, confidence = response.confidence, "low-confidence detection");
        } else {
            debug!(id = %record.id, confidence = response.confidence, "applied detection");
        }

        let mut actions: Vec<Action> = self.crop_area_changed().into_iter().collect();
        actions.extend(self.request_render());
        Ok(actions)
    }

    /// Record the backend's crop outcome on the current image.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoImage`] without a current image.
    pub fn set_status(&mut self, status: ImageStatus, processed_name: Option<String>) -> Result<(), EngineError> {
        let record = self.store.current_mut().ok_or(EngineError::NoImage)?;
        record.status = status;
        if processed_name.is_some() {
            record.processed_name = processed_name;
        }
        Ok(())
    }

    // --- Queries ---

    #[must_use]
    pub fn current(&self) -> Option<&ImageRecord> {
        self.store.current()
    }

    #[must_use]
    pub fn crop_area(&self) -> Option<Quad> {
        self.store.current().and_then(|r| r.crop_area)
    }

    #[must_use]
    pub fn cursor(&self) -> &'static str {
        self.cursor
    }

    /// Build the frame for the current state without consuming the pending flag.
    #[must_use]
    pub fn render(&self) -> Option<Frame> {
        let record = self.store.current();
        let layer = self.image_layer(record);
        let main = render::draw_main(self.canvas_size(), &self.view, layer, record.and_then(|r| r.crop_area.as_ref()))?;
        let magnifier = self.project_magnifier(record, layer);
        Some(Frame { main, magnifier })
    }

    // --- Internals ---

    fn image_layer<'a>(&self, record: Option<&'a ImageRecord>) -> ImageLayer<'a> {
        let Some(record) = record else {
            return ImageLayer::Empty;
        };
        match self.cache.get(&record.url) {
            Some(LoadState::Ready(size)) => match image_display_info(self.canvas_size(), *size) {
                Ok(info) => ImageLayer::Ready { url: &record.url, info },
                Err(err) => {
                    warn!(%err, "cannot place image");
                    ImageLayer::Failed
                }
            },
            Some(LoadState::Failed(_)) => ImageLayer::Failed,
            Some(LoadState::Loading { .. }) | None => ImageLayer::Loading,
        }
    }

    fn project_magnifier(&self, record: Option<&ImageRecord>, layer: ImageLayer<'_>) -> Option<MagnifierView> {
        let ImageLayer::Ready { url, info } = layer else {
            return None;
        };
        let record = record?;
        magnifier::project(&MagnifierInput {
            pointer: self.pointer?,
            canvas_rect: self.canvas_rect,
            viewport: self.viewport,
            view: &self.view,
            image_url: url,
            image: record.size?,
            info: &info,
            crop_area: record.crop_area.as_ref()?,
        })
    }

    /// Make the store's current record the live one: fresh view, fresh gesture,
    /// no stale frame, and a load request if its URL is new.
    fn activate_current(&mut self, now_ms: f64) -> Vec<Action> {
        self.reset_session();
        self.frames.cancel();

        let mut actions = Vec::new();
        match self.store.current().map(|r| (r.id, r.url.clone())) {
            Some((id, url)) => {
                debug!(%id, url, "switched image");
                if self.cache.track(&url, now_ms) {
                    actions.push(Action::LoadImage { url });
                } else if let Some(LoadState::Ready(size)) = self.cache.get(&url).cloned() {
                    actions.extend(self.adopt_size(size));
                }
            }
            None => self.cache.clear(),
        }
        actions.extend(self.update_cursor());
        actions.extend(self.request_render());
        actions
    }

    fn adopt_size(&mut self, size: Size) -> Vec<Action> {
        if let Some(record) = self.store.current_mut() {
            record.size = Some(size);
            record.status = ImageStatus::Completed;
        }
        let mut actions: Vec<Action> = self.ensure_crop_area().into_iter().collect();
        actions.extend(self.request_render());
        actions
    }

    /// Give a sized image its default quad once the canvas has area.
    fn ensure_crop_area(&mut self) -> Option<Action> {
        let canvas = self.canvas_size();
        if canvas.is_empty() {
            return None;
        }
        let record = self.store.current_mut()?;
        if record.size.is_none() || record.crop_area.is_some() {
            return None;
        }
        record.crop_area = Some(Quad::default_for(canvas.width, canvas.height));
        self.crop_area_changed()
    }

    fn mark_failed(&mut self, reason: &str) -> Vec<Action> {
        let Some(record) = self.store.current_mut() else {
            return Vec::new();
        };
        record.status = ImageStatus::Error;
        let id = record.id;
        warn!(%id, reason, "image unavailable");
        let mut actions = vec![Action::ImageFailed { id, reason: reason.to_owned() }];
        actions.extend(self.request_render());
        actions
    }

    fn commit_corner(&mut self, corner: Corner, p: Point) {
        let Some(quad) = self.store.current_mut().and_then(|r| r.crop_area.as_mut()) else {
            return;
        };
        quad.set_corner(corner, p);
        if let InputState::CornerDragging { moved, .. } = &mut self.input {
            *moved = true;
        }
    }

    fn crop_area_changed(&self) -> Option<Action> {
        let record = self.store.current()?;
        let crop_area = record.crop_area?;
        Some(Action::CropAreaChanged { id: record.id, crop_area })
    }

    fn end_gesture(&mut self) {
        self.input = InputState::Idle;
        self.throttle.reset();
        self.view.set_is_dragging(false);
        self.view.set_selected_corner(None);
    }

    fn reset_session(&mut self) {
        self.end_gesture();
        self.view.reset_view();
        self.pointer = None;
    }

    fn request_render(&mut self) -> Option<Action> {
        self.frames.request().then_some(Action::RenderNeeded)
    }

    fn update_cursor(&mut self) -> Option<Action> {
        let next = if self.view.is_dragging {
            CURSOR_GRABBING
        } else if self.view.selected_corner.is_some() {
            CURSOR_CROSSHAIR
        } else {
            CURSOR_GRAB
        };
        if next == self.cursor {
            return None;
        }
        self.cursor = next;
        Some(Action::SetCursor(next.to_owned()))
    }
}
