//! Shared numeric constants for the canvas crate.

// ── View ────────────────────────────────────────────────────────

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f64 = 0.1;

/// Largest allowed zoom factor.
pub const MAX_ZOOM: f64 = 5.0;

/// Multiplier applied per wheel tick scrolling down (zoom out).
pub const WHEEL_ZOOM_OUT: f64 = 0.9;

/// Multiplier applied per wheel tick scrolling up (zoom in).
pub const WHEEL_ZOOM_IN: f64 = 1.1;

/// Additive zoom step for the zoom-in / zoom-out buttons.
pub const ZOOM_BUTTON_STEP: f64 = 0.25;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space hit radius in pixels for corner handles.
pub const HANDLE_HIT_RADIUS_PX: f64 = 15.0;

// ── Scheduling ──────────────────────────────────────────────────

/// Minimum spacing between committed corner updates (~30 Hz).
pub const CORNER_UPDATE_INTERVAL_MS: f64 = 32.0;

/// Image loads that take longer than this resolve to the error placeholder.
pub const IMAGE_LOAD_TIMEOUT_MS: f64 = 10_000.0;

// ── Rendering ───────────────────────────────────────────────────

/// Drawn radius of a corner handle, in screen pixels.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

/// Width of the crop outline, in screen pixels.
pub const OUTLINE_WIDTH_PX: f64 = 3.0;

// ── Magnifier ───────────────────────────────────────────────────

/// Side length of the square magnifier surface, in screen pixels.
pub const MAGNIFIER_SIZE_PX: f64 = 200.0;

/// Magnification relative to the base aspect-fit scale.
pub const MAGNIFIER_ZOOM: f64 = 4.0;

/// Gap between the pointer and the magnifier's nearest edge.
pub const MAGNIFIER_POINTER_GAP_PX: f64 = 30.0;

/// Radius of the dragged-corner marker inside the magnifier.
pub const MAGNIFIER_MARKER_RADIUS_PX: f64 = 6.0;

/// Radius of the crosshair ring at the magnifier center.
pub const MAGNIFIER_CROSSHAIR_RADIUS_PX: f64 = 10.0;
