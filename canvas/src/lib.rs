//! Geometry and interaction engine for the perspective-crop canvas.
//!
//! The engine owns everything between raw pointer input and a frame of draw
//! commands: the view transform (zoom and pan), the mappings between screen,
//! canvas, and image space, the pan versus corner-drag gesture machine,
//! handle hit-testing, throttled corner updates, coalesced redraws, and the
//! magnifier loupe. It performs no I/O. Hosts feed it events and timestamps,
//! fetch images when asked through [`engine::Action`]s, and paint the
//! [`render::DrawList`]s it returns.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level [`engine::EngineCore`], actions, and frame ticks |
//! | [`doc`] | Image records, the image store, and the load-state cache |
//! | [`geometry`] | Points, sizes, rects, corners, and the crop quad |
//! | [`transform`] | Screen, canvas, and image space conversions |
//! | [`view`] | Zoom, pan, and selection state |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Corner handle hit-testing |
//! | [`schedule`] | Corner update throttle and frame coalescing |
//! | [`render`] | Draw-list rendering of the image and crop overlay |
//! | [`magnifier`] | Loupe projection during corner drags |
//! | [`consts`] | Shared tunables (hit radius, zoom limits, timeouts, etc.) |
//! | `web` | Browser surface replaying draw lists (feature `web`) |

pub mod consts;
pub mod doc;
pub mod engine;
pub mod geometry;
pub mod hit;
pub mod input;
pub mod magnifier;
pub mod render;
pub mod schedule;
pub mod transform;
pub mod view;

#[cfg(feature = "web")]
pub mod web;
