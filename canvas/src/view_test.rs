#![allow(clippy::float_cmp)]

use super::*;

fn busy_view() -> ViewState {
    let mut v = ViewState::default();
    v.set_zoom(3.3);
    v.set_offset(Point::new(-120.0, 44.0));
    v.set_selected_corner(Some(Corner::BottomLeft));
    v.set_is_dragging(true);
    v.set_is_editing(true);
    v
}

// =============================================================
// Defaults
// =============================================================

#[test]
fn default_view_is_identity() {
    let v = ViewState::default();
    assert_eq!(v.zoom(), 1.0);
    assert_eq!(v.offset, Point::new(0.0, 0.0));
    assert!(!v.is_dragging);
    assert!(v.selected_corner.is_none());
    assert!(!v.is_editing);
}

// =============================================================
// set_zoom
// =============================================================

#[test]
fn set_zoom_within_bounds_is_exact() {
    let mut v = ViewState::default();
    v.set_zoom(2.5);
    assert_eq!(v.zoom(), 2.5);
}

#[test]
fn set_zoom_clamps_high_and_low() {
    let mut v = ViewState::default();
    v.set_zoom(50.0);
    assert_eq!(v.zoom(), MAX_ZOOM);
    v.set_zoom(0.0001);
    assert_eq!(v.zoom(), MIN_ZOOM);
    v.set_zoom(-3.0);
    assert_eq!(v.zoom(), MIN_ZOOM);
}

#[test]
fn set_zoom_ignores_non_finite() {
    let mut v = ViewState::default();
    v.set_zoom(2.0);
    v.set_zoom(f64::NAN);
    assert_eq!(v.zoom(), 2.0);
    v.set_zoom(f64::INFINITY);
    assert_eq!(v.zoom(), 2.0);
}

// =============================================================
// reset_view
// =============================================================

#[test]
fn reset_view_restores_defaults_from_any_state() {
    let mut v = busy_view();
    v.reset_view();
    assert_eq!(v, ViewState::default());
}

#[test]
fn reset_view_is_idempotent() {
    let mut v = busy_view();
    v.reset_view();
    v.reset_view();
    assert_eq!(v.zoom(), 1.0);
    assert_eq!(v.offset, Point::default());
    assert!(v.selected_corner.is_none());
    assert!(!v.is_dragging);
}

// =============================================================
// Queries
// =============================================================

#[test]
fn corner_dragging_requires_both_flags() {
    let mut v = ViewState::default();
    assert!(!v.is_corner_dragging());
    v.set_is_dragging(true);
    assert!(!v.is_corner_dragging());
    v.set_selected_corner(Some(Corner::TopLeft));
    assert!(v.is_corner_dragging());
}
