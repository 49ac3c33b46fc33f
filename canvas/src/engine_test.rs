#![allow(clippy::float_cmp)]

use super::*;
use crate::geometry::Corner;
use crate::render::{DrawCommand, ERROR_FILL};

// =============================================================
// Helpers
// =============================================================

const CANVAS: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);
const URL: &str = "img://scan";

/// Core with one loaded image and the initial frame drained.
fn core_with(rect: Rect, image: Size) -> (EngineCore, ImageId) {
    let mut core = EngineCore::new();
    core.set_canvas_rect(rect);
    core.set_viewport(Size::new(1280.0, 800.0));
    let (id, _) = core.add_image("scan.jpg", URL, 0.0);
    core.on_image_loaded(URL, image);
    core.on_frame(0.0);
    (core, id)
}

/// 800×600 image on an 800×600 canvas: scale 1, default quad (60,60)–(740,540).
fn loaded_core() -> (EngineCore, ImageId) {
    core_with(CANVAS, Size::new(800.0, 600.0))
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn has_action<F>(actions: &[Action], pred: F) -> bool
where
    F: Fn(&Action) -> bool,
{
    actions.iter().any(pred)
}

fn has_render_needed(actions: &[Action]) -> bool {
    has_action(actions, |a| matches!(a, Action::RenderNeeded))
}

fn has_crop_changed(actions: &[Action]) -> bool {
    has_action(actions, |a| matches!(a, Action::CropAreaChanged { .. }))
}

fn has_image_failed(actions: &[Action]) -> bool {
    has_action(actions, |a| matches!(a, Action::ImageFailed { .. }))
}

fn corner(core: &EngineCore, c: Corner) -> Point {
    core.crop_area().unwrap().corner(c)
}

fn wheel(dy: f64) -> WheelDelta {
    WheelDelta { dx: 0.0, dy }
}

// =============================================================
// EngineCore: construction and defaults
// =============================================================

#[test]
fn core_new_has_no_image() {
    let core = EngineCore::new();
    assert!(core.current().is_none());
    assert!(core.crop_area().is_none());
    assert_eq!(core.input, InputState::Idle);
    assert_eq!(core.view, ViewState::default());
    assert_eq!(core.cursor(), "grab");
    assert!(!core.has_pending_frame());
}

#[test]
fn core_render_without_surface_is_skipped() {
    let core = EngineCore::new();
    assert!(core.render().is_none());
}

// =============================================================
// Images: loading lifecycle
// =============================================================

#[test]
fn add_image_requests_load_and_frame() {
    let mut core = EngineCore::new();
    core.set_canvas_rect(CANVAS);
    let (id, actions) = core.add_image("scan.jpg", URL, 0.0);

    assert!(has_action(&actions, |a| *a == Action::LoadImage { url: URL.to_owned() }));
    assert!(has_render_needed(&actions));
    assert_eq!(core.current().map(|r| r.id), Some(id));
    assert_eq!(core.current().map(|r| r.status), Some(ImageStatus::Pending));
    assert_eq!(core.load_state(), Some(&LoadState::Loading { started_ms: 0.0 }));
}

#[test]
fn image_loaded_sets_size_status_and_default_quad() {
    let mut core = EngineCore::new();
    core.set_canvas_rect(CANVAS);
    let (id, _) = core.add_image("scan.jpg", URL, 0.0);
    let actions = core.on_image_loaded(URL, Size::new(1600.0, 1200.0));

    let record = core.current().unwrap();
    assert_eq!(record.size, Some(Size::new(1600.0, 1200.0)));
    assert_eq!(record.status, ImageStatus::Completed);
    let quad = record.crop_area.unwrap();
    assert_eq!(quad.top_left, pt(60.0, 60.0));
    assert_eq!(quad.bottom_right, pt(740.0, 540.0));
    assert!(has_action(&actions, |a| matches!(a, Action::CropAreaChanged { id: got, .. } if *got == id)));
}

#[test]
fn default_quad_waits_for_canvas_area() {
    let mut core = EngineCore::new();
    core.add_image("scan.jpg", URL, 0.0);
    core.on_image_loaded(URL, Size::new(800.0, 600.0));
    assert!(core.crop_area().is_none());

    let actions = core.set_canvas_rect(CANVAS);
    assert!(has_crop_changed(&actions));
    assert_eq!(corner(&core, Corner::TopLeft), pt(60.0, 60.0));
}

#[test]
fn existing_quad_is_kept_on_resize() {
    let (mut core, _) = loaded_core();
    let before = core.crop_area();
    let actions = core.set_canvas_rect(Rect::new(0.0, 0.0, 400.0, 300.0));
    assert!(!has_crop_changed(&actions));
    assert_eq!(core.crop_area(), before);
}

#[test]
fn stale_load_completion_is_ignored() {
    let mut core = EngineCore::new();
    core.set_canvas_rect(CANVAS);
    core.add_image("a.jpg", "img://a", 0.0);
    core.add_image("b.jpg", "img://b", 1.0);

    let actions = core.on_image_loaded("img://a", Size::new(10.0, 10.0));
    assert!(actions.is_empty());
    assert!(core.current().unwrap().size.is_none());
    assert_eq!(core.load_state(), Some(&LoadState::Loading { started_ms: 1.0 }));
}

#[test]
fn zero_sized_image_becomes_error() {
    let mut core = EngineCore::new();
    core.set_canvas_rect(CANVAS);
    core.add_image("scan.jpg", URL, 0.0);
    let actions = core.on_image_loaded(URL, Size::new(0.0, 0.0));

    assert!(has_image_failed(&actions));
    assert_eq!(core.current().unwrap().status, ImageStatus::Error);
    assert!(core.crop_area().is_none());
}

#[test]
fn image_failure_renders_placeholder() {
    let mut core = EngineCore::new();
    core.set_canvas_rect(CANVAS);
    core.add_image("scan.jpg", URL, 0.0);
    let actions = core.on_image_failed(URL, "404");
    assert!(has_action(&actions, |a| matches!(a, Action::ImageFailed { reason, .. } if reason == "404")));

    let frame = core.on_frame(16.0).frame.unwrap();
    assert!(frame.main.commands.iter().any(|c| matches!(c, DrawCommand::FillRect { color, .. } if *color == ERROR_FILL)));
}

#[test]
fn load_times_out_after_ten_seconds() {
    let mut core = EngineCore::new();
    core.set_canvas_rect(CANVAS);
    core.add_image("scan.jpg", URL, 0.0);

    assert!(!has_image_failed(&core.on_frame(9_999.0).actions));
    let tick = core.on_frame(10_000.0);
    assert!(has_image_failed(&tick.actions));
    assert_eq!(core.current().unwrap().status, ImageStatus::Error);
    assert!(tick.frame.is_some());

    // A completion after the timeout no longer revives the image.
    assert!(core.on_image_loaded(URL, Size::new(800.0, 600.0)).is_empty());
    assert_eq!(core.current().unwrap().status, ImageStatus::Error);
    assert!(core.crop_area().is_none());
}

#[test]
fn loading_image_keeps_requesting_frames() {
    let mut core = EngineCore::new();
    core.set_canvas_rect(CANVAS);
    core.add_image("scan.jpg", URL, 0.0);

    let tick = core.on_frame(16.0);
    assert!(tick.frame.is_some());
    assert!(has_render_needed(&tick.actions));
    assert!(core.has_pending_frame());
}

#[test]
fn stalled_load_times_out_when_host_ticks_only_on_request() {
    let mut core = EngineCore::new();
    core.set_canvas_rect(CANVAS);
    let (_, mut actions) = core.add_image("scan.jpg", URL, 0.0);

    let mut now = 0.0;
    let mut failed = false;
    while has_render_needed(&actions) && now <= 11_000.0 {
        now += 16.0;
        let tick = core.on_frame(now);
        failed |= has_image_failed(&tick.actions);
        actions = tick.actions;
    }

    assert!(failed);
    assert!(now >= 10_000.0);
    assert_eq!(core.current().unwrap().status, ImageStatus::Error);
    assert!(!core.has_pending_frame());
}

#[test]
fn ready_image_stops_requesting_frames() {
    let (mut core, _) = loaded_core();
    core.zoom_in();
    let tick = core.on_frame(16.0);
    assert!(tick.frame.is_some());
    assert!(!has_render_needed(&tick.actions));
    assert!(!core.has_pending_frame());
}

#[test]
fn select_unknown_image_is_an_error() {
    let (mut core, _) = loaded_core();
    let err = core.select_image(uuid::Uuid::new_v4(), 0.0).unwrap_err();
    assert!(matches!(err, EngineError::UnknownImage(_)));
}

#[test]
fn switching_image_resets_view_and_gesture() {
    let (mut core, first) = loaded_core();
    core.zoom_in();
    core.on_pointer_down(pt(60.0, 60.0), 0.0);
    assert!(core.input.is_active());

    let (_, actions) = core.add_image("other.jpg", "img://other", 5.0);
    assert!(has_action(&actions, |a| matches!(a, Action::LoadImage { url } if url == "img://other")));
    assert_eq!(core.view, ViewState::default());
    assert_eq!(core.input, InputState::Idle);

    core.select_image(first, 6.0).unwrap();
    assert_eq!(core.view.zoom(), 1.0);
}

#[test]
fn same_url_reuses_decoded_image() {
    let (mut core, _) = loaded_core();
    let (_, actions) = core.add_image("copy.jpg", URL, 5.0);
    assert!(!has_action(&actions, |a| matches!(a, Action::LoadImage { .. })));
    assert_eq!(core.current().unwrap().size, Some(Size::new(800.0, 600.0)));
    assert!(core.crop_area().is_some());
}

#[test]
fn removing_current_image_clears_selection() {
    let (mut core, id) = loaded_core();
    core.remove_image(id);
    assert!(core.current().is_none());
    assert!(core.load_state().is_none());

    let frame = core.on_frame(16.0).frame.unwrap();
    assert_eq!(frame.main.len(), 2);
}

#[test]
fn removing_other_image_is_quiet() {
    let (mut core, first) = loaded_core();
    core.add_image("other.jpg", "img://other", 1.0);
    assert!(core.remove_image(first).is_empty());
    assert!(core.current().is_some());
}

// =============================================================
// Pointer: hit-testing and gesture start
// =============================================================

#[test]
fn pointer_down_on_corner_starts_corner_drag() {
    let (mut core, _) = loaded_core();
    let actions = core.on_pointer_down(pt(62.0, 62.0), 0.0);

    assert_eq!(core.input, InputState::CornerDragging { corner: Corner::TopLeft, moved: false });
    assert!(core.view.is_dragging);
    assert_eq!(core.view.selected_corner, Some(Corner::TopLeft));
    assert!(has_action(&actions, |a| *a == Action::SetCursor("grabbing".to_owned())));
}

#[test]
fn pointer_down_off_corner_starts_pan() {
    let (mut core, _) = loaded_core();
    core.on_pointer_down(pt(400.0, 300.0), 0.0);

    assert!(matches!(core.input, InputState::Panning { .. }));
    assert!(core.view.is_dragging);
    assert_eq!(core.view.selected_corner, None);
}

#[test]
fn pointer_down_without_image_is_ignored() {
    let mut core = EngineCore::new();
    core.set_canvas_rect(CANVAS);
    assert!(core.on_pointer_down(pt(60.0, 60.0), 0.0).is_empty());
    assert_eq!(core.input, InputState::Idle);
}

#[test]
fn pointer_down_during_gesture_is_ignored() {
    let (mut core, _) = loaded_core();
    core.on_pointer_down(pt(400.0, 300.0), 0.0);
    let before = core.input;
    assert!(core.on_pointer_down(pt(60.0, 60.0), 1.0).is_empty());
    assert_eq!(core.input, before);
}

#[test]
fn hit_radius_is_fifteen_screen_pixels_at_any_zoom() {
    let (mut core, _) = loaded_core();
    core.view.set_zoom(2.0);
    // Top-left (60, 60) sits at screen (120, 120); 15 px on screen is 7.5 canvas units.
    core.on_pointer_down(pt(134.0, 120.0), 0.0);
    assert_eq!(core.input.dragged_corner(), Some(Corner::TopLeft));
    core.on_pointer_up(pt(134.0, 120.0), 1.0);

    core.on_pointer_down(pt(136.0, 120.0), 2.0);
    assert!(matches!(core.input, InputState::Panning { .. }));
}

#[test]
fn pointer_down_respects_canvas_origin() {
    let (mut core, _) = core_with(Rect::new(100.0, 50.0, 800.0, 600.0), Size::new(800.0, 600.0));
    core.on_pointer_down(pt(160.0, 110.0), 0.0);
    assert_eq!(core.input.dragged_corner(), Some(Corner::TopLeft));
}

// =============================================================
// Pointer: panning
// =============================================================

#[test]
fn pan_offsets_relative_to_gesture_start() {
    let (mut core, _) = loaded_core();
    core.view.set_offset(pt(5.0, 5.0));
    core.on_pointer_down(pt(400.0, 300.0), 0.0);

    core.on_pointer_move(pt(450.0, 320.0), 1.0);
    assert_eq!(core.view.offset, pt(55.0, 25.0));

    // Same timestamp: panning is never throttled.
    core.on_pointer_move(pt(390.0, 300.0), 1.0);
    assert_eq!(core.view.offset, pt(-5.0, 5.0));
}

#[test]
fn pan_does_not_touch_quad() {
    let (mut core, _) = loaded_core();
    let before = core.crop_area();
    core.on_pointer_down(pt(400.0, 300.0), 0.0);
    core.on_pointer_move(pt(500.0, 400.0), 1.0);
    let actions = core.on_pointer_up(pt(500.0, 400.0), 2.0);
    assert_eq!(core.crop_area(), before);
    assert!(!has_crop_changed(&actions));
}

#[test]
fn move_without_gesture_is_ignored() {
    let (mut core, _) = loaded_core();
    assert!(core.on_pointer_move(pt(10.0, 10.0), 0.0).is_empty());
    assert_eq!(core.view.offset, Point::default());
}

// =============================================================
// Pointer: corner dragging and throttling
// =============================================================

#[test]
fn first_corner_update_commits_immediately() {
    let (mut core, _) = loaded_core();
    core.on_pointer_down(pt(60.0, 60.0), 0.0);
    core.on_pointer_move(pt(100.0, 100.0), 0.0);
    assert_eq!(corner(&core, Corner::TopLeft), pt(100.0, 100.0));
    assert_eq!(corner(&core, Corner::TopRight), pt(740.0, 60.0));
}

#[test]
fn fast_updates_are_deferred_to_the_frame_tick() {
    let (mut core, _) = loaded_core();
    core.on_pointer_down(pt(60.0, 60.0), 0.0);
    core.on_pointer_move(pt(100.0, 100.0), 0.0);
    core.on_pointer_move(pt(105.0, 105.0), 8.0);
    core.on_pointer_move(pt(110.0, 110.0), 10.0);
    assert_eq!(corner(&core, Corner::TopLeft), pt(100.0, 100.0));

    let tick = core.on_frame(16.0);
    assert_eq!(corner(&core, Corner::TopLeft), pt(110.0, 110.0));
    assert!(tick.frame.is_some());
}

#[test]
fn updates_after_interval_commit_directly() {
    let (mut core, _) = loaded_core();
    core.on_pointer_down(pt(60.0, 60.0), 0.0);
    core.on_pointer_move(pt(100.0, 100.0), 0.0);
    core.on_pointer_move(pt(150.0, 150.0), 32.0);
    assert_eq!(corner(&core, Corner::TopLeft), pt(150.0, 150.0));
}

#[test]
fn release_flushes_pending_update() {
    let (mut core, id) = loaded_core();
    core.on_pointer_down(pt(60.0, 60.0), 0.0);
    core.on_pointer_move(pt(100.0, 100.0), 0.0);
    core.on_pointer_move(pt(120.0, 130.0), 5.0);
    let actions = core.on_pointer_up(pt(120.0, 130.0), 6.0);

    assert_eq!(corner(&core, Corner::TopLeft), pt(120.0, 130.0));
    let expected = core.crop_area().unwrap();
    assert!(has_action(&actions, |a| *a == Action::CropAreaChanged { id, crop_area: expected }));
    assert_eq!(core.input, InputState::Idle);
    assert!(!core.view.is_dragging);
    assert_eq!(core.view.selected_corner, None);
    assert_eq!(core.cursor(), "grab");
}

#[test]
fn click_on_corner_without_moving_changes_nothing() {
    let (mut core, _) = loaded_core();
    let before = core.crop_area();
    core.on_pointer_down(pt(60.0, 60.0), 0.0);
    let actions = core.on_pointer_up(pt(60.0, 60.0), 50.0);
    assert!(!has_crop_changed(&actions));
    assert_eq!(core.crop_area(), before);
}

#[test]
fn drag_clamps_to_canvas_bounds() {
    let (mut core, _) = loaded_core();
    core.on_pointer_down(pt(740.0, 540.0), 0.0);
    core.on_pointer_move(pt(-50.0, 900.0), 0.0);
    assert_eq!(corner(&core, Corner::BottomRight), pt(0.0, 600.0));
}

#[test]
fn drag_applies_zoom_and_offset() {
    let (mut core, _) = loaded_core();
    core.view.set_zoom(2.0);
    core.view.set_offset(pt(-20.0, -40.0));
    // Top-left (60, 60) on screen: (100, 80).
    core.on_pointer_down(pt(100.0, 80.0), 0.0);
    core.on_pointer_move(pt(180.0, 160.0), 0.0);
    assert_eq!(corner(&core, Corner::TopLeft), pt(100.0, 100.0));
}

#[test]
fn drag_may_produce_degenerate_quad() {
    let (mut core, _) = loaded_core();
    core.on_pointer_down(pt(60.0, 60.0), 0.0);
    core.on_pointer_move(pt(740.0, 540.0), 0.0);
    core.on_pointer_up(pt(740.0, 540.0), 1.0);
    let quad = core.crop_area().unwrap();
    assert!(!quad.is_valid());
    assert!(core.crop_request().is_ok());
}

#[test]
fn overlapping_handles_prefer_lower_index() {
    let (mut core, _) = loaded_core();
    core.on_pointer_down(pt(740.0, 60.0), 0.0);
    core.on_pointer_move(pt(65.0, 60.0), 0.0);
    core.on_pointer_up(pt(65.0, 60.0), 1.0);

    core.on_pointer_down(pt(63.0, 60.0), 2.0);
    assert_eq!(core.input.dragged_corner(), Some(Corner::TopLeft));
}

// =============================================================
// Wheel zoom
// =============================================================

#[test]
fn wheel_down_zooms_out_wheel_up_zooms_in() {
    let (mut core, _) = loaded_core();
    core.on_wheel(pt(0.0, 0.0), wheel(1.0));
    assert!(approx_eq(core.view.zoom(), 0.9));

    let (mut core, _) = loaded_core();
    core.on_wheel(pt(0.0, 0.0), wheel(-1.0));
    assert!(approx_eq(core.view.zoom(), 1.1));
}

#[test]
fn wheel_without_vertical_delta_is_a_no_op() {
    let (mut core, _) = loaded_core();
    let actions = core.on_wheel(pt(100.0, 100.0), WheelDelta { dx: 30.0, dy: 0.0 });
    assert!(actions.is_empty());
    assert_eq!(core.view, ViewState::default());
}

#[test]
fn wheel_zoom_stays_in_bounds() {
    let (mut core, _) = loaded_core();
    for _ in 0..100 {
        core.on_wheel(pt(300.0, 200.0), wheel(-1.0));
    }
    assert_eq!(core.view.zoom(), 5.0);
    for _ in 0..200 {
        core.on_wheel(pt(300.0, 200.0), wheel(1.0));
    }
    assert_eq!(core.view.zoom(), 0.1);
}

#[test]
fn wheel_zoom_keeps_point_under_cursor_fixed() {
    let rect = Rect::new(20.0, 10.0, 800.0, 600.0);
    let (mut core, _) = core_with(rect, Size::new(800.0, 600.0));
    core.view.set_offset(pt(-35.0, 12.5));

    for (cursor, dy) in [(pt(120.0, 80.0), -1.0), (pt(700.0, 500.0), 1.0), (pt(20.0, 10.0), -3.0), (pt(333.0, 444.0), 2.0)]
    {
        let before = screen_to_canvas(cursor, rect, core.view.zoom(), core.view.offset);
        core.on_wheel(cursor, wheel(dy));
        let after = screen_to_canvas(cursor, rect, core.view.zoom(), core.view.offset);
        assert!(approx_eq(before.x, after.x) && approx_eq(before.y, after.y), "{before:?} vs {after:?}");
    }
}

#[test]
fn wheel_at_zoom_limit_leaves_offset_alone() {
    let (mut core, _) = loaded_core();
    core.view.set_zoom(5.0);
    core.view.set_offset(pt(7.0, 9.0));
    core.on_wheel(pt(300.0, 300.0), wheel(-1.0));
    assert_eq!(core.view.offset, pt(7.0, 9.0));
}

// =============================================================
// View controls
// =============================================================

#[test]
fn zoom_buttons_step_by_a_quarter() {
    let (mut core, _) = loaded_core();
    core.view.set_offset(pt(3.0, 4.0));
    core.zoom_in();
    assert_eq!(core.view.zoom(), 1.25);
    core.zoom_out();
    core.zoom_out();
    assert_eq!(core.view.zoom(), 0.75);
    assert_eq!(core.view.offset, pt(3.0, 4.0));
}

#[test]
fn zoom_buttons_clamp() {
    let (mut core, _) = loaded_core();
    for _ in 0..40 {
        core.zoom_in();
    }
    assert_eq!(core.view.zoom(), 5.0);
    for _ in 0..40 {
        core.zoom_out();
    }
    assert_eq!(core.view.zoom(), 0.1);
}

#[test]
fn reset_view_is_idempotent() {
    let (mut core, _) = loaded_core();
    core.zoom_in();
    core.view.set_offset(pt(30.0, 40.0));
    core.reset_view();
    let once = core.view;
    core.reset_view();
    assert_eq!(core.view, once);
    assert_eq!(once, ViewState::default());
}

#[test]
fn reset_view_keeps_quad() {
    let (mut core, _) = loaded_core();
    let before = core.crop_area();
    core.reset_view();
    assert_eq!(core.crop_area(), before);
}

// =============================================================
// Frames and rendering
// =============================================================

#[test]
fn frame_renders_once_per_request() {
    let (mut core, _) = loaded_core();
    core.zoom_in();
    let frame = core.on_frame(16.0).frame.unwrap();
    assert!(frame.main.commands.iter().any(|c| matches!(c, DrawCommand::DrawImage { url, .. } if url == URL)));
    assert!(core.on_frame(32.0).frame.is_none());
}

#[test]
fn many_events_in_one_tick_request_one_frame() {
    let (mut core, _) = loaded_core();
    let mut actions = core.on_pointer_down(pt(400.0, 300.0), 0.0);
    for i in 1..20 {
        actions.extend(core.on_pointer_move(pt(400.0 + f64::from(i), 300.0), f64::from(i)));
    }
    let renders = actions.iter().filter(|a| matches!(a, Action::RenderNeeded)).count();
    assert_eq!(renders, 1);
    assert!(core.on_frame(20.0).frame.is_some());
    assert!(core.on_frame(21.0).frame.is_none());
}

#[test]
fn magnifier_shown_only_while_dragging_a_corner() {
    let (mut core, _) = loaded_core();
    core.on_pointer_down(pt(60.0, 60.0), 0.0);
    core.on_pointer_move(pt(80.0, 80.0), 0.0);
    let frame = core.on_frame(16.0).frame.unwrap();
    let loupe = frame.magnifier.unwrap();
    assert_eq!(loupe.cursor_image, pt(80.0, 80.0));
    assert_eq!(loupe.marker.map(|m| m.label), Some(1));

    core.on_pointer_up(pt(80.0, 80.0), 20.0);
    assert!(core.on_frame(32.0).frame.unwrap().magnifier.is_none());

    core.on_pointer_down(pt(400.0, 300.0), 40.0);
    core.on_pointer_move(pt(420.0, 300.0), 41.0);
    assert!(core.on_frame(48.0).frame.unwrap().magnifier.is_none());
}

#[test]
fn unmount_cancels_pending_frame() {
    let (mut core, _) = loaded_core();
    core.on_pointer_down(pt(60.0, 60.0), 0.0);
    assert!(core.has_pending_frame());
    core.unmount();
    assert!(!core.has_pending_frame());
    assert_eq!(core.input, InputState::Idle);
    assert!(core.on_frame(16.0).frame.is_none());
}

// =============================================================
// Backend boundary
// =============================================================

#[test]
fn crop_request_identity_scale() {
    let (core, _) = loaded_core();
    let req = core.crop_request().unwrap();
    assert_eq!(req.points, vec![[60, 60], [740, 60], [740, 540], [60, 540]]);
}

#[test]
fn crop_request_scales_to_native_pixels() {
    let (core, _) = core_with(CANVAS, Size::new(1600.0, 1200.0));
    let req = core.crop_request().unwrap();
    assert_eq!(req.points, vec![[120, 120], [1480, 120], [1480, 1080], [120, 1080]]);
}

#[test]
fn crop_request_ignores_zoom_and_pan() {
    let (mut core, _) = loaded_core();
    let before = core.crop_request().unwrap();
    core.zoom_in();
    core.on_pointer_down(pt(400.0, 300.0), 0.0);
    core.on_pointer_move(pt(200.0, 100.0), 1.0);
    core.on_pointer_up(pt(200.0, 100.0), 2.0);
    assert_eq!(core.crop_request().unwrap(), before);
}

#[test]
fn crop_request_errors_before_image_is_ready() {
    let core = EngineCore::new();
    assert!(matches!(core.crop_request(), Err(EngineError::NoImage)));

    let mut core = EngineCore::new();
    core.set_canvas_rect(CANVAS);
    core.add_image("scan.jpg", URL, 0.0);
    assert!(matches!(core.crop_request(), Err(EngineError::ImageNotReady)));

    let mut core = EngineCore::new();
    core.add_image("scan.jpg", URL, 0.0);
    core.on_image_loaded(URL, Size::new(800.0, 600.0));
    assert!(matches!(core.crop_request(), Err(EngineError::NoCropArea)));
}

fn detection(corners: Vec<[f64; 2]>, confidence: f64) -> AutoDetectResponse {
    AutoDetectResponse { success: true, corners: Some(corners), confidence, message: "ok".to_owned(), error: None }
}

#[test]
fn auto_detect_maps_image_corners_to_canvas() {
    let (mut core, id) = core_with(CANVAS, Size::new(1600.0, 1200.0));
    let resp = detection(vec![[100.0, 100.0], [1500.0, 100.0], [1500.0, 1100.0], [100.0, 1100.0]], 0.9);
    let actions = core.apply_auto_detect(&resp).unwrap();

    let quad = core.crop_area().unwrap();
    assert_eq!(quad.top_left, pt(50.0, 50.0));
    assert_eq!(quad.top_right, pt(750.0, 50.0));
    assert_eq!(quad.bottom_right, pt(750.0, 550.0));
    assert_eq!(quad.bottom_left, pt(50.0, 550.0));
    assert!(has_action(&actions, |a| *a == Action::CropAreaChanged { id, crop_area: quad }));

    let req = core.crop_request().unwrap();
    assert_eq!(req.points, vec![[100, 100], [1500, 100], [1500, 1100], [100, 1100]]);
}

#[test]
fn auto_detect_low_confidence_still_applies() {
    let (mut core, _) = loaded_core();
    let resp = detection(vec![[10.0, 10.0], [20.0, 10.0], [20.0, 20.0], [10.0, 20.0]], 0.1);
    core.apply_auto_detect(&resp).unwrap();
    assert_eq!(corner(&core, Corner::TopLeft), pt(10.0, 10.0));
}

#[test]
fn auto_detect_failure_leaves_quad_alone() {
    let (mut core, _) = loaded_core();
    let before = core.crop_area();
    let resp = AutoDetectResponse {
        success: false,
        corners: None,
        confidence: 0.0,
        message: "failed".to_owned(),
        error: Some("no contour".to_owned()),
    };
    assert!(matches!(core.apply_auto_detect(&resp), Err(EngineError::Wire(_))));
    assert_eq!(core.crop_area(), before);
}

#[test]
fn set_status_records_processed_name() {
    let (mut core, _) = loaded_core();
    core.set_status(ImageStatus::Completed, Some("scan_cropped.jpg".to_owned())).unwrap();
    assert_eq!(core.current().unwrap().processed_name.as_deref(), Some("scan_cropped.jpg"));
    assert!(matches!(EngineCore::new().set_status(ImageStatus::Error, None), Err(EngineError::NoImage)));
}

// =============================================================
// Dispatch
// =============================================================

#[test]
fn dispatch_replays_a_recorded_drag() {
    let (mut core, _) = loaded_core();
    let script = r#"[
        {"type": "pointer_down", "x": 60, "y": 60, "t": 100},
        {"type": "pointer_move", "x": 200, "y": 150, "t": 140},
        {"type": "pointer_up", "x": 200, "y": 150, "t": 150},
        {"type": "frame", "t": 160}
    ]"#;
    let events: Vec<InputEvent> = serde_json::from_str(script).unwrap();
    let ticks: Vec<Tick> = events.iter().map(|e| core.dispatch(e)).collect();

    assert!(has_crop_changed(&ticks[2].actions));
    assert!(ticks[3].frame.is_some());
    assert_eq!(corner(&core, Corner::TopLeft), pt(200.0, 150.0));
}

#[test]
fn dispatch_routes_view_controls() {
    let (mut core, _) = loaded_core();
    core.dispatch(&InputEvent::ZoomIn { t: 0.0 });
    assert_eq!(core.view.zoom(), 1.25);
    core.dispatch(&InputEvent::Wheel { x: 0.0, y: 0.0, dy: 1.0, t: 1.0 });
    assert!(approx_eq(core.view.zoom(), 1.125));
    core.dispatch(&InputEvent::ResetView { t: 2.0 });
    assert_eq!(core.view.zoom(), 1.0);
    core.dispatch(&InputEvent::ZoomOut { t: 3.0 });
    assert_eq!(core.view.zoom(), 0.75);
}
