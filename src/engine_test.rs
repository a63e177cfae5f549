use super::*;

// --- Helpers ---

/// Engine with an 800x600 CSS container at dpr 1 and a 400x300 image
/// loaded: the image fills the container at scale 2, origin (0, 0).
fn engine() -> EngineCore {
    let mut e = EngineCore::new();
    e.on_resize(800.0, 600.0, 1.0);
    e.load_image((400, 300), MarkList::new());
    e
}

fn down(e: &mut EngineCore, x: f64, y: f64, button: Button) -> Vec<Action> {
    e.handle(InputEvent::PointerDown { at: Point::new(x, y), button })
}

fn mv(e: &mut EngineCore, x: f64, y: f64) -> Vec<Action> {
    e.handle(InputEvent::PointerMove { at: Point::new(x, y) })
}

fn up(e: &mut EngineCore, x: f64, y: f64, button: Button) -> Vec<Action> {
    e.handle(InputEvent::PointerUp { at: Point::new(x, y), button })
}

fn wheel(e: &mut EngineCore, x: f64, y: f64, dy: f64) -> Vec<Action> {
    e.handle(InputEvent::Wheel { at: Point::new(x, y), delta: WheelDelta { dx: 0.0, dy } })
}

fn key(e: &mut EngineCore, name: &str) -> Vec<Action> {
    e.handle(InputEvent::KeyDown(Key(name.to_owned())))
}

fn has_notice(actions: &[Action], level: NoticeLevel) -> bool {
    actions
        .iter()
        .any(|a| matches!(a, Action::Notice { level: l, .. } if *l == level))
}

// --- Construction and data inputs ---

#[test]
fn new_engine_has_no_image() {
    let e = EngineCore::new();
    assert_eq!(e.image_dims(), None);
    assert!(e.transform().is_degenerate());
    assert!(!e.rect_mode());
    assert!(!e.awaiting_label());
    assert_eq!(e.input_state(), InputState::Idle);
}

#[test]
fn resize_requests_render() {
    let mut e = EngineCore::new();
    let actions = e.handle(InputEvent::Resize { width: 800.0, height: 600.0, dpr: 2.0 });
    assert_eq!(actions, vec![Action::RenderNeeded]);
}

#[test]
fn load_image_resets_viewport_and_gesture() {
    let mut e = engine();
    wheel(&mut e, 100.0, 100.0, -1.0);
    down(&mut e, 100.0, 100.0, Button::Middle);
    e.load_image((200, 200), MarkList::new());
    assert_eq!(e.viewport, Viewport::default());
    assert_eq!(e.input_state(), InputState::Idle);
    assert_eq!(e.image_dims(), Some((200, 200)));
}

#[test]
fn load_image_adopts_marks() {
    let mut e = engine();
    let marks = MarkList::from_persisted(vec![Some(Mark::new(1, 2, 3))]);
    e.load_image((400, 300), marks);
    assert_eq!(e.marks.marks(), &[Mark::new(1, 2, 3)]);
}

#[test]
fn show_placeholder_drops_image_and_marks() {
    let mut e = engine();
    e.marks.add(Mark::new(1, 1, 1));
    e.show_placeholder();
    assert_eq!(e.image_dims(), None);
    assert!(e.marks.is_empty());
    assert!(e.transform().is_degenerate());
}

// --- Point placement ---

#[test]
fn click_in_bounds_prompts_for_label() {
    let mut e = engine();
    let actions = down(&mut e, 100.0, 75.0, Button::Primary);
    assert_eq!(actions, vec![Action::LabelPrompt]);
    assert!(e.awaiting_label());
}

#[test]
fn click_outside_image_notices_without_prompt() {
    // 100x100 image letterboxed in 800x600: canvas x < 100 is gutter.
    let mut e = EngineCore::new();
    e.on_resize(800.0, 600.0, 1.0);
    e.load_image((100, 100), MarkList::new());
    let actions = down(&mut e, 10.0, 10.0, Button::Primary);
    assert!(has_notice(&actions, NoticeLevel::Info));
    assert!(!actions.contains(&Action::LabelPrompt));
    assert!(!e.awaiting_label());
}

#[test]
fn click_without_image_notices() {
    let mut e = EngineCore::new();
    e.on_resize(800.0, 600.0, 1.0);
    let actions = down(&mut e, 100.0, 75.0, Button::Primary);
    assert!(has_notice(&actions, NoticeLevel::Info));
    assert!(!e.awaiting_label());
}

#[test]
fn submit_valid_label_adds_mark_and_persists() {
    let mut e = engine();
    // CSS (100, 75) at scale 2 maps to image (50, 37.5), rounded to (50, 38).
    down(&mut e, 100.0, 75.0, Button::Primary);
    let actions = e.submit_label("3");
    assert_eq!(actions, vec![Action::RenderNeeded, Action::PersistNeeded]);
    assert_eq!(e.marks.marks(), &[Mark::new(50, 38, 3)]);
    assert!(!e.awaiting_label());
}

#[test]
fn submit_accepts_label_range_bounds() {
    for label in ["1", "9"] {
        let mut e = engine();
        down(&mut e, 100.0, 75.0, Button::Primary);
        e.submit_label(label);
        assert_eq!(e.marks.len(), 1, "label {label} should be accepted");
    }
}

#[test]
fn submit_rejects_out_of_range_and_garbage() {
    for bad in ["0", "10", "abc", "", "3.5", "-1"] {
        let mut e = engine();
        down(&mut e, 100.0, 75.0, Button::Primary);
        let actions = e.submit_label(bad);
        assert!(has_notice(&actions, NoticeLevel::Error), "{bad:?} should be rejected");
        assert!(e.marks.is_empty(), "{bad:?} must not add a mark");
        assert!(!e.awaiting_label(), "{bad:?} must abandon the pending point");
    }
}

#[test]
fn submit_trims_surrounding_whitespace() {
    let mut e = engine();
    down(&mut e, 100.0, 75.0, Button::Primary);
    e.submit_label("  7 ");
    assert_eq!(e.marks.marks(), &[Mark::new(50, 38, 7)]);
}

#[test]
fn submit_without_pending_is_a_no_op() {
    let mut e = engine();
    assert!(e.submit_label("3").is_empty());
    assert!(e.marks.is_empty());
}

#[test]
fn cancel_label_abandons_pending_without_mutation() {
    let mut e = engine();
    down(&mut e, 100.0, 75.0, Button::Primary);
    let actions = e.cancel_label();
    assert_eq!(actions, vec![Action::RenderNeeded]);
    assert!(!e.awaiting_label());
    assert!(e.marks.is_empty());
}

#[test]
fn click_at_far_edge_clamps_into_bounds() {
    // CSS (799.5, 599.5) maps to image (399.75, 299.75): inside the image,
    // but rounding alone would bump it to the width and height themselves.
    let mut e = engine();
    down(&mut e, 799.5, 599.5, Button::Primary);
    e.submit_label("1");
    assert_eq!(e.marks.marks(), &[Mark::new(399, 299, 1)]);
}

// --- Modal label prompt ---

#[test]
fn input_is_ignored_while_label_pending() {
    let mut e = engine();
    down(&mut e, 100.0, 75.0, Button::Primary);
    assert!(down(&mut e, 10.0, 10.0, Button::Middle).is_empty());
    assert!(mv(&mut e, 20.0, 20.0).is_empty());
    assert!(wheel(&mut e, 100.0, 100.0, -1.0).is_empty());
    assert!(key(&mut e, "z").is_empty());
    assert!(e.awaiting_label());
}

#[test]
fn secondary_press_suppresses_menu_while_label_pending() {
    let mut e = engine();
    down(&mut e, 100.0, 75.0, Button::Primary);
    let actions = down(&mut e, 100.0, 75.0, Button::Secondary);
    assert_eq!(actions, vec![Action::SuppressDefault]);
    assert!(e.awaiting_label());
    assert!(e.marks.is_empty());
}

// --- Mark removal ---

#[test]
fn secondary_click_removes_nearest_mark() {
    let mut e = engine();
    e.marks.add(Mark::new(50, 50, 1));
    e.marks.add(Mark::new(200, 200, 2));
    // Image (50, 50) draws at canvas (100, 100); click CSS (101, 99).
    let actions = down(&mut e, 101.0, 99.0, Button::Secondary);
    assert!(actions.contains(&Action::RenderNeeded));
    assert!(actions.contains(&Action::PersistNeeded));
    assert!(actions.contains(&Action::SuppressDefault));
    assert_eq!(e.marks.marks(), &[Mark::new(200, 200, 2)]);
}

#[test]
fn secondary_click_on_empty_list_notices() {
    let mut e = engine();
    let actions = down(&mut e, 100.0, 100.0, Button::Secondary);
    assert!(has_notice(&actions, NoticeLevel::Info));
    assert!(!actions.contains(&Action::PersistNeeded));
    assert!(actions.contains(&Action::SuppressDefault));
}

// --- Panning ---

#[test]
fn middle_down_starts_pan_and_switches_cursor() {
    let mut e = engine();
    let actions = down(&mut e, 100.0, 100.0, Button::Middle);
    assert!(actions.contains(&Action::SetCursor("move")));
    assert!(actions.contains(&Action::SuppressDefault));
    assert!(matches!(e.input_state(), InputState::Panning { .. }));
}

#[test]
fn pan_moves_viewport_by_css_delta() {
    let mut e = engine();
    down(&mut e, 100.0, 100.0, Button::Middle);
    let actions = mv(&mut e, 110.0, 105.0);
    assert!(actions.contains(&Action::RenderNeeded));
    assert_eq!(e.viewport.pan_x, 10.0);
    assert_eq!(e.viewport.pan_y, 5.0);
}

#[test]
fn pan_accumulates_across_moves() {
    let mut e = engine();
    down(&mut e, 100.0, 100.0, Button::Middle);
    mv(&mut e, 110.0, 100.0);
    mv(&mut e, 130.0, 90.0);
    assert_eq!(e.viewport.pan_x, 30.0);
    assert_eq!(e.viewport.pan_y, -10.0);
}

#[test]
fn pan_shifts_draw_origin() {
    let mut e = engine();
    down(&mut e, 100.0, 100.0, Button::Middle);
    mv(&mut e, 110.0, 105.0);
    let t = e.transform();
    assert!((t.origin_x - 10.0).abs() < 1e-9);
    assert!((t.origin_y - 5.0).abs() < 1e-9);
}

#[test]
fn middle_up_ends_pan_and_restores_cursor() {
    let mut e = engine();
    down(&mut e, 100.0, 100.0, Button::Middle);
    let actions = up(&mut e, 120.0, 100.0, Button::Middle);
    assert!(actions.contains(&Action::SetCursor("crosshair")));
    assert_eq!(e.input_state(), InputState::Idle);
}

#[test]
fn move_while_idle_does_nothing() {
    let mut e = engine();
    assert!(mv(&mut e, 50.0, 50.0).is_empty());
    assert_eq!(e.viewport, Viewport::default());
}

// --- Wheel zoom ---

#[test]
fn wheel_up_zooms_in() {
    let mut e = engine();
    let actions = wheel(&mut e, 400.0, 300.0, -1.0);
    assert!(actions.contains(&Action::RenderNeeded));
    assert!(actions.contains(&Action::SuppressDefault));
    assert!((e.viewport.zoom - 1.1).abs() < 1e-9);
}

#[test]
fn wheel_down_at_min_zoom_only_suppresses() {
    let mut e = engine();
    let actions = wheel(&mut e, 400.0, 300.0, 1.0);
    assert_eq!(actions, vec![Action::SuppressDefault]);
    assert_eq!(e.viewport.zoom, 1.0);
}

#[test]
fn wheel_up_at_max_zoom_only_suppresses() {
    let mut e = engine();
    e.viewport.set_zoom(10.0);
    let actions = wheel(&mut e, 400.0, 300.0, -1.0);
    assert_eq!(actions, vec![Action::SuppressDefault]);
    assert_eq!(e.viewport.zoom, 10.0);
}

#[test]
fn wheel_zoom_keeps_cursor_point_fixed() {
    let mut e = engine();
    let cursor = Point::new(250.0, 200.0);
    let anchor = e.transform().canvas_to_image(cursor);
    wheel(&mut e, cursor.x, cursor.y, -1.0);
    let after = e.transform().canvas_to_image(cursor);
    assert!((anchor.x - after.x).abs() < 1e-9);
    assert!((anchor.y - after.y).abs() < 1e-9);
}

#[test]
fn wheel_without_image_only_suppresses() {
    let mut e = EngineCore::new();
    e.on_resize(800.0, 600.0, 1.0);
    let actions = wheel(&mut e, 100.0, 100.0, -1.0);
    assert_eq!(actions, vec![Action::SuppressDefault]);
}

// --- Keyboard ---

#[test]
fn key_z_undoes_last_mark() {
    let mut e = engine();
    e.marks.add(Mark::new(1, 1, 1));
    e.marks.add(Mark::new(2, 2, 2));
    let actions = key(&mut e, "z");
    assert!(actions.contains(&Action::RenderNeeded));
    assert!(actions.contains(&Action::PersistNeeded));
    assert_eq!(e.marks.marks(), &[Mark::new(1, 1, 1)]);
}

#[test]
fn key_z_is_case_insensitive() {
    let mut e = engine();
    e.marks.add(Mark::new(1, 1, 1));
    key(&mut e, "Z");
    assert!(e.marks.is_empty());
}

#[test]
fn key_z_with_nothing_to_undo_notices_without_persist() {
    let mut e = engine();
    let actions = key(&mut e, "z");
    assert!(has_notice(&actions, NoticeLevel::Info));
    assert!(!actions.contains(&Action::PersistNeeded));
}

#[test]
fn arrow_keys_request_navigation_and_suppress_scroll() {
    let mut e = engine();
    assert_eq!(
        key(&mut e, "ArrowLeft"),
        vec![Action::SuppressDefault, Action::NavigatePrev]
    );
    assert_eq!(
        key(&mut e, "ArrowRight"),
        vec![Action::SuppressDefault, Action::NavigateNext]
    );
}

#[test]
fn key_r_resets_the_viewport() {
    let mut e = engine();
    wheel(&mut e, 100.0, 100.0, -1.0);
    down(&mut e, 100.0, 100.0, Button::Middle);
    mv(&mut e, 150.0, 120.0);
    up(&mut e, 150.0, 120.0, Button::Middle);
    let actions = key(&mut e, "r");
    assert!(actions.contains(&Action::RenderNeeded));
    assert_eq!(e.viewport, Viewport::default());
}

#[test]
fn key_q_requests_quit() {
    let mut e = engine();
    assert_eq!(key(&mut e, "q"), vec![Action::QuitRequested]);
}

#[test]
fn unbound_key_does_nothing() {
    let mut e = engine();
    assert!(key(&mut e, "x").is_empty());
}

// --- Rectangle mode ---

#[test]
fn key_m_toggles_rect_mode() {
    let mut e = engine();
    let on = key(&mut e, "m");
    assert!(e.rect_mode());
    assert!(has_notice(&on, NoticeLevel::Info));
    let off = key(&mut e, "m");
    assert!(!e.rect_mode());
    assert!(has_notice(&off, NoticeLevel::Info));
}

#[test]
fn leaving_rect_mode_abandons_half_drawn_rectangle() {
    let mut e = engine();
    key(&mut e, "m");
    down(&mut e, 100.0, 100.0, Button::Primary);
    mv(&mut e, 150.0, 150.0);
    key(&mut e, "m");
    assert_eq!(e.input_state(), InputState::Idle);
    assert_eq!(e.rect_in_progress(), None);
}

#[test]
fn rect_drag_tracks_overlay_in_canvas_space() {
    let mut e = engine();
    key(&mut e, "m");
    let start_actions = down(&mut e, 100.0, 100.0, Button::Primary);
    assert!(start_actions.contains(&Action::SuppressDefault));
    assert_eq!(e.rect_in_progress(), None);

    let move_actions = mv(&mut e, 200.0, 150.0);
    assert!(move_actions.contains(&Action::RenderNeeded));
    assert_eq!(
        e.rect_in_progress(),
        Some((Point::new(100.0, 100.0), Point::new(200.0, 150.0)))
    );
}

#[test]
fn rect_release_prompts_for_label() {
    let mut e = engine();
    key(&mut e, "m");
    down(&mut e, 100.0, 100.0, Button::Primary);
    mv(&mut e, 200.0, 150.0);
    let actions = up(&mut e, 200.0, 150.0, Button::Primary);
    assert_eq!(actions, vec![Action::LabelPrompt]);
    assert!(e.awaiting_label());
    assert_eq!(e.input_state(), InputState::Idle);
}

#[test]
fn rect_submit_maps_corners_to_image_space() {
    let mut e = engine();
    key(&mut e, "m");
    down(&mut e, 100.0, 100.0, Button::Primary);
    mv(&mut e, 200.0, 150.0);
    up(&mut e, 200.0, 150.0, Button::Primary);
    // Canvas (100, 100) and (200, 150) at scale 2 are image (50, 50) and
    // (100, 75).
    let actions = e.submit_label("2");
    assert_eq!(
        actions,
        vec![Action::ProcessRectangle { corners: [[50, 50], [100, 75]], label: 2 }]
    );
    assert!(e.marks.is_empty());
}

#[test]
fn rect_click_without_drag_is_abandoned() {
    let mut e = engine();
    key(&mut e, "m");
    down(&mut e, 100.0, 100.0, Button::Primary);
    let actions = up(&mut e, 100.0, 100.0, Button::Primary);
    assert!(actions.is_empty());
    assert!(!e.awaiting_label());
    assert_eq!(e.input_state(), InputState::Idle);
}

#[test]
fn rect_drag_without_image_notices() {
    // Nothing loaded: the transform is degenerate, so no rectangle may
    // start, let alone reach the backend with nonsense corners.
    let mut e = EngineCore::new();
    e.on_resize(800.0, 600.0, 1.0);
    key(&mut e, "m");

    let actions = down(&mut e, 100.0, 100.0, Button::Primary);
    assert!(has_notice(&actions, NoticeLevel::Info));
    assert_eq!(e.input_state(), InputState::Idle);

    mv(&mut e, 200.0, 150.0);
    let actions = up(&mut e, 200.0, 150.0, Button::Primary);
    assert!(actions.is_empty());
    assert!(!e.awaiting_label());
    assert!(e.submit_label("2").is_empty());
}

#[test]
fn middle_pan_still_works_in_rect_mode() {
    let mut e = engine();
    key(&mut e, "m");
    down(&mut e, 100.0, 100.0, Button::Middle);
    assert!(matches!(e.input_state(), InputState::Panning { .. }));
}

#[test]
fn apply_rectangle_points_appends_in_reply_order() {
    let mut e = engine();
    let actions = e.apply_rectangle_points(&[[10, 10], [20, 20]], 2);
    assert!(actions.contains(&Action::RenderNeeded));
    assert!(actions.contains(&Action::PersistNeeded));
    assert!(has_notice(&actions, NoticeLevel::Success));
    assert_eq!(e.marks.marks(), &[Mark::new(10, 10, 2), Mark::new(20, 20, 2)]);
}

// --- Bulk operations ---

#[test]
fn clear_all_empties_marks_and_persists() {
    let mut e = engine();
    e.marks.add(Mark::new(1, 1, 1));
    e.marks.add(Mark::new(2, 2, 2));
    let actions = e.clear_all();
    assert!(e.marks.is_empty());
    assert!(actions.contains(&Action::RenderNeeded));
    assert!(actions.contains(&Action::PersistNeeded));
    assert!(has_notice(&actions, NoticeLevel::Success));
}

// --- Device pixel ratio ---

#[test]
fn click_mapping_honors_dpr() {
    let mut e = EngineCore::new();
    e.on_resize(800.0, 600.0, 2.0);
    e.load_image((400, 300), MarkList::new());
    // Physical scale is 4; CSS (100, 75) is canvas (200, 150) -> image (50, 37.5).
    down(&mut e, 100.0, 75.0, Button::Primary);
    e.submit_label("5");
    assert_eq!(e.marks.marks(), &[Mark::new(50, 38, 5)]);
}
