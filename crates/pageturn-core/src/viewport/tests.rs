use super::*;
use crate::input::Key;

fn controller(direction: ReadingDirection) -> ViewportController {
    let mut viewport = ViewportController::new(ViewportConfig::default());
    viewport.set_layout(ViewportSize::new(1000, 800), direction);
    viewport
}

fn arm_next_crossing(viewport: &mut ViewportController, now_ms: u64) -> DragUpdate {
    viewport.drag_begin(now_ms);
    let first = viewport.drag_move(30.0, Edge::End, now_ms);
    assert_eq!(first, DragUpdate::default());
    viewport.drag_move(30.0, Edge::End, now_ms)
}

#[test]
fn horizontal_tap_zones_follow_reading_direction() {
    let ltr = controller(ReadingDirection::LeftToRight);
    assert_eq!(ltr.tap(0.1, 0.5), Some(ViewportIntent::Previous));
    assert_eq!(ltr.tap(0.9, 0.5), Some(ViewportIntent::Next));
    assert_eq!(ltr.tap(0.5, 0.1), Some(ViewportIntent::Previous));
    assert_eq!(ltr.tap(0.5, 0.9), Some(ViewportIntent::Next));
    assert_eq!(ltr.tap(0.5, 0.5), Some(ViewportIntent::ToggleControls));

    let rtl = controller(ReadingDirection::RightToLeft);
    assert_eq!(rtl.tap(0.1, 0.5), Some(ViewportIntent::Next));
    assert_eq!(rtl.tap(0.9, 0.5), Some(ViewportIntent::Previous));
    assert_eq!(rtl.tap(0.5, 0.5), Some(ViewportIntent::ToggleControls));
}

#[test]
fn vertical_tap_zones_use_top_and_middle_left_for_previous() {
    let vertical = controller(ReadingDirection::Webtoon);
    assert_eq!(vertical.tap(0.5, 0.1), Some(ViewportIntent::Previous));
    assert_eq!(vertical.tap(0.1, 0.5), Some(ViewportIntent::Previous));
    assert_eq!(vertical.tap(0.9, 0.5), Some(ViewportIntent::Next));
    assert_eq!(vertical.tap(0.1, 0.9), Some(ViewportIntent::Next));
    assert_eq!(vertical.tap(0.5, 0.5), Some(ViewportIntent::ToggleControls));
}

#[test]
fn out_of_range_taps_are_clamped() {
    let ltr = controller(ReadingDirection::LeftToRight);
    assert_eq!(ltr.tap(-3.0, 0.5), Some(ViewportIntent::Previous));
    assert_eq!(ltr.tap(7.0, 0.5), Some(ViewportIntent::Next));
}

#[test]
fn disabled_tap_to_turn_only_toggles_controls() {
    let mut viewport = ViewportController::new(ViewportConfig {
        tap_to_turn: false,
        ..ViewportConfig::default()
    });
    viewport.set_layout(ViewportSize::new(1000, 800), ReadingDirection::LeftToRight);
    assert_eq!(viewport.tap(0.9, 0.5), Some(ViewportIntent::ToggleControls));
}

#[test]
fn keys_map_through_reading_direction() {
    assert_eq!(
        key_intent(Key::Left, ReadingDirection::LeftToRight),
        Some(ViewportIntent::Previous)
    );
    assert_eq!(
        key_intent(Key::Left, ReadingDirection::RightToLeft),
        Some(ViewportIntent::Next)
    );
    assert_eq!(
        key_intent(Key::Space, ReadingDirection::Vertical),
        Some(ViewportIntent::Next)
    );
    assert_eq!(key_intent(Key::Escape, ReadingDirection::Vertical), None);
}

#[test]
fn drag_emits_a_single_intent_per_gesture() {
    let mut viewport = controller(ReadingDirection::LeftToRight);
    viewport.drag_begin(0);

    assert_eq!(viewport.drag_move(100.0, Edge::None, 10).intent, None);
    assert_eq!(
        viewport.drag_move(200.0, Edge::None, 20).intent,
        Some(ViewportIntent::Next)
    );
    assert_eq!(viewport.drag_move(500.0, Edge::None, 30).intent, None);
    assert_eq!(viewport.drag_end(0.0, 40), DragUpdate::default());

    viewport.drag_begin(50);
    assert_eq!(
        viewport.drag_move(-300.0, Edge::None, 60).intent,
        Some(ViewportIntent::Previous)
    );
}

#[test]
fn drag_without_begin_is_ignored() {
    let mut viewport = controller(ReadingDirection::LeftToRight);
    assert_eq!(viewport.drag_move(900.0, Edge::None, 0), DragUpdate::default());
    assert_eq!(viewport.drag_end(0.0, 0), DragUpdate::default());
}

#[test]
fn overscroll_below_threshold_never_crosses() {
    let mut viewport = controller(ReadingDirection::LeftToRight);
    viewport.drag_begin(0);
    assert_eq!(viewport.drag_move(40.0, Edge::End, 10), DragUpdate::default());
    assert_eq!(viewport.pending_crossing(), None);
    assert_eq!(viewport.drag_end(0.0, 20), DragUpdate::default());
}

#[test]
fn armed_crossing_commits_once_on_release() {
    let mut viewport = controller(ReadingDirection::LeftToRight);
    let armed = arm_next_crossing(&mut viewport, 100);
    assert_eq!(
        armed.feedback,
        Some(ViewportFeedback::BoundaryHint(CrossingDirection::Next))
    );
    assert_eq!(viewport.pending_crossing(), Some(CrossingDirection::Next));

    // Further overscroll does not repeat the hint.
    assert_eq!(viewport.drag_move(30.0, Edge::End, 110), DragUpdate::default());

    let released = viewport.drag_end(0.0, 120);
    assert_eq!(released.intent, Some(ViewportIntent::NextChapter));
    assert_eq!(
        released.feedback,
        Some(ViewportFeedback::CrossingCommitted(CrossingDirection::Next))
    );
    assert_eq!(viewport.pending_crossing(), None);
    assert_eq!(viewport.drag_end(0.0, 130), DragUpdate::default());
}

#[test]
fn start_edge_arms_previous_chapter() {
    let mut viewport = controller(ReadingDirection::LeftToRight);
    viewport.drag_begin(0);
    let _ = viewport.drag_move(-30.0, Edge::Start, 0);
    let armed = viewport.drag_move(-30.0, Edge::Start, 0);
    assert_eq!(
        armed.feedback,
        Some(ViewportFeedback::BoundaryHint(CrossingDirection::Previous))
    );
    assert_eq!(
        viewport.drag_end(0.0, 10).intent,
        Some(ViewportIntent::PreviousChapter)
    );
}

#[test]
fn backing_off_below_threshold_clears_the_hint() {
    let mut viewport = controller(ReadingDirection::LeftToRight);
    let _ = arm_next_crossing(&mut viewport, 0);

    let update = viewport.drag_move(-20.0, Edge::End, 10);
    assert_eq!(update.feedback, Some(ViewportFeedback::HintCleared));
    assert_eq!(viewport.pending_crossing(), None);
    assert_eq!(viewport.drag_end(0.0, 20).intent, None);
}

#[test]
fn reverse_fling_reverts_an_armed_crossing() {
    let mut viewport = controller(ReadingDirection::LeftToRight);
    let _ = arm_next_crossing(&mut viewport, 0);

    let released = viewport.drag_end(-400.0, 10);
    assert_eq!(released.intent, None);
    assert_eq!(released.feedback, Some(ViewportFeedback::HintCleared));
    assert!(!viewport.in_cooldown(10));
}

#[test]
fn cooldown_suppresses_drags_after_a_crossing() {
    let mut viewport = controller(ReadingDirection::LeftToRight);
    let _ = arm_next_crossing(&mut viewport, 0);
    let _ = viewport.drag_end(0.0, 1_000);

    assert!(viewport.in_cooldown(1_100));
    viewport.drag_begin(1_100);
    assert_eq!(viewport.drag_move(600.0, Edge::None, 1_100), DragUpdate::default());

    assert!(!viewport.in_cooldown(1_150));
    viewport.drag_begin(1_150);
    assert_eq!(
        viewport.drag_move(600.0, Edge::None, 1_160).intent,
        Some(ViewportIntent::Next)
    );
}

#[test]
fn boundary_hint_expires_on_tick() {
    let mut viewport = controller(ReadingDirection::LeftToRight);
    let _ = arm_next_crossing(&mut viewport, 100);

    assert_eq!(viewport.tick(699), None);
    assert_eq!(viewport.tick(700), Some(ViewportFeedback::HintCleared));
    assert_eq!(viewport.tick(800), None);
    assert_eq!(viewport.pending_crossing(), Some(CrossingDirection::Next));
}

#[test]
fn zoom_gates_page_turns_but_not_the_center_toggle() {
    let mut viewport = controller(ReadingDirection::LeftToRight);
    assert_eq!(viewport.set_zoom(2.0), None);
    assert!(viewport.is_zoomed());

    assert_eq!(viewport.tap(0.9, 0.5), None);
    assert_eq!(viewport.tap(0.5, 0.5), Some(ViewportIntent::ToggleControls));

    viewport.drag_begin(0);
    assert_eq!(viewport.drag_move(900.0, Edge::None, 10), DragUpdate::default());

    let _ = viewport.set_zoom(1.005);
    assert!(!viewport.is_zoomed());
    assert_eq!(viewport.tap(0.9, 0.5), Some(ViewportIntent::Next));
}

#[test]
fn entering_zoom_abandons_an_armed_crossing() {
    let mut viewport = controller(ReadingDirection::LeftToRight);
    let _ = arm_next_crossing(&mut viewport, 0);

    assert_eq!(viewport.set_zoom(3.0), Some(ViewportFeedback::HintCleared));
    assert_eq!(viewport.pending_crossing(), None);
    assert_eq!(viewport.drag_end(0.0, 10), DragUpdate::default());
}

#[test]
fn zoom_scale_is_clamped_and_double_tap_toggles() {
    let mut viewport = controller(ReadingDirection::LeftToRight);
    let _ = viewport.set_zoom(12.0);
    assert_eq!(viewport.zoom_scale(), 4.0);
    let _ = viewport.set_zoom(0.2);
    assert_eq!(viewport.zoom_scale(), 1.0);

    assert_eq!(viewport.double_tap(), (2.0, None));
    assert!(viewport.is_zoomed());
    assert_eq!(viewport.double_tap(), (1.0, None));
    assert!(!viewport.is_zoomed());
}

#[test]
fn double_tap_zoom_clears_an_armed_hint() {
    let mut viewport = controller(ReadingDirection::LeftToRight);
    let _ = arm_next_crossing(&mut viewport, 0);

    assert_eq!(
        viewport.double_tap(),
        (2.0, Some(ViewportFeedback::HintCleared))
    );
    assert_eq!(viewport.pending_crossing(), None);
}

#[test]
fn webtoon_remainder_feeds_the_same_crossing() {
    let mut viewport = controller(ReadingDirection::Webtoon);
    viewport.drag_begin(0);
    assert_eq!(viewport.overscroll_move(20.0, Edge::None, 0), DragUpdate::default());
    let _ = viewport.overscroll_move(25.0, Edge::End, 0);
    let armed = viewport.overscroll_move(25.0, Edge::End, 0);
    assert_eq!(
        armed.feedback,
        Some(ViewportFeedback::BoundaryHint(CrossingDirection::Next))
    );
    assert_eq!(
        viewport.drag_end(0.0, 10).intent,
        Some(ViewportIntent::NextChapter)
    );
}

#[test]
fn progress_delta_maps_screen_axes() {
    assert_eq!(progress_delta(ReadingDirection::LeftToRight, -10.0, 3.0), 10.0);
    assert_eq!(progress_delta(ReadingDirection::RightToLeft, -10.0, 3.0), -10.0);
    assert_eq!(progress_delta(ReadingDirection::Webtoon, 5.0, -40.0), 40.0);
}
