use super::ViewportIntent;
use crate::{input::Key, layout::ReadingDirection};

/// Maps a normalized tap position to an intent.
///
/// Horizontal readers use the side bands first (swapped for RTL), then the
/// top/bottom bands. Vertical readers use the top band and the left band of
/// the middle row for "previous"; the center box toggles the controls.
pub fn tap_intent(x: f32, y: f32, direction: ReadingDirection, zone: f32) -> ViewportIntent {
    let x = unit(x);
    let y = unit(y);
    let zone = zone.clamp(0.0, 0.5);
    let low = zone;
    let high = 1.0 - zone;

    let in_center = x >= low && x <= high && y >= low && y <= high;

    if direction.is_vertical() {
        if in_center {
            return ViewportIntent::ToggleControls;
        }
        let top = y < low;
        let middle_left = y <= high && x < low;
        return if top || middle_left {
            ViewportIntent::Previous
        } else {
            ViewportIntent::Next
        };
    }

    let (before, after) = if direction.is_rtl() {
        (ViewportIntent::Next, ViewportIntent::Previous)
    } else {
        (ViewportIntent::Previous, ViewportIntent::Next)
    };

    if x < low {
        before
    } else if x > high {
        after
    } else if y < low {
        ViewportIntent::Previous
    } else if y > high {
        ViewportIntent::Next
    } else {
        ViewportIntent::ToggleControls
    }
}

pub fn key_intent(key: Key, direction: ReadingDirection) -> Option<ViewportIntent> {
    let forward_right = !direction.is_rtl();
    match key {
        Key::Right if forward_right => Some(ViewportIntent::Next),
        Key::Right => Some(ViewportIntent::Previous),
        Key::Left if forward_right => Some(ViewportIntent::Previous),
        Key::Left => Some(ViewportIntent::Next),
        Key::Down | Key::PageDown | Key::Space => Some(ViewportIntent::Next),
        Key::Up | Key::PageUp => Some(ViewportIntent::Previous),
        Key::Enter => Some(ViewportIntent::ToggleControls),
        Key::Escape => None,
    }
}

/// Converts a screen-space drag into movement along the reading progression.
/// Positive means "toward the next page".
pub fn progress_delta(direction: ReadingDirection, dx: f32, dy: f32) -> f32 {
    match direction {
        ReadingDirection::LeftToRight => -dx,
        ReadingDirection::RightToLeft => dx,
        ReadingDirection::Vertical | ReadingDirection::Webtoon => -dy,
    }
}

fn unit(value: f32) -> f32 {
    if value.is_nan() {
        0.5
    } else {
        value.clamp(0.0, 1.0)
    }
}
