//! Input abstraction layer.

mod scripted;

pub use scripted::ScriptedInput;

/// Keyboard / remote keys the reader reacts to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Space,
    Enter,
    Escape,
}

impl Key {
    pub fn from_label(label: &str) -> Option<Self> {
        let key = match label.trim().to_ascii_lowercase().as_str() {
            "left" => Self::Left,
            "right" => Self::Right,
            "up" => Self::Up,
            "down" => Self::Down,
            "pageup" => Self::PageUp,
            "pagedown" => Self::PageDown,
            "space" => Self::Space,
            "enter" => Self::Enter,
            "escape" | "esc" => Self::Escape,
            _ => return None,
        };
        Some(key)
    }
}

/// Raw pointer / keyboard actions consumed by the reader engine.
///
/// Tap coordinates are normalized to the viewport (`0.0..=1.0`); drag deltas
/// and velocities are logical pixels in screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Tap { x: f32, y: f32 },
    DoubleTap,
    DragBegin,
    DragMove { dx: f32, dy: f32 },
    DragEnd { vx: f32, vy: f32 },
    Pinch { scale: f32 },
    Key(Key),
}

/// Polled input provider.
pub trait InputProvider {
    type Error;

    fn poll_event(&mut self) -> Result<Option<InputEvent>, Self::Error>;
}
