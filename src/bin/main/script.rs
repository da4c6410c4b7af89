use std::str::FromStr;

use pageturn_core::{
    ReadingDirection, ReflowStyle, ViewportSize,
    input::{InputEvent, Key},
};

use super::error::{HostError, ScriptErrorKind};

/// Page turns in the built-in session; it stops earlier at the end of the book.
const READ_TO_END_MAX_TURNS: usize = 4_096;
const READ_TO_END_DWELL_MS: u64 = 400;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum ScriptStep {
    Input(InputEvent),
    /// Drag along the reading progression; positive moves toward the next page.
    Drag(f32),
    Release(f32),
    Resize(ViewportSize),
    Jump { chapter: u16, page: u16 },
    Style(ReflowStyle),
    Wait(u64),
}

#[derive(Clone, Debug, PartialEq)]
pub(super) struct Script {
    pub(super) steps: Vec<ScriptStep>,
    /// Stop as soon as the engine reports the end of the book.
    pub(super) stop_at_end: bool,
}

impl Script {
    pub(super) fn parse(text: &str) -> Result<Self, HostError> {
        let mut steps = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let step = parse_line(line).map_err(|reason| HostError::Script {
                line: index + 1,
                reason,
            })?;
            steps.push(step);
        }
        Ok(Self {
            steps,
            stop_at_end: false,
        })
    }

    pub(super) fn read_to_end() -> Self {
        let mut steps = Vec::with_capacity(READ_TO_END_MAX_TURNS * 2);
        for _ in 0..READ_TO_END_MAX_TURNS {
            steps.push(ScriptStep::Input(InputEvent::Key(Key::Space)));
            steps.push(ScriptStep::Wait(READ_TO_END_DWELL_MS));
        }
        Self {
            steps,
            stop_at_end: true,
        }
    }
}

/// Screen-space motion that moves `delta` along the reading progression.
pub(super) fn screen_motion(direction: ReadingDirection, delta: f32) -> (f32, f32) {
    match direction {
        ReadingDirection::LeftToRight => (-delta, 0.0),
        ReadingDirection::RightToLeft => (delta, 0.0),
        ReadingDirection::Vertical | ReadingDirection::Webtoon => (0.0, -delta),
    }
}

fn parse_line(line: &str) -> Result<ScriptStep, ScriptErrorKind> {
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or_default().to_ascii_lowercase();
    let mut arg = |name: &'static str| words.next().ok_or(ScriptErrorKind::MissingArgument(name));

    let step = match command.as_str() {
        "tap" => ScriptStep::Input(InputEvent::Tap {
            x: number(arg("x")?)?,
            y: number(arg("y")?)?,
        }),
        "doubletap" => ScriptStep::Input(InputEvent::DoubleTap),
        "drag" => ScriptStep::Drag(number(arg("delta")?)?),
        "release" => ScriptStep::Release(number(arg("velocity")?)?),
        "key" => {
            let label = arg("key")?;
            let key = Key::from_label(label)
                .ok_or_else(|| ScriptErrorKind::UnknownKey(label.to_string()))?;
            ScriptStep::Input(InputEvent::Key(key))
        }
        "zoom" => ScriptStep::Input(InputEvent::Pinch {
            scale: number(arg("scale")?)?,
        }),
        "resize" => ScriptStep::Resize(ViewportSize::new(
            number(arg("width")?)?,
            number(arg("height")?)?,
        )),
        "jump" => ScriptStep::Jump {
            chapter: number(arg("chapter")?)?,
            page: number(arg("page")?)?,
        },
        "style" => ScriptStep::Style(ReflowStyle::decode_raw(arg("style")?)),
        "wait" => ScriptStep::Wait(number(arg("ms")?)?),
        other => return Err(ScriptErrorKind::UnknownCommand(other.to_string())),
    };
    Ok(step)
}

fn number<T: FromStr>(value: &str) -> Result<T, ScriptErrorKind> {
    value
        .parse()
        .map_err(|_| ScriptErrorKind::InvalidNumber(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_skips_comments() {
        let script = Script::parse(
            "# open at the start\n\
             tap 0.9 0.5\n\
             \n\
             drag 320\n\
             release -40.5\n\
             key PageDown\n\
             zoom 1.5\n\
             resize 1920 1080\n\
             jump 2 7\n\
             style typeScale=1.5\n\
             wait 250\n",
        )
        .unwrap();

        assert!(!script.stop_at_end);
        assert_eq!(
            script.steps,
            vec![
                ScriptStep::Input(InputEvent::Tap { x: 0.9, y: 0.5 }),
                ScriptStep::Drag(320.0),
                ScriptStep::Release(-40.5),
                ScriptStep::Input(InputEvent::Key(Key::PageDown)),
                ScriptStep::Input(InputEvent::Pinch { scale: 1.5 }),
                ScriptStep::Resize(ViewportSize::new(1920, 1080)),
                ScriptStep::Jump {
                    chapter: 2,
                    page: 7
                },
                ScriptStep::Style(ReflowStyle::default().with_type_scale_percent(150)),
                ScriptStep::Wait(250),
            ]
        );
    }

    #[test]
    fn errors_carry_line_numbers() {
        let err = Script::parse("tap 0.5 0.5\n# ok\nswipe 3\n").unwrap_err();
        assert!(matches!(
            err,
            HostError::Script {
                line: 3,
                reason: ScriptErrorKind::UnknownCommand(_)
            }
        ));

        let err = Script::parse("jump 1\n").unwrap_err();
        assert!(matches!(
            err,
            HostError::Script {
                line: 1,
                reason: ScriptErrorKind::MissingArgument("page")
            }
        ));

        let err = Script::parse("wait soon\n").unwrap_err();
        assert_eq!(err.to_string(), "script line 1: invalid number \"soon\"");

        let err = Script::parse("key home\n").unwrap_err();
        assert!(matches!(
            err,
            HostError::Script {
                reason: ScriptErrorKind::UnknownKey(_),
                ..
            }
        ));
    }

    #[test]
    fn drags_map_to_screen_axes() {
        assert_eq!(
            screen_motion(ReadingDirection::LeftToRight, 10.0),
            (-10.0, 0.0)
        );
        assert_eq!(
            screen_motion(ReadingDirection::RightToLeft, 10.0),
            (10.0, 0.0)
        );
        assert_eq!(screen_motion(ReadingDirection::Webtoon, 10.0), (0.0, -10.0));
    }

    #[test]
    fn read_to_end_pages_forward_until_stopped() {
        let script = Script::read_to_end();
        assert!(script.stop_at_end);
        assert_eq!(
            script.steps[0],
            ScriptStep::Input(InputEvent::Key(Key::Space))
        );
    }
}
