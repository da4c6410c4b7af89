use super::{InputEvent, InputProvider};

/// Replays a fixed slice of events, one per poll.
#[derive(Debug, Clone)]
pub struct ScriptedInput<'a> {
    events: &'a [InputEvent],
    cursor: usize,
}

impl<'a> ScriptedInput<'a> {
    pub const fn new(events: &'a [InputEvent]) -> Self {
        Self { events, cursor: 0 }
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.events.len()
    }
}

impl InputProvider for ScriptedInput<'_> {
    type Error = core::convert::Infallible;

    fn poll_event(&mut self) -> Result<Option<InputEvent>, Self::Error> {
        let Some(event) = self.events.get(self.cursor).copied() else {
            return Ok(None);
        };
        self.cursor = self.cursor.saturating_add(1);
        Ok(Some(event))
    }
}
