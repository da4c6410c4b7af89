/// Chapter boundary a crossing would move across.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CrossingDirection {
    Previous,
    Next,
}

/// Which chapter edges the visible content is pinned against.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Edge {
    #[default]
    None,
    Start,
    End,
    /// Content fits the viewport: pinned at both ends.
    Both,
}

impl Edge {
    pub const fn from_bounds(at_start: bool, at_end: bool) -> Self {
        match (at_start, at_end) {
            (true, true) => Self::Both,
            (true, false) => Self::Start,
            (false, true) => Self::End,
            (false, false) => Self::None,
        }
    }

    /// Crossing direction a movement of `delta` pushes into, if any.
    pub fn crossing_for(self, delta: f32) -> Option<CrossingDirection> {
        let backward = delta < 0.0;
        let forward = delta > 0.0;
        match self {
            Self::Start | Self::Both if backward => Some(CrossingDirection::Previous),
            Self::End | Self::Both if forward => Some(CrossingDirection::Next),
            _ => None,
        }
    }

    pub fn resists(self, delta: f32) -> bool {
        self.crossing_for(delta).is_some()
    }
}

/// Transient overscroll state at a chapter boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundaryCrossing {
    tracking: Option<CrossingDirection>,
    overscroll: f32,
    pending: bool,
}

impl BoundaryCrossing {
    pub const fn is_tracking(&self) -> bool {
        self.tracking.is_some()
    }

    pub const fn overscroll(&self) -> f32 {
        self.overscroll
    }

    /// Armed direction once the overscroll exceeds the threshold.
    pub fn pending(&self) -> Option<CrossingDirection> {
        self.tracking.filter(|_| self.pending)
    }

    pub fn accumulate(&mut self, delta: f32, edge: Edge, threshold: f32) {
        let Some(direction) = self.tracking.or_else(|| edge.crossing_for(delta)) else {
            return;
        };

        let push = match direction {
            CrossingDirection::Next => delta,
            CrossingDirection::Previous => -delta,
        };
        let overscroll = self.overscroll + push;
        if overscroll <= 0.0 {
            self.reset();
            return;
        }

        self.tracking = Some(direction);
        self.overscroll = overscroll;
        self.pending = overscroll > threshold;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
