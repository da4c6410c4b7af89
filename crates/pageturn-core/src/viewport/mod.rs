//! Gesture interpretation: tap zones, drag paging, boundary overscroll and zoom gating.

mod overscroll;
mod tap;
mod zoom;

pub use overscroll::{BoundaryCrossing, CrossingDirection, Edge};
pub use tap::{key_intent, progress_delta, tap_intent};
pub use zoom::ZoomState;

use log::debug;

use crate::layout::ReadingDirection;

/// Viewport dimensions in logical pixels.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_landscape(self) -> bool {
        self.width > self.height
    }

    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Extent along the reading axis.
    pub const fn main_extent(self, direction: ReadingDirection) -> u32 {
        if direction.is_vertical() {
            self.height
        } else {
            self.width
        }
    }
}

/// Tuning for gesture interpretation. All distances are logical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportConfig {
    /// Width of the previous/next tap bands as a fraction of the screen.
    pub tap_zone: f32,
    /// When `false` every tap toggles the controls.
    pub tap_to_turn: bool,
    /// Drag distance, relative to the page extent, that turns one page.
    pub page_turn_ratio: f32,
    /// Overscroll past a chapter edge needed to arm a chapter crossing.
    pub overscroll_threshold: f32,
    /// Release velocity (px/s) away from the edge that cancels an armed crossing.
    pub commit_reverse_velocity: f32,
    pub crossing_cooldown_ms: u64,
    pub hint_duration_ms: u64,
    pub zoom_epsilon: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub double_tap_zoom: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            tap_zone: 0.3,
            tap_to_turn: true,
            page_turn_ratio: 0.25,
            overscroll_threshold: 48.0,
            commit_reverse_velocity: 250.0,
            crossing_cooldown_ms: 150,
            hint_duration_ms: 600,
            zoom_epsilon: 0.01,
            min_zoom: 1.0,
            max_zoom: 4.0,
            double_tap_zoom: 2.0,
        }
    }
}

/// Discrete navigation intent derived from raw input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ViewportIntent {
    Previous,
    Next,
    ToggleControls,
    PreviousChapter,
    NextChapter,
}

/// Visual / haptic affordances the host should surface.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ViewportFeedback {
    BoundaryHint(CrossingDirection),
    HintCleared,
    CrossingCommitted(CrossingDirection),
}

/// Result of feeding one drag sample or release.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DragUpdate {
    pub intent: Option<ViewportIntent>,
    pub feedback: Option<ViewportFeedback>,
}

#[derive(Clone, Copy, Debug, Default)]
struct DragGesture {
    distance: f32,
    fired: bool,
}

pub struct ViewportController {
    config: ViewportConfig,
    viewport: ViewportSize,
    direction: ReadingDirection,
    zoom: ZoomState,
    gesture: Option<DragGesture>,
    crossing: BoundaryCrossing,
    cooldown_until_ms: Option<u64>,
    hint_expires_ms: Option<u64>,
}

impl ViewportController {
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            zoom: ZoomState::new(&config),
            config,
            viewport: ViewportSize::default(),
            direction: ReadingDirection::default(),
            gesture: None,
            crossing: BoundaryCrossing::default(),
            cooldown_until_ms: None,
            hint_expires_ms: None,
        }
    }

    pub const fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn set_layout(&mut self, viewport: ViewportSize, direction: ReadingDirection) {
        self.viewport = viewport;
        self.direction = direction;
    }

    pub const fn direction(&self) -> ReadingDirection {
        self.direction
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoom.is_zoomed()
    }

    pub fn zoom_scale(&self) -> f32 {
        self.zoom.scale()
    }

    /// Applies a pinch scale. Entering zoom abandons any gesture in flight.
    pub fn set_zoom(&mut self, scale: f32) -> Option<ViewportFeedback> {
        let was_zoomed = self.zoom.is_zoomed();
        self.zoom.set_scale(scale);
        if !was_zoomed && self.zoom.is_zoomed() {
            debug!("viewport: zoom engaged scale={:.2}", self.zoom.scale());
            return self.abandon_gesture();
        }
        None
    }

    /// Toggles between baseline and the double-tap zoom, returning the new
    /// scale and the feedback of any gesture it abandoned.
    pub fn double_tap(&mut self) -> (f32, Option<ViewportFeedback>) {
        let scale = self.zoom.toggle();
        let feedback = if self.zoom.is_zoomed() {
            self.abandon_gesture()
        } else {
            None
        };
        (scale, feedback)
    }

    /// Whether the current gesture is pushing past a chapter edge.
    pub const fn crossing_active(&self) -> bool {
        self.crossing.is_tracking()
    }

    pub fn pending_crossing(&self) -> Option<CrossingDirection> {
        self.crossing.pending()
    }

    pub fn in_cooldown(&self, now_ms: u64) -> bool {
        self.cooldown_until_ms.is_some_and(|until| now_ms < until)
    }

    pub fn tap(&self, x: f32, y: f32) -> Option<ViewportIntent> {
        let intent = tap_intent(x, y, self.direction, self.config.tap_zone);
        if !self.config.tap_to_turn {
            return Some(ViewportIntent::ToggleControls);
        }
        match intent {
            ViewportIntent::ToggleControls => Some(intent),
            _ if self.zoom.is_zoomed() => None,
            _ => Some(intent),
        }
    }

    pub fn drag_begin(&mut self, now_ms: u64) {
        if self.zoom.is_zoomed() || self.in_cooldown(now_ms) {
            return;
        }
        self.gesture = Some(DragGesture::default());
        self.crossing.reset();
    }

    /// Paged drag sample. `delta` is measured along the reading progression
    /// (positive moves toward the next page); `edge` says whether the visible
    /// unit is the first and/or last of the chapter.
    pub fn drag_move(&mut self, delta: f32, edge: Edge, now_ms: u64) -> DragUpdate {
        if self.zoom.is_zoomed() || self.in_cooldown(now_ms) {
            return DragUpdate::default();
        }
        let Some(mut gesture) = self.gesture else {
            return DragUpdate::default();
        };

        if self.crossing.is_tracking() || edge.resists(delta) {
            let feedback = self.feed_overscroll(delta, edge, now_ms);
            return DragUpdate {
                intent: None,
                feedback,
            };
        }

        if gesture.fired {
            return DragUpdate::default();
        }

        gesture.distance += delta;
        let threshold = self.page_turn_threshold();
        let intent = if gesture.distance >= threshold {
            Some(ViewportIntent::Next)
        } else if gesture.distance <= -threshold {
            Some(ViewportIntent::Previous)
        } else {
            None
        };
        if intent.is_some() {
            gesture.distance = 0.0;
            gesture.fired = true;
            debug!("viewport: drag page turn intent={:?}", intent);
        }
        self.gesture = Some(gesture);

        DragUpdate {
            intent,
            feedback: None,
        }
    }

    /// Continuous-scroll remainder that the content could not absorb because
    /// it is pinned at `edge`.
    pub fn overscroll_move(&mut self, remainder: f32, edge: Edge, now_ms: u64) -> DragUpdate {
        if self.zoom.is_zoomed() || self.in_cooldown(now_ms) || self.gesture.is_none() {
            return DragUpdate::default();
        }
        if !self.crossing.is_tracking() && !edge.resists(remainder) {
            return DragUpdate::default();
        }
        DragUpdate {
            intent: None,
            feedback: self.feed_overscroll(remainder, edge, now_ms),
        }
    }

    /// Gesture release with its velocity along the reading progression.
    pub fn drag_end(&mut self, velocity: f32, now_ms: u64) -> DragUpdate {
        if self.gesture.take().is_none() {
            return DragUpdate::default();
        }

        let Some(direction) = self.crossing.pending() else {
            self.crossing.reset();
            return DragUpdate::default();
        };

        let reversing = match direction {
            CrossingDirection::Next => velocity < -self.config.commit_reverse_velocity,
            CrossingDirection::Previous => velocity > self.config.commit_reverse_velocity,
        };
        self.crossing.reset();
        self.hint_expires_ms = None;

        if reversing {
            debug!(
                "viewport: crossing reverted direction={:?} velocity={:.1}",
                direction, velocity
            );
            return DragUpdate {
                intent: None,
                feedback: Some(ViewportFeedback::HintCleared),
            };
        }

        self.cooldown_until_ms = Some(now_ms.saturating_add(self.config.crossing_cooldown_ms));
        debug!(
            "viewport: crossing committed direction={:?} cooldown_until={:?}",
            direction, self.cooldown_until_ms
        );
        DragUpdate {
            intent: Some(match direction {
                CrossingDirection::Previous => ViewportIntent::PreviousChapter,
                CrossingDirection::Next => ViewportIntent::NextChapter,
            }),
            feedback: Some(ViewportFeedback::CrossingCommitted(direction)),
        }
    }

    /// Expires the boundary hint. The crossing itself stays armed.
    pub fn tick(&mut self, now_ms: u64) -> Option<ViewportFeedback> {
        let expires = self.hint_expires_ms?;
        if now_ms < expires {
            return None;
        }
        self.hint_expires_ms = None;
        Some(ViewportFeedback::HintCleared)
    }

    fn page_turn_threshold(&self) -> f32 {
        let extent = self.viewport.main_extent(self.direction).max(1) as f32;
        (extent * self.config.page_turn_ratio).max(1.0)
    }

    fn feed_overscroll(&mut self, delta: f32, edge: Edge, now_ms: u64) -> Option<ViewportFeedback> {
        let was_pending = self.crossing.pending().is_some();
        self.crossing
            .accumulate(delta, edge, self.config.overscroll_threshold);

        match (was_pending, self.crossing.pending()) {
            (false, Some(direction)) => {
                self.hint_expires_ms = Some(now_ms.saturating_add(self.config.hint_duration_ms));
                debug!(
                    "viewport: crossing armed direction={:?} overscroll={:.1}",
                    direction,
                    self.crossing.overscroll()
                );
                Some(ViewportFeedback::BoundaryHint(direction))
            }
            (true, None) => {
                self.hint_expires_ms = None;
                Some(ViewportFeedback::HintCleared)
            }
            _ => None,
        }
    }

    fn abandon_gesture(&mut self) -> Option<ViewportFeedback> {
        self.gesture = None;
        let was_pending = self.crossing.pending().is_some();
        self.crossing.reset();
        self.hint_expires_ms = None;
        was_pending.then_some(ViewportFeedback::HintCleared)
    }
}

#[cfg(test)]
mod tests;
