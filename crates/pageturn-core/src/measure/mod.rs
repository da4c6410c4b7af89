//! Pagination of reflowable chapters from sampled content heights.
//!
//! The host lays the chapter out in a hidden surface and reports the content
//! height whenever the measurer asks for a sample. Heights settle after fonts
//! and images finish loading; the chapter is paginated once
//! `stability_samples` consecutive samples agree.

use heapless::Deque;
use log::{debug, warn};

pub const MAX_STABILITY_SAMPLES: usize = 8;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MeasureConfig {
    pub stability_samples: usize,
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub max_attempts: u16,
    pub timeout_ms: u64,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            stability_samples: 4,
            initial_interval_ms: 16,
            max_interval_ms: 250,
            max_attempts: 120,
            timeout_ms: 10_000,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MeasureState {
    Unmeasured,
    Measuring { chapter: u16 },
    Stable { chapter: u16, page_count: u16 },
}

/// Ask the host for one content-height sample.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MeasureRequest {
    pub chapter: u16,
    pub generation: u32,
    pub attempt: u16,
}

/// Page the reader was on before a remeasure, used to re-anchor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PreviousPagination {
    pub page: u16,
    pub page_count: u16,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Pagination {
    pub chapter: u16,
    pub generation: u32,
    pub page_count: u16,
    pub timed_out: bool,
    /// `floor(page * new / old)` when the chapter was paginated before.
    pub anchor_page: Option<u16>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MeasureOutcome {
    /// Wrong generation or nothing in flight.
    Ignored,
    /// Zero content or viewport height; not counted toward stability.
    Deferred,
    Sampling,
    Finalized(Pagination),
}

/// `max(1, ceil(content / viewport))`.
pub fn page_count_for(content_height: u32, viewport_height: u32) -> u16 {
    if viewport_height == 0 {
        return 1;
    }
    content_height
        .div_ceil(viewport_height)
        .clamp(1, u16::MAX as u32) as u16
}

/// Keeps the same relative spot when a chapter is repaginated.
pub fn reanchor(page: u16, old_count: u16, new_count: u16) -> u16 {
    if old_count == 0 || new_count == 0 {
        return 0;
    }
    let scaled = page as u32 * new_count as u32 / old_count as u32;
    scaled.min(new_count as u32 - 1) as u16
}

pub struct PaginationMeasurer {
    config: MeasureConfig,
    state: MeasureState,
    generation: u32,
    previous: Option<PreviousPagination>,
    samples: Deque<(u32, u32), MAX_STABILITY_SAMPLES>,
    attempts: u16,
    started_ms: u64,
    interval_ms: u64,
    next_due_ms: Option<u64>,
    last_usable: Option<(u32, u32)>,
}

impl PaginationMeasurer {
    pub fn new(config: MeasureConfig) -> Self {
        Self {
            config,
            state: MeasureState::Unmeasured,
            generation: 0,
            previous: None,
            samples: Deque::new(),
            attempts: 0,
            started_ms: 0,
            interval_ms: config.initial_interval_ms,
            next_due_ms: None,
            last_usable: None,
        }
    }

    pub const fn state(&self) -> MeasureState {
        self.state
    }

    pub const fn generation(&self) -> u32 {
        self.generation
    }

    pub const fn is_measuring(&self) -> bool {
        matches!(self.state, MeasureState::Measuring { .. })
    }

    /// Starts a new measurement of `chapter`. Any in-flight sample becomes stale.
    pub fn begin(&mut self, chapter: u16, now_ms: u64, previous: Option<PreviousPagination>) -> u32 {
        self.generation = self.generation.wrapping_add(1);
        self.state = MeasureState::Measuring { chapter };
        self.previous = previous;
        self.samples.clear();
        self.attempts = 0;
        self.started_ms = now_ms;
        self.interval_ms = self.config.initial_interval_ms;
        self.next_due_ms = Some(now_ms);
        self.last_usable = None;
        debug!(
            "measure: begin chapter={} gen={} previous={:?}",
            chapter, self.generation, previous
        );
        self.generation
    }

    pub fn cancel(&mut self) {
        if self.is_measuring() {
            debug!("measure: cancel gen={}", self.generation);
        }
        self.generation = self.generation.wrapping_add(1);
        self.state = MeasureState::Unmeasured;
        self.next_due_ms = None;
        self.samples.clear();
    }

    /// Next sample request once its time has come. The following request is
    /// scheduled when the sample arrives.
    pub fn due(&mut self, now_ms: u64) -> Option<MeasureRequest> {
        let MeasureState::Measuring { chapter } = self.state else {
            return None;
        };
        let due_ms = self.next_due_ms?;
        if now_ms < due_ms {
            return None;
        }
        self.next_due_ms = None;
        Some(MeasureRequest {
            chapter,
            generation: self.generation,
            attempt: self.attempts,
        })
    }

    /// Force-finalizes once the attempt budget or the deadline is exhausted.
    pub fn check_timeout(&mut self, now_ms: u64) -> Option<Pagination> {
        if !self.is_measuring() {
            return None;
        }
        let expired = now_ms.saturating_sub(self.started_ms) >= self.config.timeout_ms;
        if !expired && self.attempts < self.config.max_attempts {
            return None;
        }
        Some(self.finalize(true))
    }

    pub fn on_sample(
        &mut self,
        generation: u32,
        content_height: u32,
        viewport_height: u32,
        now_ms: u64,
    ) -> MeasureOutcome {
        if generation != self.generation || !self.is_measuring() {
            debug!(
                "measure: stale sample gen={} current={}",
                generation, self.generation
            );
            return MeasureOutcome::Ignored;
        }

        self.attempts = self.attempts.saturating_add(1);
        self.schedule_next(now_ms);

        if content_height == 0 || viewport_height == 0 {
            debug!(
                "measure: deferred content={} viewport={} attempt={}",
                content_height, viewport_height, self.attempts
            );
            return self
                .check_timeout(now_ms)
                .map_or(MeasureOutcome::Deferred, MeasureOutcome::Finalized);
        }

        let sample = (content_height, viewport_height);
        self.last_usable = Some(sample);
        let window = self.config.stability_samples.clamp(1, MAX_STABILITY_SAMPLES);
        while self.samples.len() >= window {
            let _ = self.samples.pop_front();
        }
        let _ = self.samples.push_back(sample);

        if self.samples.len() == window && self.samples.iter().all(|seen| *seen == sample) {
            return MeasureOutcome::Finalized(self.finalize(false));
        }

        self.check_timeout(now_ms)
            .map_or(MeasureOutcome::Sampling, MeasureOutcome::Finalized)
    }

    fn schedule_next(&mut self, now_ms: u64) {
        self.next_due_ms = Some(now_ms.saturating_add(self.interval_ms));
        self.interval_ms = self
            .interval_ms
            .saturating_mul(2)
            .clamp(1, self.config.max_interval_ms.max(1));
    }

    fn finalize(&mut self, timed_out: bool) -> Pagination {
        let chapter = match self.state {
            MeasureState::Measuring { chapter } | MeasureState::Stable { chapter, .. } => chapter,
            MeasureState::Unmeasured => 0,
        };
        let page_count = self
            .last_usable
            .map_or(1, |(content, viewport)| page_count_for(content, viewport));
        let anchor_page = self
            .previous
            .map(|previous| reanchor(previous.page, previous.page_count, page_count));

        if timed_out {
            warn!(
                "measure: timeout chapter={} attempts={} page_count={}",
                chapter, self.attempts, page_count
            );
        } else {
            debug!(
                "measure: stable chapter={} page_count={} attempts={}",
                chapter, page_count, self.attempts
            );
        }

        self.state = MeasureState::Stable {
            chapter,
            page_count,
        };
        self.next_due_ms = None;
        self.samples.clear();
        Pagination {
            chapter,
            generation: self.generation,
            page_count,
            timed_out,
            anchor_page,
        }
    }
}
