//! Asset prefetch windows around the visible render unit.

use alloc::vec::Vec;

use heapless::Vec as BoundedVec;
use log::{debug, warn};

use crate::layout::RenderUnit;

pub const MAX_PREFETCH_RADIUS: u16 = 8;
pub const MAX_CHAPTER_RADIUS: u16 = 2;
pub const MAX_HYSTERESIS: u16 = 4;
/// Upper bound on simultaneously tracked keys for the clamped config.
pub const RESIDENT_CAPACITY: usize = 48;

/// Unit of loading and eviction.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AssetKey {
    Page { chapter: u16, page: u16 },
    /// Whole reflowable chapter document.
    Document { chapter: u16 },
}

impl AssetKey {
    pub const fn chapter(self) -> u16 {
        match self {
            Self::Page { chapter, .. } | Self::Document { chapter } => chapter,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PrefetchConfig {
    pub radius: u16,
    pub chapter_radius: u16,
    /// Extra slack outside a window before a resident key is evicted.
    pub hysteresis: u16,
    /// Minimum spacing between recomputations while a gesture is active.
    pub min_interval_ms: u64,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            radius: 2,
            chapter_radius: 1,
            hysteresis: 1,
            min_interval_ms: 300,
        }
    }
}

impl PrefetchConfig {
    fn clamped(self) -> Self {
        Self {
            radius: self.radius.min(MAX_PREFETCH_RADIUS),
            chapter_radius: self.chapter_radius.min(MAX_CHAPTER_RADIUS),
            hysteresis: self.hysteresis.min(MAX_HYSTERESIS),
            min_interval_ms: self.min_interval_ms,
        }
    }
}

/// Inclusive index range.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PrefetchWindow {
    pub low: u16,
    pub high: u16,
}

impl PrefetchWindow {
    /// `[center - radius, center + radius]` clipped to `[0, limit)`.
    /// `None` when `limit` is zero.
    pub fn around(center: u16, radius: u16, limit: u16) -> Option<Self> {
        let last = limit.checked_sub(1)?;
        let center = center.min(last);
        Some(Self {
            low: center.saturating_sub(radius),
            high: center.saturating_add(radius).min(last),
        })
    }

    pub const fn contains(self, index: u16) -> bool {
        index >= self.low && index <= self.high
    }

    /// How far `index` lies outside the window (0 inside).
    pub const fn distance(self, index: u16) -> u16 {
        if index < self.low {
            self.low - index
        } else if index > self.high {
            index - self.high
        } else {
            0
        }
    }
}

/// Point-in-time view of what the reader shows.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PrefetchSnapshot {
    pub chapter: u16,
    /// Page count of an image chapter; `None` for reflow chapters.
    pub page_count: Option<u16>,
    pub unit: RenderUnit,
    /// Center of the page window.
    pub anchor_page: u16,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LoadRequest {
    pub key: AssetKey,
    pub generation: u32,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PrefetchPlan {
    pub to_load: BoundedVec<LoadRequest, RESIDENT_CAPACITY>,
    pub to_evict: BoundedVec<AssetKey, RESIDENT_CAPACITY>,
}

impl PrefetchPlan {
    pub fn is_empty(&self) -> bool {
        self.to_load.is_empty() && self.to_evict.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AssetState {
    Requested,
    Ready { width: u32, height: u32 },
    /// Shown inline with a retry affordance.
    Failed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadOutcome {
    Ready,
    Failed,
    /// Key evicted or re-requested since; the result is dropped.
    Stale,
}

#[derive(Clone, Copy, Debug)]
struct Resident {
    key: AssetKey,
    generation: u32,
    state: AssetState,
}

pub struct PrefetchScheduler {
    config: PrefetchConfig,
    /// Chapters loaded as a whole document.
    documents: Vec<bool>,
    resident: BoundedVec<Resident, RESIDENT_CAPACITY>,
    generation: u32,
    last_gesture_run_ms: Option<u64>,
}

impl PrefetchScheduler {
    pub fn new(config: PrefetchConfig, documents: Vec<bool>) -> Self {
        Self {
            config: config.clamped(),
            documents,
            resident: BoundedVec::new(),
            generation: 0,
            last_gesture_run_ms: None,
        }
    }

    pub const fn config(&self) -> &PrefetchConfig {
        &self.config
    }

    pub const fn generation(&self) -> u32 {
        self.generation
    }

    pub fn resident_len(&self) -> usize {
        self.resident.len()
    }

    pub fn state(&self, key: AssetKey) -> Option<AssetState> {
        self.find(key).map(|index| self.resident[index].state)
    }

    /// Whether a recomputation may run during an active gesture at `now_ms`.
    /// Admitting records the run.
    pub fn admit_during_gesture(&mut self, now_ms: u64) -> bool {
        let due = self
            .last_gesture_run_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= self.config.min_interval_ms);
        if due {
            self.last_gesture_run_ms = Some(now_ms);
        }
        due
    }

    pub fn page_window(&self, snapshot: &PrefetchSnapshot) -> Option<PrefetchWindow> {
        PrefetchWindow::around(snapshot.anchor_page, self.config.radius, snapshot.page_count?)
    }

    pub fn document_window(&self, chapter: u16) -> Option<PrefetchWindow> {
        PrefetchWindow::around(chapter, self.config.chapter_radius, self.documents.len() as u16)
    }

    /// Diffs the wanted key set against what is resident.
    pub fn on_position_changed(&mut self, snapshot: &PrefetchSnapshot) -> PrefetchPlan {
        let mut plan = PrefetchPlan::default();
        let page_window = self.page_window(snapshot);
        let document_window = self.document_window(snapshot.chapter);

        let mut index = 0;
        while index < self.resident.len() {
            let key = self.resident[index].key;
            if self.should_evict(key, snapshot, page_window, document_window) {
                self.resident.swap_remove(index);
                let _ = plan.to_evict.push(key);
            } else {
                index += 1;
            }
        }

        let wanted = self.wanted_keys(snapshot, page_window, document_window);
        let generation = self.generation.wrapping_add(1);
        for key in wanted {
            if self.find(key).is_some() {
                continue;
            }
            let entry = Resident {
                key,
                generation,
                state: AssetState::Requested,
            };
            if self.resident.push(entry).is_err() {
                warn!("prefetch: resident set full, skipping key={:?}", key);
                break;
            }
            let _ = plan.to_load.push(LoadRequest { key, generation });
        }

        if !plan.to_load.is_empty() {
            self.generation = generation;
        }
        if !plan.is_empty() {
            debug!(
                "prefetch: chapter={} anchor={} load={} evict={} gen={}",
                snapshot.chapter,
                snapshot.anchor_page,
                plan.to_load.len(),
                plan.to_evict.len(),
                self.generation
            );
        }
        plan
    }

    pub fn on_loaded(&mut self, key: AssetKey, generation: u32, width: u32, height: u32) -> LoadOutcome {
        self.complete(key, generation, AssetState::Ready { width, height })
    }

    pub fn on_failed(&mut self, key: AssetKey, generation: u32) -> LoadOutcome {
        self.complete(key, generation, AssetState::Failed)
    }

    /// Re-issues a failed key under a fresh generation.
    pub fn retry(&mut self, key: AssetKey) -> Option<LoadRequest> {
        let index = self.find(key)?;
        if self.resident[index].state != AssetState::Failed {
            return None;
        }
        self.generation = self.generation.wrapping_add(1);
        let entry = &mut self.resident[index];
        entry.generation = self.generation;
        entry.state = AssetState::Requested;
        debug!("prefetch: retry key={:?} gen={}", key, self.generation);
        Some(LoadRequest {
            key,
            generation: self.generation,
        })
    }

    /// Drops every resident key; in-flight results become stale.
    pub fn reset(&mut self) -> BoundedVec<AssetKey, RESIDENT_CAPACITY> {
        self.generation = self.generation.wrapping_add(1);
        self.last_gesture_run_ms = None;
        let mut evicted = BoundedVec::new();
        for entry in self.resident.iter() {
            let _ = evicted.push(entry.key);
        }
        self.resident.clear();
        evicted
    }

    fn complete(&mut self, key: AssetKey, generation: u32, state: AssetState) -> LoadOutcome {
        let Some(index) = self.find(key) else {
            debug!("prefetch: stale result key={:?} gen={} (evicted)", key, generation);
            return LoadOutcome::Stale;
        };
        let entry = &mut self.resident[index];
        if entry.generation != generation {
            debug!(
                "prefetch: stale result key={:?} gen={} expected={}",
                key, generation, entry.generation
            );
            return LoadOutcome::Stale;
        }
        entry.state = state;
        match state {
            AssetState::Failed => {
                warn!("prefetch: load failed key={:?}", key);
                LoadOutcome::Failed
            }
            _ => LoadOutcome::Ready,
        }
    }

    fn find(&self, key: AssetKey) -> Option<usize> {
        self.resident.iter().position(|entry| entry.key == key)
    }

    fn is_document(&self, chapter: u16) -> bool {
        self.documents.get(chapter as usize).copied().unwrap_or(false)
    }

    fn should_evict(
        &self,
        key: AssetKey,
        snapshot: &PrefetchSnapshot,
        page_window: Option<PrefetchWindow>,
        document_window: Option<PrefetchWindow>,
    ) -> bool {
        let slack = self.config.hysteresis;
        match key {
            AssetKey::Page { chapter, page } => {
                if chapter != snapshot.chapter {
                    return true;
                }
                if snapshot.unit.contains(page) {
                    return false;
                }
                page_window.is_none_or(|window| window.distance(page) > slack)
            }
            AssetKey::Document { chapter } => {
                if chapter == snapshot.chapter {
                    return false;
                }
                document_window.is_none_or(|window| window.distance(chapter) > slack)
            }
        }
    }

    /// Wanted keys, nearest first with a forward bias.
    fn wanted_keys(
        &self,
        snapshot: &PrefetchSnapshot,
        page_window: Option<PrefetchWindow>,
        document_window: Option<PrefetchWindow>,
    ) -> BoundedVec<AssetKey, RESIDENT_CAPACITY> {
        let mut keys: BoundedVec<AssetKey, RESIDENT_CAPACITY> = BoundedVec::new();
        let chapter = snapshot.chapter;

        if self.is_document(chapter) {
            let _ = keys.push(AssetKey::Document { chapter });
        }
        if snapshot.page_count.is_some() {
            for page in snapshot.unit.pages() {
                push_unique(&mut keys, AssetKey::Page { chapter, page });
            }
        }
        if let Some(window) = page_window {
            for page in fan_out(snapshot.anchor_page, window) {
                push_unique(&mut keys, AssetKey::Page { chapter, page });
            }
        }
        if let Some(window) = document_window {
            for neighbor in fan_out(chapter, window) {
                if self.is_document(neighbor) {
                    push_unique(&mut keys, AssetKey::Document { chapter: neighbor });
                }
            }
        }
        keys
    }
}

fn push_unique(keys: &mut BoundedVec<AssetKey, RESIDENT_CAPACITY>, key: AssetKey) {
    if !keys.contains(&key) {
        let _ = keys.push(key);
    }
}

/// `center, center+1, center-1, center+2, ...` restricted to `window`.
fn fan_out(center: u16, window: PrefetchWindow) -> impl Iterator<Item = u16> {
    let center = center.clamp(window.low, window.high) as u32;
    let span = (window.high - window.low) as u32;
    (0..=span).flat_map(move |step| {
        let forward = Some(center + step);
        let backward = (step > 0).then(|| center.checked_sub(step)).flatten();
        forward
            .into_iter()
            .chain(backward)
            .filter(move |index| *index <= u16::MAX as u32 && window.contains(*index as u16))
            .map(|index| index as u16)
    })
}
