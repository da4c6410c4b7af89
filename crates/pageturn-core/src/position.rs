//! Reading position, pending navigation targets and per-chapter page counts.

use alloc::vec::Vec;

use log::debug;

use crate::progress::ProgressReport;

/// Where the reader is.
///
/// `progress` is derived from `page` once the chapter's page count is known.
/// Before that (restored progress in an unmeasured reflow chapter) it is the
/// only authoritative value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub chapter: u16,
    pub page: u16,
    pub progress: f32,
}

impl Position {
    pub const fn start() -> Self {
        Self {
            chapter: 0,
            page: 0,
            progress: 0.0,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

/// Page part of a programmatic jump.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PageTarget {
    Page(u16),
    Progress(f32),
    /// Resolved once the chapter's page count is known.
    LastPage,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NavigationTarget {
    pub chapter: u16,
    pub page: PageTarget,
}

impl NavigationTarget {
    pub fn resolve(self, page_count: u16) -> u16 {
        resolve_page(self.page, page_count)
    }
}

pub fn resolve_page(target: PageTarget, page_count: u16) -> u16 {
    let last = page_count.saturating_sub(1);
    match target {
        PageTarget::Page(page) => page.min(last),
        PageTarget::Progress(progress) => progress_to_page(progress, page_count),
        PageTarget::LastPage => last,
    }
}

/// `floor(page_count * progress)` clamped to `[0, page_count - 1]`.
pub fn progress_to_page(progress: f32, page_count: u16) -> u16 {
    if page_count == 0 {
        return 0;
    }
    let scaled = clamp_unit(progress) * page_count as f32;
    // Truncation is floor for non-negative values.
    (scaled as u32).min(page_count as u32 - 1) as u16
}

pub fn page_progress(page: u16, page_count: u16) -> f32 {
    if page_count == 0 {
        return 0.0;
    }
    page.min(page_count - 1) as f32 / page_count as f32
}

pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Single source of truth for the reading position.
#[derive(Clone, Debug)]
pub struct PositionModel {
    current: Position,
    target: Option<NavigationTarget>,
    page_counts: Vec<Option<u16>>,
}

impl PositionModel {
    pub fn new(chapter_count: u16) -> Self {
        Self {
            current: Position::start(),
            target: None,
            page_counts: alloc::vec![None; chapter_count as usize],
        }
    }

    pub fn chapter_count(&self) -> u16 {
        self.page_counts.len() as u16
    }

    pub const fn current(&self) -> Position {
        self.current
    }

    pub const fn target(&self) -> Option<NavigationTarget> {
        self.target
    }

    pub fn page_count(&self, chapter: u16) -> Option<u16> {
        self.page_counts.get(chapter as usize).copied().flatten()
    }

    /// Replaces the page count of `chapter`. Returns `true` when it changed.
    pub fn set_page_count(&mut self, chapter: u16, page_count: u16) -> bool {
        let Some(slot) = self.page_counts.get_mut(chapter as usize) else {
            return false;
        };
        if *slot == Some(page_count) {
            return false;
        }
        debug!(
            "position: page count chapter={} old={:?} new={}",
            chapter, *slot, page_count
        );
        *slot = Some(page_count);

        if self.current.chapter == chapter {
            self.current.page = self.current.page.min(page_count.saturating_sub(1));
            self.current.progress = page_progress(self.current.page, page_count);
        }
        true
    }

    /// Forgets the page count of `chapter`, returning the old value.
    pub fn invalidate_page_count(&mut self, chapter: u16) -> Option<u16> {
        self.page_counts.get_mut(chapter as usize)?.take()
    }

    pub fn set_target(&mut self, chapter: u16, page: u16) -> NavigationTarget {
        let chapter = self.clamp_chapter(chapter);
        let page = match self.page_count(chapter) {
            Some(count) => {
                let clamped = page.min(count.saturating_sub(1));
                if clamped != page {
                    debug!(
                        "position: target page clamped chapter={} requested={} clamped={}",
                        chapter, page, clamped
                    );
                }
                clamped
            }
            None => page,
        };
        self.store_target(chapter, PageTarget::Page(page))
    }

    pub fn set_target_last_page(&mut self, chapter: u16) -> NavigationTarget {
        let chapter = self.clamp_chapter(chapter);
        self.store_target(chapter, PageTarget::LastPage)
    }

    pub fn set_target_progress(&mut self, chapter: u16, progress: f32) -> NavigationTarget {
        let chapter = self.clamp_chapter(chapter);
        self.store_target(chapter, PageTarget::Progress(clamp_unit(progress)))
    }

    pub fn take_target(&mut self) -> Option<NavigationTarget> {
        self.target.take()
    }

    /// Pending target with its page resolved, when the page count is known
    /// (or the target is an absolute page).
    pub fn resolved_target(&self) -> Option<(u16, u16)> {
        let target = self.target?;
        match (self.page_count(target.chapter), target.page) {
            (Some(count), _) => Some((target.chapter, target.resolve(count))),
            (None, PageTarget::Page(page)) => Some((target.chapter, page)),
            (None, _) => None,
        }
    }

    /// Applies the pending target. The target stays pending when its page
    /// cannot be resolved yet.
    pub fn settle_target(&mut self) -> Option<ProgressReport> {
        let (chapter, page) = self.resolved_target()?;
        self.target = None;
        self.settle(chapter, page)
    }

    /// Records a settled position. Reports only real changes.
    pub fn settle(&mut self, chapter: u16, page: u16) -> Option<ProgressReport> {
        let chapter = self.clamp_chapter(chapter);
        let (page, progress) = match self.page_count(chapter) {
            Some(count) => {
                let page = page.min(count.saturating_sub(1));
                (page, page_progress(page, count))
            }
            None if chapter == self.current.chapter && page == self.current.page => {
                (page, self.current.progress)
            }
            None => (page, 0.0),
        };

        let next = Position {
            chapter,
            page,
            progress,
        };
        if next == self.current {
            return None;
        }

        debug!(
            "position: settle chapter={} page={} progress={:.3} previous={}:{}",
            chapter, page, progress, self.current.chapter, self.current.page
        );
        self.current = next;
        Some(ProgressReport::from(next))
    }

    /// Restores saved progress without reporting it back.
    pub fn restore(&mut self, chapter: u16, page: u16, progress: f32) {
        let chapter = self.clamp_chapter(chapter);
        let (page, progress) = match self.page_count(chapter) {
            Some(count) => {
                let page = page.min(count.saturating_sub(1));
                (page, page_progress(page, count))
            }
            None => (page, clamp_unit(progress)),
        };
        self.current = Position {
            chapter,
            page,
            progress,
        };
    }

    fn store_target(&mut self, chapter: u16, page: PageTarget) -> NavigationTarget {
        let target = NavigationTarget { chapter, page };
        self.target = Some(target);
        target
    }

    fn clamp_chapter(&self, chapter: u16) -> u16 {
        let last = self.chapter_count().saturating_sub(1);
        if chapter > last {
            debug!(
                "position: chapter clamped requested={} clamped={}",
                chapter, last
            );
        }
        chapter.min(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_with_counts(counts: &[u16]) -> PositionModel {
        let mut model = PositionModel::new(counts.len() as u16);
        for (chapter, count) in counts.iter().enumerate() {
            model.set_page_count(chapter as u16, *count);
        }
        model
    }

    #[test]
    fn set_target_then_settle_round_trips_with_clamp() {
        let mut model = model_with_counts(&[10, 4]);

        model.set_target(1, 2);
        assert!(model.settle_target().is_some());
        assert_eq!((model.current().chapter, model.current().page), (1, 2));
        assert_eq!(model.target(), None);

        model.set_target(1, 99);
        model.settle_target();
        assert_eq!((model.current().chapter, model.current().page), (1, 3));

        model.set_target(7, 0);
        model.settle_target();
        assert_eq!(model.current().chapter, 1);
        assert_eq!(model.current().page, 0);
    }

    #[test]
    fn settle_reports_once_and_skips_no_ops() {
        let mut model = model_with_counts(&[8]);
        let report = model.settle(0, 4).unwrap();
        assert_eq!(report.page, 4);
        assert_eq!(report.progress, 0.5);
        assert_eq!(model.settle(0, 4), None);
    }

    #[test]
    fn last_page_target_waits_for_page_count() {
        let mut model = PositionModel::new(2);
        model.set_target_last_page(1);
        assert_eq!(model.settle_target(), None);
        assert!(model.target().is_some());

        model.set_page_count(1, 6);
        let report = model.settle_target().unwrap();
        assert_eq!((report.chapter, report.page), (1, 5));
    }

    #[test]
    fn progress_maps_to_floor_of_scaled_count() {
        assert_eq!(progress_to_page(0.0, 10), 0);
        assert_eq!(progress_to_page(0.55, 10), 5);
        assert_eq!(progress_to_page(1.0, 10), 9);
        assert_eq!(progress_to_page(f32::NAN, 10), 0);
        assert_eq!(progress_to_page(0.5, 0), 0);
    }

    #[test]
    fn shrinking_page_count_reclamps_current_page() {
        let mut model = model_with_counts(&[10]);
        model.settle(0, 9);
        model.set_page_count(0, 5);
        assert_eq!(model.current().page, 4);
    }

    #[test]
    fn restored_progress_is_kept_until_measured() {
        let mut model = PositionModel::new(3);
        model.restore(2, 0, 0.4);
        assert_eq!(model.current().progress, 0.4);
        assert_eq!(model.invalidate_page_count(2), None);
    }
}
