//! Continuous vertical strip for webtoon chapters.

use alloc::vec::Vec;

use log::debug;

use crate::viewport::Edge;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WebtoonConfig {
    /// Distance from the content end at which the last page counts as current.
    pub bottom_threshold: f32,
    /// Height changes of pages above the viewport smaller than this are ignored.
    pub height_change_threshold: f32,
    /// Tap / key scroll step as a fraction of the viewport height.
    pub scroll_amount: f32,
}

impl Default for WebtoonConfig {
    fn default() -> Self {
        Self {
            bottom_threshold: 120.0,
            height_change_threshold: 1.0,
            scroll_amount: 0.8,
        }
    }
}

/// Result of moving the strip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollOutcome {
    /// Movement the strip absorbed.
    pub applied: f32,
    /// Movement left over at an edge; feeds boundary overscroll.
    pub remainder: f32,
    pub edge: Edge,
}

#[derive(Clone, Debug)]
pub struct WebtoonStrip {
    config: WebtoonConfig,
    /// Page height / width, `None` until the image size is known.
    aspects: Vec<Option<f32>>,
    width: f32,
    viewport_height: f32,
    offset: f32,
}

impl WebtoonStrip {
    pub fn new(page_count: u16, width: u32, viewport_height: u32, config: WebtoonConfig) -> Self {
        Self {
            config,
            aspects: alloc::vec![None; page_count as usize],
            width: width.max(1) as f32,
            viewport_height: viewport_height as f32,
            offset: 0.0,
        }
    }

    pub fn page_count(&self) -> u16 {
        self.aspects.len() as u16
    }

    pub const fn offset(&self) -> f32 {
        self.offset
    }

    pub const fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    /// Rendered height of `page`; unknown sizes use a square placeholder.
    pub fn page_height(&self, page: u16) -> f32 {
        let aspect = self
            .aspects
            .get(page as usize)
            .copied()
            .flatten()
            .unwrap_or(1.0);
        self.width * aspect
    }

    pub fn page_top(&self, page: u16) -> f32 {
        (0..page.min(self.page_count()))
            .map(|index| self.page_height(index))
            .sum()
    }

    pub fn content_height(&self) -> f32 {
        self.page_top(self.page_count())
    }

    pub fn max_offset(&self) -> f32 {
        (self.content_height() - self.viewport_height).max(0.0)
    }

    pub fn edge(&self) -> Edge {
        let max = self.max_offset();
        Edge::from_bounds(self.offset <= 0.0, self.offset >= max)
    }

    /// Page under the viewport center, or the last page once the viewport
    /// bottom is within the bottom threshold of the content end.
    pub fn current_page(&self) -> u16 {
        let count = self.page_count();
        if count == 0 {
            return 0;
        }
        let bottom = self.offset + self.viewport_height;
        if bottom >= self.content_height() - self.config.bottom_threshold {
            return count - 1;
        }

        let center = self.offset + self.viewport_height / 2.0;
        let mut top = 0.0;
        for page in 0..count {
            top += self.page_height(page);
            if center < top {
                return page;
            }
        }
        count - 1
    }

    /// Resizes the viewport, keeping the current page top in place.
    pub fn set_viewport(&mut self, width: u32, viewport_height: u32) {
        let page = self.current_page();
        let into_page = self.offset - self.page_top(page);
        let ratio = width.max(1) as f32 / self.width;

        self.width = width.max(1) as f32;
        self.viewport_height = viewport_height as f32;
        self.offset = (self.page_top(page) + into_page * ratio).clamp(0.0, self.max_offset());
    }

    /// Records the decoded size of `page`. Pages above the current one shift
    /// the offset by their height change so visible content stays put.
    pub fn set_page_size(&mut self, page: u16, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        let current = self.current_page();
        let old_height = self.page_height(page);
        let Some(slot) = self.aspects.get_mut(page as usize) else {
            return false;
        };
        let aspect = height as f32 / width as f32;
        if *slot == Some(aspect) {
            return false;
        }
        *slot = Some(aspect);

        let diff = self.page_height(page) - old_height;
        let significant = diff > self.config.height_change_threshold
            || diff < -self.config.height_change_threshold;
        if page < current && significant {
            self.offset += diff;
            debug!(
                "webtoon: anchor shift page={} diff={:.1} offset={:.1}",
                page, diff, self.offset
            );
        }
        self.offset = self.offset.clamp(0.0, self.max_offset());
        true
    }

    /// Moves the strip by `delta` (positive scrolls toward later pages).
    pub fn scroll_by(&mut self, delta: f32) -> ScrollOutcome {
        let target = self.offset + delta;
        let clamped = target.clamp(0.0, self.max_offset());
        let applied = clamped - self.offset;
        self.offset = clamped;
        ScrollOutcome {
            applied,
            remainder: target - clamped,
            edge: self.edge(),
        }
    }

    /// One tap / key step forward or backward.
    pub fn step(&mut self, forward: bool) -> ScrollOutcome {
        let amount = self.viewport_height * self.config.scroll_amount;
        self.scroll_by(if forward { amount } else { -amount })
    }

    pub fn scroll_to_page(&mut self, page: u16) {
        let page = page.min(self.page_count().saturating_sub(1));
        self.offset = self.page_top(page).clamp(0.0, self.max_offset());
    }

    pub fn scroll_to_end(&mut self) {
        self.offset = self.max_offset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(pages: u16) -> WebtoonStrip {
        // 1000 px wide pages, 800 px viewport.
        WebtoonStrip::new(pages, 1000, 800, WebtoonConfig::default())
    }

    #[test]
    fn current_page_is_under_viewport_center() {
        let mut strip = strip(5);
        assert_eq!(strip.current_page(), 0);

        let _ = strip.scroll_by(700.0);
        // Center at 1100 px.
        assert_eq!(strip.current_page(), 1);
    }

    #[test]
    fn near_bottom_snaps_to_last_page() {
        let mut strip = strip(5);
        // Content 5000, viewport bottom at 4900 is within 120 px of the end.
        let _ = strip.scroll_by(4100.0);
        assert_eq!(strip.current_page(), 4);
    }

    #[test]
    fn scroll_is_clamped_and_reports_edges() {
        let mut strip = strip(3);
        assert_eq!(strip.edge(), Edge::Start);

        let outcome = strip.scroll_by(-50.0);
        assert_eq!(outcome.applied, 0.0);
        assert_eq!(outcome.remainder, -50.0);
        assert_eq!(outcome.edge, Edge::Start);

        let outcome = strip.scroll_by(5000.0);
        assert_eq!(outcome.applied, 2200.0);
        assert_eq!(outcome.remainder, 2800.0);
        assert_eq!(outcome.edge, Edge::End);
    }

    #[test]
    fn short_content_is_pinned_at_both_ends() {
        let mut strip = WebtoonStrip::new(1, 1000, 2000, WebtoonConfig::default());
        assert_eq!(strip.edge(), Edge::Both);
        assert_eq!(strip.scroll_by(30.0).remainder, 30.0);
    }

    #[test]
    fn taller_page_above_viewport_shifts_the_offset() {
        let mut strip = strip(5);
        strip.scroll_to_page(3);
        assert_eq!(strip.offset(), 3000.0);

        assert!(strip.set_page_size(0, 1000, 1500));
        assert_eq!(strip.offset(), 3500.0);
        assert_eq!(strip.current_page(), 3);

        // Pages below the current one do not move the viewport.
        assert!(strip.set_page_size(4, 1000, 2000));
        assert_eq!(strip.offset(), 3500.0);
    }

    #[test]
    fn sub_threshold_height_changes_are_ignored() {
        let mut strip = strip(5);
        strip.scroll_to_page(3);
        // Half a pixel taller.
        assert!(strip.set_page_size(0, 2000, 2001));
        assert_eq!(strip.offset(), 3000.0);
        assert!(!strip.set_page_size(0, 2000, 2001));
    }

    #[test]
    fn step_moves_by_scroll_amount() {
        let mut strip = strip(5);
        let outcome = strip.step(true);
        assert_eq!(outcome.applied, 640.0);
        let outcome = strip.step(false);
        assert_eq!(outcome.applied, -640.0);
        assert_eq!(strip.offset(), 0.0);
    }
}
