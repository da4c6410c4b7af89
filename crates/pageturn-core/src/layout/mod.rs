//! Render unit planning for single and dual page layouts.

use alloc::vec::Vec;

use crate::viewport::ViewportSize;

/// Reading direction of a book or series.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReadingDirection {
    #[default]
    LeftToRight,
    RightToLeft,
    Vertical,
    /// Continuous vertical strip without page boundaries inside a chapter.
    Webtoon,
}

impl ReadingDirection {
    pub const fn is_rtl(self) -> bool {
        matches!(self, Self::RightToLeft)
    }

    /// Whether the main scroll axis is vertical.
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Vertical | Self::Webtoon)
    }

    pub const fn is_continuous(self) -> bool {
        matches!(self, Self::Webtoon)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::LeftToRight => "ltr",
            Self::RightToLeft => "rtl",
            Self::Vertical => "vertical",
            Self::Webtoon => "webtoon",
        }
    }

    /// Parses series metadata labels. Unknown values map to `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("ltr") || label.eq_ignore_ascii_case("left_to_right") {
            Some(Self::LeftToRight)
        } else if label.eq_ignore_ascii_case("rtl") || label.eq_ignore_ascii_case("right_to_left")
        {
            Some(Self::RightToLeft)
        } else if label.eq_ignore_ascii_case("vertical") {
            Some(Self::Vertical)
        } else if label.eq_ignore_ascii_case("webtoon") {
            Some(Self::Webtoon)
        } else {
            None
        }
    }
}

/// Smallest navigable step shown to the reader.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RenderUnit {
    Single(u16),
    /// Two facing pages, `second == first + 1`.
    Pair(u16, u16),
    /// End-of-content slot hosting the next chapter / end of book UI. Not a page.
    End,
}

impl RenderUnit {
    pub const fn first_page(self) -> Option<u16> {
        match self {
            Self::Single(page) | Self::Pair(page, _) => Some(page),
            Self::End => None,
        }
    }

    pub const fn last_page(self) -> Option<u16> {
        match self {
            Self::Single(page) | Self::Pair(_, page) => Some(page),
            Self::End => None,
        }
    }

    pub const fn is_end(self) -> bool {
        matches!(self, Self::End)
    }

    pub const fn contains(self, page: u16) -> bool {
        match self {
            Self::Single(only) => only == page,
            Self::Pair(first, second) => first == page || second == page,
            Self::End => false,
        }
    }

    /// Page indices covered by this unit in traversal order.
    pub fn pages(self) -> impl Iterator<Item = u16> {
        let (first, second) = match self {
            Self::Single(page) => (Some(page), None),
            Self::Pair(first, second) => (Some(first), Some(second)),
            Self::End => (None, None),
        };
        first.into_iter().chain(second)
    }

    /// `(left, right)` page placement on screen.
    ///
    /// RTL only swaps the visual sides of a pair; traversal stays ascending.
    pub const fn visual_sides(self, direction: ReadingDirection) -> (Option<u16>, Option<u16>) {
        match self {
            Self::Single(page) => (Some(page), None),
            Self::Pair(first, second) => {
                if direction.is_rtl() {
                    (Some(second), Some(first))
                } else {
                    (Some(first), Some(second))
                }
            }
            Self::End => (None, None),
        }
    }
}

/// User preference for how many pages share the screen.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PageLayout {
    #[default]
    Single,
    Dual,
}

impl PageLayout {
    /// Dual pages are only shown when the viewport is in landscape.
    pub fn dual_active(self, viewport: ViewportSize) -> bool {
        matches!(self, Self::Dual) && viewport.is_landscape()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlanOptions {
    pub dual_page: bool,
    pub isolate_cover: bool,
    pub direction: ReadingDirection,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            dual_page: false,
            isolate_cover: true,
            direction: ReadingDirection::LeftToRight,
        }
    }
}

/// Ordered render units for one chapter, always terminated by [`RenderUnit::End`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LayoutPlan {
    units: Vec<RenderUnit>,
    page_count: u16,
    direction: ReadingDirection,
}

pub fn plan(page_count: u16, options: &PlanOptions) -> LayoutPlan {
    plan_with(page_count, options, |_| false)
}

/// Like [`plan`], with `isolated` flagging pages that must render alone
/// (wide spreads). Pairing restarts after an isolated page.
pub fn plan_with<F>(page_count: u16, options: &PlanOptions, isolated: F) -> LayoutPlan
where
    F: Fn(u16) -> bool,
{
    let mut units = Vec::with_capacity(page_count as usize + 1);

    if !options.dual_page || page_count == 1 {
        units.extend((0..page_count).map(RenderUnit::Single));
    } else {
        let mut page = 0u16;
        while page < page_count {
            let next = page + 1;
            let alone = (page == 0 && options.isolate_cover)
                || isolated(page)
                || next >= page_count
                || isolated(next);
            if alone {
                units.push(RenderUnit::Single(page));
                page = next;
            } else {
                units.push(RenderUnit::Pair(page, next));
                page = next + 1;
            }
        }
    }

    units.push(RenderUnit::End);
    LayoutPlan {
        units,
        page_count,
        direction: options.direction,
    }
}

impl LayoutPlan {
    pub fn units(&self) -> &[RenderUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// A plan always holds at least the end unit.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of pages, excluding the end unit.
    pub const fn page_count(&self) -> u16 {
        self.page_count
    }

    pub const fn direction(&self) -> ReadingDirection {
        self.direction
    }

    pub fn unit(&self, index: usize) -> Option<RenderUnit> {
        self.units.get(index).copied()
    }

    pub fn end_index(&self) -> usize {
        self.units.len() - 1
    }

    /// Unit hosting `page`; pages past the end map to the end unit.
    pub fn unit_index_for_page(&self, page: u16) -> usize {
        if page >= self.page_count {
            return self.end_index();
        }
        self.units
            .partition_point(|unit| unit.last_page().is_some_and(|last| last < page))
    }

    pub fn next_unit(&self, index: usize) -> Option<usize> {
        let next = index.checked_add(1)?;
        (next < self.units.len()).then_some(next)
    }

    pub fn previous_unit(&self, index: usize) -> Option<usize> {
        index.checked_sub(1).filter(|prev| *prev < self.units.len())
    }

    pub fn first_page_of(&self, index: usize) -> Option<u16> {
        self.unit(index)?.first_page()
    }

    /// First page of the unit at `index`; the end unit reports the last page.
    pub fn anchor_page(&self, index: usize) -> Option<u16> {
        match self.unit(index)? {
            RenderUnit::End => self.page_count.checked_sub(1),
            unit => unit.first_page(),
        }
    }
}

#[cfg(test)]
mod tests;
