//! Single-threaded dispatcher tying the reader components together.
//!
//! Hosts feed [`ReaderEvent`]s (input, asset completions, measurements,
//! viewport and settings changes) and drain [`ReaderCommand`]s (loads,
//! evictions, measurement requests, what to show, progress to save).

use alloc::vec::Vec;

use log::{debug, info};

use crate::{
    TickResult,
    input::{InputEvent, InputProvider, Key},
    layout::{self, LayoutPlan, RenderUnit},
    measure::{
        MeasureConfig, MeasureOutcome, MeasureRequest, PaginationMeasurer, Pagination,
        PreviousPagination,
    },
    position::{NavigationTarget, PageTarget, Position, PositionModel},
    prefetch::{AssetKey, AssetState, LoadOutcome, PrefetchConfig, PrefetchScheduler, PrefetchSnapshot},
    progress::ProgressReport,
    settings::{ReaderSettings, ReflowStyle},
    viewport::{
        CrossingDirection, DragUpdate, Edge, ViewportConfig, ViewportController, ViewportFeedback,
        ViewportIntent, ViewportSize, key_intent, progress_delta,
    },
    webtoon::{WebtoonConfig, WebtoonStrip},
};

/// What a chapter is made of.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChapterKind {
    Images { page_count: u16 },
    /// Reflowable document paginated by measurement.
    Reflow,
}

impl ChapterKind {
    pub const fn is_reflow(self) -> bool {
        matches!(self, Self::Reflow)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BookLayout {
    chapters: Vec<ChapterKind>,
}

impl BookLayout {
    pub fn new(chapters: Vec<ChapterKind>) -> Self {
        Self { chapters }
    }

    pub fn chapter_count(&self) -> u16 {
        self.chapters.len().min(u16::MAX as usize) as u16
    }

    pub fn kind(&self, chapter: u16) -> Option<ChapterKind> {
        self.chapters.get(chapter as usize).copied()
    }

    pub fn chapters(&self) -> &[ChapterKind] {
        &self.chapters
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    pub viewport: ViewportConfig,
    pub prefetch: PrefetchConfig,
    pub measure: MeasureConfig,
    pub webtoon: WebtoonConfig,
    pub viewport_size: ViewportSize,
    /// Controls hide themselves after this long without interaction.
    pub controls_hide_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            prefetch: PrefetchConfig::default(),
            measure: MeasureConfig::default(),
            webtoon: WebtoonConfig::default(),
            viewport_size: ViewportSize::new(1080, 1920),
            controls_hide_ms: 3_000,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ReaderEvent {
    Input(InputEvent),
    AssetLoaded {
        key: AssetKey,
        generation: u32,
        width: u32,
        height: u32,
    },
    AssetFailed {
        key: AssetKey,
        generation: u32,
    },
    ContentMeasured {
        generation: u32,
        content_height: u32,
        viewport_height: u32,
    },
    ViewportResized(ViewportSize),
    StyleChanged(ReflowStyle),
    SettingsChanged(ReaderSettings),
    JumpTo {
        chapter: u16,
        page: u16,
    },
    JumpToProgress {
        chapter: u16,
        progress: f32,
    },
    RetryAsset(AssetKey),
    /// Saved progress to resume from.
    Restore {
        chapter: u16,
        page: u16,
        progress: f32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ReaderCommand {
    LoadAsset { key: AssetKey, generation: u32 },
    EvictAsset(AssetKey),
    MeasureContent(MeasureRequest),
    ShowUnit { chapter: u16, unit: RenderUnit },
    /// Webtoon strip offset in logical pixels.
    ScrollTo { chapter: u16, offset: f32 },
    SaveProgress(ProgressReport),
    Feedback(ViewportFeedback),
    ControlsVisible(bool),
    EndOfBook,
}

pub struct ReaderEngine {
    book: BookLayout,
    settings: ReaderSettings,
    config: EngineConfig,
    viewport_size: ViewportSize,
    position: PositionModel,
    plan: LayoutPlan,
    unit_index: usize,
    /// Chapter whose plan is loaded.
    chapter: u16,
    viewport: ViewportController,
    prefetch: PrefetchScheduler,
    measurer: PaginationMeasurer,
    webtoon: Option<WebtoonStrip>,
    /// Wide pages of the current chapter; they never share a spread.
    wide_pages: Vec<u16>,
    commands: Vec<ReaderCommand>,
    opened: bool,
    gesture_active: bool,
    controls_visible: bool,
    controls_hide_at_ms: Option<u64>,
    end_of_book_sent: bool,
    last_shown: Option<(u16, RenderUnit)>,
    pending_redraw: bool,
}

include!("runtime.rs");
include!("input.rs");
include!("navigation.rs");
