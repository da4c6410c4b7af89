#![cfg_attr(not(test), no_std)]

//! Headless reader pagination and viewport engine.
//!
//! The engine tracks where the reader is, plans which pages render together,
//! turns taps and drags into page and chapter turns, schedules asset loads
//! around the visible unit and paginates reflowable chapters from measured
//! content heights. Hosts talk to it through [`reader::ReaderEvent`] and
//! [`reader::ReaderCommand`] values only.

extern crate alloc;

pub mod input;
pub mod layout;
pub mod measure;
pub mod position;
pub mod prefetch;
pub mod progress;
pub mod reader;
pub mod settings;
pub mod viewport;
pub mod webtoon;

pub use layout::{LayoutPlan, PageLayout, PlanOptions, ReadingDirection, RenderUnit};
pub use position::{NavigationTarget, Position, PositionModel};
pub use prefetch::{AssetKey, PrefetchConfig, PrefetchScheduler};
pub use progress::{ProgressPersister, ProgressReport};
pub use reader::{BookLayout, ChapterKind, EngineConfig, ReaderCommand, ReaderEngine, ReaderEvent};
pub use settings::{ReaderSettings, ReflowStyle};
pub use viewport::{ViewportConfig, ViewportController, ViewportIntent, ViewportSize};

/// Outcome of one engine tick.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TickResult {
    NoRender,
    RenderRequested,
}
