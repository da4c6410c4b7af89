use std::path::PathBuf;

use clap::Parser;
use pageturn_core::{
    EngineConfig, PageLayout, ReaderSettings, ReadingDirection, ReflowStyle, ViewportSize,
};

const PROGRESS_SAVE_DEBOUNCE_MS: u64 = 4_000;
const PROGRESS_SAVE_MIN_SPACING_MS: u64 = 500;
const DEFAULT_WORKERS: usize = 2;
const MAX_WORKERS: usize = 16;
const DEFAULT_CACHE_BUDGET_MB: usize = 64;

/// Headless reader runner: plays a script of input over a book directory.
#[derive(Parser, Debug)]
#[command(name = "pageturn", version, long_about = None)]
pub(super) struct Cli {
    /// Book directory, one sub-directory per chapter
    pub(super) book_dir: PathBuf,

    /// Input script; reads to the end of the book when omitted
    pub(super) script: Option<PathBuf>,

    /// Reading direction: ltr, rtl, vertical or webtoon
    #[arg(long, env = "PAGETURN_DIRECTION", value_parser = parse_direction)]
    direction: Option<ReadingDirection>,

    /// Page layout: single or dual
    #[arg(long, env = "PAGETURN_LAYOUT", value_parser = parse_layout)]
    layout: Option<PageLayout>,

    /// Whether side taps turn pages
    #[arg(long, env = "PAGETURN_TAP_TO_TURN")]
    tap_to_turn: Option<bool>,

    /// Reflow style, e.g. `fontFamily=serif;typeScale=1.25;theme=dark`
    #[arg(long, env = "PAGETURN_STYLE", value_parser = parse_style)]
    style: Option<ReflowStyle>,

    /// Viewport size as `WxH`
    #[arg(long, env = "PAGETURN_VIEWPORT", value_parser = parse_viewport)]
    viewport: Option<ViewportSize>,

    /// Pages preloaded on each side of the visible unit
    #[arg(long, env = "PAGETURN_PREFETCH_RADIUS")]
    prefetch_radius: Option<u16>,

    /// Asset loader threads, clamped to 1..=16
    #[arg(long, env = "PAGETURN_WORKERS", default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Decoded asset cache budget in MiB
    #[arg(long, env = "PAGETURN_CACHE_MB", default_value_t = DEFAULT_CACHE_BUDGET_MB)]
    cache_mb: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct HostConfig {
    pub(super) engine: EngineConfig,
    pub(super) settings: ReaderSettings,
    pub(super) progress_debounce_ms: u64,
    pub(super) progress_min_spacing_ms: u64,
    pub(super) workers: usize,
    pub(super) cache_budget_bytes: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            settings: ReaderSettings::default(),
            progress_debounce_ms: PROGRESS_SAVE_DEBOUNCE_MS,
            progress_min_spacing_ms: PROGRESS_SAVE_MIN_SPACING_MS,
            workers: DEFAULT_WORKERS,
            cache_budget_bytes: DEFAULT_CACHE_BUDGET_MB << 20,
        }
    }
}

impl HostConfig {
    /// Defaults overridden by whatever `cli` set from flags or `PAGETURN_*`.
    pub(super) fn from_cli(cli: &Cli) -> Self {
        let mut config = Self::default();

        if let Some(direction) = cli.direction {
            config.settings.direction = direction;
        }
        if let Some(layout) = cli.layout {
            config.settings.page_layout = layout;
        }
        if let Some(tap_to_turn) = cli.tap_to_turn {
            config.settings.tap_to_turn = tap_to_turn;
        }
        if let Some(style) = cli.style {
            config.settings.style = style;
        }
        if let Some(viewport) = cli.viewport {
            config.engine.viewport_size = viewport;
        }
        if let Some(radius) = cli.prefetch_radius {
            config.engine.prefetch.radius = radius;
        }
        config.workers = cli.workers.clamp(1, MAX_WORKERS);
        config.cache_budget_bytes = cli.cache_mb.saturating_mul(1 << 20);

        config.engine.viewport.tap_to_turn = config.settings.tap_to_turn;
        config
    }
}

fn parse_direction(value: &str) -> Result<ReadingDirection, String> {
    ReadingDirection::from_label(value)
        .ok_or_else(|| format!("expected ltr, rtl, vertical or webtoon, got {:?}", value))
}

fn parse_layout(value: &str) -> Result<PageLayout, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "single" => Ok(PageLayout::Single),
        "dual" => Ok(PageLayout::Dual),
        _ => Err(format!("expected single or dual, got {:?}", value)),
    }
}

fn parse_style(value: &str) -> Result<ReflowStyle, String> {
    Ok(ReflowStyle::decode_raw(value))
}

/// `1920x1080`
fn parse_viewport(value: &str) -> Result<ViewportSize, String> {
    let size = value
        .trim()
        .split_once(['x', 'X'])
        .and_then(|(width, height)| {
            Some(ViewportSize::new(
                width.trim().parse().ok()?,
                height.trim().parse().ok()?,
            ))
        })
        .filter(|size| !size.is_empty());
    size.ok_or_else(|| format!("expected WIDTHxHEIGHT, got {:?}", value))
}
