//! Headless runner: drives the reader engine over a book directory with
//! scripted input, loading assets on worker threads and persisting progress.

use std::{fs, process::ExitCode, time::Duration};

use clap::Parser;
use log::{debug, info, warn};
use pageturn_core::{
    AssetKey, ReaderCommand, ReaderEngine, ReaderEvent, TickResult, ViewportSize,
    input::{InputEvent, ScriptedInput},
};

use asset_cache::{AssetCache, CachedAsset};
use book_dir::BookDir;
use config::{Cli, HostConfig};
use error::HostError;
use progress_sync::{FileProgressStore, FlushReason, ProgressSyncState};
use script::{Script, ScriptStep, screen_motion};
use surface::ReflowSurface;
use worker_pool::{LoadJob, LoadResult, WorkerPool};

#[path = "main/asset_cache.rs"]
mod asset_cache;
#[path = "main/book_dir.rs"]
mod book_dir;
#[path = "main/config.rs"]
mod config;
#[path = "main/error.rs"]
mod error;
#[path = "main/progress_sync.rs"]
mod progress_sync;
#[path = "main/script.rs"]
mod script;
#[path = "main/surface.rs"]
mod surface;
#[path = "main/worker_pool.rs"]
mod worker_pool;

const FRAME_MS: u64 = 16;
/// Upper bound on frames spent waiting for loads and pagination after a step.
const MAX_SETTLE_FRAMES: u32 = 1_000;
const LOAD_POLL: Duration = Duration::from_millis(50);

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("pageturn: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), HostError> {
    let cli = Cli::parse();
    let script = match &cli.script {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|err| HostError::io(path, err))?;
            Script::parse(&text)?
        }
        None => Script::read_to_end(),
    };

    let config = HostConfig::from_cli(&cli);
    let book = BookDir::open(&cli.book_dir)?;
    let mut session = Session::new(book, config);
    session.restore();
    session.play(&script);
    session.shutdown();
    Ok(())
}

struct Session {
    engine: ReaderEngine,
    book: BookDir,
    cache: AssetCache,
    pool: WorkerPool,
    surface: ReflowSurface,
    store: FileProgressStore,
    progress: ProgressSyncState,
    now_ms: u64,
    in_flight: usize,
    dragging: bool,
    end_of_book: bool,
    rendered_frames: u64,
}

impl Session {
    fn new(book: BookDir, config: HostConfig) -> Self {
        let store = FileProgressStore::new(book.progress_path());
        let progress = ProgressSyncState::new(
            store.load(),
            config.progress_debounce_ms,
            config.progress_min_spacing_ms,
        );
        let engine = ReaderEngine::new(book.layout(), config.settings, config.engine);
        let pool = WorkerPool::new(config.workers);
        info!(
            "session: started book={} chapters={} direction={} viewport={}x{} workers={} cache_bytes={} progress_file={}",
            book.root().display(),
            book.chapters().len(),
            config.settings.direction.label(),
            config.engine.viewport_size.width,
            config.engine.viewport_size.height,
            pool.worker_count(),
            config.cache_budget_bytes,
            store.path().display()
        );

        Self {
            engine,
            cache: AssetCache::new(config.cache_budget_bytes),
            pool,
            surface: ReflowSurface::new(),
            store,
            progress,
            now_ms: 0,
            in_flight: 0,
            dragging: false,
            end_of_book: false,
            rendered_frames: 0,
            book,
        }
    }

    fn restore(&mut self) {
        if let Some(saved) = self.store.load() {
            info!(
                "session: restoring chapter={} page={} progress={:.3}",
                saved.chapter, saved.page, saved.progress
            );
            self.engine.handle_event(
                ReaderEvent::Restore {
                    chapter: saved.chapter,
                    page: saved.page,
                    progress: saved.progress,
                },
                self.now_ms,
            );
        }
        self.frame();
        self.settle();
    }

    fn play(&mut self, script: &Script) {
        for step in &script.steps {
            if script.stop_at_end && self.end_of_book {
                break;
            }
            self.apply(*step);
            self.settle();
        }
    }

    fn shutdown(mut self) {
        if let Some(report) = self.progress.unsaved() {
            self.progress
                .flush(&mut self.store, report, FlushReason::Shutdown, self.now_ms);
        }
        let position = self.engine.position();
        info!(
            "session: finished chapter={} page={} progress={:.3} frames={} cached={} cached_bytes={}",
            position.chapter,
            position.page,
            position.progress,
            self.rendered_frames,
            self.cache.len(),
            self.cache.bytes()
        );
        self.pool.shutdown();
    }

    fn apply(&mut self, step: ScriptStep) {
        let direction = self.engine.settings().direction;
        match step {
            ScriptStep::Input(event) => self.pump(&[event]),
            ScriptStep::Drag(delta) => {
                let (dx, dy) = screen_motion(direction, delta);
                if self.dragging {
                    self.pump(&[InputEvent::DragMove { dx, dy }]);
                } else {
                    self.dragging = true;
                    self.pump(&[InputEvent::DragBegin, InputEvent::DragMove { dx, dy }]);
                }
            }
            ScriptStep::Release(velocity) => {
                let (vx, vy) = screen_motion(direction, velocity);
                self.dragging = false;
                self.pump(&[InputEvent::DragEnd { vx, vy }]);
            }
            ScriptStep::Resize(size) => self.dispatch(ReaderEvent::ViewportResized(size)),
            ScriptStep::Jump { chapter, page } => {
                self.dispatch(ReaderEvent::JumpTo { chapter, page })
            }
            ScriptStep::Style(style) => self.dispatch(ReaderEvent::StyleChanged(style)),
            ScriptStep::Wait(ms) => {
                let until = self.now_ms.saturating_add(ms);
                while self.now_ms < until {
                    self.frame();
                }
            }
        }
        self.frame();
    }

    fn pump(&mut self, events: &[InputEvent]) {
        let mut input = ScriptedInput::new(events);
        let Ok(applied) = self.engine.pump_input(&mut input, self.now_ms);
        debug!("session: input applied={} at={}", applied, self.now_ms);
        self.process_commands();
    }

    fn dispatch(&mut self, event: ReaderEvent) {
        self.engine.handle_event(event, self.now_ms);
        self.process_commands();
    }

    /// Runs frames until no load is in flight and the chapter is paginated.
    fn settle(&mut self) {
        for _ in 0..MAX_SETTLE_FRAMES {
            let paginating = self.engine.current_unit().is_none();
            if self.in_flight == 0 && !paginating {
                return;
            }
            if self.in_flight > 0
                && let Some(result) = self.pool.recv_timeout(LOAD_POLL)
            {
                self.on_load_result(result);
            }
            self.frame();
        }
        warn!(
            "session: settle gave up in_flight={} at={}",
            self.in_flight, self.now_ms
        );
    }

    fn frame(&mut self) {
        self.now_ms = self.now_ms.saturating_add(FRAME_MS);

        let results = self.pool.try_results().collect::<Vec<_>>();
        for result in results {
            self.on_load_result(result);
        }

        if self.engine.tick(self.now_ms) == TickResult::RenderRequested {
            self.rendered_frames += 1;
            debug!(
                "render: frame={} unit={:?} zoom={:.2}",
                self.rendered_frames,
                self.engine.current_unit(),
                self.engine.viewport().zoom_scale()
            );
        }
        self.process_commands();
        self.progress.poll(&mut self.store, self.now_ms);
    }

    fn process_commands(&mut self) {
        loop {
            let commands = self.engine.drain_commands();
            if commands.is_empty() {
                return;
            }
            for command in commands {
                self.on_command(command);
            }
        }
    }

    fn on_command(&mut self, command: ReaderCommand) {
        match command {
            ReaderCommand::LoadAsset { key, generation } => self.load(key, generation),
            ReaderCommand::EvictAsset(key) => {
                if self.cache.remove(key) {
                    debug!("cache: released key={:?}", key);
                }
            }
            ReaderCommand::MeasureContent(request) => {
                let viewport: ViewportSize = self.engine.viewport_size();
                let content_height =
                    self.surface
                        .measure(&request, &self.engine.settings().style, viewport);
                self.engine.handle_event(
                    ReaderEvent::ContentMeasured {
                        generation: request.generation,
                        content_height,
                        viewport_height: viewport.height,
                    },
                    self.now_ms,
                );
            }
            ReaderCommand::ShowUnit { chapter, unit } => {
                let name = self
                    .book
                    .chapters()
                    .get(chapter as usize)
                    .map(|chapter| chapter.name.as_str())
                    .unwrap_or_default();
                info!("show: chapter={} ({}) unit={:?}", chapter, name, unit);
            }
            ReaderCommand::ScrollTo { chapter, offset } => {
                debug!("show: chapter={} scroll_offset={:.1}", chapter, offset);
            }
            ReaderCommand::SaveProgress(report) => {
                if let Some((report, reason)) = self.progress.observe(report, self.now_ms) {
                    self.progress
                        .flush(&mut self.store, report, reason, self.now_ms);
                }
            }
            ReaderCommand::Feedback(feedback) => debug!("feedback: {:?}", feedback),
            ReaderCommand::ControlsVisible(visible) => debug!("controls: visible={}", visible),
            ReaderCommand::EndOfBook => {
                info!("session: end of book at={}", self.now_ms);
                self.end_of_book = true;
            }
        }
    }

    fn load(&mut self, key: AssetKey, generation: u32) {
        if let Some(cached) = self.cache.get(key) {
            if let AssetKey::Document { chapter } = key
                && !self.surface.has_document(chapter)
            {
                self.surface.load_document(chapter, &cached.bytes);
            }
            self.engine.handle_event(
                ReaderEvent::AssetLoaded {
                    key,
                    generation,
                    width: cached.width,
                    height: cached.height,
                },
                self.now_ms,
            );
            return;
        }

        let submitted = self.book.asset_path(key).is_some_and(|path| {
            self.pool.submit(LoadJob {
                key,
                generation,
                path: path.to_path_buf(),
            })
        });
        if submitted {
            self.in_flight += 1;
        } else {
            warn!("loader: no source for key={:?}", key);
            self.engine
                .handle_event(ReaderEvent::AssetFailed { key, generation }, self.now_ms);
        }
    }

    fn on_load_result(&mut self, result: LoadResult) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let LoadResult {
            key,
            generation,
            outcome,
        } = result;

        let event = match outcome {
            Ok(asset) => {
                if let AssetKey::Document { chapter } = key {
                    self.surface.load_document(chapter, &asset.bytes);
                }
                let event = ReaderEvent::AssetLoaded {
                    key,
                    generation,
                    width: asset.width,
                    height: asset.height,
                };
                self.cache.insert(
                    key,
                    CachedAsset {
                        bytes: asset.bytes.into(),
                        width: asset.width,
                        height: asset.height,
                    },
                );
                event
            }
            Err(err) => {
                warn!("loader: failed key={:?} err={}", key, err);
                ReaderEvent::AssetFailed { key, generation }
            }
        };
        self.engine.handle_event(event, self.now_ms);
        self.process_commands();
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, path::Path};

    use super::*;

    fn write_page(path: &Path, width: u32, height: u32) {
        let mut bytes = Vec::new();
        image::RgbImage::new(width, height)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        fs::write(path, bytes).unwrap();
    }

    fn host_config() -> HostConfig {
        HostConfig {
            workers: 1,
            ..HostConfig::default()
        }
    }

    #[test]
    fn read_to_end_saves_and_restores_the_last_page() {
        let dir = tempfile::tempdir().unwrap();
        let chapter = dir.path().join("01");
        fs::create_dir(&chapter).unwrap();
        for name in ["a.png", "b.png", "c.png"] {
            write_page(&chapter.join(name), 12, 20);
        }

        let mut session = Session::new(BookDir::open(dir.path()).unwrap(), host_config());
        session.restore();
        session.play(&Script::read_to_end());
        assert!(session.end_of_book);
        assert_eq!(session.in_flight, 0);
        session.shutdown();

        let saved = FileProgressStore::new(dir.path().join(".pageturn-progress"))
            .load()
            .unwrap();
        assert_eq!((saved.chapter, saved.page), (0, 2));

        let mut resumed = Session::new(BookDir::open(dir.path()).unwrap(), host_config());
        resumed.restore();
        assert_eq!(resumed.engine.position().page, 2);
        resumed.shutdown();
    }

    #[test]
    fn reflow_chapters_paginate_from_the_surface() {
        let dir = tempfile::tempdir().unwrap();
        let chapter = dir.path().join("01");
        fs::create_dir(&chapter).unwrap();
        fs::write(chapter.join("text.txt"), "lorem ipsum ".repeat(4_000)).unwrap();

        let mut session = Session::new(BookDir::open(dir.path()).unwrap(), host_config());
        session.restore();
        let pages = session.engine.page_count(0).unwrap();
        assert!(pages > 1);
        assert!(session.engine.current_unit().is_some());

        session.apply(ScriptStep::Style(
            session
                .engine
                .settings()
                .style
                .with_type_scale_percent(200),
        ));
        session.settle();
        assert!(session.engine.page_count(0).unwrap() > pages);
        session.shutdown();
    }
}
