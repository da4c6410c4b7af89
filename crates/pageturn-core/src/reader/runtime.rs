impl ReaderEngine {
    pub fn new(book: BookLayout, settings: ReaderSettings, config: EngineConfig) -> Self {
        let mut position = PositionModel::new(book.chapter_count());
        for (chapter, kind) in book.chapters().iter().enumerate() {
            if let ChapterKind::Images { page_count } = kind {
                let _ = position.set_page_count(chapter as u16, *page_count);
            }
        }

        let mut viewport_config = config.viewport;
        viewport_config.tap_to_turn = settings.tap_to_turn;
        let mut viewport = ViewportController::new(viewport_config);
        viewport.set_layout(config.viewport_size, settings.direction);

        let documents = book.chapters().iter().map(|kind| kind.is_reflow()).collect();

        Self {
            settings,
            viewport_size: config.viewport_size,
            position,
            plan: layout::plan(0, &settings.plan_options(config.viewport_size)),
            unit_index: 0,
            chapter: 0,
            viewport,
            prefetch: PrefetchScheduler::new(config.prefetch, documents),
            measurer: PaginationMeasurer::new(config.measure),
            webtoon: None,
            wide_pages: Vec::new(),
            commands: Vec::new(),
            opened: false,
            gesture_active: false,
            controls_visible: false,
            controls_hide_at_ms: None,
            end_of_book_sent: false,
            last_shown: None,
            pending_redraw: false,
            book,
            config,
        }
    }

    pub const fn position(&self) -> Position {
        self.position.current()
    }

    pub const fn target(&self) -> Option<NavigationTarget> {
        self.position.target()
    }

    pub const fn plan(&self) -> &LayoutPlan {
        &self.plan
    }

    pub const fn settings(&self) -> &ReaderSettings {
        &self.settings
    }

    pub const fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub const fn viewport_size(&self) -> ViewportSize {
        self.viewport_size
    }

    pub const fn controls_visible(&self) -> bool {
        self.controls_visible
    }

    pub fn page_count(&self, chapter: u16) -> Option<u16> {
        self.position.page_count(chapter)
    }

    pub fn webtoon(&self) -> Option<&WebtoonStrip> {
        self.webtoon.as_ref()
    }

    /// Visible unit, `None` while the current chapter is being paginated.
    pub fn current_unit(&self) -> Option<RenderUnit> {
        if self.is_paginating() {
            return None;
        }
        self.plan.unit(self.unit_index)
    }

    pub fn asset_state(&self, key: AssetKey) -> Option<AssetState> {
        self.prefetch.state(key)
    }

    pub fn drain_commands(&mut self) -> Vec<ReaderCommand> {
        core::mem::take(&mut self.commands)
    }

    pub fn handle_event(&mut self, event: ReaderEvent, now_ms: u64) {
        if let ReaderEvent::Restore {
            chapter,
            page,
            progress,
        } = event
        {
            self.restore(chapter, page, progress, now_ms);
            return;
        }
        self.ensure_open(now_ms);

        match event {
            ReaderEvent::Input(input) => self.apply_input(input, now_ms),
            ReaderEvent::AssetLoaded {
                key,
                generation,
                width,
                height,
            } => self.on_asset_loaded(key, generation, width, height, now_ms),
            ReaderEvent::AssetFailed { key, generation } => {
                if self.prefetch.on_failed(key, generation) == LoadOutcome::Failed
                    && self.is_visible(key)
                {
                    self.pending_redraw = true;
                }
            }
            ReaderEvent::ContentMeasured {
                generation,
                content_height,
                viewport_height,
            } => {
                let outcome =
                    self.measurer
                        .on_sample(generation, content_height, viewport_height, now_ms);
                if let MeasureOutcome::Finalized(pagination) = outcome {
                    self.apply_pagination(pagination, now_ms);
                }
            }
            ReaderEvent::ViewportResized(size) => self.resize(size, now_ms),
            ReaderEvent::StyleChanged(style) => self.restyle(style, now_ms),
            ReaderEvent::SettingsChanged(settings) => self.apply_settings(settings, now_ms),
            ReaderEvent::JumpTo { chapter, page } => {
                let target = self.position.set_target(chapter, page);
                self.navigate(target, now_ms);
            }
            ReaderEvent::JumpToProgress { chapter, progress } => {
                let target = self.position.set_target_progress(chapter, progress);
                self.navigate(target, now_ms);
            }
            ReaderEvent::RetryAsset(key) => {
                if let Some(request) = self.prefetch.retry(key) {
                    self.commands.push(ReaderCommand::LoadAsset {
                        key: request.key,
                        generation: request.generation,
                    });
                }
            }
            ReaderEvent::Restore { .. } => {}
        }
    }

    pub fn tick(&mut self, now_ms: u64) -> TickResult {
        self.ensure_open(now_ms);

        if let Some(feedback) = self.viewport.tick(now_ms) {
            self.push_feedback(feedback);
        }

        if let Some(hide_at) = self.controls_hide_at_ms
            && now_ms >= hide_at
        {
            self.set_controls_visible(false, now_ms);
        }

        if let Some(pagination) = self.measurer.check_timeout(now_ms) {
            self.apply_pagination(pagination, now_ms);
        }
        if let Some(request) = self.measurer.due(now_ms) {
            self.commands.push(ReaderCommand::MeasureContent(request));
        }

        if self.pending_redraw {
            self.pending_redraw = false;
            return TickResult::RenderRequested;
        }
        TickResult::NoRender
    }

    fn on_asset_loaded(
        &mut self,
        key: AssetKey,
        generation: u32,
        width: u32,
        height: u32,
        now_ms: u64,
    ) {
        if self.prefetch.on_loaded(key, generation, width, height) != LoadOutcome::Ready {
            return;
        }
        if self.is_visible(key) {
            self.pending_redraw = true;
        }

        let AssetKey::Page { chapter, page } = key else {
            return;
        };
        if chapter != self.chapter {
            return;
        }

        if let Some(strip) = self.webtoon.as_mut() {
            if strip.set_page_size(page, width, height) {
                self.push_scroll();
                self.settle_webtoon(now_ms);
            }
            return;
        }

        if width > height && !self.wide_pages.contains(&page) {
            self.wide_pages.push(page);
            if self.plan_options().dual_page {
                debug!("reader: wide page chapter={} page={} replan", chapter, page);
                self.replan();
                self.show_current();
            }
        }
    }

    fn apply_pagination(&mut self, pagination: Pagination, now_ms: u64) {
        if pagination.chapter != self.chapter {
            debug!(
                "reader: pagination for chapter={} ignored, current={}",
                pagination.chapter, self.chapter
            );
            return;
        }
        info!(
            "reader: paginated chapter={} pages={} timed_out={}",
            pagination.chapter, pagination.page_count, pagination.timed_out
        );

        let _ = self
            .position
            .set_page_count(pagination.chapter, pagination.page_count);
        self.replan();

        let pending_here = self
            .position
            .target()
            .is_some_and(|target| target.chapter == pagination.chapter);
        if pending_here {
            self.try_settle(now_ms);
            return;
        }

        let page = pagination
            .anchor_page
            .unwrap_or(self.position.current().page);
        self.settle_on(pagination.chapter, page, now_ms);
    }

    fn resize(&mut self, size: ViewportSize, now_ms: u64) {
        if size == self.viewport_size {
            return;
        }
        debug!(
            "reader: resize {}x{} -> {}x{}",
            self.viewport_size.width, self.viewport_size.height, size.width, size.height
        );
        self.viewport_size = size;
        self.viewport.set_layout(size, self.settings.direction);

        if let Some(strip) = self.webtoon.as_mut() {
            strip.set_viewport(size.width, size.height);
            self.push_scroll();
        }

        if self.invalidate_reflow(now_ms) {
            return;
        }
        self.replan();
        self.show_current();
        self.refresh_prefetch(now_ms, true);
    }

    fn restyle(&mut self, style: ReflowStyle, now_ms: u64) {
        let relayout = self.settings.style != style;
        self.settings.style = style;
        self.pending_redraw = true;
        if relayout {
            let _ = self.invalidate_reflow(now_ms);
        }
    }

    fn apply_settings(&mut self, settings: ReaderSettings, now_ms: u64) {
        let previous = self.settings;
        self.settings = settings;

        let mut viewport_config = self.config.viewport;
        viewport_config.tap_to_turn = settings.tap_to_turn;
        if viewport_config != *self.viewport.config() {
            self.viewport = ViewportController::new(viewport_config);
        }
        self.viewport.set_layout(self.viewport_size, settings.direction);

        if previous.style != settings.style && self.invalidate_reflow(now_ms) {
            return;
        }
        if previous.direction != settings.direction {
            self.rebuild_webtoon();
            self.push_scroll();
        }
        self.replan();
        self.show_current();
        self.refresh_prefetch(now_ms, true);
    }

    /// Drops every reflow page count. Returns `true` when the current chapter
    /// is being remeasured.
    fn invalidate_reflow(&mut self, now_ms: u64) -> bool {
        let mut previous = None;
        for chapter in 0..self.book.chapter_count() {
            if !self.kind(chapter).is_reflow() {
                continue;
            }
            let old = self.position.invalidate_page_count(chapter);
            if chapter == self.chapter {
                previous = old;
            }
        }

        if !self.kind(self.chapter).is_reflow() {
            return false;
        }
        let previous = previous.map(|page_count| PreviousPagination {
            page: self.position.current().page.min(page_count.saturating_sub(1)),
            page_count,
        });
        let _ = self.measurer.begin(self.chapter, now_ms, previous);
        self.last_shown = None;
        self.replan();
        self.pending_redraw = true;
        true
    }

    fn refresh_prefetch(&mut self, now_ms: u64, force: bool) {
        if self.gesture_active && !force && !self.prefetch.admit_during_gesture(now_ms) {
            return;
        }
        let page_count = match self.kind(self.chapter) {
            ChapterKind::Images { page_count } => Some(page_count),
            ChapterKind::Reflow => None,
        };
        let unit = self.plan.unit(self.unit_index).unwrap_or(RenderUnit::End);
        let anchor_page = match &self.webtoon {
            Some(strip) => strip.current_page(),
            None => self.plan.anchor_page(self.unit_index).unwrap_or(0),
        };
        let snapshot = PrefetchSnapshot {
            chapter: self.chapter,
            page_count,
            unit,
            anchor_page,
        };

        let plan = self.prefetch.on_position_changed(&snapshot);
        for key in plan.to_evict.iter() {
            self.commands.push(ReaderCommand::EvictAsset(*key));
        }
        for request in plan.to_load.iter() {
            self.commands.push(ReaderCommand::LoadAsset {
                key: request.key,
                generation: request.generation,
            });
        }
    }

    fn show_current(&mut self) {
        let Some(unit) = self.current_unit() else {
            return;
        };
        let shown = (self.chapter, unit);
        if self.last_shown == Some(shown) {
            return;
        }
        self.last_shown = Some(shown);
        self.pending_redraw = true;
        self.commands.push(ReaderCommand::ShowUnit {
            chapter: self.chapter,
            unit,
        });
    }

    fn replan(&mut self) {
        let options = self.plan_options();
        let on_end = self.plan.unit(self.unit_index).is_some_and(RenderUnit::is_end)
            && self.plan.page_count() > 0;
        let page_count = match self.kind(self.chapter) {
            ChapterKind::Images { page_count } => Some(page_count),
            ChapterKind::Reflow => self.position.page_count(self.chapter),
        };

        self.plan = match page_count {
            Some(count) => {
                let wide = &self.wide_pages;
                layout::plan_with(count, &options, |page| wide.contains(&page))
            }
            None => layout::plan(0, &options),
        };
        self.unit_index = if on_end {
            self.plan.end_index()
        } else {
            self.plan.unit_index_for_page(self.position.current().page)
        };
    }

    fn plan_options(&self) -> layout::PlanOptions {
        let mut options = self.settings.plan_options(self.viewport_size);
        if self.kind(self.chapter).is_reflow() {
            options.dual_page = false;
        }
        options
    }

    fn rebuild_webtoon(&mut self) {
        self.webtoon = match self.kind(self.chapter) {
            ChapterKind::Images { page_count } if self.settings.direction.is_continuous() => {
                Some(WebtoonStrip::new(
                    page_count,
                    self.viewport_size.width,
                    self.viewport_size.height,
                    self.config.webtoon,
                ))
            }
            _ => None,
        };
        let current = self.position.current();
        if let Some(strip) = self.webtoon.as_mut()
            && current.chapter == self.chapter
        {
            strip.scroll_to_page(current.page);
        }
    }

    fn kind(&self, chapter: u16) -> ChapterKind {
        self.book
            .kind(chapter)
            .unwrap_or(ChapterKind::Images { page_count: 0 })
    }

    fn is_paginating(&self) -> bool {
        self.kind(self.chapter).is_reflow() && self.position.page_count(self.chapter).is_none()
    }

    fn is_visible(&self, key: AssetKey) -> bool {
        match key {
            AssetKey::Page { chapter, page } => {
                chapter == self.chapter
                    && self
                        .plan
                        .unit(self.unit_index)
                        .is_some_and(|unit| unit.contains(page))
            }
            AssetKey::Document { chapter } => chapter == self.chapter,
        }
    }

    fn push_feedback(&mut self, feedback: ViewportFeedback) {
        self.pending_redraw = true;
        self.commands.push(ReaderCommand::Feedback(feedback));
    }
}
