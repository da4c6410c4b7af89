impl ReaderEngine {
    fn ensure_open(&mut self, now_ms: u64) {
        if self.opened {
            return;
        }
        self.opened = true;

        let current = self.position.current();
        let target = match self.position.target() {
            Some(target) => target,
            None => self.position.set_target(current.chapter, current.page),
        };
        info!(
            "reader: open chapters={} chapter={} target={:?}",
            self.book.chapter_count(),
            target.chapter,
            target.page
        );
        self.enter_chapter(target.chapter, now_ms);
        self.try_settle(now_ms);
    }

    fn restore(&mut self, chapter: u16, page: u16, progress: f32, now_ms: u64) {
        self.position.restore(chapter, page, progress);
        let restored = self.position.current();
        debug!(
            "reader: restore chapter={} page={} progress={:.3}",
            restored.chapter, restored.page, restored.progress
        );

        let target = if self.position.page_count(restored.chapter).is_some() {
            self.position.set_target(restored.chapter, restored.page)
        } else {
            self.position
                .set_target_progress(restored.chapter, restored.progress)
        };
        if self.opened {
            self.navigate(target, now_ms);
        } else {
            self.ensure_open(now_ms);
        }
    }

    fn navigate(&mut self, target: NavigationTarget, now_ms: u64) {
        debug!(
            "reader: navigate chapter={} page={:?} from={}:{}",
            target.chapter,
            target.page,
            self.chapter,
            self.position.current().page
        );
        if target.chapter != self.chapter {
            self.enter_chapter(target.chapter, now_ms);
        }
        self.try_settle(now_ms);
    }

    fn enter_chapter(&mut self, chapter: u16, now_ms: u64) {
        debug!(
            "reader: enter chapter={} kind={:?}",
            chapter,
            self.kind(chapter)
        );
        self.measurer.cancel();
        self.chapter = chapter;
        self.wide_pages.clear();
        self.last_shown = None;
        self.unit_index = 0;
        self.plan = layout::plan(0, &self.plan_options());

        self.replan();
        self.rebuild_webtoon();
        if self.is_paginating() {
            let _ = self.measurer.begin(chapter, now_ms, None);
            self.pending_redraw = true;
            self.refresh_prefetch(now_ms, true);
        }
    }

    /// Applies the pending target once its page can be resolved.
    fn try_settle(&mut self, now_ms: u64) {
        let Some(target) = self.position.target() else {
            return;
        };
        if target.chapter != self.chapter || self.is_paginating() {
            debug!(
                "reader: target chapter={} page={:?} waits for pagination",
                target.chapter, target.page
            );
            return;
        }
        let Some((chapter, page)) = self.position.resolved_target() else {
            return;
        };
        let _ = self.position.take_target();

        if let Some(strip) = self.webtoon.as_mut() {
            match target.page {
                PageTarget::LastPage => strip.scroll_to_end(),
                _ => strip.scroll_to_page(page),
            }
            self.push_scroll();
            self.settle_webtoon(now_ms);
            return;
        }
        let index = self.plan.unit_index_for_page(page);
        debug!(
            "reader: settle target chapter={} page={} unit={}",
            chapter, page, index
        );
        self.settle_unit(index, now_ms);
    }

    fn settle_unit(&mut self, index: usize, now_ms: u64) {
        self.unit_index = index.min(self.plan.end_index());
        let page = self.plan.anchor_page(self.unit_index).unwrap_or(0);
        if let Some(report) = self.position.settle(self.chapter, page) {
            self.end_of_book_sent = false;
            self.commands.push(ReaderCommand::SaveProgress(report));
        }
        self.show_current();
        self.refresh_prefetch(now_ms, false);
    }

    fn settle_on(&mut self, chapter: u16, page: u16, now_ms: u64) {
        if chapter != self.chapter {
            return;
        }
        if let Some(strip) = self.webtoon.as_mut() {
            strip.scroll_to_page(page);
            self.push_scroll();
            self.settle_webtoon(now_ms);
            return;
        }
        let index = self.plan.unit_index_for_page(page);
        self.settle_unit(index, now_ms);
    }

    fn settle_webtoon(&mut self, now_ms: u64) {
        let Some(page) = self.webtoon.as_ref().map(WebtoonStrip::current_page) else {
            return;
        };
        let index = self.plan.unit_index_for_page(page);
        self.settle_unit(index, now_ms);
    }

    fn push_scroll(&mut self) {
        if let Some(strip) = self.webtoon.as_ref() {
            self.pending_redraw = true;
            self.commands.push(ReaderCommand::ScrollTo {
                chapter: self.chapter,
                offset: strip.offset(),
            });
        }
    }

    fn apply_intent(&mut self, intent: ViewportIntent, now_ms: u64) {
        debug!(
            "reader: intent={:?} chapter={} unit={}/{}",
            intent,
            self.chapter,
            self.unit_index,
            self.plan.end_index()
        );
        match intent {
            ViewportIntent::ToggleControls => {
                let visible = !self.controls_visible;
                self.set_controls_visible(visible, now_ms);
            }
            ViewportIntent::Next => self.step(true, now_ms),
            ViewportIntent::Previous => self.step(false, now_ms),
            ViewportIntent::NextChapter => self.cross_chapter(CrossingDirection::Next, now_ms),
            ViewportIntent::PreviousChapter => {
                self.cross_chapter(CrossingDirection::Previous, now_ms)
            }
        }
    }

    fn step(&mut self, forward: bool, now_ms: u64) {
        if self.is_paginating() {
            debug!("reader: step ignored while chapter={} paginates", self.chapter);
            return;
        }
        if self.webtoon.is_some() {
            self.step_webtoon(forward, now_ms);
            return;
        }

        let next = if forward {
            self.plan.next_unit(self.unit_index)
        } else {
            self.plan.previous_unit(self.unit_index)
        };
        match next {
            Some(index) => self.settle_unit(index, now_ms),
            None if forward => self.cross_chapter(CrossingDirection::Next, now_ms),
            None => self.cross_chapter(CrossingDirection::Previous, now_ms),
        }
    }

    fn step_webtoon(&mut self, forward: bool, now_ms: u64) {
        let Some(strip) = self.webtoon.as_mut() else {
            return;
        };
        let pinned = match (forward, strip.edge()) {
            (true, Edge::End | Edge::Both) => Some(CrossingDirection::Next),
            (false, Edge::Start | Edge::Both) => Some(CrossingDirection::Previous),
            _ => None,
        };
        if let Some(direction) = pinned {
            self.cross_chapter(direction, now_ms);
            return;
        }
        let _ = strip.step(forward);
        self.push_scroll();
        self.settle_webtoon(now_ms);
    }

    fn cross_chapter(&mut self, direction: CrossingDirection, now_ms: u64) {
        match direction {
            CrossingDirection::Next => {
                let next = self.chapter.saturating_add(1);
                if next >= self.book.chapter_count() {
                    if !self.end_of_book_sent {
                        info!("reader: end of book chapter={}", self.chapter);
                        self.end_of_book_sent = true;
                        self.commands.push(ReaderCommand::EndOfBook);
                    }
                    return;
                }
                let target = self.position.set_target(next, 0);
                self.navigate(target, now_ms);
            }
            CrossingDirection::Previous => {
                let Some(previous) = self.chapter.checked_sub(1) else {
                    debug!("reader: already at the first chapter");
                    return;
                };
                let target = self.position.set_target_last_page(previous);
                self.navigate(target, now_ms);
            }
        }
    }

    fn set_controls_visible(&mut self, visible: bool, now_ms: u64) {
        let hide_ms = self.config.controls_hide_ms;
        self.controls_hide_at_ms = (visible && hide_ms > 0).then(|| now_ms.saturating_add(hide_ms));
        if visible == self.controls_visible {
            return;
        }
        debug!("reader: controls visible={}", visible);
        self.controls_visible = visible;
        self.pending_redraw = true;
        self.commands.push(ReaderCommand::ControlsVisible(visible));
    }

    /// Chapter edges a paged drag may overscroll into.
    fn paged_edge(&self) -> Edge {
        let at_start = self.unit_index == 0 && self.chapter > 0;
        let at_end = self.plan.unit(self.unit_index).is_some_and(RenderUnit::is_end);
        Edge::from_bounds(at_start, at_end)
    }

    /// Drops the start edge in the first chapter; there is nothing to cross into.
    fn crossable(&self, edge: Edge) -> Edge {
        if self.chapter > 0 {
            return edge;
        }
        match edge {
            Edge::Start => Edge::None,
            Edge::Both => Edge::End,
            other => other,
        }
    }
}
