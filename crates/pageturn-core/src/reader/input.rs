impl ReaderEngine {
    /// Drains `provider`, returning how many events were applied.
    pub fn pump_input<P>(&mut self, provider: &mut P, now_ms: u64) -> Result<usize, P::Error>
    where
        P: InputProvider,
    {
        self.ensure_open(now_ms);
        let mut applied = 0;
        while let Some(event) = provider.poll_event()? {
            self.apply_input(event, now_ms);
            applied += 1;
        }
        Ok(applied)
    }

    fn apply_input(&mut self, event: InputEvent, now_ms: u64) {
        match event {
            InputEvent::Tap { x, y } => match self.viewport.tap(x, y) {
                Some(intent) => self.apply_intent(intent, now_ms),
                None => debug!("reader: tap ignored while zoomed x={:.2} y={:.2}", x, y),
            },
            InputEvent::DoubleTap => {
                let (scale, feedback) = self.viewport.double_tap();
                debug!("reader: double tap zoom={:.2}", scale);
                if let Some(feedback) = feedback {
                    self.push_feedback(feedback);
                }
                self.pending_redraw = true;
            }
            InputEvent::Pinch { scale } => {
                if let Some(feedback) = self.viewport.set_zoom(scale) {
                    self.push_feedback(feedback);
                }
                self.pending_redraw = true;
            }
            InputEvent::DragBegin => {
                self.viewport.drag_begin(now_ms);
                self.gesture_active = true;
            }
            InputEvent::DragMove { dx, dy } => {
                let delta = progress_delta(self.settings.direction, dx, dy);
                self.drag_move(delta, now_ms);
            }
            InputEvent::DragEnd { vx, vy } => {
                let velocity = progress_delta(self.settings.direction, vx, vy);
                let update = self.viewport.drag_end(velocity, now_ms);
                self.gesture_active = false;
                self.apply_drag_update(update, now_ms);
                self.refresh_prefetch(now_ms, true);
            }
            InputEvent::Key(Key::Escape) => {
                if self.controls_visible {
                    self.set_controls_visible(false, now_ms);
                }
            }
            InputEvent::Key(key) => {
                if self.viewport.is_zoomed() {
                    debug!("reader: key={:?} ignored while zoomed", key);
                    return;
                }
                if let Some(intent) = key_intent(key, self.settings.direction) {
                    self.apply_intent(intent, now_ms);
                }
            }
        }
    }

    fn drag_move(&mut self, delta: f32, now_ms: u64) {
        if self.viewport.is_zoomed() {
            debug!("reader: drag ignored while zoomed delta={:.1}", delta);
            return;
        }
        if let Some(strip) = self.webtoon.as_mut() {
            if self.viewport.crossing_active() {
                let strip_edge = strip.edge();
                let edge = self.crossable(strip_edge);
                let update = self.viewport.overscroll_move(delta, edge, now_ms);
                self.apply_drag_update(update, now_ms);
                return;
            }

            let outcome = strip.scroll_by(delta);
            if outcome.applied != 0.0 {
                self.push_scroll();
                self.settle_webtoon(now_ms);
            }
            if outcome.remainder != 0.0 {
                let edge = self.crossable(outcome.edge);
                let update = self.viewport.overscroll_move(outcome.remainder, edge, now_ms);
                self.apply_drag_update(update, now_ms);
            }
            return;
        }

        if self.is_paginating() {
            return;
        }
        let edge = self.paged_edge();
        let update = self.viewport.drag_move(delta, edge, now_ms);
        self.apply_drag_update(update, now_ms);
    }

    fn apply_drag_update(&mut self, update: DragUpdate, now_ms: u64) {
        if let Some(feedback) = update.feedback {
            self.push_feedback(feedback);
        }
        if let Some(intent) = update.intent {
            self.apply_intent(intent, now_ms);
        }
    }
}
