use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::{info, warn};
use pageturn_core::{
    ProgressPersister, ProgressReport,
    progress::deliver,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum FlushReason {
    Debounce,
    ChapterChange,
    Shutdown,
}

impl FlushReason {
    fn as_str(self) -> &'static str {
        match self {
            Self::Debounce => "debounce",
            Self::ChapterChange => "chapter_change",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Debounces `SaveProgress` commands before they reach the store.
#[derive(Clone, Copy, Debug)]
pub(super) struct ProgressSyncState {
    last_saved: Option<ProgressReport>,
    last_seen: Option<ProgressReport>,
    dirty_since_ms: Option<u64>,
    last_flush_ms: Option<u64>,
    debounce_ms: u64,
    min_spacing_ms: u64,
}

impl ProgressSyncState {
    pub(super) fn new(initial: Option<ProgressReport>, debounce_ms: u64, min_spacing_ms: u64) -> Self {
        Self {
            last_saved: initial,
            last_seen: initial,
            dirty_since_ms: None,
            last_flush_ms: None,
            debounce_ms,
            min_spacing_ms,
        }
    }

    /// Records a settled position. Leaving a chapter asks for an immediate flush.
    pub(super) fn observe(
        &mut self,
        report: ProgressReport,
        now_ms: u64,
    ) -> Option<(ProgressReport, FlushReason)> {
        let previous = self.last_seen.replace(report);
        if self
            .last_saved
            .is_some_and(|saved| saved.same_page(&report))
        {
            self.dirty_since_ms = None;
            return None;
        }

        self.dirty_since_ms = Some(now_ms);
        match previous {
            Some(previous) if previous.chapter != report.chapter => {
                Some((report, FlushReason::ChapterChange))
            }
            _ => None,
        }
    }

    pub(super) fn debounced_due(&self, now_ms: u64) -> Option<ProgressReport> {
        let dirty_since = self.dirty_since_ms?;
        let report = self.last_seen?;
        if now_ms.saturating_sub(dirty_since) < self.debounce_ms {
            return None;
        }
        Some(report)
    }

    pub(super) fn can_flush_now(&self, now_ms: u64) -> bool {
        self.last_flush_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= self.min_spacing_ms)
    }

    /// Unsaved position, flushed on shutdown regardless of the debounce.
    pub(super) fn unsaved(&self) -> Option<ProgressReport> {
        self.dirty_since_ms.and(self.last_seen)
    }

    pub(super) fn mark_saved(&mut self, saved: ProgressReport, now_ms: u64) {
        self.last_saved = Some(saved);
        self.last_flush_ms = Some(now_ms);
        if self.last_seen.is_some_and(|seen| seen.same_page(&saved)) {
            self.dirty_since_ms = None;
        }
    }

    /// Saves `report` through `store`. A failed save stays dirty and is retried
    /// after the next debounce window.
    pub(super) fn flush<P>(
        &mut self,
        store: &mut P,
        report: ProgressReport,
        reason: FlushReason,
        now_ms: u64,
    ) -> bool
    where
        P: ProgressPersister,
    {
        if !deliver(store, &report) {
            self.dirty_since_ms = Some(now_ms);
            return false;
        }
        self.mark_saved(report, now_ms);
        info!(
            "progress-save: flushed reason={} chapter={} page={} progress={:.3}",
            reason.as_str(),
            report.chapter.saturating_add(1),
            report.page.saturating_add(1),
            report.progress
        );
        true
    }

    /// Runs the debounce check for one loop iteration.
    pub(super) fn poll<P>(&mut self, store: &mut P, now_ms: u64)
    where
        P: ProgressPersister,
    {
        if let Some(report) = self.debounced_due(now_ms)
            && self.can_flush_now(now_ms)
        {
            self.flush(store, report, FlushReason::Debounce, now_ms);
        }
    }
}

/// `chapter page progress` stored in a single line.
pub(super) struct FileProgressStore {
    path: PathBuf,
}

impl FileProgressStore {
    pub(super) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }

    /// Saved progress, `None` when missing or unreadable.
    pub(super) fn load(&self) -> Option<ProgressReport> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!("progress-load: read failed path={} err={}", self.path.display(), err);
                return None;
            }
        };
        let report = parse_report(&raw);
        if report.is_none() {
            warn!("progress-load: ignoring malformed record path={}", self.path.display());
        }
        report
    }
}

impl ProgressPersister for FileProgressStore {
    type Error = io::Error;

    fn save(&mut self, report: &ProgressReport) -> Result<(), Self::Error> {
        let staging = self.path.with_extension("tmp");
        fs::write(
            &staging,
            format!("{} {} {}\n", report.chapter, report.page, report.progress),
        )?;
        fs::rename(&staging, &self.path)
    }
}

fn parse_report(raw: &str) -> Option<ProgressReport> {
    let mut fields = raw.split_whitespace();
    let chapter = fields.next()?.parse().ok()?;
    let page = fields.next()?.parse().ok()?;
    let progress = fields
        .next()
        .and_then(|value| value.parse::<f32>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);
    Some(ProgressReport {
        chapter,
        page,
        progress,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(chapter: u16, page: u16) -> ProgressReport {
        ProgressReport {
            chapter,
            page,
            progress: 0.5,
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        fail: bool,
        saved: Vec<ProgressReport>,
    }

    impl ProgressPersister for MemoryStore {
        type Error = ();

        fn save(&mut self, report: &ProgressReport) -> Result<(), Self::Error> {
            if self.fail {
                return Err(());
            }
            self.saved.push(*report);
            Ok(())
        }
    }

    #[test]
    fn page_turns_are_debounced_into_one_save() {
        let mut store = MemoryStore::default();
        let mut sync = ProgressSyncState::new(None, 4_000, 500);

        assert_eq!(sync.observe(report(0, 1), 0), None);
        assert_eq!(sync.observe(report(0, 2), 1_000), None);
        sync.poll(&mut store, 4_500);
        assert!(store.saved.is_empty());

        sync.poll(&mut store, 5_000);
        assert_eq!(store.saved, vec![report(0, 2)]);
        sync.poll(&mut store, 20_000);
        assert_eq!(store.saved.len(), 1);
        assert_eq!(sync.unsaved(), None);
    }

    #[test]
    fn chapter_change_flushes_immediately() {
        let mut sync = ProgressSyncState::new(Some(report(0, 0)), 4_000, 500);
        assert_eq!(sync.observe(report(0, 3), 0), None);
        assert_eq!(
            sync.observe(report(1, 0), 100),
            Some((report(1, 0), FlushReason::ChapterChange))
        );
    }

    #[test]
    fn returning_to_the_saved_page_is_clean() {
        let mut store = MemoryStore::default();
        let mut sync = ProgressSyncState::new(Some(report(0, 4)), 1_000, 0);
        sync.observe(report(0, 5), 0);
        sync.observe(report(0, 4), 10);
        sync.poll(&mut store, 5_000);
        assert!(store.saved.is_empty());
    }

    #[test]
    fn failed_saves_retry_after_debounce() {
        let mut store = MemoryStore {
            fail: true,
            ..MemoryStore::default()
        };
        let mut sync = ProgressSyncState::new(None, 1_000, 0);
        sync.observe(report(2, 7), 0);
        sync.poll(&mut store, 1_000);
        assert_eq!(sync.unsaved(), Some(report(2, 7)));

        store.fail = false;
        sync.poll(&mut store, 1_500);
        assert!(store.saved.is_empty());
        sync.poll(&mut store, 2_000);
        assert_eq!(store.saved, vec![report(2, 7)]);
    }

    #[test]
    fn file_store_round_trips_and_tolerates_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileProgressStore::new(dir.path().join(".pageturn-progress"));
        assert_eq!(store.load(), None);

        store.save(&report(3, 12)).unwrap();
        assert_eq!(store.load(), Some(report(3, 12)));

        fs::write(store.path(), "three pages in").unwrap();
        assert_eq!(store.load(), None);

        fs::write(store.path(), "1 4").unwrap();
        assert_eq!(
            store.load(),
            Some(ProgressReport {
                chapter: 1,
                page: 4,
                progress: 0.0
            })
        );
    }
}
