//! Reading progress reports and the persistence collaborator interface.

use log::warn;

use crate::position::Position;

/// Settled position handed to the persistence layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressReport {
    pub chapter: u16,
    pub page: u16,
    pub progress: f32,
}

impl From<Position> for ProgressReport {
    fn from(position: Position) -> Self {
        Self {
            chapter: position.chapter,
            page: position.page,
            progress: position.progress,
        }
    }
}

impl ProgressReport {
    pub const fn same_page(&self, other: &ProgressReport) -> bool {
        self.chapter == other.chapter && self.page == other.page
    }
}

/// Durable storage for reading progress.
///
/// Deduplication and in-flight limits are the implementor's concern.
pub trait ProgressPersister {
    type Error: core::fmt::Debug;

    fn save(&mut self, report: &ProgressReport) -> Result<(), Self::Error>;
}

/// Fire-and-forget save; failures are logged and dropped.
pub fn deliver<P>(persister: &mut P, report: &ProgressReport) -> bool
where
    P: ProgressPersister + ?Sized,
{
    match persister.save(report) {
        Ok(()) => true,
        Err(err) => {
            warn!(
                "progress: save failed chapter={} page={} err={:?}",
                report.chapter, report.page, err
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakyStore {
        fail: bool,
        saved: Vec<ProgressReport>,
    }

    impl ProgressPersister for FlakyStore {
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
    fn failed_saves_are_swallowed() {
        let report = ProgressReport {
            chapter: 1,
            page: 2,
            progress: 0.25,
        };
        let mut store = FlakyStore {
            fail: true,
            saved: Vec::new(),
        };
        assert!(!deliver(&mut store, &report));

        store.fail = false;
        assert!(deliver(&mut store, &report));
        assert_eq!(store.saved, vec![report]);
    }
}
