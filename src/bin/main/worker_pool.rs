use std::{
    fmt, fs,
    io::{self, Cursor},
    path::PathBuf,
    thread::{self, JoinHandle},
    time::Duration,
};

use image::ImageReader;
use log::{debug, warn};
use pageturn_core::AssetKey;

const QUEUE_DEPTH: usize = 256;

#[derive(Clone, Debug)]
pub(super) struct LoadJob {
    pub(super) key: AssetKey,
    pub(super) generation: u32,
    pub(super) path: PathBuf,
}

#[derive(Debug)]
pub(super) enum LoadError {
    Io(io::ErrorKind),
    Decode(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(kind) => write!(f, "io: {}", kind),
            Self::Decode(reason) => write!(f, "decode: {}", reason),
        }
    }
}

#[derive(Debug)]
pub(super) struct LoadedAsset {
    pub(super) bytes: Vec<u8>,
    /// Pixel size for page images, zero for documents.
    pub(super) width: u32,
    pub(super) height: u32,
}

#[derive(Debug)]
pub(super) struct LoadResult {
    pub(super) key: AssetKey,
    pub(super) generation: u32,
    pub(super) outcome: Result<LoadedAsset, LoadError>,
}

/// Fixed set of loader threads fed through a bounded queue.
pub(super) struct WorkerPool {
    jobs: Option<flume::Sender<LoadJob>>,
    results: flume::Receiver<LoadResult>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub(super) fn new(workers: usize) -> Self {
        let (job_tx, job_rx) = flume::bounded::<LoadJob>(QUEUE_DEPTH);
        let (result_tx, result_rx) = flume::unbounded::<LoadResult>();

        let handles = (0..workers.max(1))
            .map(|index| {
                let jobs = job_rx.clone();
                let results = result_tx.clone();
                thread::Builder::new()
                    .name(format!("pageturn-loader-{}", index))
                    .spawn(move || {
                        while let Ok(job) = jobs.recv() {
                            let outcome = load(&job);
                            let result = LoadResult {
                                key: job.key,
                                generation: job.generation,
                                outcome,
                            };
                            if results.send(result).is_err() {
                                break;
                            }
                        }
                    })
            })
            .filter_map(|spawned| match spawned {
                Ok(handle) => Some(handle),
                Err(err) => {
                    warn!("loader: spawn failed err={}", err);
                    None
                }
            })
            .collect();

        Self {
            jobs: Some(job_tx),
            results: result_rx,
            handles,
        }
    }

    pub(super) fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Queues `job`; `false` when no worker is left to run it.
    pub(super) fn submit(&self, job: LoadJob) -> bool {
        if self.handles.is_empty() {
            return false;
        }
        match &self.jobs {
            Some(jobs) => jobs.send(job).is_ok(),
            None => false,
        }
    }

    pub(super) fn try_results(&self) -> impl Iterator<Item = LoadResult> + '_ {
        self.results.try_iter()
    }

    pub(super) fn recv_timeout(&self, timeout: Duration) -> Option<LoadResult> {
        self.results.recv_timeout(timeout).ok()
    }

    pub(super) fn shutdown(mut self) {
        self.jobs = None;
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!("loader: worker panicked");
            }
        }
    }
}

fn load(job: &LoadJob) -> Result<LoadedAsset, LoadError> {
    let bytes = fs::read(&job.path).map_err(|err| LoadError::Io(err.kind()))?;
    let (width, height) = match job.key {
        AssetKey::Page { .. } => image_size(&bytes)?,
        AssetKey::Document { .. } => (0, 0),
    };
    debug!(
        "loader: loaded key={:?} bytes={} size={}x{}",
        job.key,
        bytes.len(),
        width,
        height
    );
    Ok(LoadedAsset {
        bytes,
        width,
        height,
    })
}

fn image_size(bytes: &[u8]) -> Result<(u32, u32), LoadError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| LoadError::Io(err.kind()))?
        .into_dimensions()
        .map_err(|err| LoadError::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        image::RgbImage::new(width, height)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn wait_for(pool: &WorkerPool, count: usize) -> Vec<LoadResult> {
        (0..count)
            .filter_map(|_| pool.recv_timeout(Duration::from_secs(5)))
            .collect()
    }

    #[test]
    fn loads_page_dimensions_and_documents() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("001.png");
        let doc = dir.path().join("chapter.txt");
        fs::write(&page, png(40, 90)).unwrap();
        fs::write(&doc, "call me ishmael").unwrap();

        let pool = WorkerPool::new(2);
        assert_eq!(pool.worker_count(), 2);
        assert!(pool.submit(LoadJob {
            key: AssetKey::Page {
                chapter: 0,
                page: 0
            },
            generation: 3,
            path: page,
        }));
        assert!(pool.submit(LoadJob {
            key: AssetKey::Document { chapter: 1 },
            generation: 3,
            path: doc,
        }));

        let mut results = wait_for(&pool, 2);
        results.sort_by_key(|result| result.key.chapter());
        assert_eq!(results.len(), 2);

        let image = results[0].outcome.as_ref().unwrap();
        assert_eq!((image.width, image.height), (40, 90));
        assert_eq!(results[0].generation, 3);

        let text = results[1].outcome.as_ref().unwrap();
        assert_eq!(text.bytes, b"call me ishmael");
        pool.shutdown();
    }

    #[test]
    fn missing_and_corrupt_files_fail() {
        let dir = tempfile::tempdir().unwrap();
        let corrupt = dir.path().join("bad.png");
        fs::write(&corrupt, b"not an image").unwrap();

        let pool = WorkerPool::new(1);
        for (page, path) in [(0, dir.path().join("missing.png")), (1, corrupt)] {
            assert!(pool.submit(LoadJob {
                key: AssetKey::Page { chapter: 0, page },
                generation: 1,
                path,
            }));
        }

        let results = wait_for(&pool, 2);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|result| result.outcome.is_err()));
        pool.shutdown();
    }
}
