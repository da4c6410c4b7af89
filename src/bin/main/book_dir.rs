use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{info, warn};
use pageturn_core::{AssetKey, BookLayout, ChapterKind};

use super::error::HostError;

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];
const DOCUMENT_EXTENSIONS: [&str; 3] = ["html", "xhtml", "txt"];
const PROGRESS_FILE: &str = ".pageturn-progress";

#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) enum ChapterSource {
    Images(Vec<PathBuf>),
    Document(PathBuf),
}

#[derive(Clone, Debug)]
pub(super) struct Chapter {
    pub(super) name: String,
    pub(super) source: ChapterSource,
}

impl Chapter {
    fn kind(&self) -> ChapterKind {
        match &self.source {
            ChapterSource::Images(pages) => ChapterKind::Images {
                page_count: pages.len().min(u16::MAX as usize) as u16,
            },
            ChapterSource::Document(_) => ChapterKind::Reflow,
        }
    }
}

/// A book laid out on disk: one sub-directory per chapter, sorted by name.
///
/// A directory without chapter sub-directories is read as a single chapter.
#[derive(Clone, Debug)]
pub(super) struct BookDir {
    root: PathBuf,
    chapters: Vec<Chapter>,
}

impl BookDir {
    pub(super) fn open(root: &Path) -> Result<Self, HostError> {
        let mut chapter_dirs = sorted_entries(root)?
            .into_iter()
            .filter(|path| path.is_dir() && !is_hidden(path))
            .collect::<Vec<_>>();
        if chapter_dirs.is_empty() {
            chapter_dirs.push(root.to_path_buf());
        }

        let mut chapters = Vec::with_capacity(chapter_dirs.len());
        for dir in chapter_dirs {
            match read_chapter(&dir)? {
                Some(chapter) => chapters.push(chapter),
                None => warn!("book: skipping chapter without content dir={}", dir.display()),
            }
        }

        if chapters.is_empty() {
            return Err(HostError::EmptyBook(root.to_path_buf()));
        }
        info!(
            "book: opened root={} chapters={}",
            root.display(),
            chapters.len()
        );
        Ok(Self {
            root: root.to_path_buf(),
            chapters,
        })
    }

    pub(super) fn root(&self) -> &Path {
        &self.root
    }

    pub(super) fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub(super) fn layout(&self) -> BookLayout {
        BookLayout::new(self.chapters.iter().map(Chapter::kind).collect())
    }

    pub(super) fn progress_path(&self) -> PathBuf {
        self.root.join(PROGRESS_FILE)
    }

    /// File backing `key`, if the book has one.
    pub(super) fn asset_path(&self, key: AssetKey) -> Option<&Path> {
        let chapter = self.chapters.get(key.chapter() as usize)?;
        match (key, &chapter.source) {
            (AssetKey::Page { page, .. }, ChapterSource::Images(pages)) => {
                pages.get(page as usize).map(PathBuf::as_path)
            }
            (AssetKey::Document { .. }, ChapterSource::Document(path)) => Some(path.as_path()),
            _ => None,
        }
    }
}

fn read_chapter(dir: &Path) -> Result<Option<Chapter>, HostError> {
    let files = sorted_entries(dir)?
        .into_iter()
        .filter(|path| path.is_file() && !is_hidden(path))
        .collect::<Vec<_>>();

    let name = dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let images = files
        .iter()
        .filter(|path| has_extension(path, &IMAGE_EXTENSIONS))
        .cloned()
        .collect::<Vec<_>>();
    if !images.is_empty() {
        return Ok(Some(Chapter {
            name,
            source: ChapterSource::Images(images),
        }));
    }

    let document = files
        .into_iter()
        .find(|path| has_extension(path, &DOCUMENT_EXTENSIONS));
    Ok(document.map(|path| Chapter {
        name,
        source: ChapterSource::Document(path),
    }))
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, HostError> {
    let entries = fs::read_dir(dir).map_err(|err| HostError::io(dir, err))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| HostError::io(dir, err))?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}
