use std::collections::HashMap;

use pageturn_core::{ReflowStyle, ViewportSize, measure::MeasureRequest};

const BASE_GLYPH_WIDTH_PX: u32 = 11;
const BASE_LINE_HEIGHT_PX: u32 = 26;
const PARAGRAPH_GAP_LINES: u32 = 1;
/// Samples taken before late-loading fonts settle the layout.
const SETTLE_ATTEMPTS: u16 = 2;

/// Hidden layout surface that answers measurement requests for reflowable chapters.
///
/// Layout is approximated from visible text: glyph and line metrics scale
/// with the type scale, paragraphs add a blank line.
#[derive(Debug, Default)]
pub(super) struct ReflowSurface {
    /// Visible characters per paragraph, keyed by chapter.
    documents: HashMap<u16, Vec<u32>>,
}

impl ReflowSurface {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn load_document(&mut self, chapter: u16, bytes: &[u8]) {
        let text = String::from_utf8_lossy(bytes);
        self.documents.insert(chapter, paragraph_lengths(&strip_markup(&text)));
    }

    pub(super) fn has_document(&self, chapter: u16) -> bool {
        self.documents.contains_key(&chapter)
    }

    /// Content height for `request`; zero until the document has been loaded.
    pub(super) fn measure(
        &self,
        request: &MeasureRequest,
        style: &ReflowStyle,
        viewport: ViewportSize,
    ) -> u32 {
        let Some(paragraphs) = self.documents.get(&request.chapter) else {
            return 0;
        };
        let scale = u32::from(style.type_scale_percent.max(1));
        let glyph = (BASE_GLYPH_WIDTH_PX * scale).div_ceil(100).max(1);
        let line_height = (BASE_LINE_HEIGHT_PX * scale).div_ceil(100).max(1);
        let per_line = (viewport.width / glyph).max(1);

        let lines: u32 = paragraphs
            .iter()
            .map(|chars| chars.div_ceil(per_line).max(1) + PARAGRAPH_GAP_LINES)
            .sum();
        let height = lines.saturating_mul(line_height);

        if request.attempt < SETTLE_ATTEMPTS {
            height - height / 4
        } else {
            height
        }
    }
}

fn strip_markup(text: &str) -> String {
    let mut visible = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                visible.push(' ');
            }
            _ if !in_tag => visible.push(ch),
            _ => {}
        }
    }
    visible
}

fn paragraph_lengths(text: &str) -> Vec<u32> {
    text.split("\n\n")
        .map(|paragraph| paragraph.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|paragraph| !paragraph.is_empty())
        .map(|paragraph| paragraph.chars().count().min(u32::MAX as usize) as u32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(attempt: u16) -> MeasureRequest {
        MeasureRequest {
            chapter: 0,
            generation: 1,
            attempt,
        }
    }

    #[test]
    fn unloaded_documents_measure_zero() {
        let surface = ReflowSurface::new();
        let height = surface.measure(
            &request(5),
            &ReflowStyle::default(),
            ViewportSize::new(1100, 800),
        );
        assert_eq!(height, 0);
    }

    #[test]
    fn height_grows_with_type_scale_and_settles() {
        let mut surface = ReflowSurface::new();
        let paragraph = "word ".repeat(200);
        surface.load_document(0, format!("{}\n\n{}", paragraph, paragraph).as_bytes());
        assert!(surface.has_document(0));

        let viewport = ViewportSize::new(1100, 800);
        let base = ReflowStyle::default();
        let large = base.with_type_scale_percent(200);

        // 999 chars over 100 per line: 10 lines + 1 gap, twice.
        let settled = surface.measure(&request(4), &base, viewport);
        assert_eq!(settled, 22 * 26);
        assert!(surface.measure(&request(0), &base, viewport) < settled);
        assert!(surface.measure(&request(4), &large, viewport) > settled * 2);
    }

    #[test]
    fn markup_is_not_counted() {
        let mut surface = ReflowSurface::new();
        surface.load_document(0, b"<html><body><p>abc</p></body></html>");
        let height = surface.measure(
            &request(9),
            &ReflowStyle::default(),
            ViewportSize::new(1100, 800),
        );
        assert_eq!(height, 2 * 26);
    }
}
