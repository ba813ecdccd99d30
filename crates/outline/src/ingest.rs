//! Layout ingestion: PDF pages to [`PositionedFragment`]s.
//!
//! Ingestion runs in two stages. The [`LayoutStrategy`] keeps geometry and
//! font metadata per text block. When it fails, or finds nothing, the
//! [`PlainTextStrategy`] re-reads each page as plain text and splits it into
//! sentences with uniform metadata.

use log::{debug, warn};

use crate::normalize::Normalizer;
use crate::parser::backend::{LopdfBackend, PdfBackend};
use crate::parser::layout::{analyze_page, LayoutBlock, PageLayout};
use crate::types::{BoundingBox, PositionBucket, PositionedFragment};
use crate::OutlineError;

/// Documents with more pages than this are rejected by the layout stage and
/// truncated by the plain-text stage.
pub const MAX_PAGES: u32 = 50;

/// Font size assigned to every plain-text fragment.
pub const PLAIN_TEXT_FONT_SIZE: f32 = 12.0;

/// Plain-text segments must be longer than this many characters.
const MIN_SEGMENT_CHARS: usize = 5;

/// One way of turning a document into fragments.
pub trait IngestStrategy {
    fn name(&self) -> &'static str;

    fn ingest(
        &self,
        backend: &dyn PdfBackend,
        normalizer: &Normalizer,
    ) -> Result<Vec<PositionedFragment>, OutlineError>;
}

/// Bold/italic flags derived from a font name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
}

impl FontStyle {
    pub fn from_name(font_name: &str) -> Self {
        let lower = font_name.to_lowercase();
        FontStyle {
            bold: ["bold", "black", "heavy"].iter().any(|w| lower.contains(w)),
            italic: ["italic", "oblique"].iter().any(|w| lower.contains(w)),
        }
    }
}

// ---------------------------------------------------------------------------
// Layout stage
// ---------------------------------------------------------------------------

/// One fragment per layout block, with bounding box and font metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutStrategy;

impl IngestStrategy for LayoutStrategy {
    fn name(&self) -> &'static str {
        "layout"
    }

    fn ingest(
        &self,
        backend: &dyn PdfBackend,
        normalizer: &Normalizer,
    ) -> Result<Vec<PositionedFragment>, OutlineError> {
        let pages = backend.pages();
        let mut fragments = Vec::new();

        for (&number, &page_id) in &pages {
            if number > MAX_PAGES {
                return Err(OutlineError::PageLimitExceeded {
                    pages: pages.len(),
                    limit: MAX_PAGES,
                });
            }

            let page = analyze_page(backend, number as usize, page_id)?;
            fragments.extend(
                page.blocks
                    .iter()
                    .filter_map(|block| block_fragment(block, &page, normalizer)),
            );
        }

        Ok(fragments)
    }
}

fn block_fragment(
    block: &LayoutBlock,
    page: &PageLayout,
    normalizer: &Normalizer,
) -> Option<PositionedFragment> {
    let raw = block.text();
    let trimmed = raw.trim();
    if trimmed.chars().count() <= 1 {
        return None;
    }

    let mut font_size: f32 = 0.0;
    let mut font_name = String::new();
    let mut style = FontStyle::default();
    for run in block.runs() {
        font_size = font_size.max(run.font_size);
        let run_style = FontStyle::from_name(&run.font_name);
        style.bold |= run_style.bold;
        style.italic |= run_style.italic;
        font_name.clone_from(&run.font_name);
    }

    let text = normalizer.normalize(trimmed);
    if text.chars().count() <= 1 {
        return None;
    }

    Some(PositionedFragment {
        text,
        page: page.number,
        bbox: block.bbox,
        font_size,
        font_name,
        is_bold: style.bold,
        is_italic: style.italic,
        position: PositionBucket::from_vertical(block.bbox.y0, page.height),
    })
}

// ---------------------------------------------------------------------------
// Plain-text stage
// ---------------------------------------------------------------------------

/// Sentence fragments from each page's plain text, without geometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextStrategy;

impl IngestStrategy for PlainTextStrategy {
    fn name(&self) -> &'static str {
        "plain-text"
    }

    fn ingest(
        &self,
        backend: &dyn PdfBackend,
        normalizer: &Normalizer,
    ) -> Result<Vec<PositionedFragment>, OutlineError> {
        let mut fragments = Vec::new();

        for &number in backend.pages().keys() {
            if number > MAX_PAGES {
                break;
            }

            let text = match backend.page_text(number) {
                Ok(text) => text,
                Err(e) => {
                    warn!("skipping page {number} in plain-text extraction: {e}");
                    continue;
                }
            };
            if text.trim().is_empty() {
                continue;
            }

            let cleaned = normalizer.normalize(text.trim());
            fragments.extend(
                split_sentences(&cleaned).map(|sentence| plain_fragment(sentence, number as usize)),
            );
        }

        Ok(fragments)
    }
}

/// Trimmed pieces between runs of `.`, `!` and `?` that are long enough to
/// carry a heading.
fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SEGMENT_CHARS)
}

fn plain_fragment(text: &str, page: usize) -> PositionedFragment {
    PositionedFragment {
        text: text.to_string(),
        page,
        bbox: BoundingBox::default(),
        font_size: PLAIN_TEXT_FONT_SIZE,
        font_name: String::new(),
        is_bold: false,
        is_italic: false,
        position: PositionBucket::Middle,
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Runs the primary strategy and falls back to the secondary one when the
/// primary fails or produces nothing. Only a page-limit violation of the
/// primary stage is reported to the caller.
pub struct Ingestor {
    primary: Box<dyn IngestStrategy>,
    fallback: Box<dyn IngestStrategy>,
}

impl Default for Ingestor {
    fn default() -> Self {
        Ingestor {
            primary: Box::new(LayoutStrategy),
            fallback: Box::new(PlainTextStrategy),
        }
    }
}

impl Ingestor {
    pub fn ingest(
        &self,
        backend: &dyn PdfBackend,
        normalizer: &Normalizer,
    ) -> Result<Vec<PositionedFragment>, OutlineError> {
        match self.primary.ingest(backend, normalizer) {
            Ok(fragments) if !fragments.is_empty() => {
                debug!("{} stage produced {} fragments", self.primary.name(), fragments.len());
                return Ok(fragments);
            }
            Ok(_) => warn!("{}, using {} extraction", OutlineError::NoFragmentsExtracted, self.fallback.name()),
            Err(e @ OutlineError::PageLimitExceeded { .. }) => return Err(e),
            Err(e) => warn!(
                "{} extraction failed: {e}; using {} extraction",
                self.primary.name(),
                self.fallback.name()
            ),
        }

        match self.fallback.ingest(backend, normalizer) {
            Ok(fragments) => {
                debug!("{} stage produced {} fragments", self.fallback.name(), fragments.len());
                Ok(fragments)
            }
            Err(e) => {
                warn!("{} extraction failed: {e}", self.fallback.name());
                Ok(Vec::new())
            }
        }
    }

    /// Open a PDF from memory and ingest it. A document that cannot be
    /// opened gives both stages nothing to read and yields no fragments.
    pub fn ingest_bytes(
        &self,
        bytes: &[u8],
        normalizer: &Normalizer,
    ) -> Result<Vec<PositionedFragment>, OutlineError> {
        match LopdfBackend::load_bytes(bytes) {
            Ok(backend) => self.ingest(&backend, normalizer),
            Err(e) => {
                warn!("cannot open PDF: {e}");
                Ok(Vec::new())
            }
        }
    }
}
