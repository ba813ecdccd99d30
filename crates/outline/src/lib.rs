//! Document outline extraction for PDFs.
//!
//! Pages are read into positioned text fragments, fragments are classified
//! into H1/H2/H3 headings against document-wide font statistics, and the
//! headings are ordered into an outline with a title.
//!
//! ```no_run
//! let result = pdf_outline::extract_outline(std::path::Path::new("report.pdf"));
//! println!("{}", result.title);
//! ```

use std::path::Path;
use std::time::{Duration, Instant};

use log::{debug, warn};
use thiserror::Error;

pub mod assemble;
pub mod classify;
pub mod envelope;
pub mod ingest;
pub mod normalize;
pub mod parser;
pub mod stats;
pub mod types;

pub use normalize::{Normalizer, Substitutions};
pub use types::*;

use assemble::{assemble, check_budget, PROCESSING_BUDGET};
use ingest::Ingestor;

#[derive(Debug, Error)]
pub enum OutlineError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF has {pages} pages, which exceeds the {limit} page limit")]
    PageLimitExceeded { pages: usize, limit: u32 },
    #[error("No text fragments extracted")]
    NoFragmentsExtracted,
    #[error("PDF processing took {elapsed:.1?}, which exceeds the {budget:?} limit")]
    ProcessingTimeout { elapsed: Duration, budget: Duration },
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Runs the full pipeline for one document at a time.
///
/// Holds the text normalizer (with its substitution tables) and the
/// ingestion strategies. No state carries over between documents.
pub struct OutlineExtractor {
    normalizer: Normalizer,
    ingestor: Ingestor,
    budget: Duration,
}

impl Default for OutlineExtractor {
    fn default() -> Self {
        Self::new(Normalizer::default())
    }
}

impl OutlineExtractor {
    pub fn new(normalizer: Normalizer) -> Self {
        OutlineExtractor {
            normalizer,
            ingestor: Ingestor::default(),
            budget: PROCESSING_BUDGET,
        }
    }

    pub fn with_substitutions(substitutions: Substitutions) -> Self {
        Self::new(Normalizer::new(substitutions))
    }

    /// Extract the outline of the PDF at `path`.
    ///
    /// Never fails: problems with the document are reported in the `error`
    /// field of the result. Reading the file counts against the time budget.
    pub fn extract_path(&self, path: &Path) -> OutlineResult {
        let started = Instant::now();
        let outline = std::fs::read(path)
            .map_err(|e| {
                warn!("cannot read {}: {e}", path.display());
                OutlineError::Io(e)
            })
            .and_then(|bytes| self.outline_since(started, &bytes));
        wrap(outline)
    }

    /// Extract the outline of an in-memory PDF.
    pub fn extract_bytes(&self, bytes: &[u8]) -> OutlineResult {
        wrap(self.outline(bytes))
    }

    /// The assembled outline, or the error that replaces it.
    pub fn outline(&self, bytes: &[u8]) -> Result<Outline, OutlineError> {
        self.outline_since(Instant::now(), bytes)
    }

    fn outline_since(&self, started: Instant, bytes: &[u8]) -> Result<Outline, OutlineError> {
        let fragments = self.ingestor.ingest_bytes(bytes, &self.normalizer)?;
        let outline = assemble(&fragments);
        check_budget(started, self.budget)?;

        debug!(
            "outline \"{}\" with {} headings in {:?}",
            outline.title,
            outline.headings.len(),
            started.elapsed()
        );
        Ok(outline)
    }
}

fn wrap(outline: Result<Outline, OutlineError>) -> OutlineResult {
    match outline {
        Ok(outline) => envelope::to_result(&outline),
        Err(e) => {
            warn!("outline extraction failed: {e}");
            envelope::to_error(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience free functions
// ---------------------------------------------------------------------------

/// Extract the outline of the PDF at `path` with default settings.
pub fn extract_outline(path: &Path) -> OutlineResult {
    OutlineExtractor::default().extract_path(path)
}

/// Extract the outline of an in-memory PDF with default settings.
pub fn extract_outline_bytes(bytes: &[u8]) -> OutlineResult {
    OutlineExtractor::default().extract_bytes(bytes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, ObjectId, Stream};

    /// One line of text: font resource name, size, x, y, text.
    type Line<'a> = (&'a str, i64, i64, i64, &'a str);

    /// Build a PDF whose pages each hold the given lines. `F1` is Helvetica
    /// and `F2` is Helvetica-Bold.
    fn build_pdf(pages: &[Vec<Line<'_>>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular,
                "F2" => bold,
            },
        });

        let mut kids: Vec<ObjectId> = Vec::new();
        for lines in pages {
            let mut operations = Vec::new();
            for &(font, size, x, y, text) in lines {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new(
                    "Tf",
                    vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(size)],
                ));
                operations.push(Operation::new(
                    "Td",
                    vec![Object::Integer(x), Object::Integer(y)],
                ));
                operations.push(Operation::new("Tj", vec![Object::string_literal(text)]));
                operations.push(Operation::new("ET", vec![]));
            }
            let content = Content { operations }.encode().unwrap();
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));

            kids.push(doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(595),
                    Object::Integer(842),
                ],
            }));
        }

        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
            "Count" => Object::Integer(kids.len() as i64),
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_single_numbered_heading() {
        let pdf = build_pdf(&[vec![
            ("F2", 18, 72, 760, "1. Introduction"),
            ("F1", 5, 72, 500, "plain body text at body size"),
        ]]);

        let result = extract_outline_bytes(&pdf);
        assert_eq!(result.error, None);
        assert_eq!(result.title, "1. Introduction");
        assert_eq!(
            result.outline,
            vec![OutlineEntry {
                level: HeadingLevel::H1,
                text: "1. Introduction".to_string(),
                page: 1,
            }]
        );
    }

    #[test]
    fn test_headings_across_pages_are_ordered() {
        let pdf = build_pdf(&[
            vec![
                ("F1", 5, 72, 400, "some body text on the first page"),
                ("F2", 20, 72, 780, "Annual Report"),
            ],
            vec![("F2", 14, 72, 760, "Financial Results")],
        ]);

        let result = extract_outline_bytes(&pdf);
        let entries: Vec<(HeadingLevel, &str, usize)> = result
            .outline
            .iter()
            .map(|e| (e.level, e.text.as_str(), e.page))
            .collect();
        assert_eq!(
            entries,
            vec![
                (HeadingLevel::H1, "Annual Report", 1),
                (HeadingLevel::H1, "Financial Results", 2),
            ]
        );
        assert_eq!(result.title, "Annual Report");
    }

    #[test]
    fn test_page_limit_is_reported() {
        let pages: Vec<Vec<Line<'_>>> = (0..51).map(|_| vec![("F1", 12, 72, 700, "Page text")]).collect();
        let pdf = build_pdf(&pages);

        let result = extract_outline_bytes(&pdf);
        assert!(result.is_error());
        assert_eq!(result.title, envelope::ERROR_TITLE);
        assert!(result.outline.is_empty());
        assert!(result.error.as_deref().is_some_and(|e| e.contains("51")));
    }

    #[test]
    fn test_empty_document_is_untitled() {
        let pdf = build_pdf(&[vec![]]);
        let result = extract_outline_bytes(&pdf);
        assert_eq!(result.title, assemble::UNTITLED);
        assert!(result.outline.is_empty());
        assert!(!result.is_error());
    }

    #[test]
    fn test_unparseable_bytes_are_untitled() {
        let result = extract_outline_bytes(b"not a pdf at all");
        assert_eq!(result.title, assemble::UNTITLED);
        assert!(result.outline.is_empty());
        assert!(!result.is_error());
    }

    #[test]
    fn test_missing_file_is_an_error_result() {
        let result = extract_outline(Path::new("/definitely/not/here.pdf"));
        assert!(result.is_error());
        assert_eq!(result.title, envelope::ERROR_TITLE);
        assert!(result.outline.is_empty());
    }

    #[test]
    fn test_substitutions_reach_heading_text() {
        let pdf = build_pdf(&[vec![
            ("F2", 18, 72, 760, "Hereare the results"),
            ("F1", 5, 72, 500, "plain body text at body size"),
        ]]);
        let extractor = OutlineExtractor::with_substitutions(Substitutions {
            pre: vec![("Hereare".to_string(), "Here are".to_string())],
            post: vec![],
        });

        let result = extractor.extract_bytes(&pdf);
        assert_eq!(result.title, "Here are the results");
    }

    #[test]
    fn test_file_read_counts_against_budget() {
        let pdf = build_pdf(&[vec![
            ("F2", 18, 72, 760, "1. Introduction"),
            ("F1", 5, 72, 500, "plain body text at body size"),
        ]]);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, &pdf).unwrap();

        let extractor = OutlineExtractor {
            budget: Duration::ZERO,
            ..OutlineExtractor::default()
        };
        let result = extractor.extract_path(file.path());
        assert!(result.is_error());
        assert!(result.error.as_deref().is_some_and(|e| e.contains("exceeds")));

        let result = OutlineExtractor::default().extract_path(file.path());
        assert_eq!(result.title, "1. Introduction");
    }

    #[test]
    fn test_error_messages() {
        let err = OutlineError::PageLimitExceeded { pages: 51, limit: 50 };
        assert_eq!(err.to_string(), "PDF has 51 pages, which exceeds the 50 page limit");

        let err = OutlineError::ProcessingTimeout {
            elapsed: Duration::from_millis(10_500),
            budget: Duration::from_secs(10),
        };
        assert_eq!(err.to_string(), "PDF processing took 10.5s, which exceeds the 10s limit");
    }
}
