use std::collections::{BTreeMap, BTreeSet};

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object};

use crate::OutlineError;

/// `lopdf::ObjectId` of a page: (object number, generation).
pub type PageId = (u32, u16);

/// A font entry from a page's `/Resources /Font` dictionary.
#[derive(Debug, Clone)]
pub struct FontResource {
    /// Resource key used by `Tf`, e.g. `b"F1"`.
    pub key: Vec<u8>,
    pub base_font: Option<String>,
    pub encoding: Option<String>,
}

/// Content-stream operand, reduced to what text layout reads.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<Operand>),
    Other,
}

impl Operand {
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Operand::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&Object> for Operand {
    fn from(obj: &Object) -> Self {
        match obj {
            Object::Integer(i) => Operand::Number(*i as f32),
            Object::Real(f) => Operand::Number(*f),
            Object::Name(n) => Operand::Name(n.clone()),
            Object::String(s, _) => Operand::Str(s.clone()),
            Object::Array(items) => Operand::Array(items.iter().map(Operand::from).collect()),
            _ => Operand::Other,
        }
    }
}

/// One content-stream operator with its operands.
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<Operand>,
}

/// Decode a PDF string without font information: UTF-16BE when it carries a
/// BOM, UTF-8 when valid, Latin-1 otherwise.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(payload) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return utf16_be(payload);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn utf16_be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Read access to a PDF, as needed by layout analysis and ingestion.
///
/// Everything above this trait can be driven by a mock that serves
/// pre-decoded operators.
pub trait PdfBackend {
    /// 1-based page number to page id.
    fn pages(&self) -> BTreeMap<u32, PageId>;

    fn page_fonts(&self, page: PageId) -> Result<Vec<FontResource>, OutlineError>;

    /// Raw content stream bytes, decompressed.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>, OutlineError>;

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, OutlineError>;

    /// Decode the operand of a text-showing operator drawn with a font whose
    /// `/Encoding` is `encoding`.
    fn decode_text(&self, encoding: Option<&str>, bytes: &[u8]) -> String;

    /// Height of the page's MediaBox, when it can be determined.
    fn page_height(&self, page: PageId) -> Option<f32>;

    /// Plain text of a page (1-based page number) without layout metadata.
    fn page_text(&self, page_number: u32) -> Result<String, OutlineError>;
}

/// [`PdfBackend`] over a [`lopdf::Document`].
pub struct LopdfBackend {
    doc: Document,
}

impl LopdfBackend {
    /// Parse a PDF from memory. Encrypted documents are refused.
    pub fn load_bytes(data: &[u8]) -> Result<Self, OutlineError> {
        let doc = Document::load_mem(data).map_err(|e| OutlineError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(OutlineError::Encrypted);
        }

        Ok(Self { doc })
    }

    /// The page's MediaBox `[llx, lly, urx, ury]`, inherited from the page
    /// tree when the page does not set one. A `/Parent` chain that loops
    /// back on itself yields `None`.
    pub fn media_box(&self, page: PageId) -> Option<[f32; 4]> {
        let mut visited = BTreeSet::from([page]);
        let mut dict = self.doc.get_dictionary(page).ok()?;
        loop {
            if let Some(rect) = dict.get(b"MediaBox").ok().and_then(|obj| self.rect(obj)) {
                return Some(rect);
            }
            let parent = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
            if !visited.insert(parent) {
                return None;
            }
            dict = self.doc.get_dictionary(parent).ok()?;
        }
    }

    fn rect(&self, obj: &Object) -> Option<[f32; 4]> {
        let items = self.resolve(obj).as_array().ok()?;
        let nums: Vec<f32> = items
            .iter()
            .filter_map(|item| match self.resolve(item) {
                Object::Integer(i) => Some(*i as f32),
                Object::Real(f) => Some(*f),
                _ => None,
            })
            .collect();
        match nums.as_slice() {
            &[x0, y0, x1, y1] => Some([x0, y0, x1, y1]),
            _ => None,
        }
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            other => other,
        }
    }
}

fn name_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key)
        .and_then(Object::as_name)
        .ok()
        .map(|n| String::from_utf8_lossy(n).into_owned())
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<FontResource>, OutlineError> {
        let fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| OutlineError::Parse(format!("cannot read page fonts: {e}")))?;

        Ok(fonts
            .into_iter()
            .map(|(key, dict)| FontResource {
                key,
                base_font: name_entry(dict, b"BaseFont"),
                encoding: name_entry(dict, b"Encoding"),
            })
            .collect())
    }

    fn page_content(&self, page: PageId) -> Result<Vec<u8>, OutlineError> {
        self.doc
            .get_page_content(page)
            .map_err(|e| OutlineError::Parse(format!("cannot read page content: {e}")))
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, OutlineError> {
        let content = Content::decode(data)
            .map_err(|e| OutlineError::Parse(format!("cannot decode content stream: {e}")))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operands: op.operands.iter().map(Operand::from).collect(),
                operator: op.operator,
            })
            .collect())
    }

    fn decode_text(&self, encoding: Option<&str>, bytes: &[u8]) -> String {
        // Identity-H/V strings carry two-byte codes that usually coincide
        // with UTF-16BE for simple embeddings.
        let identity = encoding.is_some_and(|enc| enc.starts_with("Identity"));

        if identity && !bytes.is_empty() && bytes.len() % 2 == 0 {
            let decoded = utf16_be(bytes);
            if decoded.chars().any(|c| c != '\u{FFFD}' && c != '\0') {
                return decoded;
            }
        }

        decode_pdf_string(bytes)
    }

    fn page_height(&self, page: PageId) -> Option<f32> {
        self.media_box(page).map(|[_, y0, _, y1]| y1 - y0)
    }

    fn page_text(&self, page_number: u32) -> Result<String, OutlineError> {
        self.doc
            .extract_text(&[page_number])
            .map_err(|e| OutlineError::Parse(format!("cannot extract text of page {page_number}: {e}")))
    }
}
