//! Content-stream interpretation and block assembly.
//!
//! Turns a page's content-stream operators into [`LayoutBlock`]s: the text
//! containers the ingestion adapter converts into fragments.
//!
//! # Pipeline
//!
//! ```text
//! content ops  ->  TextRun[]  ->  TextLine[]  ->  LayoutBlock[]
//!   (per page)     read_runs      group_runs      group_lines
//! ```

use std::cmp::Ordering;

use super::backend::{FontResource, Operand, PageId, PdfBackend};
use crate::types::BoundingBox;
use crate::OutlineError;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A run of text drawn with a single font at a single position.
///
/// Runs are the character font records of a block: every character in the
/// run shares the run's font name and size.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
    pub font_name: String,
}

/// Runs sharing (approximately) one baseline, ordered left to right.
#[derive(Debug, Clone, Default)]
pub struct TextLine {
    pub runs: Vec<TextRun>,
    pub y: f32,
    pub font_size: f32,
}

impl TextLine {
    /// Concatenate run texts, separating runs with a single space.
    pub fn text(&self) -> String {
        self.runs
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A text container: consecutive lines that belong together.
#[derive(Debug, Clone)]
pub struct LayoutBlock {
    pub lines: Vec<TextLine>,
    pub bbox: BoundingBox,
}

impl LayoutBlock {
    /// Block text with one line per row, as a layout engine reports it.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(TextLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn runs(&self) -> impl Iterator<Item = &TextRun> {
        self.lines.iter().flat_map(|line| line.runs.iter())
    }
}

/// All blocks found on one page.
#[derive(Debug, Clone)]
pub struct PageLayout {
    /// 1-based page number.
    pub number: usize,
    pub height: Option<f32>,
    pub blocks: Vec<LayoutBlock>,
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Runs whose baselines differ by less than this share a line.
const Y_TOLERANCE: f32 = 1.0;

/// Approximate glyph width as a fraction of the font size.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Gap (points) between adjacent runs above which a space is inserted.
const MIN_WORD_GAP: f32 = 1.5;

/// A vertical gap larger than this multiple of the font size starts a new block.
const BLOCK_GAP_FACTOR: f32 = 1.4;

/// Lines whose dominant sizes differ by at least this much go to separate blocks.
const FONT_SIZE_STEP: f32 = 0.5;

const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

// ---------------------------------------------------------------------------
// Internal: text-state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct TextState {
    /// `/Encoding` of the current font resource.
    font_encoding: Option<String>,
    font_name: String,
    font_size: f32,
    /// [a, b, c, d, tx, ty]
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_encoding: None,
            font_name: String::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn x(&self) -> f32 {
        self.text_matrix[4]
    }

    fn y(&self) -> f32 {
        self.text_matrix[5] + self.text_rise
    }

    /// Rendered size: `font_size * sqrt(b^2 + d^2)`.
    fn effective_font_size(&self) -> f32 {
        let scale = (self.text_matrix[1].powi(2) + self.text_matrix[3].powi(2)).sqrt();
        (self.font_size * scale).abs()
    }

    fn glyph_width(&self) -> f32 {
        self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale
    }

    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Advance past `text` as if it had been drawn.
    fn advance_over(&mut self, text: &str) {
        let dx: f32 = text
            .chars()
            .map(|ch| {
                let w = self.glyph_width() + self.char_spacing;
                if ch == ' ' {
                    w + self.word_spacing
                } else {
                    w
                }
            })
            .sum();
        self.advance_x(dx);
    }

    fn translate_line(&mut self, tx: f32, ty: f32) {
        let m = self.line_matrix;
        self.line_matrix[4] = m[0] * tx + m[2] * ty + m[4];
        self.line_matrix[5] = m[1] * tx + m[3] * ty + m[5];
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.translate_line(0.0, -self.leading);
    }

    fn run(&self, text: String, x: f32, y: f32) -> TextRun {
        let width = text.chars().count() as f32 * self.glyph_width();
        TextRun {
            text,
            x,
            y,
            width,
            font_size: self.effective_font_size(),
            font_name: self.font_name.clone(),
        }
    }
}

fn number_at(operands: &[Operand], index: usize) -> Option<f32> {
    operands.get(index).and_then(Operand::as_number)
}

fn decode_operand(val: &Operand, backend: &dyn PdfBackend, state: &TextState) -> String {
    match val {
        Operand::Str(bytes) => backend.decode_text(state.font_encoding.as_deref(), bytes),
        _ => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Public API: run extraction
// ---------------------------------------------------------------------------

/// Walk one page's content stream and collect the [`TextRun`]s it draws.
///
/// Handles the text-object, text-state, positioning and text-showing
/// operators (`BT`, `Tf`, `Tm`, `Td`, `TD`, `T*`, `TL`, `Tc`, `Tw`, `Tz`,
/// `Ts`, `Tj`, `TJ`, `'`, `"`). Everything else is ignored.
pub fn read_runs(backend: &dyn PdfBackend, page_id: PageId) -> Result<Vec<TextRun>, OutlineError> {
    let raw_content = backend.page_content(page_id)?;
    let ops = backend.decode_content(&raw_content)?;
    let fonts = backend.page_fonts(page_id).unwrap_or_default();

    let mut state = TextState::default();
    let mut runs: Vec<TextRun> = Vec::new();

    for op in &ops {
        let operands = op.operands.as_slice();
        match op.operator.as_str() {
            "BT" => {
                state.text_matrix = IDENTITY_MATRIX;
                state.line_matrix = IDENTITY_MATRIX;
            }
            "Tf" => set_font(operands, &fonts, &mut state),
            "Tm" => {
                let vals: Vec<f32> = operands.iter().filter_map(Operand::as_number).collect();
                if let &[a, b, c, d, e, f] = vals.as_slice() {
                    state.text_matrix = [a, b, c, d, e, f];
                    state.line_matrix = state.text_matrix;
                }
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (number_at(operands, 0), number_at(operands, 1)) {
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.translate_line(tx, ty);
                }
            }
            "T*" => state.next_line(),
            "TL" => state.leading = number_at(operands, 0).unwrap_or(state.leading),
            "Tc" => state.char_spacing = number_at(operands, 0).unwrap_or(state.char_spacing),
            "Tw" => state.word_spacing = number_at(operands, 0).unwrap_or(state.word_spacing),
            "Tz" => {
                if let Some(v) = number_at(operands, 0) {
                    state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => state.text_rise = number_at(operands, 0).unwrap_or(state.text_rise),
            "Tj" => {
                if let Some(first) = operands.first() {
                    show_string(first, backend, &mut state, &mut runs);
                }
            }
            "TJ" => {
                if let Some(Operand::Array(arr)) = operands.first() {
                    show_array(arr, backend, &mut state, &mut runs);
                }
            }
            "'" => {
                state.next_line();
                if let Some(first) = operands.first() {
                    show_string(first, backend, &mut state, &mut runs);
                }
            }
            "\"" => {
                if let Some(aw) = number_at(operands, 0) {
                    state.word_spacing = aw;
                }
                if let Some(ac) = number_at(operands, 1) {
                    state.char_spacing = ac;
                }
                state.next_line();
                if let Some(text) = operands.get(2) {
                    show_string(text, backend, &mut state, &mut runs);
                }
            }
            _ => {}
        }
    }

    Ok(runs)
}

fn set_font(operands: &[Operand], fonts: &[FontResource], state: &mut TextState) {
    let key = match operands.first() {
        Some(Operand::Name(n)) | Some(Operand::Str(n)) => n.clone(),
        _ => return,
    };
    let resource = fonts.iter().find(|info| info.key == key);
    state.font_size = number_at(operands, 1).unwrap_or(0.0);
    state.font_name = resource
        .and_then(|info| info.base_font.clone())
        .unwrap_or_else(|| String::from_utf8_lossy(&key).into_owned());
    state.font_encoding = resource.and_then(|info| info.encoding.clone());
}

fn show_string(
    operand: &Operand,
    backend: &dyn PdfBackend,
    state: &mut TextState,
    runs: &mut Vec<TextRun>,
) {
    let text = decode_operand(operand, backend, state);
    if text.is_empty() {
        return;
    }
    let (x, y) = (state.x(), state.y());
    state.advance_over(&text);
    runs.push(state.run(text, x, y));
}

/// `TJ` arrays mix strings with kerning adjustments in thousandths of a
/// text-space unit. A large negative adjustment reads as a word gap.
fn show_array(
    arr: &[Operand],
    backend: &dyn PdfBackend,
    state: &mut TextState,
    runs: &mut Vec<TextRun>,
) {
    let mut buf = String::new();
    let mut run_x = state.x();
    let run_y = state.y();

    for elem in arr {
        if let Operand::Str(_) = elem {
            let piece = decode_operand(elem, backend, state);
            if buf.is_empty() {
                run_x = state.x();
            }
            buf.push_str(&piece);
            state.advance_over(&piece);
        } else if let Some(adj) = elem.as_number() {
            let dx = -adj / 1000.0 * state.font_size * state.horiz_scale;
            if dx > state.glyph_width() * 0.3 && !buf.is_empty() {
                buf.push(' ');
            }
            state.advance_x(dx);
        }
    }

    let trimmed = buf.trim_end();
    if !trimmed.is_empty() {
        runs.push(state.run(trimmed.to_string(), run_x, run_y));
    }
}

// ---------------------------------------------------------------------------
// Public API: runs -> lines
// ---------------------------------------------------------------------------

/// Group runs into lines, top of the page first.
pub fn group_runs_into_lines(mut runs: Vec<TextRun>) -> Vec<TextLine> {
    runs.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<TextRun> = Vec::new();

    for run in runs {
        let same_line = current
            .first()
            .is_some_and(|first| (run.y - first.y).abs() <= Y_TOLERANCE);
        if !same_line && !current.is_empty() {
            lines.push(assemble_line(std::mem::take(&mut current)));
        }
        current.push(run);
    }

    if !current.is_empty() {
        lines.push(assemble_line(current));
    }

    lines
}

/// Merge runs on one baseline left to right. Runs of the same font that
/// touch are joined directly; a small gap becomes a space.
fn assemble_line(mut runs: Vec<TextRun>) -> TextLine {
    runs.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));

    let mut merged: Vec<TextRun> = Vec::with_capacity(runs.len());
    for run in runs {
        if let Some(prev) = merged.last_mut() {
            let gap = run.x - (prev.x + prev.width);
            let same_font = prev.font_name == run.font_name
                && (prev.font_size - run.font_size).abs() < FONT_SIZE_STEP;

            if same_font && gap > -prev.font_size && gap < prev.font_size * 2.0 {
                if gap >= MIN_WORD_GAP {
                    prev.text.push(' ');
                }
                prev.text.push_str(&run.text);
                prev.width = (run.x + run.width) - prev.x;
                continue;
            }
        }
        merged.push(run);
    }

    let y = merged.first().map(|r| r.y).unwrap_or(0.0);
    let font_size = dominant_font_size(&merged);
    TextLine {
        runs: merged,
        y,
        font_size,
    }
}

/// The font size covering the most characters.
fn dominant_font_size(runs: &[TextRun]) -> f32 {
    let mut counts: Vec<(f32, usize)> = Vec::new();
    for run in runs {
        let chars = run.text.chars().count();
        match counts
            .iter_mut()
            .find(|(size, _)| (size - run.font_size).abs() < f32::EPSILON)
        {
            Some((_, n)) => *n += chars,
            None => counts.push((run.font_size, chars)),
        }
    }
    counts
        .into_iter()
        .max_by_key(|(_, n)| *n)
        .map(|(size, _)| size)
        .unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Public API: lines -> blocks
// ---------------------------------------------------------------------------

/// Group consecutive lines into blocks.
///
/// A new block starts when the vertical gap to the previous line exceeds
/// [`BLOCK_GAP_FACTOR`] times its font size, or when the dominant font size
/// changes.
pub fn group_lines_into_blocks(lines: Vec<TextLine>) -> Vec<LayoutBlock> {
    let mut blocks: Vec<LayoutBlock> = Vec::new();
    let mut current: Vec<TextLine> = Vec::new();

    for line in lines {
        if let Some(prev) = current.last() {
            let gap_break = (prev.y - line.y).abs() > prev.font_size * BLOCK_GAP_FACTOR;
            let size_break = (prev.font_size - line.font_size).abs() >= FONT_SIZE_STEP;
            if gap_break || size_break {
                blocks.push(close_block(std::mem::take(&mut current)));
            }
        }
        current.push(line);
    }

    if !current.is_empty() {
        blocks.push(close_block(current));
    }

    blocks
}

fn close_block(lines: Vec<TextLine>) -> LayoutBlock {
    let mut bbox: Option<BoundingBox> = None;
    for run in lines.iter().flat_map(|l| l.runs.iter()) {
        let run_box = BoundingBox {
            x0: run.x,
            y0: run.y,
            x1: run.x + run.width,
            y1: run.y + run.font_size,
        };
        bbox = Some(match bbox {
            None => run_box,
            Some(b) => BoundingBox {
                x0: b.x0.min(run_box.x0),
                y0: b.y0.min(run_box.y0),
                x1: b.x1.max(run_box.x1),
                y1: b.y1.max(run_box.y1),
            },
        });
    }

    LayoutBlock {
        lines,
        bbox: bbox.unwrap_or_default(),
    }
}

// ---------------------------------------------------------------------------
// Public API: full page
// ---------------------------------------------------------------------------

/// Run the layout pipeline for one page.
pub fn analyze_page(
    backend: &dyn PdfBackend,
    number: usize,
    page_id: PageId,
) -> Result<PageLayout, OutlineError> {
    let runs = read_runs(backend, page_id)?;
    let blocks = group_lines_into_blocks(group_runs_into_lines(runs));
    Ok(PageLayout {
        number,
        height: backend.page_height(page_id),
        blocks,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
