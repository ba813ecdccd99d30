use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse vertical zone of a fragment on its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionBucket {
    Top,
    Middle,
    Bottom,
}

impl PositionBucket {
    /// Bucket a block by the bottom edge of its bounding box.
    ///
    /// `y0` uses PDF user space (y grows upward), so the top of the page is
    /// the region above 70% of the page height. Without a page height the
    /// fragment is placed in the middle.
    pub fn from_vertical(y0: f32, page_height: Option<f32>) -> Self {
        let Some(height) = page_height.filter(|h| h.is_finite() && *h > 0.0) else {
            return PositionBucket::Middle;
        };

        if y0 > height * 0.7 {
            PositionBucket::Top
        } else if y0 > height * 0.3 {
            PositionBucket::Middle
        } else {
            PositionBucket::Bottom
        }
    }

    pub fn is_top(self) -> bool {
        self == PositionBucket::Top
    }
}

impl fmt::Display for PositionBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionBucket::Top => write!(f, "top"),
            PositionBucket::Middle => write!(f, "middle"),
            PositionBucket::Bottom => write!(f, "bottom"),
        }
    }
}

/// Axis-aligned bounding box in PDF user space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// One unit of extracted text with the layout metadata the classifier needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedFragment {
    pub text: String,
    pub page: usize,
    pub bbox: BoundingBox,
    /// Largest font size seen in the source block, 0.0 when unknown.
    pub font_size: f32,
    pub font_name: String,
    pub is_bold: bool,
    pub is_italic: bool,
    pub position: PositionBucket,
}

impl PositionedFragment {
    /// Number of characters (not bytes) in the fragment text.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    pub fn as_u8(&self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.as_u8())
    }
}

/// A fragment that passed classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub level: HeadingLevel,
    pub text: String,
    pub page: usize,
    pub font_size: f32,
    pub position: PositionBucket,
}

/// The surfaced part of a [`Heading`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    pub level: HeadingLevel,
    pub text: String,
    pub page: usize,
}

impl From<&Heading> for OutlineEntry {
    fn from(heading: &Heading) -> Self {
        OutlineEntry {
            level: heading.level,
            text: heading.text.clone(),
            page: heading.page,
        }
    }
}

/// Assembled outline of a single document, before it is wrapped for output.
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    pub title: String,
    pub headings: Vec<Heading>,
}

/// Final per-document output.
///
/// When `error` is set the outline is empty and the title is
/// [`crate::envelope::ERROR_TITLE`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OutlineResult {
    pub title: String,
    pub outline: Vec<OutlineEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OutlineResult {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
