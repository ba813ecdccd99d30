//! The JSON document written for every processed PDF.

use crate::types::{Outline, OutlineEntry, OutlineResult};

/// Title reported when a document could not be processed.
pub const ERROR_TITLE: &str = "Error processing PDF";

/// Project an assembled outline to its public shape.
///
/// Only level, text and page survive; font size and position were needed for
/// ordering and are dropped here.
pub fn to_result(outline: &Outline) -> OutlineResult {
    OutlineResult {
        title: outline.title.clone(),
        outline: outline.headings.iter().map(OutlineEntry::from).collect(),
        error: None,
    }
}

/// The result reported for a document that failed.
pub fn to_error(message: impl Into<String>) -> OutlineResult {
    OutlineResult {
        title: ERROR_TITLE.to_string(),
        outline: Vec::new(),
        error: Some(message.into()),
    }
}

/// Serialize with two-space indentation, keeping non-ASCII characters as-is.
pub fn to_json_pretty(result: &OutlineResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}
