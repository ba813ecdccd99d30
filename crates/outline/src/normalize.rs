use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Literal `from -> to` replacements applied around the generic repairs.
///
/// Pairs are applied in order with plain substring replacement. Both lists
/// are empty by default; they exist for corpora with known extraction damage
/// that no generic rule can fix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitutions {
    #[serde(default)]
    pub pre: Vec<(String, String)>,
    #[serde(default)]
    pub post: Vec<(String, String)>,
}

impl Substitutions {
    pub fn is_empty(&self) -> bool {
        self.pre.is_empty() && self.post.is_empty()
    }
}

/// Repairs spacing damage introduced by layout-based text extraction.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    substitutions: Substitutions,
}

impl Normalizer {
    pub fn new(substitutions: Substitutions) -> Self {
        Self { substitutions }
    }

    /// Apply the `pre` table, the generic repairs, then the `post` table.
    pub fn normalize(&self, text: &str) -> String {
        let text = apply_table(text.to_string(), &self.substitutions.pre);
        let text = repair_spacing(&text);
        apply_table(text, &self.substitutions.post)
    }
}

/// Normalize with no substitution tables.
pub fn normalize(text: &str) -> String {
    repair_spacing(text)
}

fn apply_table(mut text: String, table: &[(String, String)]) -> String {
    for (from, to) in table {
        if !from.is_empty() && text.contains(from.as_str()) {
            text = text.replace(from.as_str(), to);
        }
    }
    text
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern compiles"))
}

/// Document-agnostic repairs.
///
/// Every rewrite removes the condition that triggered it, so running this
/// twice gives the same result as running it once.
fn repair_spacing(text: &str) -> String {
    // 1. Unicode NFC normalization.
    let mut result: String = text.nfc().collect();

    // 2. Expand typographic ligatures.
    let ligatures = [
        ('\u{FB00}', "ff"),
        ('\u{FB01}', "fi"),
        ('\u{FB02}', "fl"),
        ('\u{FB03}', "ffi"),
        ('\u{FB04}', "ffl"),
    ];
    for (lig, replacement) in ligatures {
        if result.contains(lig) {
            result = result.replace(lig, replacement);
        }
    }

    // 3. Split words glued at a lowercase -> uppercase boundary.
    static RE_CAMEL: OnceLock<Regex> = OnceLock::new();
    result = regex(&RE_CAMEL, r"(\p{Ll})(\p{Lu})")
        .replace_all(&result, "$1 $2")
        .into_owned();

    // 4. Separate letters from adjacent digits, in both directions.
    static RE_LETTER_DIGIT: OnceLock<Regex> = OnceLock::new();
    result = regex(&RE_LETTER_DIGIT, r"(\p{Latin})(\d)")
        .replace_all(&result, "$1 $2")
        .into_owned();
    static RE_DIGIT_LETTER: OnceLock<Regex> = OnceLock::new();
    result = regex(&RE_DIGIT_LETTER, r"(\d)(\p{Latin})")
        .replace_all(&result, "$1 $2")
        .into_owned();

    // 5. Collapse whitespace runs.
    static RE_SPACES: OnceLock<Regex> = OnceLock::new();
    result = regex(&RE_SPACES, r"\s+").replace_all(&result, " ").into_owned();

    // 6. No space before sentence punctuation.
    static RE_SPACE_PUNCT: OnceLock<Regex> = OnceLock::new();
    result = regex(&RE_SPACE_PUNCT, r"\s+([.,!?])")
        .replace_all(&result, "$1")
        .into_owned();

    // 7. One space after sentence punctuation followed by a letter.
    static RE_PUNCT_LETTER: OnceLock<Regex> = OnceLock::new();
    result = regex(&RE_PUNCT_LETTER, r"([.,!?])(\p{Latin})")
        .replace_all(&result, "$1 $2")
        .into_owned();

    result.trim().to_string()
}
