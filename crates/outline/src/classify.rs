//! Heading-level classification.
//!
//! A fragment is matched against an ordered rule table. Rules are grouped by
//! level (all H1 rules, then H2, then H3) and the first matching rule decides
//! the level, so a fragment that satisfies any H1 rule is never H2 or H3.
//!
//! Font thresholds are relative to the document's largest font, so the same
//! table adapts to documents set at different point sizes. The textual rules
//! (keyword prefixes, numbering, bullets, all caps) still fire when font
//! metadata is flat or missing.

use crate::stats::FontStatistics;
use crate::types::{HeadingLevel, PositionedFragment};

/// Texts with this many characters or fewer are never headings.
pub const MIN_HEADING_CHARS: usize = 2;

/// Texts with this many characters or more are never headings.
pub const MAX_HEADING_CHARS: usize = 200;

const H1_PREFIXES: [&str; 5] = ["Chapter", "Section", "Part", "Introduction", "Conclusion"];

const H3_BULLETS: [char; 4] = ['•', '●', '-', '○'];

/// Everything a rule may look at, computed once per fragment.
#[derive(Debug, Clone, Copy)]
pub struct Signals<'a> {
    pub text: &'a str,
    pub char_len: usize,
    pub ratio: f32,
    pub mean_ratio: f32,
    pub is_bold: bool,
    pub is_top: bool,
}

impl<'a> Signals<'a> {
    pub fn new(fragment: &'a PositionedFragment, stats: &FontStatistics) -> Self {
        Signals {
            text: &fragment.text,
            char_len: fragment.char_len(),
            ratio: stats.ratio(fragment.font_size),
            mean_ratio: stats.mean_ratio(),
            is_bold: fragment.is_bold,
            is_top: fragment.position.is_top(),
        }
    }
}

pub struct Rule {
    pub level: HeadingLevel,
    pub name: &'static str,
    pub applies: fn(&Signals) -> bool,
}

/// Evaluated top to bottom; the first rule that applies wins.
pub static RULES: &[Rule] = &[
    // -- H1 ---------------------------------------------------------------
    Rule {
        level: HeadingLevel::H1,
        name: "dominant-font",
        applies: |s| s.ratio > 0.8,
    },
    Rule {
        level: HeadingLevel::H1,
        name: "bold-large-top",
        applies: |s| s.ratio > 0.6 && s.is_bold && s.is_top,
    },
    Rule {
        level: HeadingLevel::H1,
        name: "keyword-prefix",
        applies: |s| H1_PREFIXES.iter().any(|p| s.text.starts_with(p)),
    },
    Rule {
        level: HeadingLevel::H1,
        name: "short-all-caps",
        applies: |s| s.char_len < 50 && is_all_caps(s.text),
    },
    // -- H2 ---------------------------------------------------------------
    Rule {
        level: HeadingLevel::H2,
        name: "large-font",
        applies: |s| s.ratio > 0.5,
    },
    Rule {
        level: HeadingLevel::H2,
        name: "bold-medium",
        applies: |s| s.ratio > 0.4 && s.is_bold,
    },
    Rule {
        level: HeadingLevel::H2,
        name: "numbered",
        applies: |s| starts_with_section_number(s.text),
    },
    Rule {
        level: HeadingLevel::H2,
        name: "leading-digit",
        applies: |s| s.char_len < 80 && s.text.chars().take(3).any(|c| c.is_ascii_digit()),
    },
    // -- H3 ---------------------------------------------------------------
    Rule {
        level: HeadingLevel::H3,
        name: "medium-font",
        applies: |s| s.ratio > 0.3,
    },
    Rule {
        level: HeadingLevel::H3,
        name: "bold-small",
        applies: |s| s.ratio > 0.25 && s.is_bold,
    },
    Rule {
        level: HeadingLevel::H3,
        name: "bullet",
        applies: |s| s.text.starts_with(H3_BULLETS),
    },
    Rule {
        level: HeadingLevel::H3,
        name: "above-mean",
        applies: |s| s.char_len < 120 && s.ratio > s.mean_ratio,
    },
];

/// Classify a fragment, or `None` when it is not a heading.
pub fn classify(fragment: &PositionedFragment, stats: &FontStatistics) -> Option<HeadingLevel> {
    matching_rule(fragment, stats).map(|rule| rule.level)
}

/// The rule that decides a fragment's level, if any.
pub fn matching_rule(fragment: &PositionedFragment, stats: &FontStatistics) -> Option<&'static Rule> {
    let signals = Signals::new(fragment, stats);
    if signals.char_len <= MIN_HEADING_CHARS || signals.char_len >= MAX_HEADING_CHARS {
        return None;
    }
    RULES.iter().find(|rule| (rule.applies)(&signals))
}

/// `1.` through `9.` at the start of the text.
fn starts_with_section_number(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some('1'..='9'), Some('.'))
    )
}

/// At least one cased letter and no lowercase letter.
fn is_all_caps(text: &str) -> bool {
    text.chars().any(char::is_uppercase) && !text.chars().any(char::is_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, PositionBucket};

    fn fragment(text: &str, font_size: f32, is_bold: bool, position: PositionBucket) -> PositionedFragment {
        PositionedFragment {
            text: text.to_string(),
            page: 1,
            bbox: BoundingBox::default(),
            font_size,
            font_name: String::new(),
            is_bold,
            is_italic: false,
            position,
        }
    }

    fn stats(max: f32, mean: f32) -> FontStatistics {
        FontStatistics {
            max_font_size: max,
            mean_font_size: mean,
            sample_count: 2,
        }
    }

    #[test]
    fn test_rules_are_grouped_by_level() {
        let levels: Vec<u8> = RULES.iter().map(|r| r.level.as_u8()).collect();
        let mut sorted = levels.clone();
        sorted.sort();
        assert_eq!(levels, sorted);
    }

    #[test]
    fn test_numbered_intro_at_max_size_is_h1() {
        let f = fragment("1. Introduction", 18.0, true, PositionBucket::Top);
        assert_eq!(classify(&f, &stats(18.0, 12.0)), Some(HeadingLevel::H1));
        assert_eq!(matching_rule(&f, &stats(18.0, 12.0)).unwrap().name, "dominant-font");
    }

    #[test]
    fn test_half_ratio_falls_through_to_h3() {
        // ratio 0.5 is not > 0.5 and nothing else in H2 matches.
        let f = fragment("Overview", 9.0, false, PositionBucket::Middle);
        assert_eq!(classify(&f, &stats(18.0, 10.0)), Some(HeadingLevel::H3));
    }

    #[test]
    fn test_bold_top_promotes_to_h1() {
        let f = fragment("Background", 13.0, true, PositionBucket::Top);
        assert_eq!(classify(&f, &stats(20.0, 12.0)), Some(HeadingLevel::H1));

        let not_top = fragment("Background", 13.0, true, PositionBucket::Middle);
        assert_eq!(classify(&not_top, &stats(20.0, 12.0)), Some(HeadingLevel::H2));
    }

    #[test]
    fn test_keyword_prefix_is_h1() {
        let f = fragment("Conclusion and outlook", 5.0, false, PositionBucket::Bottom);
        assert_eq!(classify(&f, &stats(20.0, 12.0)), Some(HeadingLevel::H1));
    }

    #[test]
    fn test_keyword_prefix_is_case_sensitive() {
        let f = fragment("chapter summary text", 5.0, false, PositionBucket::Bottom);
        assert_eq!(classify(&f, &stats(20.0, 12.0)), None);
    }

    #[test]
    fn test_short_all_caps_is_h1() {
        let f = fragment("TABLE OF CONTENTS", 5.0, false, PositionBucket::Bottom);
        assert_eq!(classify(&f, &stats(20.0, 12.0)), Some(HeadingLevel::H1));
    }

    #[test]
    fn test_digits_only_are_not_all_caps() {
        assert!(!is_all_caps("1234"));
        assert!(is_all_caps("ABC 123"));
        assert!(!is_all_caps("ABc"));
    }

    #[test]
    fn test_section_number_is_h2() {
        let f = fragment("3.Methods used in the study", 5.0, false, PositionBucket::Bottom);
        assert_eq!(classify(&f, &stats(20.0, 12.0)), Some(HeadingLevel::H2));
    }

    #[test]
    fn test_zero_prefix_is_not_section_number() {
        assert!(!starts_with_section_number("0. Preface"));
        assert!(!starts_with_section_number("10. Tenth"));
        assert!(starts_with_section_number("9. Ninth"));
    }

    #[test]
    fn test_leading_digit_within_three_chars_is_h2() {
        let f = fragment("Q 4 results", 5.0, false, PositionBucket::Bottom);
        assert_eq!(classify(&f, &stats(20.0, 12.0)), Some(HeadingLevel::H2));
    }

    #[test]
    fn test_bullet_is_h3() {
        let f = fragment("• a bullet point", 5.0, false, PositionBucket::Bottom);
        assert_eq!(classify(&f, &stats(20.0, 12.0)), Some(HeadingLevel::H3));
        let dash = fragment("- dashed item", 5.0, false, PositionBucket::Bottom);
        assert_eq!(classify(&dash, &stats(20.0, 12.0)), Some(HeadingLevel::H3));
    }

    #[test]
    fn test_body_text_is_not_a_heading() {
        let f = fragment("plain body text at body size", 5.0, false, PositionBucket::Middle);
        assert_eq!(classify(&f, &stats(20.0, 12.0)), None);
    }

    #[test]
    fn test_length_bounds() {
        let s = stats(18.0, 12.0);
        for text in ["", "A", "AB"] {
            let f = fragment(text, 18.0, true, PositionBucket::Top);
            assert_eq!(classify(&f, &s), None, "{:?} should be too short", text);
        }
        assert!(classify(&fragment("ABC", 18.0, true, PositionBucket::Top), &s).is_some());

        let long = "X".repeat(MAX_HEADING_CHARS);
        assert_eq!(classify(&fragment(&long, 18.0, true, PositionBucket::Top), &s), None);
        let just_under = "x".repeat(MAX_HEADING_CHARS - 1);
        assert!(classify(&fragment(&just_under, 18.0, true, PositionBucket::Top), &s).is_some());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // Two multi-byte characters stay below the minimum.
        let f = fragment("éé", 18.0, false, PositionBucket::Top);
        assert_eq!(classify(&f, &stats(18.0, 12.0)), None);
    }

    #[test]
    fn test_unsized_document_only_matches_text_rules() {
        let s = FontStatistics::UNSIZED;
        assert_eq!(
            classify(&fragment("Chapter 2", 0.0, false, PositionBucket::Top), &s),
            Some(HeadingLevel::H1)
        );
        assert_eq!(
            classify(&fragment("ordinary words", 0.0, true, PositionBucket::Top), &s),
            None
        );
    }

    #[test]
    fn test_font_size_can_only_promote() {
        let s = stats(24.0, 11.0);
        let texts = ["Overview", "results and discussion", "- item", "4 items"];
        for text in texts {
            for (bold, position) in [
                (false, PositionBucket::Middle),
                (true, PositionBucket::Top),
                (true, PositionBucket::Bottom),
            ] {
                let mut previous: Option<HeadingLevel> = None;
                for step in 0..=60 {
                    let size = step as f32 * 0.5;
                    let level = classify(&fragment(text, size, bold, position), &s);
                    if let Some(prev) = previous {
                        let now = level.unwrap_or_else(|| {
                            panic!("{:?} lost its heading level at size {}", text, size)
                        });
                        assert!(now <= prev, "{:?} demoted from {} to {} at size {}", text, prev, now, size);
                    }
                    previous = level.or(previous);
                }
            }
        }
    }
}
