use std::cmp::Ordering;
use std::time::{Duration, Instant};

use crate::classify::classify;
use crate::stats::FontStatistics;
use crate::types::{Heading, HeadingLevel, Outline, PositionedFragment};
use crate::OutlineError;

/// Title used when neither a heading nor a suitable top-of-page fragment exists.
pub const UNTITLED: &str = "Untitled Document";

/// Wall-clock budget for one document, checked after assembly.
pub const PROCESSING_BUDGET: Duration = Duration::from_secs(10);

/// Classify every fragment and build the ordered outline with its title.
pub fn assemble(fragments: &[PositionedFragment]) -> Outline {
    let stats = FontStatistics::compute(fragments);
    let headings = collect_headings(fragments, &stats);
    let title = select_title(&headings, fragments);
    Outline { title, headings }
}

/// Headings in outline order. A document without any font size
/// information has no headings.
pub fn collect_headings(fragments: &[PositionedFragment], stats: &FontStatistics) -> Vec<Heading> {
    if !stats.has_size_info() {
        log::debug!("no font size information, outline stays empty");
        return Vec::new();
    }

    let mut headings: Vec<Heading> = fragments
        .iter()
        .filter_map(|fragment| {
            classify(fragment, stats).map(|level| Heading {
                level,
                text: fragment.text.clone(),
                page: fragment.page,
                font_size: fragment.font_size,
                position: fragment.position,
            })
        })
        .collect();

    // `sort_by` is stable: ties keep ingestion order.
    headings.sort_by(outline_order);
    log::debug!(
        "classified {} of {} fragments as headings",
        headings.len(),
        fragments.len()
    );
    headings
}

/// Page ascending, then larger font first, then top-of-page headings last.
fn outline_order(a: &Heading, b: &Heading) -> Ordering {
    a.page
        .cmp(&b.page)
        .then_with(|| b.font_size.partial_cmp(&a.font_size).unwrap_or(Ordering::Equal))
        .then_with(|| a.position.is_top().cmp(&b.position.is_top()))
}

/// First H1, else first H2, else the first top-of-page fragment of
/// reasonable length with a known font size, else [`UNTITLED`].
pub fn select_title(headings: &[Heading], fragments: &[PositionedFragment]) -> String {
    let first_at = |level: HeadingLevel| headings.iter().find(|h| h.level == level);

    if let Some(heading) = first_at(HeadingLevel::H1).or_else(|| first_at(HeadingLevel::H2)) {
        return heading.text.clone();
    }

    fragments
        .iter()
        .find(|f| {
            let len = f.char_len();
            len > 3 && len < 100 && f.position.is_top() && f.font_size > 0.0
        })
        .map(|f| f.text.clone())
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Fail when more than `budget` has elapsed since `started`.
///
/// This runs after the work is done; it does not interrupt anything.
pub fn check_budget(started: Instant, budget: Duration) -> Result<(), OutlineError> {
    let elapsed = started.elapsed();
    if elapsed > budget {
        return Err(OutlineError::ProcessingTimeout { elapsed, budget });
    }
    Ok(())
}
