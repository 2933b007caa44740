//! List item extraction: bulleted and enumerated lines, marker stripped.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMarker {
    Bullet,
    Numbered,
}

/// Marker patterns in evaluation order; the first match wins.
static LIST_PATTERNS: Lazy<Vec<(ListMarker, Regex)>> = Lazy::new(|| {
    [
        (ListMarker::Bullet, r"^[•\-*○●□■◆◇▪▫]\s+"),
        (ListMarker::Numbered, r"^\d+\.\s+"),
        (ListMarker::Numbered, r"^\d+\)\s+"),
        (ListMarker::Numbered, r"^\(\d+\)\s+"),
        (ListMarker::Numbered, r"^\d+、\s*"),
    ]
    .into_iter()
    .map(|(marker, pattern)| {
        (
            marker,
            Regex::new(pattern).expect("valid list marker regex"),
        )
    })
    .collect()
});

/// Splits a trimmed line into its list marker and content.
///
/// Returns `None` when the line is not a list item or nothing follows the marker.
pub fn strip_list_marker(line: &str) -> Option<(ListMarker, &str)> {
    LIST_PATTERNS.iter().find_map(|(marker, re)| {
        re.find(line).and_then(|m| {
            let content = &line[m.end()..];
            (!content.is_empty()).then_some((*marker, content))
        })
    })
}

/// Returns list item contents in document order.
pub fn extract_lists(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(strip_list_marker)
        .map(|(_, content)| content.to_string())
        .collect()
}
