//! Text cleanup shared by the extractor, the link classifier and enrichment

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("hardcoded regex pattern is valid"));

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("hardcoded regex pattern is valid"));

/// Boilerplate phrases that carry no page content
static BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:back to top|skip to (?:main )?content|print this page|share this page)\b")
        .expect("hardcoded regex pattern is valid")
});

/// Collapses whitespace, strips boilerplate phrases and trims
///
/// # Example
///
/// ```
/// use site_harvest::extract::clean_text;
///
/// assert_eq!(clean_text("  Fees \n apply  Back to top "), "Fees apply");
/// ```
pub fn clean_text(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text, " ");
    let stripped = BOILERPLATE.replace_all(&collapsed, "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Trims trailing spaces per line, squeezes 3+ newlines to 2 and trims
pub fn collapse_blank_lines(text: &str) -> String {
    let trimmed_lines = text
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    BLANK_RUNS
        .replace_all(&trimmed_lines, "\n\n")
        .trim()
        .to_string()
}

/// The first `max_chars` characters of `text`, on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Truncates to `max_chars` and appends `...` when something was cut
pub fn ellipsize(text: &str, max_chars: usize) -> String {
    let head = truncate_chars(text, max_chars);
    if head.len() < text.len() {
        format!("{}...", head)
    } else {
        head.to_string()
    }
}
