//! Content extraction module
//!
//! Turns a rendered page into the pieces the crawler records:
//! - a title
//! - the linearized main content
//! - interactive sections (accordions, details blocks, tab panels)
//! - for detail pages, an ordered list of titled sections and a summary
//!
//! Junk removal runs first and mutates the document; every other function
//! only reads it.

mod interactive;
mod linearize;
mod sections;
mod text;

pub use interactive::extract_interactive;
pub use linearize::linearize;
pub use sections::{extract_sections, extract_summary};
pub use text::{clean_text, collapse_blank_lines, ellipsize, truncate_chars};

use crate::dom::{Document, Element};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Elements stripped from a page before content extraction
pub const JUNK_SELECTORS: &[&str] = &[
    "script",
    "style",
    "noscript",
    "nav",
    "header",
    "footer",
    "aside",
    ".breadcrumb",
    ".breadcrumbs",
    "[aria-label='breadcrumb']",
    ".pagination",
    "#cookie-banner",
    ".cookie-notice",
    ".cookie-banner",
    ".cookie-consent",
    ".ad",
    ".advertisement",
    "[role='banner']",
    "[role='navigation']",
    "[role='complementary']",
    ".skip-link",
    "#skip-link",
    ".back-to-top",
    "a[href='#top']",
];

/// Title used when a page has neither `<h1>` nor `<title>`
pub const UNTITLED: &str = "Untitled";

/// Kind of collapsible UI a section came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractiveKind {
    Tab,
    Accordion,
    Details,
    Other,
}

impl InteractiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tab => "tab",
            Self::Accordion => "accordion",
            Self::Details => "details",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for InteractiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content hidden behind a tab, accordion or details control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractiveSection {
    pub kind: InteractiveKind,
    pub name: String,
    pub content: String,
}

/// A titled block of a detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: String,
}

/// Everything extracted from one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub title: String,
    pub main_content: String,
    pub interactive_sections: Vec<InteractiveSection>,
    /// First substantial paragraph, empty when none qualifies
    pub summary: String,
    pub sections: Vec<Section>,
}

/// Knobs that change what [`extract_with`] reads
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// CSS selector restricting content and interactive extraction to one subtree
    pub content_area: Option<String>,
    /// Whether to read accordion, details and tab panel content
    pub interactive: bool,
}

/// Removes navigation, chrome and ads from the document
///
/// # Returns
///
/// Number of elements removed
pub fn remove_junk(doc: &mut Document) -> usize {
    let removed: usize = JUNK_SELECTORS.iter().map(|css| doc.remove(css)).sum();
    tracing::debug!("Removed {} junk elements", removed);
    removed
}

/// Extracts title, main content and interactive sections with default options
///
/// Interactive sections are read; no content area restriction applies.
pub fn extract(doc: &Document) -> ExtractedContent {
    extract_with(
        doc,
        &ExtractOptions {
            content_area: None,
            interactive: true,
        },
    )
}

/// Extracts page content
///
/// # Arguments
///
/// * `doc` - The page, normally after [`remove_junk`]
/// * `options` - Content area and interactive extraction settings
///
/// # Returns
///
/// The extracted content. Never fails: a page with no recognizable structure
/// yields its whole text as main content, and an empty page yields empty
/// strings with the title `"Untitled"`.
pub fn extract_with(doc: &Document, options: &ExtractOptions) -> ExtractedContent {
    let title = extract_title(doc);

    let scope = options
        .content_area
        .as_deref()
        .and_then(|css| {
            let area = doc.select_first(css);
            if area.is_none() {
                tracing::debug!("Content area {:?} not found, using whole page", css);
            }
            area
        })
        .unwrap_or_else(|| doc.root());

    let interactive_sections = if options.interactive {
        extract_interactive(doc, scope)
    } else {
        Vec::new()
    };

    ExtractedContent {
        title,
        main_content: linearize(main_container(scope), &[]),
        interactive_sections,
        summary: extract_summary(doc),
        sections: extract_sections(doc),
    }
}

/// First `<h1>` text, else `<title>`, else `"Untitled"`
pub fn extract_title(doc: &Document) -> String {
    ["h1", "title"]
        .iter()
        .filter_map(|tag| doc.select_first(tag))
        .map(|el| clean_text(&el.text()))
        .find(|text| !text.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// `<main>`, else the first article/div whose class mentions "content", else `scope`
fn main_container(scope: Element<'_>) -> Element<'_> {
    let Some(main) = crate::dom::compile("main") else {
        return scope;
    };
    if let Some(found) = scope.select_first(&main) {
        return found;
    }

    let Some(candidates) = crate::dom::compile("article[class], div[class]") else {
        return scope;
    };
    scope
        .select(&candidates)
        .into_iter()
        .find(|el| el.class_attr().to_lowercase().contains("content"))
        .unwrap_or(scope)
}
