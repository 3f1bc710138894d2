//! Heading-delimited section extraction for detail pages

use super::linearize::linearize;
use super::text::clean_text;
use super::Section;
use crate::dom::{Document, Element};

/// Minimum characters for a paragraph to count as a summary
const MIN_SUMMARY_CHARS: usize = 20;

/// Paragraphs inspected by the summary fallback
const SUMMARY_FALLBACK_PARAGRAPHS: usize = 5;

/// Tags whose text is collected into the current section
const BLOCK_TAGS: &[&str] = &["p", "ul", "ol", "div", "table"];

/// Container whose top-level children are scanned: `main`, `article`, then `body`
fn content_root(doc: &Document) -> Option<Element<'_>> {
    doc.select_first("main")
        .or_else(|| doc.select_first("article"))
        .or_else(|| doc.select_first("body"))
}

/// Splits the document into ordered titled sections
///
/// The primary pass walks the top-level children of the content root: an
/// `h2`/`h3` opens a section and the following `p`, `ul`, `ol`, `div` and
/// `table` blocks are joined into its content with blank lines. Blocks before
/// the first heading are ignored and sections without content are dropped.
///
/// When that finds nothing, every `h2`/`h3`/`h4` in the content root starts
/// a section that collects its following siblings up to the next heading of
/// equal or higher rank.
///
/// The document is only read, so repeated calls return identical output.
pub fn extract_sections(doc: &Document) -> Vec<Section> {
    let Some(root) = content_root(doc) else {
        return Vec::new();
    };

    let sections = top_level_sections(root);
    if !sections.is_empty() {
        return sections;
    }

    tracing::debug!("No top-level sections found, falling back to heading scan");
    heading_scan_sections(root)
}

fn top_level_sections(root: Element<'_>) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<(String, Vec<String>)> = None;

    for child in root.children() {
        match child.tag() {
            "h2" | "h3" => {
                if let Some((title, blocks)) = current.take() {
                    push_section(&mut sections, title, blocks);
                }
                current = Some((clean_text(&child.text()), Vec::new()));
            }
            tag if BLOCK_TAGS.contains(&tag) => {
                if let Some((_, blocks)) = current.as_mut() {
                    let text = block_text(child);
                    if !text.is_empty() {
                        blocks.push(text);
                    }
                }
            }
            _ => {}
        }
    }

    if let Some((title, blocks)) = current {
        push_section(&mut sections, title, blocks);
    }
    sections
}

fn heading_scan_sections(root: Element<'_>) -> Vec<Section> {
    let Some(headings) = crate::dom::compile("h2, h3, h4") else {
        return Vec::new();
    };

    let mut sections = Vec::new();
    for heading in root.select(&headings) {
        let title = clean_text(&heading.text());
        if title.is_empty() {
            continue;
        }
        let rank = heading.heading_level().unwrap_or(6);

        let blocks: Vec<String> = heading
            .following_siblings()
            .take_while(|sibling| sibling.heading_level().map_or(true, |level| level > rank))
            .filter(|sibling| BLOCK_TAGS.contains(&sibling.tag()))
            .map(block_text)
            .filter(|text| !text.is_empty())
            .collect();

        push_section(&mut sections, title, blocks);
    }
    sections
}

fn push_section(sections: &mut Vec<Section>, title: String, blocks: Vec<String>) {
    let content = blocks.join("\n\n");
    if !title.is_empty() && !content.trim().is_empty() {
        sections.push(Section { title, content });
    }
}

/// Lists and tables keep their structure; everything else is flattened
fn block_text(el: Element<'_>) -> String {
    match el.tag() {
        "ul" | "ol" | "table" => linearize(el, &[]),
        _ => clean_text(&el.text()),
    }
}

/// First substantial paragraph of the page
///
/// Prefers the first paragraph after the `h1` when it is longer than 20
/// characters; otherwise the first such paragraph among the first five in
/// the content root. Empty when neither exists.
pub fn extract_summary(doc: &Document) -> String {
    let Some(root) = content_root(doc) else {
        return String::new();
    };
    let Some(flow) = crate::dom::compile("h1, p") else {
        return String::new();
    };

    let ordered = root.select(&flow);

    if let Some(h1_pos) = ordered.iter().position(|el| el.tag() == "h1") {
        if let Some(next_p) = ordered[h1_pos + 1..].iter().find(|el| el.tag() == "p") {
            let text = clean_text(&next_p.text());
            if text.chars().count() > MIN_SUMMARY_CHARS {
                return text;
            }
        }
    }

    ordered
        .iter()
        .filter(|el| el.tag() == "p")
        .take(SUMMARY_FALLBACK_PARAGRAPHS)
        .map(|p| clean_text(&p.text()))
        .find(|text| text.chars().count() > MIN_SUMMARY_CHARS)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL: &str = r#"
        <html><body>
          <nav>menu</nav>
          <main>
            <h1>Skilled Independent visa</h1>
            <p>Short.</p>
            <p>This visa lets invited skilled workers live and work permanently.</p>
            <h2>Overview</h2>
            <p>Stay permanently.</p>
            <ul><li>Work</li><li>Study</li></ul>
            <h2>Empty heading</h2>
            <h3>Costs</h3>
            <table><tr><td>Main applicant</td><td>AUD 4,765</td></tr></table>
            <span>ignored inline</span>
          </main>
        </body></html>
    "#;

    #[test]
    fn test_top_level_sections() {
        let doc = Document::parse(DETAIL);
        let sections = extract_sections(&doc);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Overview");
        assert_eq!(sections[0].content, "Stay permanently.\n\n- Work\n- Study");
        assert_eq!(sections[1].title, "Costs");
        assert_eq!(sections[1].content, "Main applicant | AUD 4,765");
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let doc = Document::parse(DETAIL);
        assert_eq!(extract_sections(&doc), extract_sections(&doc));
    }

    #[test]
    fn test_fallback_heading_scan() {
        // Headings are nested, so the top-level pass sees none
        let doc = Document::parse(
            r#"<main><div class="wrap">
                 <h2>Eligibility</h2><p>Be under 45.</p>
                 <h4>Age</h4><p>Exceptions exist.</p>
                 <h3>Next</h3><p>Apply.</p>
                 <h2>After</h2><p>Wait.</p>
               </div></main>"#,
        );
        let sections = extract_sections(&doc);
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Eligibility", "Age", "Next", "After"]);
        // h4 is lower rank than h2, so the h2 section runs past it
        assert_eq!(sections[0].content, "Be under 45.\n\nExceptions exist.\n\nApply.");
        assert_eq!(sections[1].content, "Exceptions exist.");
        assert_eq!(sections[2].content, "Apply.");
    }

    #[test]
    fn test_no_headings_yields_empty() {
        let doc = Document::parse("<body><p>Just text</p></body>");
        assert!(extract_sections(&doc).is_empty());
    }

    #[test]
    fn test_summary_after_h1() {
        let doc = Document::parse(DETAIL);
        assert_eq!(
            extract_summary(&doc),
            "This visa lets invited skilled workers live and work permanently."
        );
    }

    #[test]
    fn test_summary_prefers_paragraph_right_after_h1() {
        let doc = Document::parse(
            "<main><p>An introduction paragraph that is long.</p><h1>T</h1><p>The real summary sentence here.</p></main>",
        );
        assert_eq!(extract_summary(&doc), "The real summary sentence here.");
    }

    #[test]
    fn test_summary_missing() {
        let doc = Document::parse("<main><h1>T</h1><p>tiny</p></main>");
        assert_eq!(extract_summary(&doc), "");
    }
}
