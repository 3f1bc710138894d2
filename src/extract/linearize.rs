//! Depth-first conversion of an element subtree into structured plain text

use super::text::{clean_text, collapse_blank_lines};
use crate::dom::{compile, Child, Element};
use ego_tree::NodeId;

/// Elements that end the current line of inline text
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "details", "dialog", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "header", "hr", "html", "main",
    "nav", "ol", "pre", "section", "summary", "ul",
];

/// Elements whose text is never content
const SILENT_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Turns an element subtree into plain text that keeps its structure
///
/// - list items become `- text`, or `N. text` inside an `<ol>`
/// - headings become `#`-prefixed lines
/// - paragraphs stand on their own lines
/// - table rows become `cell | cell`
/// - other text is concatenated
///
/// Nodes listed in `skip` are left out together with their subtrees.
/// Runs of blank lines are squeezed and the result is trimmed.
///
/// # Example
///
/// ```
/// use site_harvest::dom::Document;
/// use site_harvest::extract::linearize;
///
/// let doc = Document::parse("<main><h2>Steps</h2><ol><li>Apply</li><li>Pay</li></ol></main>");
/// let main = doc.select_first("main").unwrap();
/// assert_eq!(linearize(main, &[]), "## Steps\n\n1. Apply\n2. Pay");
/// ```
pub fn linearize(root: Element<'_>, skip: &[NodeId]) -> String {
    let mut out = Linearizer {
        lines: Vec::new(),
        inline: String::new(),
        skip,
    };
    match root.tag() {
        "table" => out.table(root),
        _ => out.walk(root),
    }
    out.flush();
    collapse_blank_lines(&out.lines.join("\n"))
}

struct Linearizer<'s> {
    lines: Vec<String>,
    inline: String,
    skip: &'s [NodeId],
}

impl Linearizer<'_> {
    fn walk(&mut self, el: Element<'_>) {
        for child in el.child_nodes() {
            match child {
                Child::Text(text) => self.inline.push_str(text),
                Child::Element(child) if !self.skip.contains(&child.node_id()) => {
                    self.element(child)
                }
                Child::Element(_) => {}
            }
        }
    }

    fn element(&mut self, el: Element<'_>) {
        let tag = el.tag();

        if SILENT_TAGS.contains(&tag) {
            return;
        }

        if let Some(level) = el.heading_level() {
            self.flush();
            let text = self.text_of(el, &[]);
            if !text.is_empty() {
                self.blank();
                self.lines.push(format!("{} {}", "#".repeat(level), text));
                self.blank();
            }
            return;
        }

        match tag {
            "li" => self.list_item(el),
            "p" => {
                self.flush();
                let text = self.text_of(el, &[]);
                if !text.is_empty() {
                    self.blank();
                    self.lines.push(text);
                    self.blank();
                }
            }
            "table" => {
                self.flush();
                self.table(el);
            }
            "br" => self.flush(),
            _ if BLOCK_TAGS.contains(&tag) => {
                self.flush();
                self.walk(el);
                self.flush();
            }
            _ => self.walk(el),
        }
    }

    fn list_item(&mut self, li: Element<'_>) {
        self.flush();

        let text = self.text_of(li, &["ul", "ol"]);
        if !text.is_empty() {
            let marker = match li.parent() {
                Some(parent) if parent.tag() == "ol" => {
                    let position = li.preceding_siblings().filter(|s| s.tag() == "li").count() + 1;
                    format!("{}.", position)
                }
                _ => "-".to_string(),
            };
            self.lines.push(format!("{} {}", marker, text));
        }

        for nested in li.children().filter(|c| matches!(c.tag(), "ul" | "ol")) {
            if !self.skip.contains(&nested.node_id()) {
                self.walk(nested);
            }
        }
        self.flush();
    }

    fn table(&mut self, table: Element<'_>) {
        let (Some(rows), Some(cells)) = (compile("tr"), compile("td, th")) else {
            return;
        };

        let mut rendered = Vec::new();
        for row in table.select(&rows) {
            let values: Vec<String> = row
                .select(&cells)
                .into_iter()
                .map(|cell| self.text_of(cell, &[]))
                .collect();
            if !values.is_empty() {
                rendered.push(values.join(" | "));
            }
        }

        if !rendered.is_empty() {
            self.blank();
            self.lines.extend(rendered);
            self.blank();
        }
    }

    /// Cleaned text of `el`, leaving out skipped nodes and `excluded` tags
    fn text_of(&self, el: Element<'_>, excluded: &[&str]) -> String {
        let mut raw = String::new();
        self.collect_text(el, excluded, &mut raw);
        clean_text(&raw)
    }

    fn collect_text(&self, el: Element<'_>, excluded: &[&str], raw: &mut String) {
        for child in el.child_nodes() {
            match child {
                Child::Text(text) => raw.push_str(text),
                Child::Element(child) => {
                    let tag = child.tag();
                    if self.skip.contains(&child.node_id())
                        || excluded.contains(&tag)
                        || SILENT_TAGS.contains(&tag)
                    {
                        continue;
                    }
                    if tag == "br" || BLOCK_TAGS.contains(&tag) {
                        raw.push(' ');
                    }
                    self.collect_text(child, excluded, raw);
                    if BLOCK_TAGS.contains(&tag) {
                        raw.push(' ');
                    }
                }
            }
        }
    }

    fn flush(&mut self) {
        if !self.inline.is_empty() {
            let text = clean_text(&self.inline);
            self.inline.clear();
            if !text.is_empty() {
                self.lines.push(text);
            }
        }
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn linearize_first(html: &str, css: &str) -> String {
        let doc = Document::parse(html);
        let el = doc.select_first(css).unwrap();
        linearize(el, &[])
    }

    #[test]
    fn test_lists() {
        let text = linearize_first(
            "<div><ul><li>Passport</li><li>Photo</li></ul><ol><li>Lodge</li><li>Wait</li></ol></div>",
            "div",
        );
        assert_eq!(text, "- Passport\n- Photo\n1. Lodge\n2. Wait");
    }

    #[test]
    fn test_nested_list_not_duplicated() {
        let text = linearize_first(
            "<ul><li>Fees<ul><li>Base</li><li>Extra</li></ul></li></ul>",
            "ul",
        );
        assert_eq!(text, "- Fees\n- Base\n- Extra");
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let text = linearize_first(
            "<section><h2>Costs</h2><p>From AUD 4,640.</p><h3>Extra</h3><p>Charges apply.</p></section>",
            "section",
        );
        assert_eq!(
            text,
            "## Costs\n\nFrom AUD 4,640.\n\n### Extra\n\nCharges apply."
        );
    }

    #[test]
    fn test_table_rows() {
        let text = linearize_first(
            "<div><table><tr><th>Stream</th><th>Fee</th></tr><tr><td>Core</td><td>$10</td></tr></table></div>",
            "div",
        );
        assert_eq!(text, "Stream | Fee\nCore | $10");
    }

    #[test]
    fn test_table_as_root() {
        let text = linearize_first(
            "<table><tr><td>Main applicant</td><td>AUD 4,765</td></tr><tr><td>Partner</td><td>AUD 2,385</td></tr></table>",
            "table",
        );
        assert_eq!(text, "Main applicant | AUD 4,765\nPartner | AUD 2,385");
    }

    #[test]
    fn test_inline_text_concatenated() {
        let text = linearize_first("<div>Apply <a href='#'>online</a> today</div>", "div");
        assert_eq!(text, "Apply online today");
    }

    #[test]
    fn test_skip_excludes_subtree() {
        let doc = Document::parse("<details><summary>More</summary><p>Hidden body</p></details>");
        let details = doc.select_first("details").unwrap();
        let summary = doc.select_first("summary").unwrap();
        assert_eq!(linearize(details, &[summary.node_id()]), "Hidden body");
    }

    #[test]
    fn test_scripts_ignored_and_boilerplate_stripped() {
        let text = linearize_first(
            "<div><script>var x = 1;</script><p>Body</p><p>Back to top</p></div>",
            "div",
        );
        assert_eq!(text, "Body");
    }
}
