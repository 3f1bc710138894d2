//! Collapsible UI content: accordions, `<details>` blocks and tab panels
//!
//! The renderer returns markup with every panel present. These passes read
//! each panel's content and pair it with the name of the control that would
//! reveal it in a browser.

use super::linearize::linearize;
use super::text::clean_text;
use super::{InteractiveKind, InteractiveSection};
use crate::dom::{compile, Document, Element};

const ACCORDION_TRIGGERS: &str = "button[aria-expanded], .accordion-button";

/// Runs the accordion, details and tab passes over `scope`, in that order
///
/// Control lookups by `aria-controls` go through the whole document so a tab
/// strip outside the content area can still name its panels.
pub fn extract_interactive(doc: &Document, scope: Element<'_>) -> Vec<InteractiveSection> {
    let mut sections = Vec::new();
    sections.extend(accordions(doc, scope));
    sections.extend(details(scope));
    sections.extend(tab_panels(doc, scope));

    tracing::debug!("Extracted {} interactive sections", sections.len());
    sections
}

fn accordions(doc: &Document, scope: Element<'_>) -> Vec<InteractiveSection> {
    let Some(triggers) = compile(ACCORDION_TRIGGERS) else {
        return Vec::new();
    };

    let mut sections = Vec::new();
    for trigger in scope.select(&triggers) {
        let name = clean_text(&trigger.text());

        let panel = match trigger.attr("aria-controls") {
            Some(controls) => {
                let panel = doc.element_by_id(controls.trim());
                if panel.is_none() {
                    tracing::debug!("Accordion {:?} controls missing panel #{}", name, controls);
                }
                panel
            }
            None => trigger.next_sibling_element(),
        };

        if let Some(panel) = panel {
            sections.push(InteractiveSection {
                kind: InteractiveKind::Accordion,
                name,
                content: linearize(panel, &[]),
            });
        }
    }
    sections
}

fn details(scope: Element<'_>) -> Vec<InteractiveSection> {
    let (Some(details_sel), Some(summary_sel)) = (compile("details"), compile("summary")) else {
        return Vec::new();
    };

    scope
        .select(&details_sel)
        .into_iter()
        .map(|block| {
            let summary = block
                .children()
                .find(|child| child.matches(&summary_sel))
                .or_else(|| block.select_first(&summary_sel));

            let name = summary
                .map(|s| clean_text(&s.text()))
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Details".to_string());

            let skip: Vec<_> = summary.iter().map(Element::node_id).collect();

            InteractiveSection {
                kind: InteractiveKind::Details,
                name,
                content: linearize(block, &skip),
            }
        })
        .collect()
}

fn tab_panels(doc: &Document, scope: Element<'_>) -> Vec<InteractiveSection> {
    let Some(panels) = compile("[role='tabpanel']") else {
        return Vec::new();
    };

    scope
        .select(&panels)
        .into_iter()
        .map(|panel| {
            let name = panel
                .attr("id")
                .filter(|id| !id.is_empty())
                .and_then(|id| tab_control_name(doc, id))
                .unwrap_or_else(|| "Tab".to_string());

            InteractiveSection {
                kind: InteractiveKind::Tab,
                name,
                content: linearize(panel, &[]),
            }
        })
        .collect()
}

/// Text of the button, or failing that the anchor, that controls panel `id`
fn tab_control_name(doc: &Document, id: &str) -> Option<String> {
    let controls = doc.find_by_attr("aria-controls", |value| value.trim() == id);

    ["button", "a"]
        .iter()
        .find_map(|tag| controls.iter().find(|el| el.tag() == *tag))
        .map(|control| clean_text(&control.text()))
}
