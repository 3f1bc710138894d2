//! DOM abstraction over `scraper`
//!
//! The link classifier and the content extractor never touch `scraper` types
//! directly. They work with [`Document`] and [`Element`], which offer the
//! handful of queries the crawler needs:
//! - find by tag name or CSS selector
//! - find by attribute predicate
//! - walk children, siblings and ancestors
//! - read text and attributes
//! - remove subtrees (junk removal)
//!
//! Removal detaches nodes from the tree. `scraper` keeps detached nodes in its
//! arena, so every query here starts from the root element and therefore only
//! sees what is still attached.

mod element;

pub use element::{Child, Element};

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

/// Compiles a CSS selector, logging and discarding invalid ones
///
/// # Arguments
///
/// * `css` - The selector source, e.g. `"nav.section-nav a"`
///
/// # Returns
///
/// * `Some(Selector)` - The compiled selector
/// * `None` - The selector did not parse
pub fn compile(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::warn!("Ignoring invalid CSS selector {:?}: {:?}", css, e);
            None
        }
    }
}

/// Compiles a list of selectors, skipping the invalid ones
pub fn compile_all(sources: &[&str]) -> Vec<Selector> {
    sources.iter().filter_map(|css| compile(css)).collect()
}

/// A parsed HTML document
#[derive(Debug, Clone)]
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses a full HTML document
    ///
    /// Parsing never fails; malformed markup is repaired the way a browser
    /// would repair it.
    ///
    /// # Example
    ///
    /// ```
    /// use site_harvest::dom::Document;
    ///
    /// let doc = Document::parse("<html><body><h1>Fees</h1></body></html>");
    /// assert_eq!(doc.select_first("h1").unwrap().text(), "Fees");
    /// ```
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    /// The `<html>` element
    pub fn root(&self) -> Element<'_> {
        Element::new(self.html.root_element())
    }

    /// All attached elements matching `css`, in document order
    ///
    /// An invalid selector matches nothing.
    pub fn select(&self, css: &str) -> Vec<Element<'_>> {
        match compile(css) {
            Some(selector) => self.select_with(&selector),
            None => Vec::new(),
        }
    }

    /// Like [`Document::select`] with a precompiled selector
    pub fn select_with(&self, selector: &Selector) -> Vec<Element<'_>> {
        self.root().select(selector)
    }

    /// The first attached element matching `css`
    pub fn select_first(&self, css: &str) -> Option<Element<'_>> {
        let selector = compile(css)?;
        self.html
            .root_element()
            .select(&selector)
            .next()
            .map(Element::new)
    }

    /// All elements with the given tag name, in document order
    pub fn find_by_tag(&self, tag: &str) -> Vec<Element<'_>> {
        self.elements()
            .filter(|el| el.tag().eq_ignore_ascii_case(tag))
            .collect()
    }

    /// All elements carrying attribute `name` whose value satisfies `predicate`
    ///
    /// # Example
    ///
    /// ```
    /// use site_harvest::dom::Document;
    ///
    /// let doc = Document::parse(r#"<div aria-controls="p1"></div><div aria-controls="p2"></div>"#);
    /// let hits = doc.find_by_attr("aria-controls", |v| v == "p2");
    /// assert_eq!(hits.len(), 1);
    /// ```
    pub fn find_by_attr<F>(&self, name: &str, predicate: F) -> Vec<Element<'_>>
    where
        F: Fn(&str) -> bool,
    {
        self.elements()
            .filter(|el| el.attr(name).is_some_and(&predicate))
            .collect()
    }

    /// The element whose `id` attribute equals `id`
    pub fn element_by_id(&self, id: &str) -> Option<Element<'_>> {
        if id.is_empty() {
            return None;
        }
        self.elements().find(|el| el.attr("id") == Some(id))
    }

    /// Removes every element matching `css` together with its subtree
    ///
    /// # Returns
    ///
    /// The number of matched elements that were detached
    pub fn remove(&mut self, css: &str) -> usize {
        let ids: Vec<NodeId> = self.select(css).iter().map(Element::node_id).collect();
        self.remove_nodes(&ids)
    }

    /// Removes the given nodes together with their subtrees
    pub fn remove_nodes(&mut self, ids: &[NodeId]) -> usize {
        let mut removed = 0;
        for id in ids {
            if let Some(mut node) = self.html.tree.get_mut(*id) {
                node.detach();
                removed += 1;
            }
        }
        removed
    }

    /// Every attached element in document order, the root included
    fn elements(&self) -> impl Iterator<Item = Element<'_>> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .map(Element::new)
    }
}
