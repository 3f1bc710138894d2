use ego_tree::NodeId;
use scraper::{ElementRef, Node, Selector};

/// A node directly under an element
#[derive(Debug, Clone, Copy)]
pub enum Child<'a> {
    Element(Element<'a>),
    Text(&'a str),
}

/// A borrowed element inside a [`Document`](super::Document)
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    inner: ElementRef<'a>,
}

impl<'a> Element<'a> {
    pub(crate) fn new(inner: ElementRef<'a>) -> Self {
        Self { inner }
    }

    /// Arena identity of this element, stable for the document's lifetime
    pub fn node_id(&self) -> NodeId {
        self.inner.id()
    }

    /// Lowercase tag name
    pub fn tag(&self) -> &'a str {
        self.inner.value().name()
    }

    /// Heading level for `h1`..`h6`
    pub fn heading_level(&self) -> Option<usize> {
        match self.tag() {
            "h1" => Some(1),
            "h2" => Some(2),
            "h3" => Some(3),
            "h4" => Some(4),
            "h5" => Some(5),
            "h6" => Some(6),
            _ => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.inner.value().attr(name)
    }

    /// The raw `class` attribute, empty when absent
    pub fn class_attr(&self) -> &'a str {
        self.attr("class").unwrap_or("")
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.inner.value().classes().any(|c| c == class)
    }

    /// Text content with whitespace runs collapsed and ends trimmed
    pub fn text(&self) -> String {
        self.raw_text()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Text content exactly as it appears in the markup
    pub fn raw_text(&self) -> String {
        self.inner.text().collect()
    }

    /// Child elements, skipping text and comments
    pub fn children(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        self.inner
            .children()
            .filter_map(ElementRef::wrap)
            .map(Element::new)
    }

    /// Child elements and text nodes in document order
    pub fn child_nodes(&self) -> Vec<Child<'a>> {
        self.inner
            .children()
            .filter_map(|node| match node.value() {
                Node::Text(text) => Some(Child::Text(&**text)),
                Node::Element(_) => ElementRef::wrap(node).map(|el| Child::Element(Element::new(el))),
                _ => None,
            })
            .collect()
    }

    pub fn parent(&self) -> Option<Element<'a>> {
        self.inner.parent().and_then(ElementRef::wrap).map(Element::new)
    }

    /// Enclosing elements from the parent up to `<html>`
    pub fn ancestors(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        self.inner
            .ancestors()
            .filter_map(ElementRef::wrap)
            .map(Element::new)
    }

    /// The next element sibling, skipping text in between
    pub fn next_sibling_element(&self) -> Option<Element<'a>> {
        self.following_siblings().next()
    }

    /// Element siblings after this one, in document order
    pub fn following_siblings(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        self.inner
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .map(Element::new)
    }

    /// Element siblings before this one, nearest first
    pub fn preceding_siblings(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        self.inner
            .prev_siblings()
            .filter_map(ElementRef::wrap)
            .map(Element::new)
    }

    /// This element or its nearest ancestor matching `selector`
    pub fn closest(&self, selector: &Selector) -> Option<Element<'a>> {
        std::iter::once(*self)
            .chain(self.ancestors())
            .find(|el| el.matches(selector))
    }

    /// Nearest ancestor whose tag is one of `tags`
    pub fn closest_tag(&self, tags: &[&str]) -> Option<Element<'a>> {
        self.ancestors().find(|el| tags.contains(&el.tag()))
    }

    /// True if any ancestor, or this element, matches one of `selectors`
    pub fn is_within(&self, selectors: &[Selector]) -> bool {
        selectors.iter().any(|sel| self.closest(sel).is_some())
    }

    /// Descendants matching `selector`, in document order
    pub fn select(&self, selector: &Selector) -> Vec<Element<'a>> {
        self.inner.select(selector).map(Element::new).collect()
    }

    pub fn select_first(&self, selector: &Selector) -> Option<Element<'a>> {
        self.inner.select(selector).next().map(Element::new)
    }

    pub fn matches(&self, selector: &Selector) -> bool {
        selector.matches(&self.inner)
    }

    /// True if `other` is this element or one of its descendants
    pub fn contains(&self, other: &Element<'_>) -> bool {
        other.node_id() == self.node_id()
            || other.inner.ancestors().any(|a| a.id() == self.node_id())
    }
}

impl PartialEq for Element<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.node_id() == other.node_id()
    }
}

impl Eq for Element<'_> {}
