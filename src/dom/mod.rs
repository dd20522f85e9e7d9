//! In-memory document model
//!
//! The document is the only state store of a session. Nodes live in an arena
//! addressed by [`NodeId`]; ids are never reused, so a removed node keeps its
//! id but is detached from the tree and no longer reachable from the root.

mod form;
mod parser;
mod selector;

pub use form::FormData;
pub use selector::{Selector, SelectorError};

/// Elements that never have children or an end tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is serialized without escaping
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub(crate) fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Handle to a node in a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag: String,
    /// Attributes in source order (names are lowercase)
    pub(crate) attrs: Vec<(String, String)>,
    /// Value typed by the user, cleared by a form reset
    pub(crate) dirty_value: Option<String>,
    /// Checkedness toggled by the user, cleared by a form reset
    pub(crate) dirty_checked: Option<bool>,
}

impl Element {
    fn new(tag: &str, attrs: Vec<(String, String)>) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs,
            dirty_value: None,
            dirty_checked: None,
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element(Element),
    Text(String),
    Comment(String),
    Doctype(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// Where `insert_adjacent_html` places the parsed fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    BeforeBegin,
    AfterBegin,
    BeforeEnd,
    AfterEnd,
}

/// An HTML document held entirely in memory
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            root: NodeId(0),
        }
    }

    /// Parse a full page
    pub fn parse(html: &str) -> Self {
        let mut doc = Self::new();
        parser::build_document(&mut doc, html);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `<body>` element, or the document node for bare fragments
    pub fn body(&self) -> NodeId {
        self.descendants(self.root)
            .into_iter()
            .find(|&id| self.tag_name(id) == Some("body"))
            .unwrap_or(self.root)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Node construction
    // ─────────────────────────────────────────────────────────────────────

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    pub(crate) fn create_element(&mut self, tag: &str, attrs: Vec<(String, String)>) -> NodeId {
        self.push_node(NodeKind::Element(Element::new(tag, attrs)))
    }

    pub(crate) fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Text(text.to_string()))
    }

    pub(crate) fn create_comment(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Comment(text.to_string()))
    }

    pub(crate) fn create_doctype(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Doctype(text.to_string()))
    }

    /// Detach `node` from its current parent (no-op when already detached)
    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn insert_at(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
    }

    /// Parse `html` into detached top-level nodes
    fn parse_fragment(&mut self, html: &str) -> Vec<NodeId> {
        let container = self.create_element("template", Vec::new());
        parser::build_fragment(self, container, html);
        let nodes = self.nodes[container.0].children.clone();
        for &node in &nodes {
            self.detach(node);
        }
        nodes
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tree navigation
    // ─────────────────────────────────────────────────────────────────────

    pub(crate) fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(id.0)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0)?.parent
    }

    /// Parent, but only when it is an element (the document node is skipped)
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.is_element(p))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Element descendants of `id` in document order (excluding `id` itself)
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if self.is_element(node) {
                out.push(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    // ─────────────────────────────────────────────────────────────────────
    // Selectors
    // ─────────────────────────────────────────────────────────────────────

    /// All elements under `scope` matching `selector`, in document order
    pub fn select_all_in(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&id| selector.matches(self, id))
            .collect()
    }

    pub fn select_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.select_all_in(self.root, selector)
    }

    pub fn select_in(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&id| selector.matches(self, id))
    }

    pub fn select(&self, selector: &Selector) -> Option<NodeId> {
        self.select_in(self.root, selector)
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        Ok(self.select_all(&Selector::parse(selector)?))
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        Ok(self.select(&Selector::parse(selector)?))
    }

    /// Nearest inclusive ancestor matching `selector`
    pub fn closest(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if selector.matches(self, node) {
                return Some(node);
            }
            current = self.parent_element(node);
        }
        None
    }

    // ─────────────────────────────────────────────────────────────────────
    // Attributes
    // ─────────────────────────────────────────────────────────────────────

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        if let Some(element) = self.element_mut(id) {
            match element.attrs.iter_mut().find(|(n, _)| *n == name) {
                Some((_, v)) => *v = value.to_string(),
                None => element.attrs.push((name, value.to_string())),
            }
        }
    }

    /// Read a `data-*` attribute by its dataset key (`target` -> `data-target`)
    pub fn data(&self, id: NodeId, key: &str) -> Option<&str> {
        self.attr(id, &format!("data-{}", key))
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .map(|c| c.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn set_class_name(&mut self, id: NodeId, class_name: &str) {
        self.set_attr(id, "class", class_name);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Content
    // ─────────────────────────────────────────────────────────────────────

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            match &self.nodes[node.0].kind {
                NodeKind::Text(text) => out.push_str(text),
                NodeKind::Element(_) | NodeKind::Document => {
                    stack.extend(self.children(node).iter().rev().copied());
                }
                NodeKind::Comment(_) | NodeKind::Doctype(_) => {}
            }
        }
        out
    }

    /// Replace all children with a single text node
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        self.clear_children(id);
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(id, node);
        }
    }

    fn clear_children(&mut self, id: NodeId) {
        for child in std::mem::take(&mut self.nodes[id.0].children) {
            self.nodes[child.0].parent = None;
        }
    }

    /// Replace all children with the parsed fragment
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) {
        self.clear_children(id);
        for node in self.parse_fragment(html) {
            self.append_child(id, node);
        }
    }

    /// Parse `html` and insert it relative to `id`
    ///
    /// `BeforeBegin`/`AfterEnd` are no-ops on a node without a parent.
    pub fn insert_adjacent_html(&mut self, id: NodeId, position: Position, html: &str) {
        let fragment = self.parse_fragment(html);
        match position {
            Position::AfterBegin => {
                for (offset, node) in fragment.into_iter().enumerate() {
                    self.insert_at(id, offset, node);
                }
            }
            Position::BeforeEnd => {
                for node in fragment {
                    self.append_child(id, node);
                }
            }
            Position::BeforeBegin | Position::AfterEnd => {
                let Some(parent) = self.parent(id) else {
                    return;
                };
                let index = self.children(parent).iter().position(|&c| c == id);
                let Some(mut index) = index else {
                    return;
                };
                if position == Position::AfterEnd {
                    index += 1;
                }
                for (offset, node) in fragment.into_iter().enumerate() {
                    self.insert_at(parent, index + offset, node);
                }
            }
        }
    }

    /// Detach the node from the tree
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Serialization
    // ─────────────────────────────────────────────────────────────────────

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        let raw = self.is_raw_text(id);
        let mut stack: Vec<Step> = self
            .children(id)
            .iter()
            .rev()
            .map(|&child| Step::Open(child, raw))
            .collect();
        self.serialize(&mut stack, &mut out);
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.serialize(&mut vec![Step::Open(id, false)], &mut out);
        out
    }

    fn is_raw_text(&self, id: NodeId) -> bool {
        self.tag_name(id)
            .map(|t| RAW_TEXT_ELEMENTS.contains(&t))
            .unwrap_or(false)
    }

    /// Drain `stack`, writing markup in document order
    fn serialize(&self, stack: &mut Vec<Step>, out: &mut String) {
        while let Some(step) = stack.pop() {
            let (id, raw_text) = match step {
                Step::Close(id) => {
                    if let Some(tag) = self.tag_name(id) {
                        out.push_str("</");
                        out.push_str(tag);
                        out.push('>');
                    }
                    continue;
                }
                Step::Open(id, raw_text) => (id, raw_text),
            };
            match &self.nodes[id.0].kind {
                NodeKind::Document => {
                    stack.extend(self.children(id).iter().rev().map(|&c| Step::Open(c, false)));
                }
                NodeKind::Text(text) if raw_text => out.push_str(text),
                NodeKind::Text(text) => out.push_str(&escape_text(text)),
                NodeKind::Comment(text) => {
                    out.push_str("<!--");
                    out.push_str(text);
                    out.push_str("-->");
                }
                NodeKind::Doctype(text) => {
                    out.push_str("<!");
                    out.push_str(text);
                    out.push('>');
                }
                NodeKind::Element(element) => {
                    out.push('<');
                    out.push_str(&element.tag);
                    for (name, value) in &element.attrs {
                        out.push(' ');
                        out.push_str(name);
                        out.push_str("=\"");
                        out.push_str(&escape_attr(value));
                        out.push('"');
                    }
                    out.push('>');
                    if is_void(&element.tag) {
                        continue;
                    }
                    let raw = self.is_raw_text(id);
                    stack.push(Step::Close(id));
                    stack.extend(self.children(id).iter().rev().map(|&c| Step::Open(c, raw)));
                }
            }
        }
    }
}

/// Pending work for the serializer
enum Step {
    /// Write the node; the flag marks raw-text content
    Open(NodeId, bool),
    /// Write the element's end tag
    Close(NodeId),
}

/// Escape text for inclusion in HTML element content
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    #[test]
    fn test_parse_and_serialize_roundtrip() {
        let html = r#"<div id="feed" class="feed"><p>Hello <b>world</b></p><br><img src="a.png"></div>"#;
        let doc = Document::parse(html);
        let feed = doc.select(&sel("#feed")).unwrap();
        assert_eq!(doc.outer_html(feed), html);
    }

    #[test]
    fn test_text_content_and_set_text_content() {
        let mut doc = Document::parse("<button><span class=\"like-count\">3</span> likes</button>");
        let button = doc.select(&sel("button")).unwrap();
        assert_eq!(doc.text_content(button), "3 likes");

        let count = doc.select(&sel(".like-count")).unwrap();
        doc.set_text_content(count, "4");
        assert_eq!(doc.text_content(button), "4 likes");
    }

    #[test]
    fn test_insert_adjacent_html_positions() {
        let mut doc = Document::parse(r#"<ul id="list"><li>b</li></ul>"#);
        let list = doc.select(&sel("#list")).unwrap();

        doc.insert_adjacent_html(list, Position::AfterBegin, "<li>a</li>");
        doc.insert_adjacent_html(list, Position::BeforeEnd, "<li>c</li><li>d</li>");
        assert_eq!(
            doc.inner_html(list),
            "<li>a</li><li>b</li><li>c</li><li>d</li>"
        );

        doc.insert_adjacent_html(list, Position::BeforeBegin, "<h2>top</h2>");
        doc.insert_adjacent_html(list, Position::AfterEnd, "<p>bottom</p>");
        assert_eq!(
            doc.inner_html(doc.body()),
            "<h2>top</h2><ul id=\"list\"><li>a</li><li>b</li><li>c</li><li>d</li></ul><p>bottom</p>"
        );
    }

    #[test]
    fn test_prepend_keeps_fragment_order() {
        let mut doc = Document::parse(r#"<div id="t"><p>old</p></div>"#);
        let target = doc.select(&sel("#t")).unwrap();
        doc.insert_adjacent_html(target, Position::AfterBegin, "<p>1</p><p>2</p>");
        assert_eq!(doc.inner_html(target), "<p>1</p><p>2</p><p>old</p>");
    }

    #[test]
    fn test_remove_detaches_from_queries() {
        let mut doc =
            Document::parse(r#"<div data-post="1"><a class="js-delete">x</a></div><div data-post="2"></div>"#);
        let first = doc.select(&sel("[data-post='1']")).unwrap();
        let link = doc.select(&sel(".js-delete")).unwrap();
        doc.remove(first);

        assert_eq!(doc.parent(first), None);
        assert_eq!(doc.closest(link, &sel("[data-post]")), Some(first));
        assert_eq!(doc.select_all(&sel("[data-post]")).len(), 1);
        assert!(doc.select(&sel(".js-delete")).is_none());
    }

    #[test]
    fn test_closest_includes_self_and_stops_at_document() {
        let doc = Document::parse(
            r#"<article data-post="7"><button class="js-like"><i class="fa-regular fa-heart"></i></button></article>"#,
        );
        let icon = doc.select(&sel("i")).unwrap();
        let button = doc.select(&sel(".js-like")).unwrap();
        let card = doc.select(&sel("article")).unwrap();

        assert_eq!(doc.closest(icon, &sel(".js-like")), Some(button));
        assert_eq!(doc.closest(button, &sel(".js-like")), Some(button));
        assert_eq!(
            doc.closest(icon, &sel("[data-post], [data-comment]")),
            Some(card)
        );
        assert_eq!(doc.closest(icon, &sel(".missing")), None);
    }

    #[test]
    fn test_set_inner_html_replaces_children() {
        let mut doc = Document::parse(r#"<div id="r"><p>stale</p></div>"#);
        let results = doc.select(&sel("#r")).unwrap();
        doc.set_inner_html(results, "<div class=\"search-row\">Ann</div>");
        assert_eq!(doc.select_all(&sel("#r > *")).len(), 1);
        assert_eq!(doc.text_content(results), "Ann");
    }

    #[test]
    fn test_attributes_and_classes() {
        let mut doc = Document::parse(r#"<i class="fa-regular fa-heart"></i>"#);
        let icon = doc.select(&sel("i")).unwrap();
        assert!(doc.has_class(icon, "fa-regular"));

        doc.set_class_name(icon, "fa-solid fa-heart");
        assert!(doc.has_class(icon, "fa-solid"));
        assert!(!doc.has_class(icon, "fa-regular"));

        doc.set_attr(icon, "data-bound", "1");
        assert_eq!(doc.data(icon, "bound"), Some("1"));
        doc.set_attr(icon, "DATA-BOUND", "2");
        assert_eq!(doc.attr(icon, "data-bound"), Some("2"));
    }

    #[test]
    fn test_deeply_nested_tree_reads_without_recursion() {
        const DEPTH: usize = 200_000;
        let mut doc = Document::new();
        let mut parent = doc.root();
        for _ in 0..DEPTH {
            let div = doc.create_element("div", Vec::new());
            doc.append_child(parent, div);
            parent = div;
        }
        let leaf = doc.create_text("x");
        doc.append_child(parent, leaf);

        assert_eq!(doc.text_content(doc.root()), "x");
        let html = doc.outer_html(doc.root());
        assert_eq!(html.len(), DEPTH * "<div></div>".len() + 1);
        assert!(html.starts_with("<div><div>"));
        assert!(html.ends_with("x</div></div>"));

        let outer = doc.children(doc.root())[0];
        assert_eq!(doc.inner_html(outer).len(), html.len() - "<div></div>".len());
    }

    #[test]
    fn test_text_is_escaped_on_serialization() {
        let mut doc = Document::parse("<p></p>");
        let p = doc.select(&sel("p")).unwrap();
        doc.set_text_content(p, "<script>&");
        assert_eq!(doc.inner_html(p), "&lt;script&gt;&amp;");
    }
}
