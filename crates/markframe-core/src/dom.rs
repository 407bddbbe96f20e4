//! Explicit node tree for rendered content.
//!
//! Rendered HTML is mounted into a [`Fragment`] (parsed with html5ever) so
//! the post-processing passes can walk and rewrite it without a browser.
//! Nodes produced by a pass are stored as [`Rendered`]: opaque markup plus
//! the source text it came from, never walked again.

use std::fmt::Write as _;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A node in the mounted tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Rendered(Rendered),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Element(el) => {
                for child in &el.children {
                    child.collect_text(out);
                }
            }
            Node::Text(text) => out.push_str(text),
            Node::Rendered(rendered) => out.push_str(&rendered.source),
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Element(el) => el.write_html(out),
            Node::Text(text) => escape_into(out, text, false),
            Node::Rendered(rendered) => out.push_str(&rendered.markup),
        }
    }
}

/// Output of an enhancement pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Markup emitted verbatim on serialization
    pub markup: String,
    /// Text the markup was produced from; this is the node's text content
    pub source: String,
}

/// An element with attributes in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    /// Remove an attribute; returns whether it was present.
    pub fn remove_attr(&mut self, name: &str) -> bool {
        let before = self.attrs.len();
        self.attrs.retain(|(n, _)| n != name);
        before != self.attrs.len()
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let value = match self.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attr("class", &value);
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in &self.attrs {
            let _ = write!(out, " {}=\"", name);
            escape_into(out, value, true);
            out.push('"');
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&self.name.as_str()) {
            return;
        }
        for child in &self.children {
            child.write_html(out);
        }
        let _ = write!(out, "</{}>", self.name);
    }
}

/// The mounted content subtree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    pub children: Vec<Node>,
}

impl Fragment {
    /// Mount an HTML string.
    ///
    /// The HTML is parsed as a document body, so unclosed tags are repaired
    /// the way a browser would. Comments and doctypes are dropped.
    pub fn parse(html: &str) -> Self {
        let dom = parse_document(RcDom::default(), Default::default()).one(html);
        let children = find_element(&dom.document, "body")
            .map(|body| convert_children(&body))
            .unwrap_or_default();
        Self { children }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_html(&mut out);
        }
        out
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }

    /// Visit every element depth-first, parents before children.
    pub fn for_each_element_mut(&mut self, f: &mut dyn FnMut(&mut Element)) {
        fn visit(nodes: &mut [Node], f: &mut dyn FnMut(&mut Element)) {
            for node in nodes {
                if let Node::Element(el) = node {
                    f(el);
                    visit(&mut el.children, f);
                }
            }
        }
        visit(&mut self.children, f);
    }

    /// Elements with the given tag name, document order.
    pub fn elements_named<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        fn visit<'a>(nodes: &'a [Node], name: &str, out: &mut Vec<&'a Element>) {
            for node in nodes {
                if let Node::Element(el) = node {
                    if el.name == name {
                        out.push(el);
                    }
                    visit(&el.children, name, out);
                }
            }
        }
        let mut out = Vec::new();
        visit(&self.children, name, &mut out);
        out
    }
}

fn find_element(handle: &Handle, name: &str) -> Option<Handle> {
    if let NodeData::Element { name: qual, .. } = &handle.data {
        if qual.local.as_ref() == name {
            return Some(handle.clone());
        }
    }
    handle
        .children
        .borrow()
        .iter()
        .find_map(|child| find_element(child, name))
}

fn convert_children(handle: &Handle) -> Vec<Node> {
    handle.children.borrow().iter().filter_map(convert).collect()
}

fn convert(handle: &Handle) -> Option<Node> {
    match &handle.data {
        NodeData::Text { contents } => Some(Node::Text(contents.borrow().to_string())),
        NodeData::Element { name, attrs, .. } => {
            let attrs = attrs
                .borrow()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect();
            Some(Node::Element(Element {
                name: name.local.to_string(),
                attrs,
                children: convert_children(handle),
            }))
        }
        _ => None,
    }
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialize_roundtrip() {
        let html = "<h1>Title</h1>\n<p>Some <strong>bold</strong> text</p>\n";
        let fragment = Fragment::parse(html);
        assert_eq!(fragment.to_html(), html);
    }

    #[test]
    fn test_entities_decoded_in_text() {
        let fragment = Fragment::parse("<p>a &lt; b &amp;&amp; c</p>");
        assert_eq!(fragment.text_content(), "a < b && c");
        assert_eq!(fragment.to_html(), "<p>a &lt; b &amp;&amp; c</p>");
    }

    #[test]
    fn test_void_elements_not_closed() {
        let fragment = Fragment::parse("<p>a<br />b</p><hr>");
        assert_eq!(fragment.to_html(), "<p>a<br>b</p><hr>");
    }

    #[test]
    fn test_unclosed_tags_repaired() {
        let fragment = Fragment::parse("<div><p>open");
        assert_eq!(fragment.to_html(), "<div><p>open</p></div>");
    }

    #[test]
    fn test_comments_dropped() {
        let fragment = Fragment::parse("<p>a<!-- hidden -->b</p>");
        assert_eq!(fragment.text_content(), "ab");
    }

    #[test]
    fn test_class_helpers() {
        let mut el = Element::new("code").with_attr("class", "language-rust");
        assert!(el.has_class("language-rust"));
        el.add_class("hljs");
        el.add_class("hljs");
        assert_eq!(el.attr("class"), Some("language-rust hljs"));
        assert!(!el.remove_attr("data-highlighted"));
        el.set_attr("data-highlighted", "yes");
        assert!(el.remove_attr("data-highlighted"));
    }

    #[test]
    fn test_rendered_node_text_is_source() {
        let el = Element::new("span").with_child(Node::Rendered(Rendered {
            markup: "<math><mi>x</mi></math>".into(),
            source: "$x$".into(),
        }));
        assert_eq!(el.text_content(), "$x$");
        let fragment = Fragment {
            children: vec![Node::Element(el)],
        };
        assert_eq!(fragment.to_html(), "<span><math><mi>x</mi></math></span>");
    }

    #[test]
    fn test_elements_named() {
        let fragment = Fragment::parse("<pre><code>a</code></pre><p><code>b</code></p>");
        let codes = fragment.elements_named("code");
        assert_eq!(codes.len(), 2);
        assert_eq!(codes[1].text_content(), "b");
    }
}
