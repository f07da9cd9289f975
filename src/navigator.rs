//! Namespace-aware navigation over a parsed XML tree.
//!
//! [`Element`] is a thin, read-only wrapper around a `roxmltree` node with
//! the namespace of the transport dialect fixed at construction. Lookups
//! return a three-way [`Lookup`] so callers must distinguish "absent"
//! (normal) from "ambiguous" (an error) at compile time; there is no
//! reflective field discovery, only this closed set of methods.

use crate::error::{Error, Result};

/// TransXChange namespace.
pub const TXC_NAMESPACE: &str = "http://www.transxchange.org.uk/";

/// NeTEx namespace.
pub const NETEX_NAMESPACE: &str = "http://www.netex.org.uk/netex";

/// Outcome of a single-element lookup.
///
/// `NotFound` is an ordinary, expected result; `Ambiguous` means the
/// document has several matches where the dialect allows at most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<T> {
    /// Exactly one match
    Found(T),
    /// No match; callers typically skip or fall back to a default
    NotFound,
    /// More than one match; carries the match count
    Ambiguous(usize),
}

impl<T> Lookup<T> {
    /// Converts to an `Option`, collapsing `NotFound` and `Ambiguous`.
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            _ => None,
        }
    }

    /// Returns true when nothing matched.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Lookup::NotFound)
    }

    /// Maps the found value, preserving the other outcomes.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::NotFound => Lookup::NotFound,
            Lookup::Ambiguous(n) => Lookup::Ambiguous(n),
        }
    }
}

/// Parses a byte-validated document into a navigable tree.
///
/// DTDs are not allowed by the underlying parser, so this is a second line
/// of defence behind [`crate::guard::dangerous_xml_check`]. Syntax errors
/// carry the parser's reported line.
pub fn parse_document(text: &str) -> Result<roxmltree::Document<'_>> {
    roxmltree::Document::parse(text).map_err(|e| Error::XmlSyntax {
        line: e.pos().row as u64,
        message: e.to_string(),
    })
}

/// A namespace-aware element in a parsed document.
///
/// Wraps a borrowed node; the underlying tree is never mutated and the
/// wrapper lives only as long as one validation run.
#[derive(Debug, Clone, Copy)]
pub struct Element<'a, 'input> {
    node: roxmltree::Node<'a, 'input>,
    namespace: Option<&'static str>,
}

impl<'a, 'input> Element<'a, 'input> {
    /// Wraps the root element of a TransXChange document.
    pub fn transxchange_root(doc: &'a roxmltree::Document<'input>) -> Self {
        Self {
            node: doc.root_element(),
            namespace: Some(TXC_NAMESPACE),
        }
    }

    /// Wraps the root element of a NeTEx fares document.
    pub fn netex_root(doc: &'a roxmltree::Document<'input>) -> Self {
        Self {
            node: doc.root_element(),
            namespace: Some(NETEX_NAMESPACE),
        }
    }

    /// Wraps the root element with no namespace constraint.
    pub fn root(doc: &'a roxmltree::Document<'input>) -> Self {
        Self {
            node: doc.root_element(),
            namespace: None,
        }
    }

    fn wrap(&self, node: roxmltree::Node<'a, 'input>) -> Self {
        Self {
            node,
            namespace: self.namespace,
        }
    }

    /// True when `node` is an element with the wanted local name in the
    /// navigator's namespace. Unqualified elements always match, so test
    /// fixtures without an `xmlns` behave like production documents.
    fn matches(&self, node: &roxmltree::Node<'a, 'input>, tag: &str) -> bool {
        if !node.is_element() || node.tag_name().name() != tag {
            return false;
        }
        match (node.tag_name().namespace(), self.namespace) {
            (Some(actual), Some(wanted)) => actual == wanted,
            _ => true,
        }
    }

    /// Local name of this element.
    pub fn name(&self) -> &'a str {
        self.node.tag_name().name()
    }

    /// Trimmed text content, or `None` when absent or whitespace-only.
    pub fn text(&self) -> Option<&'a str> {
        self.node
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.node.attribute(name)
    }

    /// Looks up a single element by a slash-joined local-name path.
    pub fn get_element(&self, path: &str) -> Lookup<Element<'a, 'input>> {
        let matches = self.get_elements(path);
        match matches.len() {
            0 => Lookup::NotFound,
            1 => Lookup::Found(matches[0]),
            n => Lookup::Ambiguous(n),
        }
    }

    /// Looks up all elements matching a slash-joined local-name path.
    pub fn get_elements(&self, path: &str) -> Vec<Element<'a, 'input>> {
        let mut frontier = vec![self.node];
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let mut next = Vec::new();
            for node in &frontier {
                for child in node.children() {
                    if self.matches(&child, segment) {
                        next.push(child);
                    }
                }
            }
            if next.is_empty() {
                return Vec::new();
            }
            frontier = next;
        }
        frontier.into_iter().map(|node| self.wrap(node)).collect()
    }

    /// Text of the single element at `path`, or the supplied default when
    /// the element or its text is missing (or the path is ambiguous).
    pub fn get_text_or_default(&self, path: &str, default: &str) -> String {
        match self.get_element(path) {
            Lookup::Found(el) => el.text().unwrap_or(default).to_string(),
            _ => default.to_string(),
        }
    }

    /// Text of the first element at `path`, or the supplied default.
    pub fn get_first_text_or_default(&self, path: &str, default: &str) -> String {
        self.get_elements(path)
            .first()
            .and_then(Element::text)
            .unwrap_or(default)
            .to_string()
    }

    /// Direct element children.
    pub fn children(&self) -> impl Iterator<Item = Element<'a, 'input>> + '_ {
        self.node
            .children()
            .filter(|n| n.is_element())
            .map(|n| self.wrap(n))
    }

    /// The parent element. Absence is an explicit error: every non-root
    /// element has one, so `Err` here means the caller is at the root.
    pub fn parent(&self) -> Result<Element<'a, 'input>> {
        self.node
            .parent()
            .filter(roxmltree::Node::is_element)
            .map(|n| self.wrap(n))
            .ok_or_else(|| Error::NoParent(self.name().to_string()))
    }

    /// 1-based source line of this element's start tag.
    pub fn line_number(&self) -> u64 {
        let pos = self.node.document().text_pos_at(self.node.range().start);
        pos.row as u64
    }

    /// Collects the first occurrence of each requested direct child in one
    /// linear pass. Structures with many optional siblings are extracted
    /// this way so mapping stays linear in document size.
    pub fn scan_children(&self, tags: &[&str]) -> Vec<Option<Element<'a, 'input>>> {
        let mut found: Vec<Option<Element<'a, 'input>>> = vec![None; tags.len()];
        for child in self.node.children() {
            if !child.is_element() {
                continue;
            }
            if let Some(index) = tags.iter().position(|tag| self.matches(&child, tag)) {
                if found[index].is_none() {
                    found[index] = Some(self.wrap(child));
                }
            }
        }
        found
    }
}
