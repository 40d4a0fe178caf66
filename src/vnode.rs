//! Virtual nodes - the declarative description of desired document output.
//!
//! A render produces a tree of [`VNode`]s. Trees are immutable once built:
//! the reconciler only reads them.
//!
//! Adjacent text children are merged while the tree is built, so no element
//! ever holds two consecutive `Text` children:
//!
//! ```
//! use spark_vdom::vnode::{h, text, VNode};
//!
//! let node = h("p", [], [text("a"), text("b"), h("br", [], [])]);
//! let children = node.as_element().unwrap().children();
//! assert_eq!(children.len(), 2);
//! assert_eq!(children[0], VNode::Text("ab".into()));
//! ```

use std::fmt;

pub use serde_json::Value;

/// Reserved attribute naming the list-reconciliation key.
pub const KEY_ATTRIBUTE: &str = "key";

// =============================================================================
// Node Kind
// =============================================================================

/// Kind tag of a virtual node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Text,
    Element,
    Comment,
    Doctype,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Text => "text",
            NodeKind::Element => "element",
            NodeKind::Comment => "comment",
            NodeKind::Doctype => "doctype",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Attribute
// =============================================================================

/// A single `(namespace, key, value)` attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub namespace: Option<String>,
    pub key: String,
    pub value: Value,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            namespace: None,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn namespaced(
        namespace: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            namespace: Some(namespace.into()),
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Shorthand for [`Attribute::new`].
pub fn attr(key: impl Into<String>, value: impl Into<Value>) -> Attribute {
    Attribute::new(key, value)
}

/// Render a key attribute value as the string used for matching.
pub(crate) fn key_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// =============================================================================
// Element
// =============================================================================

/// An element node: tag, attributes and children.
///
/// Children are only reachable through [`Element::child`] and
/// [`Element::children_from`], which merge adjacent text.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub namespace: Option<String>,
    pub attributes: Vec<Attribute>,
    children: Vec<VNode>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            namespace: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.push(Attribute::new(key, value));
        self
    }

    pub fn attribute_list(mut self, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    pub fn child(mut self, child: impl Into<VNode>) -> Self {
        push_child(&mut self.children, child.into());
        self
    }

    pub fn children_from(mut self, children: impl IntoIterator<Item = VNode>) -> Self {
        for child in children {
            push_child(&mut self.children, child);
        }
        self
    }

    pub fn children(&self) -> &[VNode] {
        &self.children
    }

    /// Value of the last attribute named `key`.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .rev()
            .find(|a| a.key == key)
            .map(|a| &a.value)
    }

    /// The reserved `key` attribute, stringified.
    pub fn key(&self) -> Option<String> {
        self.attribute(KEY_ATTRIBUTE).and_then(key_string)
    }
}

/// Append a child, merging it into a trailing text node when both are text.
fn push_child(children: &mut Vec<VNode>, child: VNode) {
    if let VNode::Text(data) = &child {
        if let Some(VNode::Text(last)) = children.last_mut() {
            last.push_str(data);
            return;
        }
    }
    children.push(child);
}

// =============================================================================
// VNode
// =============================================================================

/// A virtual node.
///
/// Only `Text` and `Element` can be reconciled. `Comment` and `Doctype`
/// exist so that tree producers can describe them; diffing one is an error.
#[derive(Debug, Clone, PartialEq)]
pub enum VNode {
    Text(String),
    Element(Element),
    Comment(String),
    Doctype(String),
}

impl VNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            VNode::Text(_) => NodeKind::Text,
            VNode::Element(_) => NodeKind::Element,
            VNode::Comment(_) => NodeKind::Comment,
            VNode::Doctype(_) => NodeKind::Doctype,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            VNode::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, VNode::Text(_))
    }

    /// List-reconciliation key. Only elements carry one.
    pub fn key(&self) -> Option<String> {
        self.as_element().and_then(Element::key)
    }
}

impl From<Element> for VNode {
    fn from(el: Element) -> Self {
        VNode::Element(el)
    }
}

impl From<&str> for VNode {
    fn from(data: &str) -> Self {
        VNode::Text(data.to_string())
    }
}

impl From<String> for VNode {
    fn from(data: String) -> Self {
        VNode::Text(data)
    }
}

/// Build an element node.
pub fn h(
    tag: impl Into<String>,
    attributes: impl IntoIterator<Item = Attribute>,
    children: impl IntoIterator<Item = VNode>,
) -> VNode {
    Element::new(tag)
        .attribute_list(attributes)
        .children_from(children)
        .into()
}

/// Build a text node.
pub fn text(data: impl Into<String>) -> VNode {
    VNode::Text(data.into())
}

// =============================================================================
// Tests
// =============================================================================
