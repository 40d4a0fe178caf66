//! In-memory document.
//!
//! Nodes live in a flat arena and are addressed by [`NodeId`]. Every
//! mutation is appended to a log so callers can see exactly what a render
//! did to the tree. Used for headless rendering and throughout the tests.

use std::collections::BTreeMap;

use super::Document;
use crate::vnode::{Attribute, Value};

/// Handle to a node in a [`MemoryDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One recorded document mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreateElement { node: NodeId, tag: String },
    CreateText { node: NodeId, text: String },
    AppendChild { parent: NodeId, node: NodeId },
    InsertBefore { parent: NodeId, node: NodeId, reference: NodeId },
    Remove { parent: NodeId, node: NodeId },
    SetText { node: NodeId, text: String },
    SetProperty { node: NodeId, name: String },
    SetAccessor {
        node: NodeId,
        key: String,
        old: Option<Value>,
        new: Option<Value>,
        svg: bool,
    },
}

impl Mutation {
    /// Whether the mutation changed tree shape or text, as opposed to
    /// attribute re-application.
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            Mutation::SetAccessor { .. } | Mutation::SetProperty { .. }
        )
    }
}

#[derive(Debug, Clone)]
enum NodeData {
    Element { tag: String, svg: bool },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeRecord {
    data: NodeData,
    attributes: BTreeMap<String, Value>,
    properties: BTreeMap<String, Value>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed document tree.
#[derive(Debug, Default, Clone)]
pub struct MemoryDocument {
    nodes: Vec<NodeRecord>,
    log: Vec<Mutation>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a container element without logging it.
    pub fn create_root(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element {
            tag: tag.to_string(),
            svg: tag == "svg",
        })
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.log
    }

    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.log)
    }

    pub fn clear_mutations(&mut self) {
        self.log.clear();
    }

    /// Mutations that are not attribute re-application.
    pub fn structural_mutations(&self) -> Vec<&Mutation> {
        self.log.iter().filter(|m| m.is_structural()).collect()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes[node.0].children.clone()
    }

    pub fn attribute(&self, node: NodeId, key: &str) -> Option<&Value> {
        self.nodes[node.0].attributes.get(key)
    }

    /// Serialize a subtree as HTML-like markup. Properties are not emitted.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    /// Serialize the children of `node` without the node itself.
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for &child in &self.nodes[node.0].children {
            self.write_html(child, &mut out);
        }
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let record = &self.nodes[node.0];
        match &record.data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element { tag, .. } => {
                out.push('<');
                out.push_str(tag);
                for (key, value) in &record.attributes {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    match value {
                        Value::String(s) => out.push_str(s),
                        other => out.push_str(&other.to_string()),
                    }
                    out.push('"');
                }
                out.push('>');
                for &child in &record.children {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeRecord {
            data,
            attributes: BTreeMap::new(),
            properties: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Unlink from the current parent without logging.
    fn detach(&mut self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes[node.0].parent.take()?;
        self.nodes[parent.0].children.retain(|&c| c != node);
        Some(parent)
    }
}

impl Document for MemoryDocument {
    type Node = NodeId;

    fn create_element(&mut self, tag: &str, svg: bool) -> NodeId {
        let node = self.alloc(NodeData::Element {
            tag: tag.to_string(),
            svg,
        });
        self.log.push(Mutation::CreateElement {
            node,
            tag: tag.to_string(),
        });
        node
    }

    fn create_text_node(&mut self, text: &str) -> NodeId {
        let node = self.alloc(NodeData::Text(text.to_string()));
        self.log.push(Mutation::CreateText {
            node,
            text: text.to_string(),
        });
        node
    }

    fn is_text(&self, node: &NodeId) -> bool {
        matches!(self.nodes[node.0].data, NodeData::Text(_))
    }

    fn node_name(&self, node: &NodeId) -> Option<String> {
        match &self.nodes[node.0].data {
            NodeData::Element { tag, .. } => Some(tag.clone()),
            NodeData::Text(_) => None,
        }
    }

    fn is_svg(&self, node: &NodeId) -> bool {
        match &self.nodes[node.0].data {
            NodeData::Element { svg, .. } => *svg,
            NodeData::Text(_) => false,
        }
    }

    fn text(&self, node: &NodeId) -> Option<String> {
        match &self.nodes[node.0].data {
            NodeData::Text(text) => Some(text.clone()),
            NodeData::Element { .. } => None,
        }
    }

    fn set_text(&mut self, node: &NodeId, text: &str) {
        if let NodeData::Text(current) = &mut self.nodes[node.0].data {
            *current = text.to_string();
            self.log.push(Mutation::SetText {
                node: *node,
                text: text.to_string(),
            });
        }
    }

    fn get(&self, node: &NodeId, name: &str) -> Option<Value> {
        let record = &self.nodes[node.0];
        record
            .properties
            .get(name)
            .or_else(|| record.attributes.get(name))
            .cloned()
    }

    fn set(&mut self, node: &NodeId, name: &str, value: Option<Value>) {
        let properties = &mut self.nodes[node.0].properties;
        match value {
            Some(value) => properties.insert(name.to_string(), value),
            None => properties.remove(name),
        };
        self.log.push(Mutation::SetProperty {
            node: *node,
            name: name.to_string(),
        });
    }

    fn attributes(&self, node: &NodeId) -> Vec<Attribute> {
        self.nodes[node.0]
            .attributes
            .iter()
            .map(|(key, value)| Attribute::new(key.clone(), value.clone()))
            .collect()
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn first_child(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes[node.0].children.first().copied()
    }

    fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
        let parent = self.nodes[node.0].parent?;
        let siblings = &self.nodes[parent.0].children;
        let position = siblings.iter().position(|c| c == node)?;
        siblings.get(position + 1).copied()
    }

    fn child_count(&self, node: &NodeId) -> usize {
        self.nodes[node.0].children.len()
    }

    fn child_at(&self, node: &NodeId, index: usize) -> Option<NodeId> {
        self.nodes[node.0].children.get(index).copied()
    }

    fn append_child(&mut self, parent: &NodeId, node: &NodeId) {
        self.detach(*node);
        self.nodes[parent.0].children.push(*node);
        self.nodes[node.0].parent = Some(*parent);
        self.log.push(Mutation::AppendChild {
            parent: *parent,
            node: *node,
        });
    }

    fn insert_before(&mut self, parent: &NodeId, node: &NodeId, reference: &NodeId) {
        self.detach(*node);
        let children = &mut self.nodes[parent.0].children;
        let position = children
            .iter()
            .position(|c| c == reference)
            .unwrap_or(children.len());
        children.insert(position, *node);
        self.nodes[node.0].parent = Some(*parent);
        self.log.push(Mutation::InsertBefore {
            parent: *parent,
            node: *node,
            reference: *reference,
        });
    }

    fn remove(&mut self, node: &NodeId) {
        if let Some(parent) = self.detach(*node) {
            self.log.push(Mutation::Remove {
                parent,
                node: *node,
            });
        }
    }

    fn set_accessor(
        &mut self,
        node: &NodeId,
        key: &str,
        old: Option<&Value>,
        new: Option<&Value>,
        svg: bool,
    ) {
        let attributes = &mut self.nodes[node.0].attributes;
        match new {
            Some(value) => attributes.insert(key.to_string(), value.clone()),
            None => attributes.remove(key),
        };
        self.log.push(Mutation::SetAccessor {
            node: *node,
            key: key.to_string(),
            old: old.cloned(),
            new: new.cloned(),
            svg,
        });
    }
}

// =============================================================================
// Tests
// =============================================================================
