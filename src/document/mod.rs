//! Document adapter - the contract between the reconciler and a live document.
//!
//! The reconciler never owns document nodes. It holds transient handles and
//! mutates the tree only through [`Document`]. Implementations decide what a
//! node is (a DOM handle, an index into an arena, a terminal widget...).
//!
//! - [`memory::MemoryDocument`] - in-memory tree with a mutation log

pub mod memory;

use std::fmt::Debug;
use std::hash::Hash;

use crate::vnode::{Attribute, Value};

/// Default name of the internal attribute that tags framework-owned nodes.
///
/// A node carrying it was produced by a render (possibly a server-side one)
/// and is adopted rather than rebuilt.
pub const MARKER_ATTRIBUTE: &str = "__spark_attr__";

/// Mutable document tree.
pub trait Document {
    /// Cheap, comparable handle to a node.
    type Node: Clone + Eq + Hash + Debug;

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    /// Create a detached element. `svg` selects the SVG namespace.
    fn create_element(&mut self, tag: &str, svg: bool) -> Self::Node;

    /// Create a detached text node.
    fn create_text_node(&mut self, text: &str) -> Self::Node;

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    fn is_text(&self, node: &Self::Node) -> bool;

    /// Normalized tag name of an element, `None` for text.
    fn node_name(&self, node: &Self::Node) -> Option<String>;

    /// Whether the node lives in (or is) an SVG subtree.
    fn is_svg(&self, node: &Self::Node) -> bool;

    /// Text content of a text node.
    fn text(&self, node: &Self::Node) -> Option<String>;

    fn set_text(&mut self, node: &Self::Node, text: &str);

    /// Read a property. `None` stands for "undefined".
    fn get(&self, node: &Self::Node, name: &str) -> Option<Value>;

    /// Write a property. `None` deletes it.
    fn set(&mut self, node: &Self::Node, name: &str, value: Option<Value>);

    /// Attributes currently present on an element.
    fn attributes(&self, node: &Self::Node) -> Vec<Attribute>;

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    fn first_child(&self, node: &Self::Node) -> Option<Self::Node>;

    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

    fn child_count(&self, node: &Self::Node) -> usize;

    fn child_at(&self, node: &Self::Node, index: usize) -> Option<Self::Node>;

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Append `node` as the last child of `parent`, detaching it first.
    fn append_child(&mut self, parent: &Self::Node, node: &Self::Node);

    /// Insert `node` before `reference` (a child of `parent`), detaching it first.
    fn insert_before(&mut self, parent: &Self::Node, node: &Self::Node, reference: &Self::Node);

    /// Detach `node` from its parent. No-op when already detached.
    fn remove(&mut self, node: &Self::Node);

    /// Put `new` where `old` is and detach `old`.
    fn replace_child(&mut self, parent: &Self::Node, new: &Self::Node, old: &Self::Node) {
        self.insert_before(parent, new, old);
        self.remove(old);
    }

    /// Apply an attribute, property, listener or style change.
    ///
    /// `None` for `new` clears the attribute. Called for every attribute on
    /// every pass, even when `old == new`.
    fn set_accessor(
        &mut self,
        node: &Self::Node,
        key: &str,
        old: Option<&Value>,
        new: Option<&Value>,
        svg: bool,
    );
}
