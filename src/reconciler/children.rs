//! List reconciliation - matching new virtual children to existing nodes.
//!
//! Keyed children are matched through a key → node map. Unkeyed children
//! take the first not-yet-used node of the same type at or after a cursor
//! that only moves forward, which keeps in-order lists linear. This is not
//! a minimal edit script: predictability wins over optimality.

use std::collections::BTreeMap;

use super::{Pass, Vdom};
use crate::component::Context;
use crate::document::Document;
use crate::error::Result;
use crate::vnode::{key_string, VNode, KEY_ATTRIBUTE};

impl<D: Document> Vdom<D> {
    pub(crate) fn inner_diff_node(
        &mut self,
        parent: &D::Node,
        vchildren: &[VNode],
        context: &Context,
        mount_all: bool,
        pass: Pass,
    ) -> Result<()> {
        // 1. Classify existing children
        let mut keyed: BTreeMap<String, D::Node> = BTreeMap::new();
        let mut candidates: Vec<Option<D::Node>> = Vec::new();
        // Whitespace text skipped while hydrating: never matched, always torn down
        let mut stray: Vec<D::Node> = Vec::new();
        let count = self.document.child_count(parent);
        for i in 0..count {
            let Some(child) = self.document.child_at(parent, i) else {
                continue;
            };
            match self.node_key(&child) {
                Some(key) if !keyed.contains_key(&key) => {
                    keyed.insert(key, child);
                }
                Some(key) => {
                    // First occurrence keeps the key; later ones are matched by position
                    tracing::warn!(key = %key, "duplicate key among existing children");
                    candidates.push(Some(child));
                }
                None => {
                    if self.is_candidate(&child, pass.hydrating) {
                        candidates.push(Some(child));
                    } else {
                        stray.push(child);
                    }
                }
            }
        }

        // 2-3. Match, diff and place each new child
        let mut min = 0;
        for (i, vchild) in vchildren.iter().enumerate() {
            let mut matched = None;
            if let Some(key) = vchild.key() {
                matched = keyed.remove(&key);
            } else if min < candidates.len() {
                for j in min..candidates.len() {
                    let same = candidates[j]
                        .as_ref()
                        .is_some_and(|c| self.is_same_node_type(c, vchild));
                    if same {
                        matched = candidates[j].take();
                        if j == min {
                            min += 1;
                        }
                        break;
                    }
                }
            }

            let child = self.idiff(matched, vchild, context, mount_all, pass)?;
            let slot = self.document.child_at(parent, i);
            if &child != parent && slot.as_ref() != Some(&child) {
                match slot {
                    None => self.document.append_child(parent, &child),
                    Some(slot) => {
                        if self.document.next_sibling(&slot).as_ref() == Some(&child) {
                            // Slot occupant is stale here; detach it so the
                            // match slides into place. Every original child is
                            // in `keyed`, `candidates` or `stray`, so it is
                            // either matched later or recollected in step 4.
                            self.document.remove(&slot);
                        } else {
                            self.document.insert_before(parent, &child, &slot);
                        }
                    }
                }
            }
        }

        // 4. Tear down whatever was not reused
        for (key, node) in keyed {
            tracing::trace!(key = %key, "removing unused keyed child");
            self.recollect_node_tree(&node, false);
        }
        for node in candidates.into_iter().skip(min).flatten() {
            self.recollect_node_tree(&node, false);
        }
        for node in stray {
            self.recollect_node_tree(&node, false);
        }
        Ok(())
    }

    /// Reconciliation key of an existing node.
    ///
    /// An owning component's key wins; otherwise the `key` attribute last
    /// applied to a framework-created element.
    fn node_key(&self, node: &D::Node) -> Option<String> {
        if let Some(id) = self.owners.get(node) {
            return self.arena.get(*id).and_then(|core| core.key.clone());
        }
        self.attr_cache
            .get(node)?
            .iter()
            .rev()
            .find(|a| a.key == KEY_ATTRIBUTE)
            .and_then(|a| key_string(&a.value))
    }

    /// Whether an unkeyed node may be matched positionally.
    fn is_candidate(&self, node: &D::Node, hydrating: bool) -> bool {
        if hydrating && self.document.is_text(node) {
            return self
                .document
                .text(node)
                .is_some_and(|text| !text.trim().is_empty());
        }
        true
    }

    /// Text matches text, a plain element matches its tag, and a component
    /// node matches a node whose outermost owner was built for that tag.
    fn is_same_node_type(&self, node: &D::Node, vnode: &VNode) -> bool {
        match vnode {
            VNode::Text(_) => self.document.is_text(node),
            VNode::Element(el) if self.registry.contains(&el.tag) => self
                .owners
                .get(node)
                .is_some_and(|id| self.constructor_is(*id, &el.tag)),
            VNode::Element(el) => self.is_named_node(node, &el.tag),
            VNode::Comment(_) | VNode::Doctype(_) => false,
        }
    }
}
