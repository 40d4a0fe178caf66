//! Node-level diffing: `diff`, `idiff` and subtree teardown.

use super::{Pass, Vdom};
use crate::component::{is_host_tag, Context};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::vnode::{Element, VNode};

impl<D: Document> Vdom<D> {
    /// Diff `vnode` against `existing` and return the resulting node.
    ///
    /// When `pass` is `None` this is an outermost call: SVG mode comes from
    /// `parent`, and hydration is on iff `existing` carries the marker but
    /// was never diffed by this instance (pre-rendered markup). Every
    /// element this instance diffs has an `attr_cache` entry, so its own
    /// output never hydrates.
    /// The result is appended to `parent` when it is not already its child.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn diff(
        &mut self,
        existing: Option<D::Node>,
        vnode: &VNode,
        parent: Option<&D::Node>,
        context: &Context,
        mount_all: bool,
        component_root: bool,
        pass: Option<Pass>,
    ) -> Result<D::Node> {
        let pass = match pass {
            Some(pass) => pass,
            None => Pass {
                svg: parent.is_some_and(|p| self.document.is_svg(p)),
                hydrating: existing
                    .as_ref()
                    .is_some_and(|e| self.is_marked(e) && !self.attr_cache.contains_key(e)),
            },
        };

        self.diff_depth += 1;
        let result = self
            .idiff(existing, vnode, context, mount_all, pass)
            .map(|out| {
                if let Some(parent) = parent {
                    if self.document.parent(&out).as_ref() != Some(parent) {
                        self.document.append_child(parent, &out);
                    }
                }
                out
            });
        self.diff_depth -= 1;

        if self.diff_depth == 0 && !component_root {
            match &result {
                Ok(_) => self.flush_mounts(),
                // Instances from a failed pass never see did_mount
                Err(_) => self.mounts.clear(),
            }
        }
        result
    }

    pub(crate) fn idiff(
        &mut self,
        existing: Option<D::Node>,
        vnode: &VNode,
        context: &Context,
        mount_all: bool,
        pass: Pass,
    ) -> Result<D::Node> {
        match vnode {
            VNode::Text(data) => Ok(self.diff_text(existing, data)),
            VNode::Element(el) => {
                if self.is_higher_order(el)? {
                    return self.build_component_from_vnode(existing, el, context, mount_all, pass);
                }
                self.diff_element(existing, el, context, mount_all, pass)
            }
            VNode::Comment(_) | VNode::Doctype(_) => Err(Error::UnsupportedNode {
                kind: vnode.kind(),
            }),
        }
    }

    fn diff_text(&mut self, existing: Option<D::Node>, data: &str) -> D::Node {
        if let Some(node) = &existing {
            if self.document.is_text(node) && self.document.parent(node).is_some() {
                if self.document.text(node).as_deref() != Some(data) {
                    self.document.set_text(node, data);
                }
                self.mark(node);
                return node.clone();
            }
        }

        let out = self.document.create_text_node(data);
        self.mark(&out);
        if let Some(old) = existing {
            if let Some(parent) = self.document.parent(&old) {
                self.document.replace_child(&parent, &out, &old);
            }
            self.recollect_node_tree(&old, true);
        }
        out
    }

    fn diff_element(
        &mut self,
        existing: Option<D::Node>,
        el: &Element,
        context: &Context,
        mount_all: bool,
        mut pass: Pass,
    ) -> Result<D::Node> {
        if el.tag == "svg" {
            pass.svg = true;
        } else if el.tag == "foreignObject" {
            pass.svg = false;
        }

        let out = match existing {
            Some(node) if self.is_named_node(&node, &el.tag) => node,
            existing => {
                let out = self.document.create_element(&el.tag, pass.svg);
                self.mark(&out);
                if let Some(old) = existing {
                    // Transplant children, then splice in place of the old node
                    while let Some(child) = self.document.first_child(&old) {
                        self.document.append_child(&out, &child);
                    }
                    if let Some(parent) = self.document.parent(&old) {
                        self.document.replace_child(&parent, &out, &old);
                    }
                    self.recollect_node_tree(&old, true);
                }
                tracing::trace!(tag = %el.tag, svg = pass.svg, "created element");
                out
            }
        };

        let old_attributes = match self.attr_cache.get(&out) {
            Some(cached) => cached.clone(),
            None => {
                let marker = &self.config.marker_attribute;
                self.document
                    .attributes(&out)
                    .into_iter()
                    .filter(|a| &a.key != marker)
                    .collect()
            }
        };

        let first = self.document.first_child(&out);
        match (el.children(), first) {
            ([VNode::Text(data)], Some(fc))
                if !pass.hydrating
                    && self.document.is_text(&fc)
                    && self.document.next_sibling(&fc).is_none() =>
            {
                if self.document.text(&fc).as_deref() != Some(data.as_str()) {
                    self.document.set_text(&fc, data);
                }
            }
            (children, first) if !children.is_empty() || first.is_some() => {
                self.inner_diff_node(&out, children, context, mount_all, pass)?;
            }
            _ => {}
        }

        self.diff_attributes(&out, &el.attributes, &old_attributes, pass.svg);
        self.attr_cache.insert(out.clone(), el.attributes.clone());
        Ok(out)
    }

    /// Whether an element node names a registered component.
    ///
    /// In strict mode an unregistered tag that is not a host element is an
    /// unknown component rather than a plain element.
    pub(crate) fn is_higher_order(&self, el: &Element) -> Result<bool> {
        if self.registry.contains(&el.tag) {
            return Ok(true);
        }
        if self.config.strict_tags && !is_host_tag(&el.tag) {
            return Err(Error::UnknownComponent {
                tag: el.tag.clone(),
            });
        }
        Ok(false)
    }

    pub(crate) fn is_named_node(&self, node: &D::Node, tag: &str) -> bool {
        self.document
            .node_name(node)
            .is_some_and(|name| name.eq_ignore_ascii_case(tag))
    }

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------

    /// Unmount the component owning `node`, or remove `node` and recurse.
    ///
    /// With `unmount_only`, framework-created nodes are left attached (their
    /// caller already detached an ancestor or replaced them).
    pub(crate) fn recollect_node_tree(&mut self, node: &D::Node, unmount_only: bool) {
        if let Some(id) = self.owners.get(node).copied() {
            self.unmount_component(id, true);
            return;
        }
        self.attr_cache.remove(node);
        if !unmount_only || !self.is_marked(node) {
            self.document.remove(node);
        }
        self.remove_children(node);
    }

    /// Recollect every child of `node`, last first.
    pub(crate) fn remove_children(&mut self, node: &D::Node) {
        let count = self.document.child_count(node);
        let children: Vec<D::Node> = (0..count)
            .filter_map(|i| self.document.child_at(node, i))
            .collect();
        for child in children.iter().rev() {
            self.recollect_node_tree(child, true);
        }
    }
}
