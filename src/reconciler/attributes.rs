//! Attribute diffing.

use std::collections::BTreeMap;

use super::Vdom;
use crate::document::Document;
use crate::vnode::{Attribute, Value};

/// Keys that pass through to components and are never applied one by one.
const PASS_THROUGH: [&str; 2] = ["children", "innerHTML"];

fn by_key(attributes: &[Attribute]) -> BTreeMap<&str, &Value> {
    attributes
        .iter()
        .map(|a| (a.key.as_str(), &a.value))
        .collect()
}

impl<D: Document> Vdom<D> {
    /// Clear keys that disappeared, then re-issue every present key.
    ///
    /// Unchanged values are re-applied too; the adapter decides whether
    /// that is a no-op (it is how listeners get rebound).
    pub(crate) fn diff_attributes(
        &mut self,
        node: &D::Node,
        attributes: &[Attribute],
        old: &[Attribute],
        svg: bool,
    ) {
        let next = by_key(attributes);
        let prev = by_key(old);

        for (key, value) in &prev {
            if !next.contains_key(key) {
                self.document
                    .set_accessor(node, key, Some(*value), None, svg);
            }
        }

        for (key, value) in &next {
            if PASS_THROUGH.contains(key) {
                continue;
            }
            self.document
                .set_accessor(node, key, prev.get(key).copied(), Some(*value), svg);
        }
    }
}
