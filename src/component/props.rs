//! Props, state and context values passed to components.

use std::sync::Arc;

use serde_json::Map;

use crate::vnode::{key_string, Element, VNode, Value, KEY_ATTRIBUTE};

/// Component state: a flat map merged shallowly by `set_state`.
pub type State = Map<String, Value>;

/// Shallow merge: keys in `partial` override, keys absent from it are kept.
pub fn merge(prev: &State, partial: &State) -> State {
    let mut next = prev.clone();
    for (key, value) in partial {
        next.insert(key.clone(), value.clone());
    }
    next
}

// =============================================================================
// Props
// =============================================================================

/// Properties handed to a component by its parent.
///
/// Attribute values of the component's virtual node plus its children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    values: Map<String, Value>,
    children: Vec<VNode>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Props of a higher-order node: its attributes and its children.
    pub fn from_element(el: &Element) -> Self {
        let mut values = Map::new();
        for attribute in &el.attributes {
            values.insert(attribute.key.clone(), attribute.value.clone());
        }
        Self {
            values,
            children: el.children().to_vec(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn with_children(mut self, children: Vec<VNode>) -> Self {
        self.children = children;
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn children(&self) -> &[VNode] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.children.is_empty()
    }

    /// The reserved `key` prop, stringified, without removing it.
    pub fn key(&self) -> Option<String> {
        self.values.get(KEY_ATTRIBUTE).and_then(key_string)
    }

    /// Remove and return the reserved `key` prop.
    pub(crate) fn take_key(&mut self) -> Option<String> {
        self.values.remove(KEY_ATTRIBUTE).as_ref().and_then(key_string)
    }

    /// Lay these props over `defaults`. Caller values win.
    pub fn with_defaults(self, defaults: &Props) -> Props {
        let mut values = defaults.values.clone();
        for (key, value) in self.values {
            values.insert(key, value);
        }
        let children = if self.children.is_empty() {
            defaults.children.clone()
        } else {
            self.children
        };
        Props { values, children }
    }
}

// =============================================================================
// Context
// =============================================================================

/// Ambient values inherited from ancestor components.
///
/// Cheap to clone; `with` copies on write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: Arc<Map<String, Value>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Arc::make_mut(&mut self.values).insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
