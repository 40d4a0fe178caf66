//! Component registry - maps tag names to constructors.
//!
//! Names are case-insensitive and stored lower-case, matching the
//! lower-cased tags that templates produce.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::host;
use super::Component;
use crate::error::{ComponentError, Error, Result};

/// Creates a fresh component instance.
pub type Constructor =
    Arc<dyn Fn() -> std::result::Result<Box<dyn Component>, ComponentError> + Send + Sync>;

/// Name → constructor table.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    constructors: HashMap<String, Constructor>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fallible constructor under `name`.
    ///
    /// Fails with [`Error::ReservedName`] when `name` is a host element tag.
    /// Registering an existing name replaces its constructor.
    pub fn register<F>(&mut self, name: &str, constructor: F) -> Result<()>
    where
        F: Fn() -> std::result::Result<Box<dyn Component>, ComponentError> + Send + Sync + 'static,
    {
        if host::is_reserved(name) {
            return Err(Error::ReservedName {
                name: name.to_string(),
            });
        }
        let name = name.to_ascii_lowercase();
        tracing::debug!(component = %name, "registered component");
        self.constructors.insert(name, Arc::new(constructor));
        Ok(())
    }

    /// Register a `Default`-constructible component.
    pub fn register_default<C>(&mut self, name: &str) -> Result<()>
    where
        C: Component + Default,
    {
        self.register(name, || Ok(Box::new(C::default()) as Box<dyn Component>))
    }

    pub fn get(&self, tag: &str) -> Option<&Constructor> {
        self.constructors.get(&tag.to_ascii_lowercase())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("names", &self.names())
            .finish()
    }
}
