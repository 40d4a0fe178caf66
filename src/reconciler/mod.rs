//! Reconciler - maps virtual trees onto a live document with minimal mutation.
//!
//! [`Vdom`] is the framework instance. It owns the component arena, the
//! registry and the document adapter, and shares its [`RenderQueue`] with
//! every [`Updater`] it hands out.
//!
//! # Algorithm
//!
//! 1. `diff` - outermost call decides SVG and hydration mode for the pass
//! 2. `idiff` - per node: update text in place, recurse into elements, or
//!    hand higher-order (component) nodes to the component layer
//! 3. `inner_diff_node` - match new children to existing ones by key, then
//!    by first same-typed node from a forward-moving cursor; move, append,
//!    or tear down what is left
//! 4. `diff_attributes` - clear removed keys, re-apply every present key
//! 5. After the outermost pass, `did_mount` fires for new instances
//!
//! # Example
//!
//! ```
//! use spark_vdom::document::memory::MemoryDocument;
//! use spark_vdom::vnode::{attr, h, text};
//! use spark_vdom::Vdom;
//!
//! let mut document = MemoryDocument::new();
//! let root = document.create_root("body");
//! let mut vdom = Vdom::new(document);
//!
//! let tree = h("ul", [attr("class", "list")], [h("li", [], [text("one")])]);
//! let node = vdom.render(&tree, &root, None).unwrap();
//! assert_eq!(
//!     vdom.document().to_html(node),
//!     "<ul class=\"list\"><li>one</li></ul>"
//! );
//! ```

mod attributes;
mod children;
mod diff;
mod mount;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;

use crate::component::{Capabilities, Component, ComponentRegistry, Context, Props, State};
use crate::config::Config;
use crate::document::Document;
use crate::engine::{Arena, ComponentId, Core};
use crate::error::{ComponentError, Error, Result};
use crate::scheduler::{RenderCallback, RenderQueue, Updater};
use crate::vnode::{Attribute, Value, VNode};

/// How a prop change is turned into a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Commit props only.
    NoRender,
    /// Render now.
    #[default]
    Sync,
    /// Render now, bypassing `should_update`.
    Force,
    /// Render now when `sync_component_updates` is set, else enqueue.
    Async,
}

/// Namespace and hydration mode of the current pass.
///
/// Threaded through recursive calls by value, so nested subtrees restore
/// the caller's mode on return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Pass {
    pub(crate) svg: bool,
    pub(crate) hydrating: bool,
}

/// Outcome of one [`Vdom::rerender`] drain.
#[derive(Debug, Default)]
pub struct DrainReport {
    /// Instances rendered successfully.
    pub rendered: usize,
    /// Entries dropped: already clean, or unmounted since they were queued.
    pub skipped: usize,
    /// Instances whose render failed. They stay dirty.
    pub errors: Vec<(ComponentId, Error)>,
}

// =============================================================================
// Vdom
// =============================================================================

/// A framework instance bound to one document.
pub struct Vdom<D: Document> {
    pub(crate) document: D,
    pub(crate) config: Config,
    pub(crate) registry: ComponentRegistry,
    pub(crate) arena: Arena<Core<D::Node>>,
    /// Node → outermost component whose base it is.
    pub(crate) owners: HashMap<D::Node, ComponentId>,
    /// Node → attributes applied by the last diff of that node.
    pub(crate) attr_cache: HashMap<D::Node, Vec<Attribute>>,
    /// Instances awaiting `did_mount`, in completion order.
    pub(crate) mounts: Vec<ComponentId>,
    pub(crate) queue: Arc<RenderQueue>,
    pub(crate) diff_depth: usize,
}

impl<D: Document> Vdom<D> {
    /// Bind a new instance to `document` with the default configuration.
    pub fn new(document: D) -> Self {
        Self::with_config(document, Config::default())
    }

    /// Bind a new instance to `document` with an explicit configuration.
    pub fn with_config(document: D, config: Config) -> Self {
        Self {
            document,
            config,
            registry: ComponentRegistry::new(),
            arena: Arena::new(),
            owners: HashMap::new(),
            attr_cache: HashMap::new(),
            mounts: Vec::new(),
            queue: Arc::new(RenderQueue::new()),
            diff_depth: 0,
        }
    }

    /// Configuration this instance was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The document adapter.
    pub fn document(&self) -> &D {
        &self.document
    }

    /// Mutable access to the document adapter.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    /// Registered component constructors.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Shared handle to this instance's render queue.
    pub fn queue(&self) -> Arc<RenderQueue> {
        self.queue.clone()
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Register a fallible constructor under `name`.
    pub fn register<F>(&mut self, name: &str, constructor: F) -> Result<()>
    where
        F: Fn() -> std::result::Result<Box<dyn Component>, ComponentError> + Send + Sync + 'static,
    {
        self.registry.register(name, constructor)
    }

    /// Register `C::default` under `name`.
    pub fn register_default<C>(&mut self, name: &str) -> Result<()>
    where
        C: Component + Default,
    {
        self.registry.register_default::<C>(name)
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    /// Render `tree` into `container`, diffing against `existing` if given.
    pub fn render(
        &mut self,
        tree: &VNode,
        container: &D::Node,
        existing: Option<D::Node>,
    ) -> Result<D::Node> {
        let context = Context::new();
        self.diff(existing, tree, Some(container), &context, false, false, None)
    }

    /// Tear down a rendered tree: unmount its components, detach its nodes.
    pub fn unmount(&mut self, node: &D::Node) {
        self.recollect_node_tree(node, false);
    }

    /// Drain the render queue, rendering every instance still marked dirty.
    pub fn rerender(&mut self) -> DrainReport {
        let mut report = DrainReport::default();
        while let Some(id) = self.queue.pop() {
            let Some(core) = self.arena.get(id) else {
                tracing::trace!(component = %id, "dropping update for unmounted component");
                self.queue.take_pending(id);
                report.skipped += 1;
                continue;
            };
            // A patch is only ever pending while the instance is dirty; the
            // render that clears the flag consumes it.
            if !core.is_dirty() {
                report.skipped += 1;
                continue;
            }
            match self.render_component(id, RenderMode::Sync, false, false, None) {
                Ok(()) => report.rendered += 1,
                Err(err) => {
                    tracing::error!(component = %id, error = %err, "render failed");
                    report.errors.push((id, err));
                }
            }
        }
        if report.rendered > 0 || !report.errors.is_empty() {
            tracing::debug!(
                rendered = report.rendered,
                skipped = report.skipped,
                failed = report.errors.len(),
                "drain finished"
            );
        }
        report
    }

    // -------------------------------------------------------------------------
    // Component access
    // -------------------------------------------------------------------------

    /// Look up a live instance.
    pub fn component(&self, id: ComponentId) -> Option<&Core<D::Node>> {
        self.arena.get(id)
    }

    /// Mutable lookup of a live instance.
    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Core<D::Node>> {
        self.arena.get_mut(id)
    }

    /// The outermost component owning `node`.
    pub fn component_at(&self, node: &D::Node) -> Option<ComponentId> {
        self.owners.get(node).copied()
    }

    /// Number of mounted component instances.
    pub fn component_count(&self) -> usize {
        self.arena.len()
    }

    /// A `Send` handle for scheduling state changes on `id`.
    pub fn updater(&self, id: ComponentId) -> Option<Updater> {
        let core = self.arena.get(id)?;
        Some(Updater::new(id, core.dirty.clone(), self.queue.clone()))
    }

    /// Merge `partial` into state now and enqueue a re-render.
    pub fn set_state(
        &mut self,
        id: ComponentId,
        partial: State,
        callback: Option<RenderCallback>,
    ) -> Result<()> {
        let core = self.arena.get_mut(id).ok_or(Error::StaleComponent(id))?;
        // Earlier updater patches apply first
        if let Some(pending) = self.queue.take_pending(id) {
            core.apply_state(&pending.patch);
            core.render_callbacks.extend(pending.callbacks);
        }
        core.apply_state(&partial);
        core.render_callbacks.extend(callback);
        let dirty = core.dirty.clone();
        self.queue.enqueue(id, &dirty);
        Ok(())
    }

    /// Replace an instance's props, keeping its context.
    pub fn set_props(&mut self, id: ComponentId, props: Props) -> Result<()> {
        let context = self
            .arena
            .get(id)
            .map(|core| core.context.clone())
            .ok_or(Error::StaleComponent(id))?;
        self.set_component_props(id, props, RenderMode::Async, &context, false, None)
    }

    /// Render now, skipping `should_update`.
    pub fn force_update(&mut self, id: ComponentId) -> Result<()> {
        if !self.arena.contains(id) {
            return Err(Error::StaleComponent(id));
        }
        self.render_component(id, RenderMode::Force, false, false, None)
    }

    // -------------------------------------------------------------------------
    // Internals shared by the submodules
    // -------------------------------------------------------------------------

    pub(crate) fn is_marked(&self, node: &D::Node) -> bool {
        self.document
            .get(node, &self.config.marker_attribute)
            .is_some_and(|value| !value.is_null())
    }

    pub(crate) fn mark(&mut self, node: &D::Node) {
        if !self.is_marked(node) {
            self.document
                .set(node, &self.config.marker_attribute, Some(Value::Bool(true)));
        }
    }

    /// Run `did_mount` for instances whose first render completed.
    pub(crate) fn flush_mounts(&mut self) {
        let mounts = std::mem::take(&mut self.mounts);
        for id in mounts {
            let Some(updater) = self.updater(id) else {
                continue;
            };
            let Some(core) = self.arena.get_mut(id) else {
                continue;
            };
            if core.mounted {
                continue;
            }
            core.mounted = true;
            tracing::debug!(component = %id, constructor = %core.constructor, "mounted");
            if core.has(Capabilities::DID_MOUNT) {
                core.component.did_mount(&updater);
            }
        }
    }
}

impl<D: Document + std::fmt::Debug> std::fmt::Debug for Vdom<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vdom")
            .field("document", &self.document)
            .field("components", &self.arena.len())
            .field("registry", &self.registry)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}
