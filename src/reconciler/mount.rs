//! Component mount, update and unmount.
//!
//! Node ownership lives in `Vdom::owners`: a rendered base node maps to the
//! outermost component of the chain that produced it. Inner links of a
//! chain (a component whose render output is another component) are
//! `child_component` / `parent_component` ids in the arena.

use std::sync::atomic::Ordering;

use super::{Pass, RenderMode, Vdom};
use crate::component::{Capabilities, Context, Props, State};
use crate::document::Document;
use crate::engine::{ComponentId, Core};
use crate::error::{Error, Result};
use crate::scheduler::Updater;
use crate::vnode::Element;

impl<D: Document> Vdom<D> {
    /// Diff a higher-order node: update the owning instance in place, or
    /// build a new one for the slot.
    pub(crate) fn build_component_from_vnode(
        &mut self,
        existing: Option<D::Node>,
        el: &Element,
        context: &Context,
        mount_all: bool,
        pass: Pass,
    ) -> Result<D::Node> {
        let original = existing.as_ref().and_then(|n| self.owners.get(n).copied());
        let is_direct_owner = original.is_some_and(|id| self.constructor_is(id, &el.tag));
        let props = Props::from_element(el);

        let mut owner = original;
        let mut is_owner = is_direct_owner;
        while let Some(id) = owner {
            if is_owner {
                break;
            }
            owner = self.arena.get(id).and_then(|core| core.parent_component);
            is_owner = owner.is_some_and(|p| self.constructor_is(p, &el.tag));
        }

        if let Some(id) = owner.filter(|_| is_owner) {
            let reusable = !mount_all
                || self
                    .arena
                    .get(id)
                    .is_some_and(|core| core.child_component.is_some());
            if reusable {
                self.set_component_props(id, props, RenderMode::Sync, context, mount_all, Some(pass))?;
                return self.base_of(id);
            }
        }

        // Construct before touching the slot so a failure leaves it intact
        let created = self.create_component(&el.tag, &props, context)?;

        let mut existing = existing;
        if let Some(orig) = original {
            if is_direct_owner {
                // Same tag but not reusable: retire the instance, keep its nodes
                self.unmount_component(orig, false);
            } else {
                self.unmount_component(orig, true);
                existing = None;
            }
        }

        // Adopt whatever still occupies the slot; the first render diffs against it
        if let Some(core) = self.arena.get_mut(created) {
            core.next_base = existing;
        }

        let base = self
            .set_component_props(created, props, RenderMode::Sync, context, mount_all, Some(pass))
            .and_then(|()| self.base_of(created));
        if base.is_err() {
            self.discard_component(created);
        }
        base
    }

    /// Instantiate the component registered for `tag`.
    ///
    /// Default props and initial state are applied; nothing is rendered.
    pub(crate) fn create_component(
        &mut self,
        tag: &str,
        props: &Props,
        context: &Context,
    ) -> Result<ComponentId> {
        let constructor = self
            .registry
            .get(tag)
            .cloned()
            .ok_or_else(|| Error::UnknownComponent {
                tag: tag.to_string(),
            })?;
        let mut component = constructor().map_err(|source| Error::Construction {
            tag: tag.to_string(),
            source,
        })?;

        let capabilities = component.capabilities();
        let mut props = props.clone();
        let key = props.take_key();
        if capabilities.contains(Capabilities::INIT_PROPS) {
            props = props.with_defaults(&component.init_props());
        }
        let state = if capabilities.contains(Capabilities::INIT_STATE) {
            component.init_state(&props)
        } else {
            State::new()
        };

        let name = tag.to_ascii_lowercase();
        let id = self.arena.allocate(|id| {
            let mut core = Core::new(id, name, component, props, context.clone());
            core.state = state;
            core.key = key;
            core
        });
        tracing::debug!(component = %id, tag, "created component");
        Ok(id)
    }

    /// Commit new props and context, then render according to `mode`.
    pub(crate) fn set_component_props(
        &mut self,
        id: ComponentId,
        mut props: Props,
        mode: RenderMode,
        context: &Context,
        mount_all: bool,
        pass: Option<Pass>,
    ) -> Result<()> {
        let queue = self.queue.clone();
        let core = self.arena.get_mut(id).ok_or(Error::StaleComponent(id))?;
        if core.disabled {
            return Ok(());
        }
        core.disabled = true;

        core.key = props.take_key();
        if core.has(Capabilities::INIT_PROPS) {
            props = props.with_defaults(&core.component.init_props());
        }

        if core.base.is_none() || mount_all {
            if core.has(Capabilities::WILL_MOUNT) && !core.mounted {
                let updater = Updater::new(id, core.dirty.clone(), queue);
                core.component.will_mount(&updater);
            }
        } else if core.has(Capabilities::WILL_RECEIVE_PROPS) {
            core.component.will_receive_props(context, &props);
        }

        if core.context != *context {
            let previous = std::mem::replace(&mut core.context, context.clone());
            core.prev_context.get_or_insert(previous);
        }
        let previous = std::mem::replace(&mut core.props, props);
        core.prev_props.get_or_insert(previous);
        core.disabled = false;

        let has_base = core.base.is_some();
        match mode {
            RenderMode::NoRender => Ok(()),
            RenderMode::Async if has_base && !self.config.sync_component_updates => {
                let dirty = core.dirty.clone();
                self.queue.enqueue(id, &dirty);
                Ok(())
            }
            RenderMode::Force => self.render_component(id, RenderMode::Force, mount_all, false, pass),
            RenderMode::Sync | RenderMode::Async => {
                self.render_component(id, RenderMode::Sync, mount_all, false, pass)
            }
        }
    }

    /// Render one instance and reconcile its output against its base.
    ///
    /// The dirty flag stays set when the render fails.
    pub(crate) fn render_component(
        &mut self,
        id: ComponentId,
        mode: RenderMode,
        mount_all: bool,
        is_child: bool,
        pass: Option<Pass>,
    ) -> Result<()> {
        let result = self.render_component_inner(id, mode, mount_all, is_child, pass);
        if result.is_err() {
            if let Some(core) = self.arena.get(id) {
                core.dirty.store(true, Ordering::Release);
            }
            if self.diff_depth == 0 && !is_child {
                self.mounts.clear();
            }
        }
        result
    }

    fn render_component_inner(
        &mut self,
        id: ComponentId,
        mode: RenderMode,
        mount_all: bool,
        is_child: bool,
        pass: Option<Pass>,
    ) -> Result<()> {
        let core = self.arena.get_mut(id).ok_or(Error::StaleComponent(id))?;
        if core.disabled {
            return Ok(());
        }

        // Clear before consuming patches: a patch scheduled after this point
        // re-marks the instance, so the drain renders it again.
        core.dirty.store(false, Ordering::Release);
        if let Some(pending) = self.queue.take_pending(id) {
            core.apply_state(&pending.patch);
            core.render_callbacks.extend(pending.callbacks);
        }

        let is_update = core.base.is_some();
        let next_base = core.next_base.take();
        let initial_base = core.base.clone().or_else(|| next_base.clone());
        let initial_child = core.child_component;
        let previous_props = core.prev_props.take();
        let previous_state = core.prev_state.take();
        core.prev_context = None;

        let mut skip = false;
        if is_update {
            if mode != RenderMode::Force
                && core.has(Capabilities::SHOULD_UPDATE)
                && !core
                    .component
                    .should_update(&core.context, &core.props, &core.state)
            {
                skip = true;
            } else if core.has(Capabilities::WILL_UPDATE) {
                if let Some(over) = core
                    .component
                    .will_update(&core.context, &core.props, &core.state)
                {
                    core.props = over.with_defaults(&core.props);
                }
            }
        }

        if !skip {
            if core.has(Capabilities::DERIVE_STATE) {
                core.state = core.component.derive_state(&core.props, &core.state);
            }
            let rendered = core.component.render(&core.context, &core.props, &core.state);
            let child_context = if core.has(Capabilities::WITH_CONTEXT) {
                core.component.with_context(&core.context)
            } else {
                core.context.clone()
            };

            let mut inst = None;
            let mut to_unmount = None;
            let base = match rendered.as_element().filter(|el| self.registry.contains(&el.tag)) {
                Some(el) => {
                    let child_props = Props::from_element(el);
                    let child_key = child_props.key();
                    let reusable = initial_child.filter(|child| {
                        self.arena.get(*child).is_some_and(|core| {
                            core.constructor.eq_ignore_ascii_case(&el.tag) && core.key == child_key
                        })
                    });
                    let child = match reusable {
                        Some(child) => {
                            self.set_component_props(
                                child,
                                child_props,
                                RenderMode::Sync,
                                &child_context,
                                false,
                                pass,
                            )?;
                            child
                        }
                        None => {
                            to_unmount = initial_child;
                            let child = self.create_component(&el.tag, &child_props, &child_context)?;
                            if let Some(core) = self.arena.get_mut(child) {
                                core.parent_component = Some(id);
                                if core.next_base.is_none() {
                                    core.next_base = next_base.clone();
                                }
                            }
                            if let Some(core) = self.arena.get_mut(id) {
                                core.child_component = Some(child);
                            }
                            self.set_component_props(
                                child,
                                child_props,
                                RenderMode::NoRender,
                                &child_context,
                                false,
                                pass,
                            )?;
                            self.render_component(child, RenderMode::Sync, mount_all, true, pass)?;
                            child
                        }
                    };
                    inst = Some(child);
                    self.arena.get(child).and_then(|core| core.base.clone())
                }
                None => {
                    let mut cbase = initial_base.clone();
                    if initial_child.is_some() {
                        to_unmount = initial_child;
                        cbase = None;
                        if let Some(core) = self.arena.get_mut(id) {
                            core.child_component = None;
                        }
                    }
                    if initial_base.is_some() || matches!(mode, RenderMode::Sync | RenderMode::Force) {
                        // The base is diffed as a plain node, not as this component's slot
                        let released = cbase.as_ref().and_then(|cb| self.owners.remove(cb));
                        let parent = initial_base.as_ref().and_then(|b| self.document.parent(b));
                        let diffed = self.diff(
                            cbase.clone(),
                            &rendered,
                            parent.as_ref(),
                            &child_context,
                            mount_all || !is_update,
                            true,
                            pass,
                        );
                        match diffed {
                            Ok(node) => Some(node),
                            Err(err) => {
                                if let (Some(cb), Some(owner)) = (cbase, released) {
                                    self.owners.insert(cb, owner);
                                }
                                return Err(err);
                            }
                        }
                    } else {
                        None
                    }
                }
            };

            if let (Some(initial), Some(base)) = (&initial_base, &base) {
                if base != initial && inst != initial_child {
                    if let Some(parent) = self.document.parent(initial) {
                        if &parent != base {
                            self.document.replace_child(&parent, base, initial);
                            if to_unmount.is_none() {
                                self.owners.remove(initial);
                                self.recollect_node_tree(initial, false);
                            }
                        }
                    }
                }
            }
            if let Some(stale) = to_unmount {
                self.unmount_component(stale, true);
            }

            if let Some(core) = self.arena.get_mut(id) {
                core.base = base.clone();
            }
            if let (Some(base), false) = (&base, is_child) {
                let top = self.propagate_base(id, base);
                if let Some(initial) = &initial_base {
                    if initial != base && self.owners.get(initial) == Some(&top) {
                        self.owners.remove(initial);
                    }
                }
                self.owners.insert(base.clone(), top);
            }
        }

        let core = self.arena.get_mut(id).ok_or(Error::StaleComponent(id))?;
        if !core.mounted {
            if !self.mounts.contains(&id) {
                self.mounts.push(id);
            }
        } else if is_update && !skip && core.has(Capabilities::DID_UPDATE) {
            let prev_props = previous_props.unwrap_or_else(|| core.props.clone());
            let prev_state = previous_state.unwrap_or_else(|| core.state.clone());
            core.component.did_update(&prev_props, &prev_state);
        }

        let callbacks = std::mem::take(&mut core.render_callbacks);
        for callback in callbacks {
            callback();
        }
        tracing::trace!(component = %id, skipped = skip, "rendered component");

        if self.diff_depth == 0 && !is_child {
            self.flush_mounts();
        }
        Ok(())
    }

    /// Give every ancestor in the chain `base`; returns the outermost id.
    fn propagate_base(&mut self, id: ComponentId, base: &D::Node) -> ComponentId {
        let mut top = id;
        let mut cursor = self.arena.get(id).and_then(|core| core.parent_component);
        while let Some(parent) = cursor {
            let Some(core) = self.arena.get_mut(parent) else {
                break;
            };
            core.base = Some(base.clone());
            top = parent;
            cursor = core.parent_component;
        }
        top
    }

    /// Tear an instance down. `will_unmount` runs before any node leaves
    /// the document; with `remove_base` the instance's nodes are removed.
    pub(crate) fn unmount_component(&mut self, id: ComponentId, remove_base: bool) {
        let Some(core) = self.arena.get_mut(id) else {
            return;
        };
        if core.has(Capabilities::WILL_UNMOUNT) {
            core.component.will_unmount();
        }
        core.disabled = true;
        let base = core.base.take();
        let child = core.child_component.take();
        tracing::debug!(component = %id, constructor = %core.constructor, "unmounting component");

        if let Some(base) = &base {
            if self.owners.get(base) == Some(&id) {
                self.owners.remove(base);
            }
        }
        match (child, base) {
            (Some(child), _) => self.unmount_component(child, remove_base),
            (None, Some(base)) if remove_base => {
                self.attr_cache.remove(&base);
                self.document.remove(&base);
                self.remove_children(&base);
            }
            _ => {}
        }
        self.mounts.retain(|queued| *queued != id);
        self.arena.release(id);
    }

    /// Drop an instance whose first render failed. No hooks run.
    fn discard_component(&mut self, id: ComponentId) {
        if let Some(child) = self.arena.get(id).and_then(|core| core.child_component) {
            self.discard_component(child);
        }
        self.mounts.retain(|queued| *queued != id);
        self.arena.release(id);
    }

    pub(crate) fn base_of(&self, id: ComponentId) -> Result<D::Node> {
        self.arena
            .get(id)
            .and_then(|core| core.base.clone())
            .ok_or(Error::StaleComponent(id))
    }

    pub(crate) fn constructor_is(&self, id: ComponentId, tag: &str) -> bool {
        self.arena
            .get(id)
            .is_some_and(|core| core.constructor.eq_ignore_ascii_case(tag))
    }
}

