//! Core - the per-instance record every mounted component carries.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::ComponentId;
use crate::component::{merge, Capabilities, Component, Context, Props, State};
use crate::scheduler::RenderCallback;

/// Bookkeeping for one mounted component.
///
/// `N` is the document node handle type. `base` is the node the instance
/// currently owns; `next_base` the node it adopts on its next render.
pub struct Core<N> {
    pub(crate) id: ComponentId,
    pub(crate) constructor: String,
    pub(crate) component: Box<dyn Component>,
    pub(crate) capabilities: Capabilities,

    pub(crate) context: Context,
    pub(crate) props: Props,
    pub(crate) state: State,
    pub(crate) prev_context: Option<Context>,
    pub(crate) prev_props: Option<Props>,
    pub(crate) prev_state: Option<State>,

    pub(crate) render_callbacks: Vec<RenderCallback>,

    /// Instance this component rendered as its root, if its output was
    /// itself a component node.
    pub(crate) child_component: Option<ComponentId>,
    /// Lookup-only back reference. Never used for ownership decisions.
    pub(crate) parent_component: Option<ComponentId>,

    pub(crate) base: Option<N>,
    pub(crate) next_base: Option<N>,

    pub(crate) dirty: Arc<AtomicBool>,
    /// Guards against re-entrant prop application.
    pub(crate) disabled: bool,
    pub(crate) mounted: bool,
    pub(crate) key: Option<String>,
    pub(crate) priority: i32,
}

impl<N> Core<N> {
    pub(crate) fn new(
        id: ComponentId,
        constructor: String,
        component: Box<dyn Component>,
        props: Props,
        context: Context,
    ) -> Self {
        let capabilities = component.capabilities();
        Self {
            id,
            constructor,
            component,
            capabilities,
            context,
            props,
            state: State::new(),
            prev_context: None,
            prev_props: None,
            prev_state: None,
            render_callbacks: Vec::new(),
            child_component: None,
            parent_component: None,
            base: None,
            next_base: None,
            dirty: Arc::new(AtomicBool::new(false)),
            disabled: false,
            mounted: false,
            key: None,
            priority: 0,
        }
    }

    /// Arena handle of this instance.
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Lower-case tag this instance was created for.
    pub fn constructor(&self) -> &str {
        &self.constructor
    }

    /// Hooks the component implements.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub(crate) fn has(&self, capability: Capabilities) -> bool {
        self.capabilities.contains(capability)
    }

    /// Props of the last committed update.
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Current state, including merged patches.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Context received from the nearest providing ancestor.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Props before the pending render, if they changed since the last one.
    pub fn prev_props(&self) -> Option<&Props> {
        self.prev_props.as_ref()
    }

    /// State before the pending render, if it changed since the last one.
    pub fn prev_state(&self) -> Option<&State> {
        self.prev_state.as_ref()
    }

    /// Root node the instance currently renders into.
    pub fn base(&self) -> Option<&N> {
        self.base.as_ref()
    }

    /// Node adopted on the next render.
    pub fn next_base(&self) -> Option<&N> {
        self.next_base.as_ref()
    }

    /// Reconciliation key taken from the props.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Component that rendered this one as its root, if any.
    pub fn parent_component(&self) -> Option<ComponentId> {
        self.parent_component
    }

    /// Component this one rendered as its root, if any.
    pub fn child_component(&self) -> Option<ComponentId> {
        self.child_component
    }

    /// Whether a re-render is pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Whether `did_mount` has run.
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Rendering-urgency hint. Higher is more urgent.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Set the rendering-urgency hint.
    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    /// Merge `partial` into state, remembering the pre-update snapshot.
    pub(crate) fn apply_state(&mut self, partial: &State) {
        if self.prev_state.is_none() {
            self.prev_state = Some(self.state.clone());
        }
        self.state = merge(&self.state, partial);
    }
}

impl<N: fmt::Debug> fmt::Debug for Core<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Core")
            .field("id", &self.id)
            .field("constructor", &self.constructor)
            .field("props", &self.props)
            .field("state", &self.state)
            .field("base", &self.base)
            .field("key", &self.key)
            .field("dirty", &self.is_dirty())
            .finish_non_exhaustive()
    }
}
