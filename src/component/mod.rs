//! Component model - the contract application components implement.
//!
//! A component turns `(context, props, state)` into a [`VNode`] tree. Every
//! lifecycle hook is optional: a component advertises the hooks it actually
//! implements through [`Component::capabilities`], and the reconciler only
//! calls hooks whose flag is set.
//!
//! # Lifecycle
//!
//! ```text
//! construct → init_props/init_state → will_mount → render → (attach) → did_mount
//!     update: will_receive_props → should_update? → will_update → render → did_update
//!     teardown: will_unmount → (detach)
//! ```
//!
//! # Example
//!
//! ```
//! use spark_vdom::component::{Capabilities, Component, Context, Props, State};
//! use spark_vdom::vnode::{h, text, VNode};
//!
//! #[derive(Default)]
//! struct Greeting;
//!
//! impl Component for Greeting {
//!     fn render(&self, _: &Context, props: &Props, _: &State) -> VNode {
//!         let name = props.get_str("name").unwrap_or("world");
//!         h("p", [], [text(format!("hello {name}"))])
//!     }
//! }
//! ```

mod host;
mod props;
mod registry;

pub use host::{is_host_tag, is_reserved};
pub use props::{merge, Context, Props, State};
pub use registry::{ComponentRegistry, Constructor};

use crate::scheduler::Updater;
use crate::vnode::VNode;

bitflags::bitflags! {
    /// Optional lifecycle hooks a component implements.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Capabilities: u16 {
        const INIT_STATE = 1 << 0;
        const INIT_PROPS = 1 << 1;
        const WILL_MOUNT = 1 << 2;
        const DID_MOUNT = 1 << 3;
        const WILL_UNMOUNT = 1 << 4;
        const WILL_RECEIVE_PROPS = 1 << 5;
        const SHOULD_UPDATE = 1 << 6;
        const WILL_UPDATE = 1 << 7;
        const DID_UPDATE = 1 << 8;
        const DERIVE_STATE = 1 << 9;
        const WITH_CONTEXT = 1 << 10;
    }
}

/// A unit of user interface.
///
/// Only [`Component::render`] is required. Hook methods are invoked only
/// when the matching [`Capabilities`] flag is returned.
pub trait Component: Send + 'static {
    /// Describe the desired output.
    fn render(&self, context: &Context, props: &Props, state: &State) -> VNode;

    /// Hooks this component implements.
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    /// Initial state, before the first render.
    fn init_state(&mut self, _props: &Props) -> State {
        State::new()
    }

    /// Default props, merged under caller-supplied props.
    fn init_props(&self) -> Props {
        Props::new()
    }

    fn will_mount(&mut self, _updater: &Updater) {}

    fn did_mount(&mut self, _updater: &Updater) {}

    /// Runs before the component's nodes leave the document.
    fn will_unmount(&mut self) {}

    fn will_receive_props(&mut self, _context: &Context, _next_props: &Props) {}

    /// Returning false skips the render; props and state are still committed.
    fn should_update(&mut self, _context: &Context, _next_props: &Props, _next_state: &State) -> bool {
        true
    }

    /// Returned props are laid over `next_props` for the render that follows.
    fn will_update(
        &mut self,
        _context: &Context,
        _next_props: &Props,
        _next_state: &State,
    ) -> Option<Props> {
        None
    }

    fn did_update(&mut self, _prev_props: &Props, _prev_state: &State) {}

    /// Pure derivation applied before every render.
    fn derive_state(&self, _props: &Props, state: &State) -> State {
        state.clone()
    }

    /// Context passed to this component's children.
    fn with_context(&self, context: &Context) -> Context {
        context.clone()
    }
}
