//! # spark-vdom
//!
//! Component-based virtual DOM reconciliation for Rust.
//!
//! Application components describe their output as [`VNode`] trees. The
//! reconciler diffs each new tree against the live document it produced
//! last time and applies the smallest practical set of mutations through a
//! [`Document`](document::Document) adapter.
//!
//! ## Architecture
//!
//! Component instances are not linked objects. They live in a generational
//! arena owned by the [`Vdom`] and refer to each other by [`ComponentId`].
//! Optional lifecycle hooks are advertised as [`Capabilities`] flags and
//! checked before every call.
//!
//! ```text
//! VNode tree → diff / idiff → inner_diff_node → Document adapter
//!                  │
//!                  └─► component mount/update → render → diff (recursive)
//!
//! Updater::set_state → RenderQueue → Runtime worker → Vdom::rerender
//! ```
//!
//! ## Modules
//!
//! - [`vnode`] - Virtual node data model
//! - [`document`] - Document adapter contract and an in-memory document
//! - [`component`] - Component trait, props, state, context, registry
//! - [`engine`] - Component arena and per-instance records
//! - [`reconciler`] - Tree diff, list reconciliation, mount/unmount
//! - [`scheduler`] - Render queue, updaters, background drain
//! - [`config`] - Instance configuration

pub mod component;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod reconciler;
pub mod scheduler;
pub mod vnode;

// Re-export commonly used items
pub use component::{Capabilities, Component, ComponentRegistry, Context, Props, State};
pub use config::Config;
pub use engine::{ComponentId, Core};
pub use error::{ComponentError, Error, Result};
pub use reconciler::{DrainReport, RenderMode, Vdom};
pub use scheduler::{RenderCallback, RenderQueue, Runtime, Updater};
pub use vnode::{attr, h, text, Attribute, Element, NodeKind, VNode, Value};
