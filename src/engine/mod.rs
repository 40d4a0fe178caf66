//! Engine - component arena and per-instance records.
//!
//! - Arena: handle allocation with free-slot reuse and generations
//! - Core: props/state/context snapshots, base nodes, dirty flag, hooks
//!
//! # Architecture
//!
//! Components are not linked objects. They live in one arena owned by the
//! framework instance and refer to each other by [`ComponentId`]:
//!
//! ```text
//! #0v0: app     (parent=None, child=#1v0, base=<div>)
//! #1v0: layout  (parent=#0v0, child=None, base=<div>)
//! #2v0: counter (parent=None, child=None, base=<span>)
//! ```
//!
//! The parent link is a lookup aid only; ownership follows tree position.

mod arena;
mod instance;

pub use arena::*;
pub use instance::*;
