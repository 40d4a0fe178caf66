//! Scheduler - dirty tracking and the background drain.
//!
//! - [`RenderQueue`]: shared, lock-protected list of dirty instances
//! - [`Updater`]: `Send` handle a component uses to change its own state
//! - [`Runtime`]: owns the framework instance and one drain worker
//!
//! # Flow
//!
//! ```text
//! Updater::set_state ─┐
//! Vdom::set_state ────┼─► RenderQueue (dirty = true, push) ──► worker wakes
//!                     │                                           │
//!                     │                  Vdom::rerender ◄─────────┘
//!                     │                  pop → apply patch → render_component
//! ```
//!
//! Enqueueing never blocks on a render. At most one drain runs at a time:
//! the worker is the only drainer, and it renders under the instance lock.

mod queue;
mod runtime;

pub use queue::{RenderCallback, RenderQueue, Updater};
pub use runtime::Runtime;
