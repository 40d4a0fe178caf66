//! Render queue - dirty component instances awaiting a re-render.
//!
//! Entries are popped most-recent-first. Duplicates are tolerated: an
//! instance pushed twice renders at most once per pop, and an instance
//! pushed again while its render is in flight is rendered again by a later
//! pop.
//!
//! One lock guards entries, pending state patches and the drain flags.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::component::{merge, State};
use crate::engine::ComponentId;

/// Zero-argument callback run after a component's next completed render.
pub type RenderCallback = Box<dyn FnOnce() + Send>;

/// State merge scheduled by an [`Updater`] and applied by the drain.
#[derive(Default)]
pub(crate) struct PendingUpdate {
    pub(crate) patch: State,
    pub(crate) callbacks: Vec<RenderCallback>,
}

#[derive(Default)]
struct QueueState {
    entries: Vec<ComponentId>,
    pending: HashMap<ComponentId, PendingUpdate>,
    draining: bool,
    closed: bool,
}

/// Shared queue of dirty instances.
#[derive(Default)]
pub struct RenderQueue {
    state: Mutex<QueueState>,
    work: Condvar,
    idle: Condvar,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, id: ComponentId) {
        self.state.lock().entries.push(id);
        self.work.notify_one();
    }

    /// Remove and return the most recently pushed instance.
    pub fn pop(&self) -> Option<ComponentId> {
        self.state.lock().entries.pop()
    }

    /// The most recently pushed instance, without removing it.
    pub fn last(&self) -> Option<ComponentId> {
        self.state.lock().entries.last().copied()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Mark `dirty` and push. Never waits for the render.
    pub fn enqueue(&self, id: ComponentId, dirty: &AtomicBool) {
        dirty.store(true, Ordering::Release);
        self.push(id);
    }

    /// Record a state patch for `id`, mark it dirty and push it.
    pub(crate) fn schedule(
        &self,
        id: ComponentId,
        dirty: &AtomicBool,
        patch: &State,
        callback: Option<RenderCallback>,
    ) {
        {
            let mut state = self.state.lock();
            let pending = state.pending.entry(id).or_default();
            pending.patch = merge(&pending.patch, patch);
            pending.callbacks.extend(callback);
            dirty.store(true, Ordering::Release);
            state.entries.push(id);
        }
        self.work.notify_one();
    }

    pub(crate) fn take_pending(&self, id: ComponentId) -> Option<PendingUpdate> {
        self.state.lock().pending.remove(&id)
    }

    // -------------------------------------------------------------------------
    // Drain coordination
    // -------------------------------------------------------------------------

    /// Block until there is work. Returns false once the queue is closed.
    ///
    /// On true the caller owns the drain until [`RenderQueue::end_drain`].
    pub fn wait_for_work(&self) -> bool {
        let mut state = self.state.lock();
        while state.entries.is_empty() && !state.closed {
            self.work.wait(&mut state);
        }
        if state.closed {
            return false;
        }
        state.draining = true;
        true
    }

    pub fn end_drain(&self) {
        self.state.lock().draining = false;
        self.idle.notify_all();
    }

    pub fn is_draining(&self) -> bool {
        self.state.lock().draining
    }

    /// Block until the queue is empty and no drain is running.
    ///
    /// Returns false on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while !state.entries.is_empty() || state.draining {
            if state.closed {
                return state.entries.is_empty() && !state.draining;
            }
            if self.idle.wait_until(&mut state, deadline).timed_out() {
                return state.entries.is_empty() && !state.draining;
            }
        }
        true
    }

    /// Wake the worker and make it exit.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.work.notify_all();
        self.idle.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl fmt::Debug for RenderQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RenderQueue")
            .field("entries", &state.entries)
            .field("pending", &state.pending.len())
            .field("draining", &state.draining)
            .field("closed", &state.closed)
            .finish()
    }
}

// =============================================================================
// Updater
// =============================================================================

/// Handle a component uses to schedule its own state changes.
///
/// `Send + Clone`: it can move to other threads (timers, I/O callbacks).
/// After the instance unmounts, updates are dropped by the drain.
#[derive(Clone)]
pub struct Updater {
    id: ComponentId,
    dirty: Arc<AtomicBool>,
    queue: Arc<RenderQueue>,
}

impl Updater {
    pub(crate) fn new(id: ComponentId, dirty: Arc<AtomicBool>, queue: Arc<RenderQueue>) -> Self {
        Self { id, dirty, queue }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Schedule a shallow merge of `partial` into state and a re-render.
    pub fn set_state(&self, partial: State) {
        self.queue.schedule(self.id, &self.dirty, &partial, None);
    }

    /// Like [`Updater::set_state`], running `callback` after that render.
    pub fn set_state_then(&self, partial: State, callback: impl FnOnce() + Send + 'static) {
        self.queue
            .schedule(self.id, &self.dirty, &partial, Some(Box::new(callback)));
    }

    /// Schedule a re-render without changing state.
    pub fn invalidate(&self) {
        self.queue.enqueue(self.id, &self.dirty);
    }
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater")
            .field("id", &self.id)
            .field("dirty", &self.dirty.load(Ordering::Relaxed))
            .finish()
    }
}
