//! Runtime - a framework instance plus its drain worker.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use super::RenderQueue;
use crate::document::Document;
use crate::error::Result;
use crate::reconciler::Vdom;

/// Shares a [`Vdom`] with a background thread that drains its render queue.
///
/// All access to the instance goes through [`Runtime::with`], which takes
/// the same lock the worker renders under.
pub struct Runtime<D: Document> {
    vdom: Arc<Mutex<Vdom<D>>>,
    queue: Arc<RenderQueue>,
    worker: Option<JoinHandle<()>>,
}

impl<D> Runtime<D>
where
    D: Document + Send + 'static,
    D::Node: Send,
{
    /// Move `vdom` behind a lock and spawn the drain worker.
    pub fn start(vdom: Vdom<D>) -> Result<Self> {
        let queue = vdom.queue();
        let name = vdom.config().worker_name.clone();
        let vdom = Arc::new(Mutex::new(vdom));

        let worker = {
            let vdom = vdom.clone();
            let queue = queue.clone();
            thread::Builder::new()
                .name(name.clone())
                .spawn(move || drain_loop(&vdom, &queue))?
        };
        tracing::debug!(worker = %name, "render worker started");

        Ok(Self {
            vdom,
            queue,
            worker: Some(worker),
        })
    }

    /// Run `f` with exclusive access to the instance.
    pub fn with<R>(&self, f: impl FnOnce(&mut Vdom<D>) -> R) -> R {
        f(&mut self.vdom.lock())
    }

    /// Shared handle to the render queue the worker drains.
    pub fn queue(&self) -> Arc<RenderQueue> {
        self.queue.clone()
    }

    /// Block until every queued render has completed.
    ///
    /// Returns false on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.queue.wait_idle(timeout)
    }

    /// Stop the worker and wait for it to exit. Queued work is abandoned.
    pub fn shutdown(&mut self) {
        self.queue.close();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("render worker panicked");
            }
        }
    }
}

impl<D: Document> Drop for Runtime<D> {
    fn drop(&mut self) {
        self.queue.close();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("render worker panicked");
            }
        }
    }
}

impl<D: Document> fmt::Debug for Runtime<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("queue", &self.queue)
            .field("running", &self.worker.is_some())
            .finish()
    }
}

fn drain_loop<D: Document>(vdom: &Mutex<Vdom<D>>, queue: &RenderQueue) {
    while queue.wait_for_work() {
        let report = vdom.lock().rerender();
        if !report.errors.is_empty() {
            tracing::warn!(failed = report.errors.len(), "drain finished with errors");
        }
        queue.end_drain();
    }
    tracing::debug!("render worker stopped");
}
