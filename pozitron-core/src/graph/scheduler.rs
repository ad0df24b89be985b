//! Batch Scheduler
//!
//! The scheduler coalesces the effects notified by one or more writes into
//! a single ordered flush.
//!
//! # Algorithm
//!
//! 1. `start` increments the depth counter. Nested batches share the queue
//!    of the outermost one.
//! 2. Notified effects are appended to the queue in notification order.
//! 3. `finish` decrements the depth. Only the outermost `finish` flushes.
//! 4. During the flush the depth is pinned at 1, so notifications raised by
//!    running effects are queued behind the current position instead of
//!    starting a nested flush. The queue is walked by index and may grow
//!    while it is walked.
//! 5. When the flush ends, normally or by unwinding, the queue is cleared
//!    and the depth reset to 0.
//! 6. A scope left by unwinding only closes its own level. The queue is
//!    dropped when that was the outermost scope.
//!
//! The scheduler only does the bookkeeping; running the queued nodes is
//! the runtime's job.

use super::node::NodeId;

/// Queue and depth counter of the batch scope.
#[derive(Debug, Default)]
pub(crate) struct BatchScheduler {
    queue: Vec<NodeId>,
    depth: usize,
}

impl BatchScheduler {
    /// Create a new idle scheduler.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Open a batch scope.
    pub(crate) fn start(&mut self) {
        if self.depth == 0 {
            self.queue.clear();
        }
        self.depth += 1;
    }

    /// Close a batch scope. Returns `true` when this closed the outermost
    /// scope and the queue must now be flushed.
    ///
    /// The depth stays at 1 for the duration of that flush; call
    /// [`BatchScheduler::reset`] once it completes.
    pub(crate) fn finish(&mut self) -> bool {
        debug_assert!(self.depth > 0, "finish without matching start");
        self.depth = self.depth.saturating_sub(1);
        if self.depth > 0 {
            return false;
        }
        self.depth = 1;
        true
    }

    /// Close a scope that is being unwound, without flushing. Returns `true`
    /// when that left no scope open, and the queue must be dropped.
    pub(crate) fn unwind(&mut self) -> bool {
        self.depth = self.depth.saturating_sub(1);
        self.depth == 0
    }

    /// Whether a batch scope is open.
    pub(crate) fn is_batching(&self) -> bool {
        self.depth > 0
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    /// Append a node to the queue of the open batch.
    pub(crate) fn enqueue(&mut self, id: NodeId) {
        debug_assert!(self.is_batching(), "enqueue outside of a batch");
        self.queue.push(id);
    }

    /// The queued node at `position`, if the queue is that long.
    pub(crate) fn get(&self, position: usize) -> Option<NodeId> {
        self.queue.get(position).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    /// Queued nodes from `position` on.
    pub(crate) fn pending_from(&self, position: usize) -> &[NodeId] {
        self.queue.get(position..).unwrap_or(&[])
    }

    /// Drop the queue and close every scope.
    pub(crate) fn reset(&mut self) {
        self.queue.clear();
        self.depth = 0;
    }
}
