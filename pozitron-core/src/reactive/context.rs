//! Reactive Context
//!
//! The reactive context records which computation is currently running.
//! This enables automatic dependency tracking: when a signal is read, the
//! current computation is registered as one of its observers.
//!
//! # Implementation
//!
//! The runtime keeps a single slot holding the active observer. Entering a
//! context swaps a new value into the slot and remembers the old one; the
//! returned guard puts the old value back when dropped. Nested evaluations
//! (a memo read from inside an effect) therefore restore the outer observer
//! on every exit path, including unwinding.

use crate::graph::NodeId;

use super::runtime::Runtime;

/// Guard that restores the previous tracking context when dropped.
pub struct ReactiveContext<'rt> {
    runtime: &'rt Runtime,
    previous: Option<NodeId>,
}

impl<'rt> ReactiveContext<'rt> {
    /// Make `observer` the active tracking context.
    ///
    /// Passing `None` suspends tracking: reads inside the scope create no
    /// edges.
    pub fn enter(runtime: &'rt Runtime, observer: Option<NodeId>) -> Self {
        let previous = runtime.observer.replace(observer);
        Self { runtime, previous }
    }

    /// Suspend tracking until the guard is dropped.
    pub fn suspend(runtime: &'rt Runtime) -> Self {
        Self::enter(runtime, None)
    }

    /// Get the node currently being tracked, if any.
    pub fn current_observer() -> Option<NodeId> {
        Runtime::with(|rt| rt.observer.get())
    }

    /// Check if there is an active tracking context.
    pub fn is_active() -> bool {
        Self::current_observer().is_some()
    }
}

impl Drop for ReactiveContext<'_> {
    fn drop(&mut self) {
        self.runtime.observer.set(self.previous);
    }
}
