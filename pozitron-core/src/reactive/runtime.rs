//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals, memos, and
//! effects. It owns the dependency graph, the tracking context and the batch
//! scheduler of the current thread.
//!
//! # How It Works
//!
//! 1. When a memo or effect evaluates, it becomes the tracking context.
//!    Every signal or memo read during the evaluation records an edge.
//!
//! 2. When a signal's value changes, the runtime:
//!    a. Opens a batch
//!    b. Marks direct observers dirty and their downstream nodes "check"
//!    c. Queues every effect that left the clean state
//!    d. Closes the batch, which flushes the queue in notification order
//!
//! 3. Memos are lazy: they recompute on the next read, and only when a
//!    source actually produced a different value.
//!
//! # Threading
//!
//! The runtime is single-threaded. Each thread owns one instance, reached
//! through [`Runtime::with`]. Handles created on one thread must not be used
//! on another.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::graph::{BatchScheduler, DirtyState, Graph, Node, NodeId, NodeKind};

use super::context::ReactiveContext;

thread_local! {
    static RUNTIME: Runtime = Runtime::new();
}

/// The reactive runtime of the current thread.
pub struct Runtime {
    graph: RefCell<Graph>,
    /// The node whose reads are being tracked.
    pub(crate) observer: Cell<Option<NodeId>>,
    scheduler: RefCell<BatchScheduler>,
}

/// Snapshot of the runtime's graph, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub signals: usize,
    pub memos: usize,
    pub effects: usize,
    /// Number of observer edges across all nodes.
    pub edges: usize,
    /// Effects waiting in the batch queue.
    pub queued: usize,
    pub batch_depth: usize,
}

impl Runtime {
    fn new() -> Self {
        Self {
            graph: RefCell::new(Graph::new()),
            observer: Cell::new(None),
            scheduler: RefCell::new(BatchScheduler::new()),
        }
    }

    /// Run `f` with the runtime of the current thread.
    pub fn with<R>(f: impl FnOnce(&Runtime) -> R) -> R {
        RUNTIME.with(f)
    }

    /// Collect a [`GraphStats`] snapshot.
    pub fn stats(&self) -> GraphStats {
        let graph = self.graph.borrow();
        let scheduler = self.scheduler.borrow();
        let mut stats = GraphStats {
            queued: scheduler.len(),
            batch_depth: scheduler.depth(),
            ..GraphStats::default()
        };
        for node in graph.nodes() {
            match node.kind {
                NodeKind::Signal => stats.signals += 1,
                NodeKind::Memo => stats.memos += 1,
                NodeKind::Effect => stats.effects += 1,
            }
            stats.edges += node.observers.len();
        }
        stats
    }

    pub(crate) fn create_node(&self, node: Node) -> NodeId {
        let kind = node.kind;
        let id = self.graph.borrow_mut().insert(node);
        trace!(node = ?id, ?kind, "created node");
        id
    }

    pub(crate) fn is_alive(&self, id: NodeId) -> bool {
        self.graph.borrow().contains(id)
    }

    pub(crate) fn state_of(&self, id: NodeId) -> Option<DirtyState> {
        self.graph.borrow().get(id).map(|node| node.state)
    }

    pub(crate) fn observer_count(&self, id: NodeId) -> usize {
        self.graph
            .borrow()
            .get(id)
            .map_or(0, |node| node.observers.len())
    }

    pub(crate) fn source_count(&self, id: NodeId) -> usize {
        self.graph.borrow().sources_of(id).len()
    }

    /// Record that the active tracking context read `source`.
    pub(crate) fn track(&self, source: NodeId) {
        let Some(observer) = self.observer.get() else {
            return;
        };
        let mut graph = self.graph.borrow_mut();
        if graph.get(observer).map_or(true, |node| node.is_static) {
            return;
        }
        trace!(source = ?source, observer = ?observer, "tracked read");
        graph.link(source, observer);
    }

    /// Tell every observer of `id` that its value changed.
    pub(crate) fn notify(&self, id: NodeId) {
        let observers = self.graph.borrow().observers_of(id);
        if observers.is_empty() {
            return;
        }
        trace!(node = ?id, observers = observers.len(), "notify");

        self.start_batch();
        for observer in observers {
            self.mark(observer, DirtyState::Dirty);
        }
        self.finish_batch();
    }

    /// Raise the dirty state of `id` and propagate.
    ///
    /// A memo forwards `Check` to its own observers. An effect is scheduled
    /// when it leaves the clean state, and only then: notifications arriving
    /// before it runs collapse into that one run.
    fn mark(&self, id: NodeId, state: DirtyState) {
        let (kind, previous) = {
            let mut graph = self.graph.borrow_mut();
            let Some(node) = graph.get_mut(id) else {
                return;
            };
            (node.kind, node.raise(state))
        };

        match kind {
            NodeKind::Memo if previous.is_none() => self.reach_clean_observers(id),
            NodeKind::Memo => {
                let observers = self.graph.borrow().observers_of(id);
                for observer in observers {
                    self.mark(observer, DirtyState::Check);
                }
            }
            NodeKind::Effect => {
                if previous == Some(DirtyState::Clean) {
                    self.schedule(id);
                }
            }
            NodeKind::Signal => {}
        }
    }

    /// Notify the clean nodes downstream of an already stale memo.
    ///
    /// Stale memos in between are walked through, each once. Observers can
    /// be clean behind a stale memo after an aborted flush, or when a
    /// static memo skipped the read.
    fn reach_clean_observers(&self, id: NodeId) {
        let mut visited = HashSet::from([id]);
        let mut pending = vec![id];

        while let Some(memo) = pending.pop() {
            let mut clean = Vec::new();
            {
                let graph = self.graph.borrow();
                for observer in graph.observers_of(memo) {
                    let Some(node) = graph.get(observer) else {
                        continue;
                    };
                    if node.is_clean() {
                        clean.push(observer);
                    } else if node.kind == NodeKind::Memo && visited.insert(observer) {
                        pending.push(observer);
                    }
                }
            }
            for observer in clean {
                self.mark(observer, DirtyState::Check);
            }
        }
    }

    /// Queue an effect into the open batch, or run it right away.
    fn schedule(&self, id: NodeId) {
        let batching = self.scheduler.borrow().is_batching();
        if batching {
            trace!(node = ?id, "queued effect");
            self.scheduler.borrow_mut().enqueue(id);
        } else {
            self.run_effect(id);
        }
    }

    pub(crate) fn start_batch(&self) {
        self.scheduler.borrow_mut().start();
    }

    /// Close a batch scope, flushing when it was the outermost one.
    pub(crate) fn finish_batch(&self) {
        let flush = self.scheduler.borrow_mut().finish();
        if flush {
            self.flush();
        }
    }

    fn flush(&self) {
        let mut guard = FlushGuard {
            runtime: self,
            position: 0,
            previous: self.observer.get(),
            completed: false,
        };

        loop {
            let Some(id) = self.scheduler.borrow().get(guard.position) else {
                break;
            };
            self.run_effect(id);
            guard.position += 1;
        }

        trace!(effects = guard.position, "flushed batch");
        guard.completed = true;
    }

    /// Run a queued effect if it is still stale.
    fn run_effect(&self, id: NodeId) {
        match self.state_of(id) {
            None | Some(DirtyState::Clean) => return,
            Some(DirtyState::Check) => self.refresh_sources(id),
            Some(DirtyState::Dirty) => {}
        }

        if self.state_of(id) == Some(DirtyState::Dirty) {
            self.evaluate(id);
        } else {
            self.set_clean(id);
        }
    }

    /// Bring a memo up to date, recomputing it only if needed.
    pub(crate) fn update_memo(&self, id: NodeId) {
        match self.state_of(id) {
            None | Some(DirtyState::Clean) => return,
            Some(DirtyState::Check) => self.refresh_sources(id),
            Some(DirtyState::Dirty) => {}
        }

        if self.state_of(id) != Some(DirtyState::Dirty) {
            self.set_clean(id);
            return;
        }

        let is_static = self
            .graph
            .borrow()
            .get(id)
            .is_some_and(|node| node.is_static);
        if !is_static {
            self.graph.borrow_mut().unlink_sources(id, false);
        }

        if self.evaluate(id) == Some(true) {
            self.notify(id);
        }
    }

    /// Refresh the memo sources of a `Check` node, in order, stopping as
    /// soon as one of them turns the node `Dirty`.
    fn refresh_sources(&self, id: NodeId) {
        let sources = self.graph.borrow().memo_sources_of(id);
        for source in sources {
            self.update_memo(source);
            if self.state_of(id) != Some(DirtyState::Check) {
                break;
            }
        }
    }

    /// Run the computation of `id` with `id` as the tracking context (no
    /// context for static nodes), then mark it clean.
    ///
    /// Returns whether the computed value changed, or `None` when the node
    /// has no computation.
    pub(crate) fn evaluate(&self, id: NodeId) -> Option<bool> {
        let (computation, is_static) = {
            let graph = self.graph.borrow();
            let node = graph.get(id)?;
            trace!(node = ?id, name = node.label(), kind = ?node.kind, "evaluating");
            (node.computation.clone()?, node.is_static)
        };

        let changed = {
            let _ctx = ReactiveContext::enter(self, if is_static { None } else { Some(id) });
            computation.run()
        };

        if let Some(node) = self.graph.borrow_mut().get_mut(id) {
            node.state = DirtyState::Clean;
            if node.freeze {
                node.freeze = false;
                node.is_static = true;
            }
        }
        Some(changed)
    }

    fn set_clean(&self, id: NodeId) {
        if let Some(node) = self.graph.borrow_mut().get_mut(id) {
            node.state = DirtyState::Clean;
        }
    }

    pub(crate) fn set_freeze(&self, id: NodeId) {
        if let Some(node) = self.graph.borrow_mut().get_mut(id) {
            node.freeze = true;
        }
    }

    /// Sever every edge of `id` and free its slot. Idempotent.
    pub(crate) fn dispose(&self, id: NodeId) {
        let removed = self.graph.borrow_mut().remove(id);
        if let Some(node) = removed {
            debug!(node = ?id, name = node.label(), kind = ?node.kind, "disposed node");
            // Dropped here, after the graph borrow ended: the computation
            // may own handles whose values are being released.
            drop(node);
        }
    }

    /// Run `f` with tracking suspended.
    pub fn untrack<R>(&self, f: impl FnOnce() -> R) -> R {
        let _ctx = ReactiveContext::suspend(self);
        f()
    }

    /// Run `f` inside a batch scope.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        self.start_batch();
        let scope = BatchScope { runtime: self };
        let result = f();
        std::mem::forget(scope);
        self.finish_batch();
        result
    }

    /// Abandon the queue from `position` on. Leftover effects go back to
    /// clean so that later writes can schedule them again.
    fn abort_queue(&self, position: usize) {
        let pending = self.scheduler.borrow().pending_from(position).to_vec();
        warn!(skipped = pending.len(), "batch flush aborted");
        for id in pending {
            self.set_clean(id);
        }
        self.scheduler.borrow_mut().reset();
    }
}

/// Restores scheduler and tracking context when a flush ends.
struct FlushGuard<'rt> {
    runtime: &'rt Runtime,
    position: usize,
    previous: Option<NodeId>,
    completed: bool,
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.runtime.abort_queue(self.position);
        }
        self.runtime.observer.set(self.previous);
        self.runtime.scheduler.borrow_mut().reset();
    }
}

/// Unwinding out of [`Runtime::batch`] closes the scope without flushing.
/// Queued effects stay for an enclosing scope or a running flush, and are
/// dropped only when no scope is left.
struct BatchScope<'rt> {
    runtime: &'rt Runtime,
}

impl Drop for BatchScope<'_> {
    fn drop(&mut self) {
        let outermost = self.runtime.scheduler.borrow_mut().unwind();
        if outermost {
            self.runtime.abort_queue(0);
        }
    }
}

/// Run `f` with tracking suspended and return its result.
///
/// Reads inside `f` do not become dependencies of the surrounding memo or
/// effect.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    Runtime::with(|rt| rt.untrack(f))
}

/// Run `f` as one batch: effects notified by writes inside `f` run once,
/// after `f` returns.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    Runtime::with(|rt| rt.batch(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::graph::Computation;

    struct Counter(Rc<Cell<usize>>);

    impl Computation for Counter {
        fn run(&self) -> bool {
            self.0.set(self.0.get() + 1);
            false
        }
    }

    fn effect_node(rt: &Runtime, runs: &Rc<Cell<usize>>) -> NodeId {
        let id = rt.create_node(Node::effect(None, Rc::new(Counter(runs.clone()))));
        rt.evaluate(id);
        id
    }

    #[test]
    fn track_links_active_observer() {
        Runtime::with(|rt| {
            let runs = Rc::new(Cell::new(0));
            let signal = rt.create_node(Node::signal(None));
            let effect = effect_node(rt, &runs);

            {
                let _ctx = ReactiveContext::enter(rt, Some(effect));
                rt.track(signal);
            }
            // Outside any context nothing is recorded.
            rt.track(signal);

            assert_eq!(rt.observer_count(signal), 1);
            assert_eq!(rt.source_count(effect), 1);
        });
    }

    #[test]
    fn notify_runs_dirty_effects_once() {
        Runtime::with(|rt| {
            let runs = Rc::new(Cell::new(0));
            let signal = rt.create_node(Node::signal(None));
            let effect = effect_node(rt, &runs);
            assert_eq!(runs.get(), 1);

            {
                let _ctx = ReactiveContext::enter(rt, Some(effect));
                rt.track(signal);
                rt.track(signal);
            }

            rt.notify(signal);
            assert_eq!(runs.get(), 2);
            assert_eq!(rt.state_of(effect), Some(DirtyState::Clean));
            assert_eq!(rt.stats().queued, 0);
        });
    }

    #[test]
    fn disposed_nodes_are_skipped() {
        Runtime::with(|rt| {
            let runs = Rc::new(Cell::new(0));
            let signal = rt.create_node(Node::signal(None));
            let effect = effect_node(rt, &runs);
            {
                let _ctx = ReactiveContext::enter(rt, Some(effect));
                rt.track(signal);
            }

            rt.dispose(effect);
            rt.dispose(effect);
            rt.notify(signal);

            assert_eq!(runs.get(), 1);
            assert_eq!(rt.observer_count(signal), 0);
            assert!(!rt.is_alive(effect));
        });
    }

    #[test]
    fn stats_count_nodes_by_kind() {
        Runtime::with(|rt| {
            let runs = Rc::new(Cell::new(0));
            let signal = rt.create_node(Node::signal(Some("count".into())));
            let effect = effect_node(rt, &runs);
            {
                let _ctx = ReactiveContext::enter(rt, Some(effect));
                rt.track(signal);
            }

            let stats = rt.stats();
            assert_eq!(stats.signals, 1);
            assert_eq!(stats.effects, 1);
            assert_eq!(stats.edges, 1);
            assert_eq!(stats.batch_depth, 0);
        });
    }
}
