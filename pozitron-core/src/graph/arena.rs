//! Node Arena
//!
//! All nodes of one runtime live in a single generational arena. Edges are
//! stored on both endpoints together with the slot they occupy on the other
//! side, so removing an edge is a swap-remove plus one slot repair.

use super::node::{Edge, Node, NodeId, NodeKind};

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// The dependency graph: an arena of nodes plus the edges between them.
pub(crate) struct Graph {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Graph {
    /// Create a new empty graph.
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Add a node to the graph.
    pub(crate) fn insert(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId::new(index, slot.generation);
        }

        let index = u32::try_from(self.slots.len()).expect("node arena exhausted");
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId::new(index, 0)
    }

    /// Get a reference to a live node.
    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
    }

    /// Get a mutable reference to a live node.
    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Remove a node from the graph.
    ///
    /// Severs every edge touching the node and frees its slot. The node is
    /// returned so the caller can drop its computation outside any borrow
    /// of the graph.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<Node> {
        if !self.contains(id) {
            return None;
        }

        self.unlink_sources(id, true);

        // Drop this node from the source lists of everything observing it.
        loop {
            let Some((observer, slot)) = self.get_mut(id).and_then(|node| node.observers.pop())
            else {
                break;
            };
            self.detach_source(observer, slot);
        }

        let slot = &mut self.slots[id.index()];
        let node = slot.node.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index() as u32);
        node
    }

    /// Add a dependency edge: `observer` read `source`.
    pub(crate) fn link(&mut self, source: NodeId, observer: NodeId) {
        let Some(source_slot) = self.get(source).map(|node| node.observers.len()) else {
            return;
        };
        let Some(observer_slot) = self
            .get(observer)
            .and_then(|node| node.sources.as_ref())
            .map(|sources| sources.len())
        else {
            return;
        };

        if let Some(node) = self.get_mut(source) {
            node.observers.push((observer, observer_slot));
        }
        if let Some(sources) = self.get_mut(observer).and_then(|node| node.sources.as_mut()) {
            sources.push((source, source_slot));
        }
    }

    /// Remove every source edge of `id`.
    ///
    /// With `destroy` the source list is discarded for good and the node can
    /// no longer record dependencies; otherwise it is left empty for the next
    /// evaluation.
    pub(crate) fn unlink_sources(&mut self, id: NodeId, destroy: bool) {
        let count = match self.get(id).and_then(|node| node.sources.as_ref()) {
            Some(sources) => sources.len(),
            None => return,
        };

        // Entries are re-read on every step: detaching one edge may repair
        // the slot recorded by a later entry of this same list.
        for i in 0..count {
            let entry = self
                .get(id)
                .and_then(|node| node.sources.as_ref())
                .and_then(|sources| sources.get(i).copied());
            if let Some((source, slot)) = entry {
                self.detach_observer(source, slot);
            }
        }

        if let Some(node) = self.get_mut(id) {
            if destroy {
                node.sources = None;
            } else if let Some(sources) = node.sources.as_mut() {
                sources.clear();
            }
        }
    }

    /// Remove the entry at `slot` from `source.observers`.
    fn detach_observer(&mut self, source: NodeId, slot: usize) {
        let moved = {
            let Some(node) = self.get_mut(source) else {
                return;
            };
            if slot >= node.observers.len() {
                return;
            }
            node.observers.swap_remove(slot);
            node.observers.get(slot).copied()
        };

        // The former last observer now lives at `slot`; point its source
        // entry at the new position.
        if let Some((observer, source_index)) = moved {
            if let Some(entry) = self
                .get_mut(observer)
                .and_then(|node| node.sources.as_mut())
                .and_then(|sources| sources.get_mut(source_index))
            {
                entry.1 = slot;
            }
        }
    }

    /// Remove the entry at `slot` from `observer.sources`.
    fn detach_source(&mut self, observer: NodeId, slot: usize) {
        let moved = {
            let Some(sources) = self.get_mut(observer).and_then(|node| node.sources.as_mut())
            else {
                return;
            };
            if slot >= sources.len() {
                return;
            }
            sources.swap_remove(slot);
            sources.get(slot).copied()
        };

        if let Some((source, observer_index)) = moved {
            if let Some(entry) = self
                .get_mut(source)
                .and_then(|node| node.observers.get_mut(observer_index))
            {
                entry.1 = slot;
            }
        }
    }

    /// Snapshot of the observers of `id`, in notification order.
    pub(crate) fn observers_of(&self, id: NodeId) -> Vec<NodeId> {
        self.get(id)
            .map(|node| node.observers.iter().map(|(observer, _)| *observer).collect())
            .unwrap_or_default()
    }

    /// Snapshot of the sources of `id` that are memos.
    pub(crate) fn memo_sources_of(&self, id: NodeId) -> Vec<NodeId> {
        let Some(sources) = self.get(id).and_then(|node| node.sources.as_ref()) else {
            return Vec::new();
        };
        sources
            .iter()
            .map(|(source, _)| *source)
            .filter(|source| {
                self.get(*source)
                    .is_some_and(|node| node.kind == NodeKind::Memo)
            })
            .collect()
    }

    /// Raw edge list of `id`'s sources.
    pub(crate) fn sources_of(&self, id: NodeId) -> &[Edge] {
        self.get(id)
            .and_then(|node| node.sources.as_deref())
            .unwrap_or(&[])
    }

    /// Iterate over all live nodes.
    pub(crate) fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.slots.iter().filter_map(|slot| slot.node.as_ref())
    }
}
