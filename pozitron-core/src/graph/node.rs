//! Graph Nodes
//!
//! This module defines the node record that lives in the dependency graph.
//! Signals, memos and effects all share this one shape; the role-specific
//! behaviour hangs off the optional [`Computation`].

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Unique identifier for a node in the dependency graph.
///
/// The index addresses an arena slot; the generation distinguishes the
/// current occupant of that slot from earlier, disposed ones.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Get the arena slot index.
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Get the slot generation this id was issued for.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}v{})", self.index, self.generation)
    }
}

/// The role a node plays in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A source node (signal). Has observers, never sources.
    Signal,

    /// A derived node (memo). Has both sources and observers and caches
    /// its computed value.
    Memo,

    /// An effect node. A leaf: it has sources but nobody observes it.
    Effect,
}

/// Dirty state of a node.
///
/// Ordered so that a node can only be raised, never lowered, by a
/// notification: `Clean < Check < Dirty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DirtyState {
    /// The node's value is up-to-date.
    Clean,

    /// An upstream memo was invalidated. The node must refresh its memo
    /// sources before deciding whether it has to recompute.
    Check,

    /// A direct dependency changed. The node must recompute.
    Dirty,
}

/// Role-specific behaviour of a memo or effect node.
///
/// The runtime establishes the tracking context before calling
/// [`Computation::run`] and restores it afterwards.
pub(crate) trait Computation {
    /// Run the compute function. Returns `true` when the node's visible
    /// value changed; effects always report `false`.
    fn run(&self) -> bool;
}

/// Edge list entry: the peer node and the slot this edge occupies in the
/// peer's opposite list.
pub(crate) type Edge = (NodeId, usize);

pub(crate) type EdgeList = SmallVec<[Edge; 4]>;

/// A node in the dependency graph.
pub(crate) struct Node {
    pub(crate) kind: NodeKind,

    /// Diagnostic name, shown in tracing output.
    pub(crate) name: Option<Cow<'static, str>>,

    pub(crate) state: DirtyState,

    /// When set, evaluating this node does not record new sources.
    pub(crate) is_static: bool,

    /// Set `is_static` once the next evaluation completes.
    pub(crate) freeze: bool,

    /// Nodes that read this node, each with the index of the matching
    /// entry in that observer's `sources`.
    pub(crate) observers: EdgeList,

    /// Nodes read during the last evaluation, each with the index of the
    /// matching entry in that source's `observers`. `None` once the node
    /// has been destroyed.
    pub(crate) sources: Option<EdgeList>,

    pub(crate) computation: Option<Rc<dyn Computation>>,
}

impl Node {
    /// Create a new source (signal) node.
    pub(crate) fn signal(name: Option<Cow<'static, str>>) -> Self {
        Self {
            kind: NodeKind::Signal,
            name,
            state: DirtyState::Clean,
            is_static: false,
            freeze: false,
            observers: EdgeList::new(),
            sources: None,
            computation: None,
        }
    }

    /// Create a new derived (memo) node. Memos start dirty so that the
    /// first read computes them.
    pub(crate) fn memo(name: Option<Cow<'static, str>>, computation: Rc<dyn Computation>) -> Self {
        Self {
            kind: NodeKind::Memo,
            name,
            state: DirtyState::Dirty,
            is_static: false,
            freeze: false,
            observers: EdgeList::new(),
            sources: Some(EdgeList::new()),
            computation: Some(computation),
        }
    }

    /// Create a new effect node.
    pub(crate) fn effect(name: Option<Cow<'static, str>>, computation: Rc<dyn Computation>) -> Self {
        Self {
            kind: NodeKind::Effect,
            name,
            state: DirtyState::Dirty,
            is_static: false,
            freeze: false,
            observers: EdgeList::new(),
            sources: Some(EdgeList::new()),
            computation: Some(computation),
        }
    }

    /// Diagnostic name, or an empty string.
    pub(crate) fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub(crate) fn is_clean(&self) -> bool {
        self.state == DirtyState::Clean
    }

    /// Raise the dirty state. Returns the previous state, or `None` when
    /// the node was already at least as dirty as `state`.
    pub(crate) fn raise(&mut self, state: DirtyState) -> Option<DirtyState> {
        if self.state >= state {
            return None;
        }
        let previous = self.state;
        self.state = state;
        Some(previous)
    }
}
