//! Dependency Graph
//!
//! This module implements the dependency graph that links reactive sources
//! to the computations reading them.
//!
//! # Overview
//!
//! - Nodes are signals, memos or effects ([`NodeKind`]).
//! - Edges are discovered automatically: when a node is read while another
//!   node is evaluating, an edge from the read node to the evaluating node
//!   is recorded.
//!
//! # Design Decisions
//!
//! 1. Nodes live in a generational arena and are addressed by [`NodeId`].
//!    Handles never hold references into the arena, so a disposed node is
//!    detected instead of dangling.
//!
//! 2. Both directions of every edge are stored, each entry carrying the slot
//!    of its counterpart. That makes removing an edge O(1).
//!
//! 3. The observer order is the notification order. Removing an edge may
//!    reorder the remaining observers of that source.

mod arena;
mod node;
mod scheduler;

pub(crate) use arena::Graph;
pub(crate) use node::{Computation, Node};
pub use node::{DirtyState, NodeId, NodeKind};
pub(crate) use scheduler::BatchScheduler;
