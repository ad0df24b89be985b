//! Error types.
//!
//! Everything reported here is a programming error on the caller's side:
//! a stale handle, a malformed collection, or a list that was never
//! mounted. None of these are retried by the runtime.

use crate::graph::NodeId;

/// Errors surfaced by the reactive runtime and the list reconcilers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The node behind a handle was disposed.
    #[error("reactive node {0:?} has been disposed")]
    Disposed(NodeId),

    /// Two items of a keyed collection produced the same key.
    #[error("duplicate key at index {index} of a keyed list")]
    DuplicateKey { index: usize },

    /// A key was looked up that is not part of the rendered collection.
    #[error("key is not present in the rendered list")]
    StaleKey,

    /// The list's anchor node is not attached to a parent host node.
    #[error("list is not mounted under a parent host node")]
    Detached,

    /// An item does not expose the field used as its key.
    #[error("item has no key field named `{0}`")]
    UnknownKeyField(&'static str),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
