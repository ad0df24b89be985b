//! Host Node Interface
//!
//! The reconcilers create, move and remove host nodes but never look inside
//! them. Everything they need from the host tree is described by
//! [`HostNode`]: a handle type whose equality is node identity.

/// A handle to a node of an externally managed tree.
///
/// `PartialEq` must compare identity: two handles are equal only when they
/// refer to the same node.
pub trait HostNode: Clone + PartialEq + 'static {
    /// Create a detached, empty node that stands in for an empty list.
    fn placeholder() -> Self;

    fn parent(&self) -> Option<Self>;

    fn first_child(&self) -> Option<Self>;

    fn last_child(&self) -> Option<Self>;

    fn next_sibling(&self) -> Option<Self>;

    /// Insert `nodes`, in order, as children of `self` before `anchor`, or
    /// at the end when `anchor` is `None`. Nodes attached elsewhere are
    /// moved.
    fn insert_before(&self, nodes: &[Self], anchor: Option<&Self>);

    fn append_child(&self, child: &Self) {
        self.insert_before(std::slice::from_ref(child), None);
    }

    /// Put `replacement` where `self` is, detaching `self`.
    fn replace_with(&self, replacement: &Self);

    /// Detach `self` from its parent.
    fn remove(&self);

    /// Detach every child of `self`.
    fn clear_children(&self);
}
