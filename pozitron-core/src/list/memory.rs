//! In-memory host tree.
//!
//! [`MemoryNode`] implements [`HostNode`] over plain reference-counted
//! nodes. It is what the tests render into, and it is usable by hosts that
//! want to diff against a model before touching a real tree.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::host::HostNode;

const PLACEHOLDER_LABEL: &str = "#placeholder";

struct Inner {
    label: String,
    placeholder: bool,
    parent: Weak<NodeCell>,
    children: Vec<MemoryNode>,
}

struct NodeCell {
    inner: RefCell<Inner>,
    /// Structural operations applied to this node's children.
    mutations: Cell<usize>,
}

/// A node of an in-memory tree. Clones share the node.
#[derive(Clone)]
pub struct MemoryNode(Rc<NodeCell>);

impl MemoryNode {
    fn create(label: String, placeholder: bool) -> Self {
        Self(Rc::new(NodeCell {
            inner: RefCell::new(Inner {
                label,
                placeholder,
                parent: Weak::new(),
                children: Vec::new(),
            }),
            mutations: Cell::new(0),
        }))
    }

    /// Create a labelled element node.
    pub fn element(label: impl Into<String>) -> Self {
        Self::create(label.into(), false)
    }

    pub fn label(&self) -> String {
        self.0.inner.borrow().label.clone()
    }

    pub fn is_placeholder(&self) -> bool {
        self.0.inner.borrow().placeholder
    }

    pub fn children(&self) -> Vec<MemoryNode> {
        self.0.inner.borrow().children.clone()
    }

    /// Labels of the children, placeholders shown as `#placeholder`.
    pub fn child_labels(&self) -> Vec<String> {
        self.0
            .inner
            .borrow()
            .children
            .iter()
            .map(MemoryNode::label)
            .collect()
    }

    /// Number of insert, replace and remove operations applied to the
    /// children of this node so far.
    pub fn mutations(&self) -> usize {
        self.0.mutations.get()
    }

    fn bump(&self) {
        self.0.mutations.set(self.0.mutations.get() + 1);
    }

    fn set_parent(&self, parent: Option<&MemoryNode>) {
        self.0.inner.borrow_mut().parent = parent.map_or_else(Weak::new, |p| Rc::downgrade(&p.0));
    }

    fn index_of(&self, child: &MemoryNode) -> Option<usize> {
        self.0
            .inner
            .borrow()
            .children
            .iter()
            .position(|candidate| candidate == child)
    }

    /// Remove `self` from its parent's child list without counting it as a
    /// separate mutation.
    fn detach(&self) -> Option<MemoryNode> {
        let parent = self.parent()?;
        parent
            .0
            .inner
            .borrow_mut()
            .children
            .retain(|child| child != self);
        self.set_parent(None);
        Some(parent)
    }
}

impl HostNode for MemoryNode {
    fn placeholder() -> Self {
        Self::create(PLACEHOLDER_LABEL.to_owned(), true)
    }

    fn parent(&self) -> Option<Self> {
        self.0.inner.borrow().parent.upgrade().map(MemoryNode)
    }

    fn first_child(&self) -> Option<Self> {
        self.0.inner.borrow().children.first().cloned()
    }

    fn last_child(&self) -> Option<Self> {
        self.0.inner.borrow().children.last().cloned()
    }

    fn next_sibling(&self) -> Option<Self> {
        let parent = self.parent()?;
        let index = parent.index_of(self)?;
        let sibling = parent.0.inner.borrow().children.get(index + 1).cloned();
        sibling
    }

    fn insert_before(&self, nodes: &[Self], anchor: Option<&Self>) {
        if nodes.is_empty() {
            return;
        }
        for node in nodes {
            node.detach();
            node.set_parent(Some(self));
        }

        let position = anchor
            .and_then(|anchor| self.index_of(anchor))
            .unwrap_or_else(|| self.0.inner.borrow().children.len());
        {
            let mut inner = self.0.inner.borrow_mut();
            let tail = inner.children.split_off(position);
            inner.children.extend(nodes.iter().cloned());
            inner.children.extend(tail);
        }
        self.bump();
    }

    fn replace_with(&self, replacement: &Self) {
        let Some(parent) = self.parent() else {
            return;
        };
        replacement.detach();
        let Some(index) = parent.index_of(self) else {
            return;
        };
        parent.0.inner.borrow_mut().children[index] = replacement.clone();
        replacement.set_parent(Some(&parent));
        self.set_parent(None);
        parent.bump();
    }

    fn remove(&self) {
        if let Some(parent) = self.detach() {
            parent.bump();
        }
    }

    fn clear_children(&self) {
        let children = std::mem::take(&mut self.0.inner.borrow_mut().children);
        for child in &children {
            child.set_parent(None);
        }
        self.bump();
    }
}

impl PartialEq for MemoryNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for MemoryNode {}

impl fmt::Debug for MemoryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.inner.borrow();
        if inner.children.is_empty() {
            write!(f, "{}", inner.label)
        } else {
            f.debug_tuple(&inner.label).field(&inner.children).finish()
        }
    }
}
