//! List Rendering
//!
//! This module keeps a run of host nodes in sync with a reactive collection.
//!
//! # Reconcilers
//!
//! - [`For`] identifies items by key. When the collection changes it trims
//!   the common prefix and suffix, then rebuilds the middle region, moving
//!   the host node of every key that survived instead of rendering it again.
//!
//! - [`Index`] identifies items by position. A position whose key changed
//!   is rendered again in place; moving an item is seen as a content change
//!   at both positions.
//!
//! Both are effects over the collection source. The first build happens
//! when the list is mounted; later changes go through the diff path.
//!
//! # Empty Lists
//!
//! An empty list is represented by a single placeholder node, so the list
//! always owns at least one host node to anchor future insertions. The
//! `on_ref` callback receives an empty slice whenever the collection is
//! logically empty, placeholder or not.

mod host;
mod indexed;
mod key;
mod keyed;
mod memory;

use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::reactive::{subscribe, untrack, Disposer, Source, SubscribeOptions};

pub use host::HostNode;
pub use indexed::Index;
pub use key::{KeyField, KeyFn};
pub use keyed::For;
pub use memory::MemoryNode;

/// Callback receiving the rendered nodes after every change.
pub type RefCallback<N> = Rc<dyn Fn(&[N])>;

/// Render `items` once, appending the nodes to `parent`.
///
/// No subscription is made: later changes to whatever produced `items` are
/// not reflected.
pub fn static_list<T, N>(
    parent: &N,
    items: impl IntoIterator<Item = T>,
    render: impl Fn(T) -> N,
) -> Vec<N>
where
    N: HostNode,
{
    let nodes: Vec<N> = items.into_iter().map(render).collect();
    parent.insert_before(&nodes, None);
    nodes
}

/// Bookkeeping shared by both reconcilers.
///
/// `previous` and `nodes` always have the same, non-zero length. An empty
/// collection is remembered as a single `None` key next to a placeholder.
pub(crate) struct ListState<K, N> {
    pub(crate) previous: Vec<Option<K>>,
    pub(crate) nodes: Vec<N>,
}

impl<K: PartialEq, N: HostNode> ListState<K, N> {
    pub(crate) fn new(keys: Vec<K>, nodes: Vec<N>) -> Self {
        debug_assert_eq!(keys.len(), nodes.len());
        if keys.is_empty() {
            return Self::empty();
        }
        Self {
            previous: keys.into_iter().map(Some).collect(),
            nodes,
        }
    }

    pub(crate) fn empty() -> Self {
        Self {
            previous: vec![None],
            nodes: vec![N::placeholder()],
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.previous.first().map_or(true, Option::is_none)
    }

    /// The nodes standing for items, without the placeholder.
    pub(crate) fn rendered(&self) -> &[N] {
        if self.is_empty() {
            &[]
        } else {
            &self.nodes
        }
    }

    pub(crate) fn parent(&self) -> Result<N> {
        self.nodes
            .first()
            .and_then(HostNode::parent)
            .ok_or(Error::Detached)
    }

    /// Whether the list is the only content of `parent`.
    pub(crate) fn is_sole_content(&self, parent: &N) -> bool {
        parent.first_child().as_ref() == self.nodes.first()
            && parent.last_child().as_ref() == self.nodes.last()
    }

    /// Shortcut for a list that is the only content of its parent and
    /// shrinks to at most one item: the parent is cleared and given the
    /// single node directly. The first node is kept when its key did not
    /// change.
    ///
    /// Only the first node is ever reused: `[a, x]` to `[x]` renders `x`
    /// again.
    pub(crate) fn replace_sole(
        &mut self,
        parent: &N,
        first: Option<K>,
        render: impl FnOnce() -> N,
    ) -> Patch {
        let removed = self.rendered().len();
        let mut patch = Patch::default();
        let node = match &first {
            Some(key) if self.previous[0].as_ref() == Some(key) => {
                if self.nodes.len() == 1 {
                    return patch;
                }
                patch.recycled = 1;
                self.nodes[0].clone()
            }
            Some(_) => {
                patch.rendered = 1;
                render()
            }
            None => N::placeholder(),
        };
        patch.removed = removed - patch.recycled;

        parent.clear_children();
        parent.append_child(&node);
        self.nodes = vec![node];
        self.previous = vec![first];
        patch
    }

    /// Swap everything for a placeholder.
    pub(crate) fn clear(&mut self) -> Patch {
        let removed = self.rendered().len();
        let placeholder = N::placeholder();
        self.nodes[0].replace_with(&placeholder);
        for node in self.nodes[1..].iter().rev() {
            node.remove();
        }
        self.nodes = vec![placeholder];
        self.previous = vec![None];
        Patch {
            removed,
            ..Patch::default()
        }
    }

    fn node_for(&self, key: &K) -> Result<N> {
        self.previous
            .iter()
            .position(|candidate| candidate.as_ref() == Some(key))
            .map(|index| self.nodes[index].clone())
            .ok_or(Error::StaleKey)
    }
}

/// Host node work done by one update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Patch {
    pub(crate) rendered: usize,
    pub(crate) recycled: usize,
    pub(crate) removed: usize,
}

/// One diff strategy.
pub(crate) trait Reconcile<T, K, N>: 'static {
    /// Build the initial state for `items`.
    fn build(&self, items: &[T], keys: Vec<K>) -> Result<ListState<K, N>>;

    /// Bring `state` in line with `items`. `None` means nothing changed and
    /// `on_ref` is not called.
    fn update(&self, state: &mut ListState<K, N>, items: &[T], keys: Vec<K>)
        -> Result<Option<Patch>>;
}

/// Options shared by the list builders.
pub(crate) struct ListOptions<N> {
    pub(crate) on_ref: Option<RefCallback<N>>,
    pub(crate) name: Option<Cow<'static, str>>,
}

impl<N> Default for ListOptions<N> {
    fn default() -> Self {
        Self {
            on_ref: None,
            name: None,
        }
    }
}

/// Build the list under `parent` and subscribe to `each`.
pub(crate) fn mount<S, T, K, N, R>(
    parent: &N,
    each: S,
    key: KeyFn<T, K>,
    reconciler: R,
    options: ListOptions<N>,
) -> Result<List<K, N>>
where
    S: Source<Value = Vec<T>>,
    T: 'static,
    K: PartialEq + 'static,
    N: HostNode,
    R: Reconcile<T, K, N>,
{
    let items = untrack(|| each.read());
    let keys = key.keys(&items)?;
    let state = reconciler.build(&items, keys)?;
    parent.insert_before(&state.nodes, None);
    debug!(
        list = options.name.as_deref().unwrap_or("list"),
        items = items.len(),
        "mounted list"
    );

    let rendered = state.rendered().to_vec();
    let state = Rc::new(RefCell::new(state));
    if let Some(on_ref) = &options.on_ref {
        on_ref(&rendered);
    }

    let label = options.name.clone().unwrap_or(Cow::Borrowed("list"));
    let subscribe_options = SubscribeOptions::deferred().name(label.clone());
    let on_ref = options.on_ref;
    let list_state = Rc::clone(&state);

    let disposer = subscribe(
        each,
        move |items: Vec<T>| {
            let rendered = {
                let mut state = list_state.borrow_mut();
                let outcome = key
                    .keys(&items)
                    .and_then(|keys| reconciler.update(&mut state, &items, keys));
                match outcome {
                    Ok(None) => None,
                    Ok(Some(patch)) => {
                        debug!(
                            list = %label,
                            rendered = patch.rendered,
                            recycled = patch.recycled,
                            removed = patch.removed,
                            "reconciled list"
                        );
                        Some(state.rendered().to_vec())
                    }
                    Err(err) => {
                        error!(list = %label, %err, "list update failed");
                        panic!("{err}");
                    }
                }
            };

            if let (Some(nodes), Some(on_ref)) = (rendered, &on_ref) {
                on_ref(&nodes);
            }
        },
        subscribe_options,
    );

    Ok(List { state, disposer })
}

/// Handle to a mounted list.
pub struct List<K, N> {
    state: Rc<RefCell<ListState<K, N>>>,
    disposer: Disposer,
}

impl<K: PartialEq, N: HostNode> List<K, N> {
    /// The host nodes currently standing for items, in order. Empty when
    /// the collection is empty.
    pub fn nodes(&self) -> Vec<N> {
        self.state.borrow().rendered().to_vec()
    }

    /// Every host node the list owns, including the placeholder of an
    /// empty list.
    pub fn host_nodes(&self) -> Vec<N> {
        self.state.borrow().nodes.clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().rendered().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    /// The host node rendered for `key`.
    ///
    /// Fails with [`Error::StaleKey`] once `key` left the collection.
    pub fn node_for(&self, key: &K) -> Result<N> {
        self.state.borrow().node_for(key)
    }

    /// Stop following the collection. Host nodes stay where they are.
    pub fn dispose(&self) {
        self.disposer.dispose();
    }

    pub fn is_active(&self) -> bool {
        self.disposer.is_active()
    }
}

impl<K: Clone + PartialEq, N: HostNode> List<K, N> {
    /// Keys of the rendered items, in order.
    pub fn keys(&self) -> Vec<K> {
        self.state.borrow().previous.iter().flatten().cloned().collect()
    }
}
