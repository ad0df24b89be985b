//! Keyed list reconciler.
//!
//! # Algorithm
//!
//! 1. A list that is the only content of its parent and shrinks to at most
//!    one item clears the parent and inserts the single node.
//!
//! 2. The common prefix and suffix of the old and new key sequences are
//!    left alone. A collection that only grew by nothing, or is unchanged,
//!    stops here.
//!
//! 3. The old middle region is detached. Each detached node is remembered
//!    by key so that a key that is still present in the new middle region
//!    gets its old node back instead of a freshly rendered one.
//!
//! 4. The new middle region is inserted in one operation, before the node
//!    that follows the untouched suffix.

use std::borrow::Cow;
use std::hash::Hash;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};

use crate::error::{Error, Result};
use crate::reactive::Source;

use super::host::HostNode;
use super::key::KeyFn;
use super::{mount, List, ListOptions, ListState, Patch, Reconcile};

/// Builder for a keyed list.
///
/// # Example
///
/// ```rust
/// use pozitron_core::list::{For, MemoryNode};
/// use pozitron_core::reactive::signal;
///
/// let root = MemoryNode::element("ul");
/// let (items, set_items) = signal(vec!['a', 'b', 'c']);
///
/// let list = For::new(items, |item: &char| MemoryNode::element(item.to_string()))
///     .mount(&root)
///     .unwrap();
/// let b = list.node_for(&'b').unwrap();
///
/// set_items.set(vec!['c', 'b', 'a']);
/// assert_eq!(root.child_labels(), ["c", "b", "a"]);
/// assert_eq!(list.node_for(&'b').unwrap(), b);
/// ```
pub struct For<S, T, K, N> {
    each: S,
    key: KeyFn<T, K>,
    render: Rc<dyn Fn(&T) -> N>,
    options: ListOptions<N>,
}

impl<S, T, N> For<S, T, T, N>
where
    S: Source<Value = Vec<T>>,
    T: Clone + Eq + Hash + 'static,
    N: HostNode,
{
    /// A list keyed by the items themselves.
    pub fn new(each: S, render: impl Fn(&T) -> N + 'static) -> Self {
        Self::keyed(each, KeyFn::identity(), render)
    }
}

impl<S, T, K, N> For<S, T, K, N>
where
    S: Source<Value = Vec<T>>,
    T: 'static,
    K: Clone + Eq + Hash + 'static,
    N: HostNode,
{
    pub fn keyed(each: S, key: KeyFn<T, K>, render: impl Fn(&T) -> N + 'static) -> Self {
        Self {
            each,
            key,
            render: Rc::new(render),
            options: ListOptions::default(),
        }
    }

    /// Use a different key.
    pub fn key<K2>(self, key: KeyFn<T, K2>) -> For<S, T, K2, N> {
        For {
            each: self.each,
            key,
            render: self.render,
            options: self.options,
        }
    }

    /// Receive the rendered nodes after mounting and after every change.
    pub fn on_ref(mut self, on_ref: impl Fn(&[N]) + 'static) -> Self {
        self.options.on_ref = Some(Rc::new(on_ref));
        self
    }

    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.options.name = Some(name.into());
        self
    }

    /// Render the collection into `parent` and start following it.
    ///
    /// Fails with [`Error::DuplicateKey`] when two items share a key.
    pub fn mount(self, parent: &N) -> Result<List<K, N>> {
        let reconciler = Keyed {
            render: self.render,
        };
        mount(parent, self.each, self.key, reconciler, self.options)
    }
}

struct Keyed<T, N> {
    render: Rc<dyn Fn(&T) -> N>,
}

fn ensure_unique<K: Eq + Hash>(keys: &[K]) -> Result<()> {
    let mut seen = IndexSet::with_capacity(keys.len());
    for (index, key) in keys.iter().enumerate() {
        if !seen.insert(key) {
            return Err(Error::DuplicateKey { index });
        }
    }
    Ok(())
}

impl<T, K, N> Reconcile<T, K, N> for Keyed<T, N>
where
    T: 'static,
    K: Clone + Eq + Hash + 'static,
    N: HostNode,
{
    fn build(&self, items: &[T], keys: Vec<K>) -> Result<ListState<K, N>> {
        ensure_unique(&keys)?;
        let nodes = items.iter().map(|item| (self.render)(item)).collect();
        Ok(ListState::new(keys, nodes))
    }

    fn update(
        &self,
        state: &mut ListState<K, N>,
        items: &[T],
        keys: Vec<K>,
    ) -> Result<Option<Patch>> {
        ensure_unique(&keys)?;
        if keys.is_empty() && state.is_empty() {
            return Ok(None);
        }

        let parent = state.parent()?;
        let length = keys.len();
        let prev_length = state.previous.len();

        if length <= 1 && state.is_sole_content(&parent) {
            let first = keys.into_iter().next();
            let patch = state.replace_sole(&parent, first, || (self.render)(&items[0]));
            return Ok(Some(patch).filter(|patch| *patch != Patch::default()));
        }

        if length == 0 {
            return Ok(Some(state.clear()));
        }

        let mut start = 0;
        let min_length = length.min(prev_length);
        while start < min_length && state.previous[start].as_ref() == Some(&keys[start]) {
            start += 1;
        }
        if start >= length && length >= prev_length {
            return Ok(None);
        }

        let mut end = length;
        let mut prev_end = prev_length;
        while end > start
            && prev_end > start
            && state.previous[prev_end - 1].as_ref() == Some(&keys[end - 1])
        {
            end -= 1;
            prev_end -= 1;
        }

        let need_insert = end > start;
        let anchor = match (need_insert, prev_end) {
            (false, _) => None,
            (true, 0) => Some(state.nodes[0].clone()),
            (true, _) => state.nodes[prev_end - 1].next_sibling(),
        };

        // Detach the old middle region, remembering each node by key.
        let mut recycle: IndexMap<K, usize> = IndexMap::new();
        let mut detached: Vec<Option<N>> = Vec::with_capacity(prev_end - start);
        for (offset, index) in (start..prev_end).enumerate() {
            let node = &state.nodes[index];
            node.remove();
            if let (true, Some(key)) = (need_insert, &state.previous[index]) {
                recycle.insert(key.clone(), offset);
            }
            detached.push(Some(node.clone()));
        }

        let mut patch = Patch::default();
        let mut middle = Vec::with_capacity(end - start);
        for (item, key) in items[start..end].iter().zip(&keys[start..end]) {
            let reused = recycle
                .get(key)
                .and_then(|&offset| detached[offset].take());
            let node = match reused {
                Some(node) => {
                    patch.recycled += 1;
                    node
                }
                None => {
                    patch.rendered += 1;
                    (self.render)(item)
                }
            };
            middle.push(node);
        }
        if need_insert {
            parent.insert_before(&middle, anchor.as_ref());
        }

        patch.removed = detached
            .iter()
            .zip(&state.previous[start..prev_end])
            .filter(|(node, key)| node.is_some() && key.is_some())
            .count();

        let suffix = state.nodes.split_off(prev_end);
        state.nodes.truncate(start);
        state.nodes.extend(middle);
        state.nodes.extend(suffix);
        state.previous = keys.into_iter().map(Some).collect();
        debug_assert_eq!(state.nodes.len(), state.previous.len());

        Ok(Some(patch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::MemoryNode;

    fn keyed() -> Keyed<&'static str, MemoryNode> {
        Keyed {
            render: Rc::new(|item: &&'static str| MemoryNode::element(*item)),
        }
    }

    fn mounted(items: &[&'static str]) -> (MemoryNode, ListState<&'static str, MemoryNode>) {
        let root = MemoryNode::element("root");
        // Siblings around the list keep the single-node shortcut out of the way.
        root.append_child(&MemoryNode::element("<"));
        let state = keyed().build(items, items.to_vec()).unwrap();
        root.insert_before(&state.nodes, None);
        root.append_child(&MemoryNode::element(">"));
        (root, state)
    }

    fn update(state: &mut ListState<&'static str, MemoryNode>, items: &[&'static str]) -> Option<Patch> {
        keyed().update(state, items, items.to_vec()).unwrap()
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        assert_eq!(
            keyed().build(&["a", "b", "a"], vec!["a", "b", "a"]).err(),
            Some(Error::DuplicateKey { index: 2 })
        );
    }

    #[test]
    fn unchanged_sequence_is_a_no_op() {
        let (root, mut state) = mounted(&["a", "b"]);
        let before = root.mutations();

        assert_eq!(update(&mut state, &["a", "b"]), None);
        assert_eq!(root.mutations(), before);
    }

    #[test]
    fn append_renders_only_the_tail() {
        let (root, mut state) = mounted(&["a", "b"]);

        let patch = update(&mut state, &["a", "b", "c"]).unwrap();

        assert_eq!(patch.rendered, 1);
        assert_eq!(patch.recycled, 0);
        assert_eq!(root.child_labels(), ["<", "a", "b", "c", ">"]);
    }

    #[test]
    fn middle_region_is_inserted_at_once() {
        let (root, mut state) = mounted(&["a", "b", "c", "d"]);
        let before = root.mutations();

        let patch = update(&mut state, &["a", "c", "b", "x", "d"]).unwrap();

        assert_eq!(patch, Patch { rendered: 1, recycled: 2, removed: 0 });
        assert_eq!(root.child_labels(), ["<", "a", "c", "b", "x", "d", ">"]);
        // Two removals plus a single insertion.
        assert_eq!(root.mutations(), before + 3);
    }

    #[test]
    fn shrinking_drops_missing_keys() {
        let (root, mut state) = mounted(&["a", "b", "c", "d"]);

        let patch = update(&mut state, &["a", "d"]).unwrap();

        assert_eq!(patch, Patch { rendered: 0, recycled: 0, removed: 2 });
        assert_eq!(root.child_labels(), ["<", "a", "d", ">"]);
        assert_eq!(state.nodes.len(), 2);
    }

    #[test]
    fn becoming_empty_leaves_placeholder_between_siblings() {
        let (root, mut state) = mounted(&["a", "b"]);

        update(&mut state, &[]).unwrap();

        assert_eq!(root.child_labels(), ["<", "#placeholder", ">"]);
        assert!(state.is_empty());

        update(&mut state, &["z"]).unwrap();
        assert_eq!(root.child_labels(), ["<", "z", ">"]);
    }
}
