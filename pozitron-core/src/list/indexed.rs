//! Positional list reconciler.
//!
//! Each position is compared with what it held before. A position whose
//! key changed is rendered again and swapped in place; new trailing
//! positions are inserted after the last node, and surplus ones removed.

use std::borrow::Cow;
use std::rc::Rc;

use crate::error::Result;
use crate::reactive::Source;

use super::host::HostNode;
use super::key::KeyFn;
use super::{mount, List, ListOptions, ListState, Patch, Reconcile};

/// Builder for a list whose items are identified by position.
///
/// The render callback receives the item and its index.
pub struct Index<S, T, K, N> {
    each: S,
    key: KeyFn<T, K>,
    render: Rc<dyn Fn(&T, usize) -> N>,
    options: ListOptions<N>,
}

impl<S, T, N> Index<S, T, T, N>
where
    S: Source<Value = Vec<T>>,
    T: Clone + PartialEq + 'static,
    N: HostNode,
{
    /// A list comparing the items themselves.
    pub fn new(each: S, render: impl Fn(&T, usize) -> N + 'static) -> Self {
        Self::keyed(each, KeyFn::identity(), render)
    }
}

impl<S, T, K, N> Index<S, T, K, N>
where
    S: Source<Value = Vec<T>>,
    T: 'static,
    K: PartialEq + 'static,
    N: HostNode,
{
    pub fn keyed(each: S, key: KeyFn<T, K>, render: impl Fn(&T, usize) -> N + 'static) -> Self {
        Self {
            each,
            key,
            render: Rc::new(render),
            options: ListOptions::default(),
        }
    }

    /// Compare positions by a different key.
    pub fn key<K2>(self, key: KeyFn<T, K2>) -> Index<S, T, K2, N> {
        Index {
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
    pub fn mount(self, parent: &N) -> Result<List<K, N>> {
        let reconciler = Positional {
            render: self.render,
        };
        mount(parent, self.each, self.key, reconciler, self.options)
    }
}

struct Positional<T, N> {
    render: Rc<dyn Fn(&T, usize) -> N>,
}

impl<T, K, N> Reconcile<T, K, N> for Positional<T, N>
where
    T: 'static,
    K: PartialEq + 'static,
    N: HostNode,
{
    fn build(&self, items: &[T], keys: Vec<K>) -> Result<ListState<K, N>> {
        let nodes = items
            .iter()
            .enumerate()
            .map(|(index, item)| (self.render)(item, index))
            .collect();
        Ok(ListState::new(keys, nodes))
    }

    fn update(
        &self,
        state: &mut ListState<K, N>,
        items: &[T],
        keys: Vec<K>,
    ) -> Result<Option<Patch>> {
        if keys.is_empty() && state.is_empty() {
            return Ok(None);
        }

        let parent = state.parent()?;
        let length = keys.len();
        let prev_length = state.previous.len();

        if length <= 1 && state.is_sole_content(&parent) {
            let first = keys.into_iter().next();
            let patch = state.replace_sole(&parent, first, || (self.render)(&items[0], 0));
            return Ok(Some(patch).filter(|patch| *patch != Patch::default()));
        }

        if length == 0 {
            return Ok(Some(state.clear()));
        }

        let mut patch = Patch::default();
        for (index, (item, key)) in items.iter().zip(&keys).enumerate() {
            let unchanged = state
                .previous
                .get(index)
                .is_some_and(|previous| previous.as_ref() == Some(key));
            if unchanged {
                continue;
            }

            let node = (self.render)(item, index);
            patch.rendered += 1;
            if index < prev_length {
                state.nodes[index].replace_with(&node);
                state.nodes[index] = node;
            } else {
                let anchor = state.nodes[index - 1].next_sibling();
                parent.insert_before(std::slice::from_ref(&node), anchor.as_ref());
                state.nodes.push(node);
            }
        }

        if prev_length > length {
            for node in state.nodes.drain(length..).rev() {
                node.remove();
                patch.removed += 1;
            }
        }

        state.previous = keys.into_iter().map(Some).collect();
        Ok(Some(patch))
    }
}
