//! Memo Implementation
//!
//! A Memo is a cached derived value that re-evaluates only when its
//! dependencies change.
//!
//! # How Memos Work
//!
//! 1. A memo is lazy: nothing runs until the first read.
//!
//! 2. When a dependency changes, the memo is marked dirty and its own
//!    observers are marked "check" right away (push-invalidate). Nothing is
//!    recomputed yet.
//!
//! 3. On the next read the memo recomputes (pull-recompute), at most once
//!    per flush no matter how many dependencies changed. A "check" memo
//!    first refreshes its memo sources and skips the recomputation when
//!    none of them produced a new value.
//!
//! 4. A recomputation that yields a value equal to the cached one does not
//!    disturb anything further downstream.
//!
//! # Static Memos
//!
//! A static memo records its dependencies on the first evaluation only.
//! Later evaluations neither drop nor re-discover edges.

use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::{Computation, DirtyState, Node, NodeId};

use super::runtime::Runtime;

/// Options for [`memo_with`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoOptions {
    /// Diagnostic name.
    pub name: Option<Cow<'static, str>>,
    /// Freeze the dependency set after the first evaluation.
    pub is_static: bool,
    /// Reads through [`Memo::get`] do not create edges.
    pub untracked: bool,
}

impl MemoOptions {
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn untracked(mut self, untracked: bool) -> Self {
        self.untracked = untracked;
        self
    }
}

/// Create a memo from a computation.
///
/// The computation is not run immediately. It runs on first access.
pub fn memo<T, F>(compute: F) -> Memo<T>
where
    T: Clone + PartialEq + 'static,
    F: Fn() -> T + 'static,
{
    memo_with(compute, MemoOptions::default())
}

/// Create a static, untracked memo.
///
/// Suited for values derived once from sources that never need to be
/// re-discovered, such as a lookup table selected by a setting.
pub fn static_memo<T, F>(compute: F) -> Memo<T>
where
    T: Clone + PartialEq + 'static,
    F: Fn() -> T + 'static,
{
    memo_with(compute, MemoOptions::default().is_static(true).untracked(true))
}

/// Create a memo with options.
pub fn memo_with<T, F>(compute: F, options: MemoOptions) -> Memo<T>
where
    T: Clone + PartialEq + 'static,
    F: Fn() -> T + 'static,
{
    let cell = Rc::new(MemoCell {
        value: RefCell::new(None),
        compute: Box::new(compute),
    });

    let id = Runtime::with(|rt| {
        let id = rt.create_node(Node::memo(options.name, cell.clone()));
        if options.is_static {
            rt.set_freeze(id);
        }
        id
    });

    Memo {
        id,
        cell,
        untracked: options.untracked,
    }
}

struct MemoCell<T> {
    /// The cached value (None if never computed).
    value: RefCell<Option<T>>,
    compute: Box<dyn Fn() -> T>,
}

impl<T: PartialEq> Computation for MemoCell<T> {
    fn run(&self) -> bool {
        let next = (self.compute)();
        let mut value = self.value.borrow_mut();
        if value.as_ref() == Some(&next) {
            return false;
        }
        *value = Some(next);
        true
    }
}

/// A cached derived value that recomputes only when dependencies change.
///
/// # Type Parameters
///
/// - `T`: The type of the computed value. `PartialEq` is needed to detect
///   when a recomputation actually produced a new value.
pub struct Memo<T> {
    id: NodeId,
    cell: Rc<MemoCell<T>>,
    untracked: bool,
}

impl<T: Clone + PartialEq + 'static> Memo<T> {
    /// Get the memo's node id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the current value, recomputing if necessary.
    ///
    /// # Panics
    ///
    /// Panics if the memo has been disposed.
    pub fn get(&self) -> T {
        match self.try_get() {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Get the current value, or [`Error::Disposed`] for a disposed memo.
    pub fn try_get(&self) -> Result<T> {
        self.read(!self.untracked)
    }

    /// Get the current value without registering a dependency.
    pub fn get_untracked(&self) -> T {
        match self.read(false) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    fn read(&self, tracked: bool) -> Result<T> {
        Runtime::with(|rt| {
            if !rt.is_alive(self.id) {
                return Err(Error::Disposed(self.id));
            }
            rt.update_memo(self.id);
            if tracked {
                rt.track(self.id);
            }
            Ok(())
        })?;

        self.cell
            .value
            .borrow()
            .clone()
            .ok_or(Error::Disposed(self.id))
    }

    /// Sever the memo from the graph. Further reads fail.
    pub fn dispose(&self) {
        Runtime::with(|rt| rt.dispose(self.id));
    }

    /// Get the current dirty state, or `None` once disposed.
    pub fn state(&self) -> Option<DirtyState> {
        Runtime::with(|rt| rt.state_of(self.id))
    }

    /// Check if the memo has a cached value.
    pub fn has_value(&self) -> bool {
        self.cell.value.borrow().is_some()
    }

    /// Get the number of observers.
    pub fn observer_count(&self) -> usize {
        Runtime::with(|rt| rt.observer_count(self.id))
    }

    /// Get the number of dependency edges recorded by the last evaluation.
    pub fn source_count(&self) -> usize {
        Runtime::with(|rt| rt.source_count(self.id))
    }
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            cell: Rc::clone(&self.cell),
            untracked: self.untracked,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("id", &self.id)
            .field("value", &*self.cell.value.borrow())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
