//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which computations depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read within a reactive context (memo/effect), the
//!    signal registers that context as an observer.
//!
//! 2. When a signal is written with a value different from the stored one,
//!    all observers are notified. Writing an equal value does nothing.
//!
//! 3. Notifications trigger re-execution of dependent computations.
//!
//! # Void Signals
//!
//! A void signal stores nothing. Reading it still creates an edge, so
//! downstream nodes can depend on "this event happened"; triggering it
//! notifies unconditionally.

use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::graph::{Node, NodeId};

use super::runtime::Runtime;

/// Options for [`signal_with`] and [`void_signal_with`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalOptions {
    /// Diagnostic name.
    pub name: Option<Cow<'static, str>>,
}

impl SignalOptions {
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// Create a signal, returning its getter and setter halves.
///
/// # Example
///
/// ```rust
/// use pozitron_core::reactive::signal;
///
/// let (count, set_count) = signal(0);
/// set_count.set(5);
/// assert_eq!(count.get(), 5);
/// ```
pub fn signal<T>(initial: T) -> (ReadSignal<T>, WriteSignal<T>)
where
    T: PartialEq + 'static,
{
    signal_with(initial, SignalOptions::default())
}

/// Create a signal with options.
pub fn signal_with<T>(initial: T, options: SignalOptions) -> (ReadSignal<T>, WriteSignal<T>)
where
    T: PartialEq + 'static,
{
    let id = Runtime::with(|rt| rt.create_node(Node::signal(options.name)));
    let value = Rc::new(RefCell::new(initial));
    (
        ReadSignal {
            id,
            value: Rc::clone(&value),
        },
        WriteSignal { id, value },
    )
}

/// The reading half of a signal.
pub struct ReadSignal<T> {
    id: NodeId,
    value: Rc<RefCell<T>>,
}

impl<T> ReadSignal<T> {
    /// Get the signal's node id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Borrow the current value.
    ///
    /// If called within a reactive context, this also registers the current
    /// computation as an observer.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        Runtime::with(|rt| rt.track(self.id));
        f(&self.value.borrow())
    }

    /// Borrow the current value without tracking.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Get the number of observers.
    pub fn observer_count(&self) -> usize {
        Runtime::with(|rt| rt.observer_count(self.id))
    }
}

impl<T: Clone> ReadSignal<T> {
    /// Get the current value, tracking the read.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> T {
        self.value.borrow().clone()
    }
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Rc::clone(&self.value),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadSignal")
            .field("id", &self.id)
            .field("value", &*self.value.borrow())
            .finish()
    }
}

/// The writing half of a signal.
pub struct WriteSignal<T> {
    id: NodeId,
    value: Rc<RefCell<T>>,
}

impl<T: PartialEq> WriteSignal<T> {
    /// Get the signal's node id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Store a new value and notify observers if it differs from the
    /// current one.
    pub fn set(&self, value: T) {
        {
            let mut current = self.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value;
        }
        Runtime::with(|rt| rt.notify(self.id));
    }

    /// Update the value using a function of the current value.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.value.borrow());
        self.set(next);
    }
}

impl<T> Clone for WriteSignal<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Rc::clone(&self.value),
        }
    }
}

impl<T> fmt::Debug for WriteSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteSignal").field("id", &self.id).finish()
    }
}

/// Create a void signal: a pure notification channel.
pub fn void_signal() -> (VoidReader, VoidTrigger) {
    void_signal_with(SignalOptions::default())
}

/// Create a void signal with options.
pub fn void_signal_with(options: SignalOptions) -> (VoidReader, VoidTrigger) {
    let id = Runtime::with(|rt| rt.create_node(Node::signal(options.name)));
    (VoidReader { id }, VoidTrigger { id })
}

/// Reading half of a void signal.
#[derive(Debug, Clone, Copy)]
pub struct VoidReader {
    id: NodeId,
}

impl VoidReader {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Register a dependency on this channel and hand back `value`.
    pub fn track<V>(&self, value: V) -> V {
        Runtime::with(|rt| rt.track(self.id));
        value
    }
}

/// Writing half of a void signal.
#[derive(Debug, Clone, Copy)]
pub struct VoidTrigger {
    id: NodeId,
}

impl VoidTrigger {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Notify every observer of the channel.
    pub fn notify(&self) {
        Runtime::with(|rt| rt.notify(self.id));
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
