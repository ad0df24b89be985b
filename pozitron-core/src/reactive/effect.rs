//! Effect Implementation
//!
//! An effect (subscription) runs a callback whenever its sources change.
//!
//! # How Effects Work
//!
//! 1. When created, the effect reads its sources once to establish its
//!    dependencies, and calls the callback unless it is deferred.
//!
//! 2. After that first run the dependency set is frozen. Later runs read
//!    the same sources again without re-tracking them.
//!
//! 3. When any dependency changes the effect is queued once, however many
//!    notifications arrive before the queue is flushed.
//!
//! 4. The callback always runs with tracking suspended, so reads inside it
//!    never become dependencies.
//!
//! # Differences from Memo
//!
//! - Memos return a value; effects do not.
//! - Memos are lazy (compute on access); effects are eager (run when deps change).

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::graph::{Computation, Node, NodeId};

use super::context::ReactiveContext;
use super::runtime::Runtime;
use super::source::Source;

/// Options for [`subscribe`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscribeOptions {
    /// Skip the callback on the initial run; wait for the first change.
    pub defer: bool,
    /// Together with `defer`: dispose after the first callback.
    pub once: bool,
    /// Diagnostic name.
    pub name: Option<Cow<'static, str>>,
}

impl SubscribeOptions {
    /// Options for a deferred subscription.
    pub fn deferred() -> Self {
        Self {
            defer: true,
            ..Self::default()
        }
    }

    pub fn defer(mut self, defer: bool) -> Self {
        self.defer = defer;
        self
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Subscribe `callback` to `source`.
///
/// `source` is a single getter or an ordered group of getters (see
/// [`Source`]). Returns a [`Disposer`] that tears the subscription down;
/// dropping it without calling it keeps the subscription alive.
///
/// # Example
///
/// ```rust
/// use pozitron_core::reactive::{signal, subscribe, SubscribeOptions};
///
/// let (count, set_count) = signal(0);
/// let dispose = subscribe(count, |value| println!("count = {value}"), SubscribeOptions::default());
/// set_count.set(1);
/// dispose.dispose();
/// ```
pub fn subscribe<S, F>(source: S, callback: F, options: SubscribeOptions) -> Disposer
where
    S: Source,
    F: FnMut(S::Value) + 'static,
{
    let subscription = Rc::new(Subscription {
        id: Cell::new(None),
        source,
        callback: RefCell::new(callback),
        defer: Cell::new(options.defer),
        once: options.once && options.defer,
    });

    Runtime::with(|rt| {
        let id = rt.create_node(Node::effect(options.name, subscription.clone()));
        subscription.id.set(Some(id));
        rt.set_freeze(id);
        rt.evaluate(id);
        Disposer { id }
    })
}

struct Subscription<S, F> {
    id: Cell<Option<NodeId>>,
    source: S,
    callback: RefCell<F>,
    defer: Cell<bool>,
    once: bool,
}

impl<S, F> Computation for Subscription<S, F>
where
    S: Source,
    F: FnMut(S::Value),
{
    fn run(&self) -> bool {
        let value = self.source.read();
        if self.defer.replace(false) {
            return false;
        }

        Runtime::with(|rt| {
            let _ctx = ReactiveContext::suspend(rt);
            (self.callback.borrow_mut())(value);
        });

        if self.once {
            if let Some(id) = self.id.get() {
                Runtime::with(|rt| rt.dispose(id));
            }
        }
        false
    }
}

/// Tears down a subscription. Calling it more than once is harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disposer {
    id: NodeId,
}

impl Disposer {
    /// Get the effect's node id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Remove the effect from all of its dependencies' observer lists.
    pub fn dispose(&self) {
        Runtime::with(|rt| rt.dispose(self.id));
    }

    /// Whether the subscription is still live.
    pub fn is_active(&self) -> bool {
        Runtime::with(|rt| rt.is_alive(self.id))
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
