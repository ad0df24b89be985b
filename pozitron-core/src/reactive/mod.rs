//! Reactive Primitives
//!
//! This module implements the core reactive system: signals, memos, and effects.
//! These primitives form the foundation of Pozitron's fine-grained reactivity.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! within a tracking context (such as a memo or effect), the signal automatically
//! registers that context as a dependent. When the signal's value changes, all
//! dependents are notified.
//!
//! ## Memos
//!
//! A Memo is a derived value that caches its result. It re-evaluates only when
//! one of its dependencies changes, and only when it is read again.
//!
//! ## Effects
//!
//! An Effect (created with [`subscribe`]) runs a callback whenever its sources
//! change. Effects are used to synchronize reactive state with external
//! systems, such as a host node tree.
//!
//! ## Batches
//!
//! Every write opens a batch. Effects notified inside it are queued and run
//! once, in notification order, when the outermost batch closes. [`batch`]
//! widens that scope to several writes.
//!
//! # Implementation Notes
//!
//! The reactive system uses a thread-local runtime to detect dependencies.
//! When a signal is read, we check if there is an active tracking context
//! and, if so, register the dependency.

mod context;
mod effect;
mod memo;
mod runtime;
mod signal;
mod source;
mod store;

pub use context::ReactiveContext;
pub use effect::{subscribe, Disposer, SubscribeOptions};
pub use memo::{memo, memo_with, static_memo, Memo, MemoOptions};
pub use runtime::{batch, untrack, GraphStats, Runtime};
pub use signal::{
    signal, signal_with, void_signal, void_signal_with, ReadSignal, SignalOptions, VoidReader,
    VoidTrigger, WriteSignal,
};
pub use source::{Constant, Getter, Source};
pub use store::Store;
