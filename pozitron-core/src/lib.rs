//! Pozitron Core
//!
//! This crate provides the core runtime for the Pozitron reactive UI library.
//! It implements:
//!
//! - Reactive primitives (signals, memos, effects)
//! - A glitch-free, batched propagation engine
//! - Keyed and positional list reconcilers over an abstract host tree
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: Dependency graph storage and the batch scheduler
//! - `reactive`: Reactive primitives and dependency tracking
//! - `list`: List rendering against a [`list::HostNode`] tree
//!
//! # Example
//!
//! ```rust
//! use pozitron_core::reactive::{memo, signal, subscribe, SubscribeOptions};
//!
//! // Create a signal
//! let (count, set_count) = signal(0);
//!
//! // Create a derived value
//! let doubled = memo({
//!     let count = count.clone();
//!     move || count.get() * 2
//! });
//!
//! // Subscribe to both
//! let _dispose = subscribe(
//!     (count, doubled),
//!     |(count, doubled)| println!("Count: {count}, Doubled: {doubled}"),
//!     SubscribeOptions::default(),
//! );
//!
//! // Update the signal
//! set_count.set(5);
//! // The subscription runs once, prints: "Count: 5, Doubled: 10"
//! ```

pub mod error;
pub mod graph;
pub mod list;
pub mod reactive;

pub use error::{Error, Result};
