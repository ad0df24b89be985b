//! Notifiable Store
//!
//! A store holds a value that is mutated in place. It keeps no previous
//! copy to compare against, so every [`Store::update`] notifies, through a
//! void signal, whether or not the value really changed.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::signal::{void_signal_with, SignalOptions, VoidReader, VoidTrigger};
use super::source::Source;

/// A value mutated in place, with a notification channel attached.
pub struct Store<T> {
    value: Rc<RefCell<T>>,
    reader: VoidReader,
    trigger: VoidTrigger,
}

impl<T: 'static> Store<T> {
    pub fn new(value: T) -> Self {
        Self::with_options(value, SignalOptions::default())
    }

    pub fn with_options(value: T, options: SignalOptions) -> Self {
        let (reader, trigger) = void_signal_with(options);
        Self {
            value: Rc::new(RefCell::new(value)),
            reader,
            trigger,
        }
    }

    /// Borrow the value, tracking the read.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.reader.track(());
        f(&self.value.borrow())
    }

    /// Borrow the value without tracking.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Mutate the value, then notify every observer.
    ///
    /// The borrow is released before observers run, so they may read the
    /// store again.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut self.value.borrow_mut());
        self.trigger.notify();
        result
    }

    /// Notify observers without touching the value.
    pub fn touch(&self) {
        self.trigger.notify();
    }
}

impl<T: Clone + 'static> Store<T> {
    /// Get a copy of the value, tracking the read.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
            reader: self.reader,
            trigger: self.trigger,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.reader.id())
            .field("value", &*self.value.borrow())
            .finish()
    }
}

impl<T: Clone + 'static> Source for Store<T> {
    type Value = T;

    fn read(&self) -> T {
        self.get()
    }
}
