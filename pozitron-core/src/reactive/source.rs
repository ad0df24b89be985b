//! Subscription Sources
//!
//! [`subscribe`](super::subscribe) accepts anything implementing [`Source`]:
//! a single getter, or an ordered group of getters (tuples, `Vec`s) whose
//! values are handed to the callback together.

use super::memo::Memo;
use super::signal::{ReadSignal, VoidReader};

/// A readable reactive value.
///
/// Reading inside a tracking context registers the dependency.
pub trait Source: 'static {
    type Value;

    fn read(&self) -> Self::Value;
}

impl<T: Clone + 'static> Source for ReadSignal<T> {
    type Value = T;

    fn read(&self) -> T {
        self.get()
    }
}

impl<T: Clone + PartialEq + 'static> Source for Memo<T> {
    type Value = T;

    fn read(&self) -> T {
        self.get()
    }
}

impl Source for VoidReader {
    type Value = ();

    fn read(&self) {
        self.track(())
    }
}

/// A getter closure used as a source.
///
/// ```rust
/// use pozitron_core::reactive::{signal, subscribe, Getter, SubscribeOptions};
///
/// let (width, set_width) = signal(2);
/// let (height, _) = signal(3);
/// let _dispose = subscribe(
///     Getter::new(move || width.get() * height.get()),
///     |area| println!("area = {area}"),
///     SubscribeOptions::default(),
/// );
/// set_width.set(4);
/// ```
#[derive(Clone)]
pub struct Getter<F>(F);

impl<F> Getter<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<T, F> Source for Getter<F>
where
    F: Fn() -> T + 'static,
{
    type Value = T;

    fn read(&self) -> T {
        (self.0)()
    }
}

/// A non-reactive value. Reading it never creates an edge.
#[derive(Debug, Clone)]
pub struct Constant<T>(pub T);

impl<T: Clone + 'static> Source for Constant<T> {
    type Value = T;

    fn read(&self) -> T {
        self.0.clone()
    }
}

impl<S: Source> Source for Vec<S> {
    type Value = Vec<S::Value>;

    fn read(&self) -> Self::Value {
        self.iter().map(Source::read).collect()
    }
}

macro_rules! impl_source_for_tuple {
    ($($name:ident),+) => {
        impl<$($name: Source),+> Source for ($($name,)+) {
            type Value = ($($name::Value,)+);

            #[allow(non_snake_case)]
            fn read(&self) -> Self::Value {
                let ($($name,)+) = self;
                ($($name.read(),)+)
            }
        }
    };
}

impl_source_for_tuple!(A);
impl_source_for_tuple!(A, B);
impl_source_for_tuple!(A, B, C);
impl_source_for_tuple!(A, B, C, D);
impl_source_for_tuple!(A, B, C, D, E);
impl_source_for_tuple!(A, B, C, D, E, F);
