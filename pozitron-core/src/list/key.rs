//! Item keys.
//!
//! A key is the stable identity of a collection item. It is derived by a
//! [`KeyFn`]: the item itself (identity), a named field, or any function.

use std::fmt;
use std::rc::Rc;

use tracing::error;

use crate::error::{Error, Result};

/// Items that expose named key fields, for [`KeyFn::field`].
///
/// ```rust
/// use pozitron_core::list::{KeyField, KeyFn};
///
/// struct Row {
///     id: u32,
/// }
///
/// impl KeyField<u32> for Row {
///     fn key_field(&self, name: &str) -> Option<u32> {
///         match name {
///             "id" => Some(self.id),
///             _ => None,
///         }
///     }
/// }
///
/// let key = KeyFn::<Row, u32>::field("id");
/// assert_eq!(key.key(&Row { id: 4 }), Ok(4));
/// ```
pub trait KeyField<K> {
    fn key_field(&self, name: &str) -> Option<K>;
}

/// Extracts the key of a collection item.
pub struct KeyFn<T, K> {
    extract: Rc<dyn Fn(&T) -> Result<K>>,
}

impl<T, K> KeyFn<T, K> {
    /// Key items with a function.
    pub fn new(f: impl Fn(&T) -> K + 'static) -> Self {
        Self {
            extract: Rc::new(move |item| Ok(f(item))),
        }
    }

    pub fn key(&self, item: &T) -> Result<K> {
        (self.extract)(item)
    }

    /// Key every item of `items`, in order.
    pub fn keys(&self, items: &[T]) -> Result<Vec<K>> {
        items.iter().map(|item| self.key(item)).collect()
    }
}

impl<T: Clone + 'static> KeyFn<T, T> {
    /// Items are their own keys.
    pub fn identity() -> Self {
        Self {
            extract: Rc::new(|item: &T| Ok(item.clone())),
        }
    }
}

impl<T: KeyField<K> + 'static, K> KeyFn<T, K> {
    /// Key items by the field called `name`.
    ///
    /// An item without such a field yields [`Error::UnknownKeyField`].
    pub fn field(name: &'static str) -> Self {
        Self {
            extract: Rc::new(move |item: &T| {
                item.key_field(name).ok_or_else(|| {
                    let err = Error::UnknownKeyField(name);
                    error!(field = name, "item has no such key field");
                    err
                })
            }),
        }
    }
}

impl<T, K> Clone for KeyFn<T, K> {
    fn clone(&self) -> Self {
        Self {
            extract: Rc::clone(&self.extract),
        }
    }
}

impl<T, K> fmt::Debug for KeyFn<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyFn").finish_non_exhaustive()
    }
}
