//! A variant of `Rc` where equality and hashing are done by reference.

use std::{fmt, hash::Hash, ops::Deref, sync};

/// A wrapper for `std::sync::Arc` where equality and hashing are done by
/// reference, instead of by value.
///
/// Two `Rc`s compare equal and hash equal only if they point to the same
/// allocation, which makes both operations constant time even for deeply
/// recursive structures. The logging solver hash-conses every term it
/// creates, so equal terms always share an allocation and comparing them by
/// pointer is sound.
///
/// Because of that, terms must never be built with a bare `Rc::new_raw`
/// outside of the interning machinery: a second allocation of an existing
/// term would compare as different from the canonical one.
#[derive(Eq)]
pub struct Rc<T: ?Sized>(sync::Arc<T>);

// If we simply `#[derive(Clone)]`, it would require that the type parameter
// `T` also implements `Clone`, even though it is not needed. For more info:
// https://github.com/rust-lang/rust/issues/26925
impl<T: ?Sized> Clone for Rc<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: ?Sized> PartialEq for Rc<T> {
    fn eq(&self, other: &Self) -> bool {
        sync::Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized> Hash for Rc<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        sync::Arc::as_ptr(&self.0).hash(state);
    }
}

impl<T: ?Sized> Deref for Rc<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

// Note: Since `Eq` and `Hash` are implemented differently for `Rc<T>` than
// they are for `T`, we _cannot_ implement `Borrow<T>` for `Rc<T>`
impl<T: ?Sized> AsRef<T> for Rc<T> {
    fn as_ref(&self) -> &T {
        self.0.as_ref()
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Rc<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl<T: ?Sized + fmt::Display> fmt::Display for Rc<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl<T> Rc<T> {
    /// Constructs a new `Rc<T>`.
    ///
    /// # Safety
    /// This method creates a brand new allocation for `value`. The
    /// `PartialEq` and `Hash` implementations of `Rc` expect that identical
    /// objects share the same allocation, which is normally enforced by the
    /// term storage. Callers must guarantee that the value is either about
    /// to be interned, or can never be structurally equal to an interned
    /// value.
    pub(crate) unsafe fn new_raw(value: T) -> Self {
        Self(sync::Arc::new(value))
    }
}
