//! Interning for structural edge-tag labels.
//!
//! Interning lets [`crate::tag::EdgeTag`] carry an arbitrary caller-supplied relation label
//! while staying `Copy` and comparing/hashing as fast as an integer, instead of paying for a
//! fresh `String` allocation and comparison on every edge.

use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::{PoisonError, RwLock};

/// An interned value. Stays valid until the end of the program and is never dropped.
///
/// Interned values use reference equality: two interned values only compare equal if they were
/// interned using the same [`Interner`] instance.
pub struct Interned<T: ?Sized + 'static>(pub &'static T);

impl<T: ?Sized> Copy for Interned<T> {}

impl<T: ?Sized> Deref for Interned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl<T: ?Sized> Clone for Interned<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Internable + ?Sized> PartialEq for Interned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.ref_eq(other.0)
    }
}

impl<T: Internable + ?Sized> Eq for Interned<T> {}

impl<T: Internable + ?Sized> Hash for Interned<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.ref_hash(state);
    }
}

impl<T: Internable + ?Sized> PartialOrd for Interned<T>
where
    T: PartialOrd,
{
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(other.0)
    }
}

impl<T: Internable + ?Sized> Ord for Interned<T>
where
    T: Ord,
{
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(other.0)
    }
}

impl<T: ?Sized + Debug> Debug for Interned<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A trait for internable values, used by [`Interner<T>`] to create static references.
pub trait Internable: Hash + Eq {
    /// Creates a static reference to `self`, possibly leaking memory.
    fn leak(&self) -> &'static Self;

    /// Returns `true` if the two references point to the same value.
    fn ref_eq(&self, other: &Self) -> bool;

    /// Feeds the reference (not the value) to the hasher.
    fn ref_hash<H: Hasher>(&self, state: &mut H);
}

impl Internable for str {
    fn leak(&self) -> &'static Self {
        Box::leak(self.to_owned().into_boxed_str())
    }

    fn ref_eq(&self, other: &Self) -> bool {
        self.as_ptr() == other.as_ptr() && self.len() == other.len()
    }

    fn ref_hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        self.as_ptr().hash(state);
    }
}

type InternerHasher = std::hash::BuildHasherDefault<std::collections::hash_map::DefaultHasher>;

/// A thread-safe interner which produces [`Interned<T>`] values.
pub struct Interner<T: ?Sized + 'static>(
    RwLock<std::collections::HashSet<&'static T, InternerHasher>>,
);

impl<T: ?Sized> Interner<T> {
    /// Creates a new, empty interner.
    pub const fn new() -> Self {
        Self(RwLock::new(std::collections::HashSet::with_hasher(
            InternerHasher::new(),
        )))
    }
}

impl<T: Internable + ?Sized> Interner<T> {
    /// Returns the [`Interned<T>`] corresponding to `value`.
    ///
    /// The first call for a given `value` leaks it to obtain a `'static` reference; later calls
    /// with an equal value reuse that reference.
    pub fn intern(&self, value: &T) -> Interned<T> {
        {
            let set = self.0.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(existing) = set.get(value) {
                return Interned(*existing);
            }
        }
        let mut set = self.0.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = set.get(value) {
            Interned(*existing)
        } else {
            let leaked = value.leak();
            set.insert(leaked);
            Interned(leaked)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_strings_intern_to_the_same_reference() {
        let interner = Interner::<str>::new();
        let a = interner.intern("Participant");
        let b = interner.intern("Participant");
        assert!(a.0.ref_eq(b.0));
        assert_eq!(a, b);
    }

    #[test]
    fn different_strings_intern_differently() {
        let interner = Interner::<str>::new();
        let a = interner.intern("Participant");
        let b = interner.intern("Process");
        assert_ne!(a, b);
    }
}
