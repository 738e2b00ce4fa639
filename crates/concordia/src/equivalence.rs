//! # Equality / Hash Strategies
//!
//! Uniqueness in [`UniqueSynchronizedSequence`](crate::UniqueSynchronizedSequence)
//! and membership in [`SynchronizedHashSet`](crate::SynchronizedHashSet) are
//! decided by an [`Equivalence`], fixed at construction and resolved at
//! compile time.
//!
//! ```rust,ignore
//! // Two records are "the same" when their ids match.
//! let by_id = KeyEquivalence::new(|user: &User| user.id);
//! let users = UniqueSynchronizedSequence::with_equivalence(by_id);
//! ```

use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::Arc;

/// Equality and hashing strategy for `T`.
///
/// Implementations must be consistent: `equivalent(a, b)` implies that `hash`
/// feeds identical data for `a` and `b`.
pub trait Equivalence<T: ?Sized>: Send + Sync {
    /// Returns whether `a` and `b` count as the same element.
    fn equivalent(&self, a: &T, b: &T) -> bool;

    /// Feeds the identity of `value` into `state`.
    fn hash<H: Hasher>(&self, value: &T, state: &mut H);
}

/// The element type's own `Eq` + `Hash`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NaturalEquality;

impl<T: Eq + Hash + ?Sized> Equivalence<T> for NaturalEquality {
    #[inline]
    fn equivalent(&self, a: &T, b: &T) -> bool {
        a == b
    }

    #[inline]
    fn hash<H: Hasher>(&self, value: &T, state: &mut H) {
        value.hash(state);
    }
}

impl<T: ?Sized, E: Equivalence<T> + ?Sized> Equivalence<T> for Arc<E> {
    #[inline]
    fn equivalent(&self, a: &T, b: &T) -> bool {
        E::equivalent(self, a, b)
    }

    #[inline]
    fn hash<H: Hasher>(&self, value: &T, state: &mut H) {
        E::hash(self, value, state);
    }
}

/// Equivalence by a derived key: two elements are the same when their keys are.
#[derive(Clone, Copy)]
pub struct KeyEquivalence<F> {
    selector: F,
}

impl<F> KeyEquivalence<F> {
    /// Creates a strategy comparing `selector(element)`.
    #[must_use]
    pub const fn new(selector: F) -> Self {
        Self { selector }
    }
}

impl<T, K, F> Equivalence<T> for KeyEquivalence<F>
where
    F: Fn(&T) -> K + Send + Sync,
    K: Eq + Hash,
{
    #[inline]
    fn equivalent(&self, a: &T, b: &T) -> bool {
        (self.selector)(a) == (self.selector)(b)
    }

    #[inline]
    fn hash<H: Hasher>(&self, value: &T, state: &mut H) {
        (self.selector)(value).hash(state);
    }
}

impl<F> std::fmt::Debug for KeyEquivalence<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyEquivalence").finish_non_exhaustive()
    }
}

/// Hash index of elements under an [`Equivalence`].
///
/// Holds at most one representative per equivalence class. Elements are
/// bucketed by the strategy's hash and compared with `equivalent` inside a
/// bucket, so any strategy works without wrapping `T`.
pub struct EquivalenceIndex<T, S> {
    strategy: S,
    hasher: RandomState,
    buckets: HashMap<u64, Vec<T>>,
    len: usize,
}

impl<T, S: Equivalence<T>> EquivalenceIndex<T, S> {
    /// Creates an empty index.
    #[must_use]
    pub fn new(strategy: S) -> Self {
        Self {
            strategy,
            hasher: RandomState::new(),
            buckets: HashMap::new(),
            len: 0,
        }
    }

    /// The strategy this index was built with.
    #[inline]
    #[must_use]
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Number of elements held.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the index is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn hash_of(&self, value: &T) -> u64 {
        let mut state = self.hasher.build_hasher();
        self.strategy.hash(value, &mut state);
        state.finish()
    }

    /// Returns the held element equivalent to `value`, if any.
    #[must_use]
    pub fn get(&self, value: &T) -> Option<&T> {
        self.buckets
            .get(&self.hash_of(value))?
            .iter()
            .find(|held| self.strategy.equivalent(held, value))
    }

    /// Returns whether an element equivalent to `value` is held.
    #[inline]
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.get(value).is_some()
    }

    /// Adds `value` unless an equivalent element is held. Returns whether it was added.
    pub fn insert(&mut self, value: T) -> bool {
        let hash = self.hash_of(&value);
        let strategy = &self.strategy;
        let bucket = self.buckets.entry(hash).or_default();
        if bucket.iter().any(|held| strategy.equivalent(held, &value)) {
            return false;
        }
        bucket.push(value);
        self.len += 1;
        true
    }

    /// Removes and returns the element equivalent to `value`.
    pub fn remove(&mut self, value: &T) -> Option<T> {
        let hash = self.hash_of(value);
        let bucket = self.buckets.get_mut(&hash)?;
        let pos = bucket
            .iter()
            .position(|held| self.strategy.equivalent(held, value))?;
        let removed = bucket.swap_remove(pos);
        if bucket.is_empty() {
            self.buckets.remove(&hash);
        }
        self.len -= 1;
        Some(removed)
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
    }

    /// Iterates over the held elements in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buckets.values().flatten()
    }
}

impl<T, S: Equivalence<T> + Default> Default for EquivalenceIndex<T, S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<T: std::fmt::Debug, S> std::fmt::Debug for EquivalenceIndex<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.buckets.values().flatten()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_equality() {
        let eq = NaturalEquality;
        assert!(Equivalence::<str>::equivalent(&eq, "a", "a"));
        assert!(!Equivalence::<i32>::equivalent(&eq, &1, &2));
    }

    #[test]
    fn test_key_equivalence() {
        let by_first = KeyEquivalence::new(|pair: &(u32, char)| pair.0);
        assert!(by_first.equivalent(&(1, 'a'), &(1, 'b')));
        assert!(!by_first.equivalent(&(1, 'a'), &(2, 'a')));
    }

    #[test]
    fn test_index_rejects_equivalent() {
        let mut index = EquivalenceIndex::new(KeyEquivalence::new(|s: &String| s.to_lowercase()));
        assert!(index.insert(String::from("Apple")));
        assert!(!index.insert(String::from("APPLE")));
        assert!(index.insert(String::from("pear")));
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(&String::from("apple")).map(String::as_str), Some("Apple"));
    }

    #[test]
    fn test_index_remove_and_clear() {
        let mut index: EquivalenceIndex<i32, NaturalEquality> = EquivalenceIndex::default();
        for v in 0..10 {
            assert!(index.insert(v));
        }
        assert_eq!(index.remove(&3), Some(3));
        assert_eq!(index.remove(&3), None);
        assert!(!index.contains(&3));
        assert_eq!(index.len(), 9);
        assert_eq!(index.iter().count(), 9);

        index.clear();
        assert!(index.is_empty());
        assert!(!index.contains(&0));
    }

    /// Every value hashes alike, forcing all elements into one bucket.
    struct Colliding;

    impl Equivalence<u8> for Colliding {
        fn equivalent(&self, a: &u8, b: &u8) -> bool {
            a == b
        }

        fn hash<H: Hasher>(&self, _value: &u8, state: &mut H) {
            state.write_u8(0);
        }
    }

    #[test]
    fn test_index_handles_collisions() {
        let mut index = EquivalenceIndex::new(Colliding);
        assert!(index.insert(1));
        assert!(index.insert(2));
        assert!(!index.insert(1));
        assert_eq!(index.remove(&1), Some(1));
        assert!(index.contains(&2));
        assert_eq!(index.len(), 1);
    }
}
