//! Ordered synchronized sequence holding no two equivalent elements.
//!
//! ```text
//!   items:  [ a, b, c ]          position, order
//!   index:  { a, b, c }          membership under S
//! ```
//!
//! Both are changed inside the same exclusive section. Validation happens
//! before either is touched, so a rejected or failing call leaves both as
//! they were.

use std::hash::Hash;
use std::sync::Arc;

use crossbeam_channel::Receiver;

use crate::config::SequenceConfig;
use crate::equivalence::{Equivalence, EquivalenceIndex, NaturalEquality};
use crate::error::SequenceResult;
use crate::notify::{CollectionChange, PropertyName, SequenceEvent, Subscription};

use super::list::{MembershipIndex, ObservableList};
use super::snapshot::Snapshot;

impl<T, S> MembershipIndex<T> for EquivalenceIndex<T, S>
where
    T: Clone,
    S: Equivalence<T>,
{
    #[inline]
    fn admits(&self, value: &T) -> bool {
        !self.contains(value)
    }

    fn admits_replacement(&self, current: &T, value: &T) -> bool {
        self.strategy().equivalent(current, value) || !self.contains(value)
    }

    #[inline]
    fn record_insert(&mut self, value: &T) {
        self.insert(value.clone());
    }

    #[inline]
    fn record_remove(&mut self, value: &T) {
        self.remove(value);
    }

    #[inline]
    fn record_clear(&mut self) {
        self.clear();
    }
}

/// Thread-safe, observable, ordered list with set semantics.
///
/// Equivalence is decided by `S` (natural `Eq` + `Hash` by default). Adding
/// or inserting an element equivalent to one already present is a silent
/// no-op reported as `Ok(false)`. Everything else behaves like
/// [`SynchronizedSequence`](crate::SynchronizedSequence).
///
/// # Example
///
/// ```rust,ignore
/// let seq = UniqueSynchronizedSequence::from_source([1, 2, 3]);
/// assert!(!seq.add(3)?);
/// assert!(seq.add(4)?);
/// seq.move_item(3, 0)?;
/// assert_eq!(seq.get(0)?, 4);
/// ```
pub struct UniqueSynchronizedSequence<T, S = NaturalEquality> {
    list: ObservableList<T, EquivalenceIndex<T, Arc<S>>>,
    strategy: Arc<S>,
}

impl<T> UniqueSynchronizedSequence<T, NaturalEquality>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    /// Creates an empty sequence using natural equality.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SequenceConfig::default())
    }

    /// Creates an empty configured sequence using natural equality.
    #[must_use]
    pub fn with_config(config: SequenceConfig) -> Self {
        Self::from_source_with_config(std::iter::empty(), config)
    }

    /// Creates a sequence from `source`, keeping the first of any equal elements.
    #[must_use]
    pub fn from_source(source: impl IntoIterator<Item = T>) -> Self {
        Self::from_source_with_config(source, SequenceConfig::default())
    }

    /// Configured variant of [`from_source`](Self::from_source).
    #[must_use]
    pub fn from_source_with_config(source: impl IntoIterator<Item = T>, config: SequenceConfig) -> Self {
        Self::build(source, NaturalEquality, config)
    }
}

impl<T, S> UniqueSynchronizedSequence<T, S>
where
    T: Clone + Send + Sync + 'static,
    S: Equivalence<T>,
{
    /// Creates an empty sequence using `strategy`.
    #[must_use]
    pub fn with_equivalence(strategy: S) -> Self {
        Self::build(std::iter::empty(), strategy, SequenceConfig::default())
    }

    /// Creates a sequence from `source` using `strategy`, keeping the first of
    /// any equivalent elements.
    #[must_use]
    pub fn from_source_with_equivalence(source: impl IntoIterator<Item = T>, strategy: S) -> Self {
        Self::build(source, strategy, SequenceConfig::default())
    }

    /// Fully specified constructor.
    #[must_use]
    pub fn build(source: impl IntoIterator<Item = T>, strategy: S, config: SequenceConfig) -> Self {
        let strategy = Arc::new(strategy);
        let mut index = EquivalenceIndex::new(Arc::clone(&strategy));
        let items: Vec<T> = source
            .into_iter()
            .filter(|item| index.insert(item.clone()))
            .collect();
        Self {
            list: ObservableList::from_parts(items, index, config),
            strategy,
        }
    }

    /// The equivalence strategy, fixed at construction.
    #[inline]
    #[must_use]
    pub fn equivalence(&self) -> &S {
        &self.strategy
    }

    /// The configuration this sequence was built with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SequenceConfig {
        self.list.config()
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Returns a copy of the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::IndexOutOfRange` if `index >= len`,
    /// `SequenceError::Disposed` after disposal.
    pub fn get(&self, index: usize) -> SequenceResult<T> {
        self.list.get(index)
    }

    /// Number of elements (`Count`).
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` if the sequence has been disposed.
    pub fn len(&self) -> SequenceResult<usize> {
        self.list.len()
    }

    /// Returns whether the sequence is empty.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` if the sequence has been disposed.
    pub fn is_empty(&self) -> SequenceResult<bool> {
        Ok(self.list.len()? == 0)
    }

    /// Copy of the first element.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` if the sequence has been disposed.
    pub fn first(&self) -> SequenceResult<Option<T>> {
        self.list.first()
    }

    /// Copy of the last element.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` if the sequence has been disposed.
    pub fn last(&self) -> SequenceResult<Option<T>> {
        self.list.last()
    }

    /// Returns whether an element equivalent to `value` is present. Constant time.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` after disposal.
    pub fn contains(&self, value: &T) -> SequenceResult<bool> {
        self.list.read(|s| s.index.contains(value))
    }

    /// Position of the element equivalent to `value`.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` if the sequence has been disposed.
    pub fn index_of(&self, value: &T) -> SequenceResult<Option<usize>> {
        self.list
            .position(|index, item| index.strategy().equivalent(item, value))
    }

    /// Copies every element into `destination` starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::InsufficientCapacity` if the elements do not fit in
    /// `destination` from `offset`, `SequenceError::Disposed` after disposal.
    pub fn copy_to(&self, destination: &mut [T], offset: usize) -> SequenceResult<()> {
        self.list.copy_to(destination, offset)
    }

    /// Copies the elements into a new `Vec`.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` if the sequence has been disposed.
    pub fn to_vec(&self) -> SequenceResult<Vec<T>> {
        self.list.to_vec()
    }

    /// Iterator over a copy taken now. Later mutations are not reflected.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` if the sequence has been disposed.
    pub fn snapshot(&self) -> SequenceResult<Snapshot<T>> {
        self.list.snapshot()
    }

    /// Allocated storage, in elements.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` after disposal.
    pub fn capacity(&self) -> SequenceResult<usize> {
        self.list.capacity()
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Appends `value` unless an equivalent element is present.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::ReentrantMutation` if called from one of its own
    /// handlers, `SequenceError::Disposed` after disposal.
    pub fn add(&self, value: T) -> SequenceResult<bool> {
        self.list.insert(None, value)
    }

    /// Inserts `value` at `index` unless an equivalent element is present.
    ///
    /// The range is checked first: an invalid index is an error even for a
    /// duplicate.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::IndexOutOfRange` if `index > len`,
    /// `SequenceError::ReentrantMutation` if called from one of its own handlers,
    /// or `SequenceError::Disposed` after disposal.
    pub fn insert(&self, index: usize, value: T) -> SequenceResult<bool> {
        self.list.insert(Some(index), value)
    }

    /// Overwrites the element at `index`.
    ///
    /// `Ok(false)` when `value` is equivalent to an element at another
    /// position; replacing an element with an equivalent one is allowed.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::IndexOutOfRange` if `index >= len`,
    /// `SequenceError::ReentrantMutation` if called from one of its own handlers,
    /// or `SequenceError::Disposed` after disposal.
    pub fn set(&self, index: usize, value: T) -> SequenceResult<bool> {
        self.list.set(index, value)
    }

    /// Appends the elements of `values` not already present, as one change.
    ///
    /// Later duplicates within `values` are skipped too. Returns how many were added.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::ReentrantMutation` if called from one of its own
    /// handlers, `SequenceError::Disposed` after disposal.
    pub fn add_range(&self, values: impl IntoIterator<Item = T>) -> SequenceResult<usize> {
        self.list.insert_many(None, values.into_iter().collect())
    }

    /// Inserts the elements of `values` not already present, contiguously at `index`.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::IndexOutOfRange` if `index > len`. Re-entrant and
    /// disposed calls fail as for [`insert`](Self::insert).
    pub fn insert_range(&self, index: usize, values: impl IntoIterator<Item = T>) -> SequenceResult<usize> {
        self.list.insert_many(Some(index), values.into_iter().collect())
    }

    /// Removes the element equivalent to `value`. `Ok(false)` if none is present.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::ReentrantMutation` if called from one of its own
    /// handlers, `SequenceError::Disposed` after disposal.
    pub fn remove(&self, value: &T) -> SequenceResult<bool> {
        self.list
            .remove_first(|index, item| index.strategy().equivalent(item, value))
    }

    /// Removes and returns the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::IndexOutOfRange` if `index >= len`,
    /// `SequenceError::ReentrantMutation` if called from one of its own handlers,
    /// or `SequenceError::Disposed` after disposal.
    pub fn remove_at(&self, index: usize) -> SequenceResult<T> {
        self.list.remove_at(index)
    }

    /// Removes every element. Fires nothing when already empty.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::ReentrantMutation` if called from one of its own
    /// handlers, `SequenceError::Disposed` after disposal.
    pub fn clear(&self) -> SequenceResult<()> {
        self.list.clear()
    }

    /// Moves the element at `old_index` so it ends up at `new_index`.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::IndexOutOfRange` if either index is `>= len`.
    /// Re-entrant and disposed calls fail as for [`remove_at`](Self::remove_at).
    pub fn move_item(&self, old_index: usize, new_index: usize) -> SequenceResult<()> {
        self.list.move_item(old_index, new_index)
    }

    /// Reserves room for `additional` more elements. Not notified.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::ReentrantMutation` if called from one of its own
    /// handlers, `SequenceError::Disposed` after disposal.
    pub fn reserve(&self, additional: usize) -> SequenceResult<()> {
        self.list.reserve(additional)
    }

    /// Releases unused storage. Not notified.
    ///
    /// # Errors
    ///
    /// Same as [`reserve`](Self::reserve).
    pub fn shrink_to_fit(&self) -> SequenceResult<()> {
        self.list.shrink_to_fit()
    }

    // =========================================================================
    // SUBSCRIPTIONS & LIFECYCLE
    // =========================================================================

    /// Subscribes to structural changes.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` if the sequence has been disposed.
    pub fn subscribe<F>(&self, handler: F) -> SequenceResult<Subscription>
    where
        F: Fn(&CollectionChange<T>) + Send + Sync + 'static,
    {
        self.list.subscribe_changes(handler)
    }

    /// Subscribes to `Count` / `Item[]` notices.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` if the sequence has been disposed.
    pub fn subscribe_properties<F>(&self, handler: F) -> SequenceResult<Subscription>
    where
        F: Fn(PropertyName) + Send + Sync + 'static,
    {
        self.list.subscribe_properties(handler)
    }

    /// Subscribes to both feeds, in emission order.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` if the sequence has been disposed.
    pub fn subscribe_events<F>(&self, handler: F) -> SequenceResult<Subscription>
    where
        F: Fn(&SequenceEvent<T>) + Send + Sync + 'static,
    {
        self.list.subscribe_events(handler)
    }

    /// Subscribes a channel bounded by the configured `feed_capacity`.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::ZeroCapacity` if the configured `feed_capacity` is 0,
    /// `SequenceError::Disposed` after disposal.
    pub fn subscribe_channel(&self) -> SequenceResult<(Subscription, Receiver<SequenceEvent<T>>)> {
        self.list.subscribe_channel(self.config().feed_capacity)
    }

    /// Subscribes a channel holding at most `capacity` pending events.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::ZeroCapacity` if `capacity` is 0, `SequenceError::Disposed`
    /// after disposal.
    pub fn subscribe_channel_bounded(
        &self,
        capacity: usize,
    ) -> SequenceResult<(Subscription, Receiver<SequenceEvent<T>>)> {
        self.list.subscribe_channel(capacity)
    }

    /// Disposes the sequence. Idempotent.
    pub fn dispose(&self) {
        self.list.dispose();
    }

    /// Returns whether [`dispose`](Self::dispose) has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.list.is_disposed()
    }

    #[cfg(test)]
    fn index_len(&self) -> usize {
        self.list.read(|s| s.index.len()).unwrap_or(0)
    }
}

impl<T> Default for UniqueSynchronizedSequence<T, NaturalEquality>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for UniqueSynchronizedSequence<T, NaturalEquality>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_source(iter)
    }
}

impl<T, S> std::fmt::Debug for UniqueSynchronizedSequence<T, S>
where
    T: std::fmt::Debug + Clone + Send + Sync + 'static,
    S: Equivalence<T>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = f.debug_struct("UniqueSynchronizedSequence");
        out.field("label", &self.config().label);
        match self.list.to_vec() {
            Ok(items) => out.field("items", &items),
            Err(_) => out.field("disposed", &true),
        };
        out.finish_non_exhaustive()
    }
}
