//! Ordered synchronized sequence without a uniqueness constraint.

use crossbeam_channel::Receiver;

use crate::config::SequenceConfig;
use crate::error::SequenceResult;
use crate::notify::{CollectionChange, PropertyName, SequenceEvent, Subscription};

use super::list::{ObservableList, Unindexed};
use super::snapshot::Snapshot;

/// Thread-safe, observable, ordered list.
///
/// Every method may be called from any thread through a shared reference.
/// Mutations are serialized; each one that changes the list notifies
/// subscribers on the calling thread before returning:
///
/// | Operation | Notifications |
/// |-----------|---------------|
/// | `add`, `insert`, `add_range`, `insert_range` | `Count`, `Item[]`, `Add` |
/// | `remove`, `remove_at` | `Count`, `Item[]`, `Remove` |
/// | `set` | `Item[]`, `Replace` |
/// | `move_item` | `Item[]`, `Move` |
/// | `clear` (non-empty) | `Count`, `Item[]`, `Reset` |
///
/// Handlers may read the sequence. Mutating it from a handler returns
/// [`SequenceError::ReentrantMutation`](crate::SequenceError::ReentrantMutation).
///
/// # Example
///
/// ```rust,ignore
/// let seq = SynchronizedSequence::new();
/// let _sub = seq.subscribe(|change| println!("{change:?}"))?;
/// seq.add("a")?;
/// seq.insert(0, "b")?;
/// assert_eq!(seq.to_vec()?, vec!["b", "a"]);
/// ```
pub struct SynchronizedSequence<T> {
    list: ObservableList<T, Unindexed>,
}

impl<T> SynchronizedSequence<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates an empty sequence with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SequenceConfig::default())
    }

    /// Creates an empty sequence.
    #[must_use]
    pub fn with_config(config: SequenceConfig) -> Self {
        Self {
            list: ObservableList::from_parts(Vec::new(), Unindexed, config),
        }
    }

    /// Creates a sequence holding the elements of `source`, in order.
    ///
    /// `source` is consumed before the sequence exists, so no lock is taken.
    #[must_use]
    pub fn from_source(source: impl IntoIterator<Item = T>) -> Self {
        Self::from_source_with_config(source, SequenceConfig::default())
    }

    /// Creates a configured sequence holding the elements of `source`.
    #[must_use]
    pub fn from_source_with_config(source: impl IntoIterator<Item = T>, config: SequenceConfig) -> Self {
        Self {
            list: ObservableList::from_parts(source.into_iter().collect(), Unindexed, config),
        }
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

    /// Overwrites the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::IndexOutOfRange` if `index >= len`,
    /// `SequenceError::ReentrantMutation` if called from one of its own handlers,
    /// or `SequenceError::Disposed` after disposal.
    pub fn set(&self, index: usize, value: T) -> SequenceResult<()> {
        self.list.set(index, value).map(|_| ())
    }

    /// Appends `value`.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::ReentrantMutation` if called from one of its own
    /// handlers, `SequenceError::Disposed` after disposal.
    pub fn add(&self, value: T) -> SequenceResult<()> {
        self.list.insert(None, value).map(|_| ())
    }

    /// Inserts `value` at `index` (`index == len` appends).
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::IndexOutOfRange` if `index > len`,
    /// `SequenceError::ReentrantMutation` if called from one of its own handlers,
    /// or `SequenceError::Disposed` after disposal.
    pub fn insert(&self, index: usize, value: T) -> SequenceResult<()> {
        self.list.insert(Some(index), value).map(|_| ())
    }

    /// Appends every element of `values` as one change. Returns how many were added.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::ReentrantMutation` if called from one of its own
    /// handlers, `SequenceError::Disposed` after disposal.
    pub fn add_range(&self, values: impl IntoIterator<Item = T>) -> SequenceResult<usize> {
        self.list.insert_many(None, values.into_iter().collect())
    }

    /// Inserts every element of `values` contiguously at `index` as one change.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::IndexOutOfRange` if `index > len`. Re-entrant and
    /// disposed calls fail as for [`insert`](Self::insert).
    pub fn insert_range(&self, index: usize, values: impl IntoIterator<Item = T>) -> SequenceResult<usize> {
        self.list.insert_many(Some(index), values.into_iter().collect())
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

    /// Disposes the sequence: every later call fails with `Disposed` and all
    /// subscribers are dropped. Idempotent.
    pub fn dispose(&self) {
        self.list.dispose();
    }

    /// Returns whether [`dispose`](Self::dispose) has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.list.is_disposed()
    }
}

impl<T> SynchronizedSequence<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Position of the first element equal to `value`.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` if the sequence has been disposed.
    pub fn index_of(&self, value: &T) -> SequenceResult<Option<usize>> {
        self.list.position(|_, item| item == value)
    }

    /// Returns whether an element equal to `value` is present.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` after disposal.
    pub fn contains(&self, value: &T) -> SequenceResult<bool> {
        Ok(self.index_of(value)?.is_some())
    }

    /// Removes the first element equal to `value`. `Ok(false)` if none is present.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::ReentrantMutation` if called from one of its own
    /// handlers, `SequenceError::Disposed` after disposal.
    pub fn remove(&self, value: &T) -> SequenceResult<bool> {
        self.list.remove_first(|_, item| item == value)
    }
}

impl<T> Default for SynchronizedSequence<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for SynchronizedSequence<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_source(iter)
    }
}

impl<T: std::fmt::Debug + Clone + Send + Sync + 'static> std::fmt::Debug for SynchronizedSequence<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = f.debug_struct("SynchronizedSequence");
        out.field("label", &self.config().label);
        match self.list.to_vec() {
            Ok(items) => out.field("items", &items),
            Err(_) => out.field("disposed", &true),
        };
        out.finish_non_exhaustive()
    }
}
