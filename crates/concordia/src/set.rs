//! # Synchronized Hash Set
//!
//! Unordered counterpart of the sequences: membership under an
//! [`Equivalence`], the same lock protocol, the same two feeds.
//!
//! ```text
//!   union_with([b, c, d])        { a, b }  ──>  { a, b, c, d }
//!     Count, Item[], Added([c, d])
//!
//!   symmetric_except_with([b, e])  { a, b }  ──>  { a, e }
//!     Count, Item[], Added([e])
//!     Count, Item[], Removed([b])
//! ```
//!
//! Bulk operations are atomic: the batch is resolved against the current
//! members under the intent lock, applied in one exclusive section and
//! announced with at most one notification per direction.

use std::hash::Hash;
use std::sync::Arc;

use crossbeam_channel::Receiver;

use crate::config::SequenceConfig;
use crate::equivalence::{Equivalence, EquivalenceIndex, NaturalEquality};
use crate::error::{SequenceError, SequenceResult};
use crate::notify::{ChangeFeed, PropertyName, SetChange, SetEvent, Subscription};
use crate::sequence::Snapshot;
use crate::sync::{LockCoordinator, Step};

/// Every set change alters the count.
const COUNT_AND_ITEMS: &[PropertyName] = &[PropertyName::Count, PropertyName::Items];

type Members<T, S> = EquivalenceIndex<T, Arc<S>>;

/// Thread-safe, observable, unordered set.
///
/// # Example
///
/// ```rust,ignore
/// let tags = SynchronizedHashSet::from_source(["red", "green"]);
/// let _sub = tags.subscribe(|change| println!("{change:?}"))?;
/// assert_eq!(tags.union_with(["green", "blue"])?, 1);   // Added(["blue"])
/// assert!(tags.is_superset_of(["red"])?);
/// ```
pub struct SynchronizedHashSet<T, S = NaturalEquality> {
    lock: LockCoordinator<Members<T, S>>,
    feed: ChangeFeed<SetChange<T>>,
    strategy: Arc<S>,
    config: SequenceConfig,
}

impl<T> SynchronizedHashSet<T, NaturalEquality>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    /// Creates an empty set using natural equality.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SequenceConfig::labeled("set"))
    }

    /// Creates an empty configured set using natural equality.
    #[must_use]
    pub fn with_config(config: SequenceConfig) -> Self {
        Self::build(std::iter::empty(), NaturalEquality, config)
    }

    /// Creates a set holding the distinct elements of `source`.
    #[must_use]
    pub fn from_source(source: impl IntoIterator<Item = T>) -> Self {
        Self::build(source, NaturalEquality, SequenceConfig::labeled("set"))
    }
}

impl<T, S> SynchronizedHashSet<T, S>
where
    T: Clone + Send + Sync + 'static,
    S: Equivalence<T>,
{
    /// Creates an empty set using `strategy`.
    #[must_use]
    pub fn with_equivalence(strategy: S) -> Self {
        Self::build(std::iter::empty(), strategy, SequenceConfig::labeled("set"))
    }

    /// Creates a set from `source` using `strategy`; the first of any
    /// equivalent elements is kept.
    #[must_use]
    pub fn from_source_with_equivalence(source: impl IntoIterator<Item = T>, strategy: S) -> Self {
        Self::build(source, strategy, SequenceConfig::labeled("set"))
    }

    /// Fully specified constructor.
    #[must_use]
    pub fn build(source: impl IntoIterator<Item = T>, strategy: S, config: SequenceConfig) -> Self {
        let strategy = Arc::new(strategy);
        let mut members = EquivalenceIndex::new(Arc::clone(&strategy));
        for item in source {
            members.insert(item);
        }
        tracing::debug!(collection = %config.label, count = members.len(), "set created");
        Self {
            lock: LockCoordinator::new(members),
            feed: ChangeFeed::new(config.label.clone()),
            strategy,
            config,
        }
    }

    /// The equivalence strategy, fixed at construction.
    #[inline]
    #[must_use]
    pub fn equivalence(&self) -> &S {
        &self.strategy
    }

    /// The configuration this set was built with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    /// Distinct elements of `values` under this set's strategy. Built outside the lock.
    fn distinct(&self, values: impl IntoIterator<Item = T>) -> Members<T, S> {
        let mut scratch = EquivalenceIndex::new(Arc::clone(&self.strategy));
        for value in values {
            scratch.insert(value);
        }
        scratch
    }

    fn read<R>(&self, f: impl FnOnce(&Members<T, S>) -> R) -> SequenceResult<R> {
        Ok(self.lock.read(f)?)
    }

    fn commit<P, Q, R>(
        &self,
        decide: impl FnOnce(&Members<T, S>) -> SequenceResult<Step<P, R>>,
        mutate: impl FnOnce(&mut Members<T, S>, P) -> SequenceResult<Q>,
        notify: impl FnOnce(&Members<T, S>, Q) -> R,
    ) -> SequenceResult<R> {
        self.lock.read_then_write_then_read(decide, mutate, notify)
    }

    fn publish(&self, len: usize, change: SetChange<T>) {
        tracing::trace!(
            collection = %self.config.label,
            kind = ?change.kind(),
            count = len,
            "mutation committed"
        );
        if self.feed.has_subscribers() {
            self.feed.emit_all(COUNT_AND_ITEMS, change);
        }
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Number of members (`Count`).
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` if the set has been disposed.
    pub fn len(&self) -> SequenceResult<usize> {
        self.read(EquivalenceIndex::len)
    }

    /// Returns whether the set is empty.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` if the set has been disposed.
    pub fn is_empty(&self) -> SequenceResult<bool> {
        self.read(EquivalenceIndex::is_empty)
    }

    /// Returns whether a member equivalent to `value` exists.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` after disposal.
    pub fn contains(&self, value: &T) -> SequenceResult<bool> {
        self.read(|m| m.contains(value))
    }

    /// Copy of the member equivalent to `value`.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` if the set has been disposed.
    pub fn get(&self, value: &T) -> SequenceResult<Option<T>> {
        self.read(|m| m.get(value).cloned())
    }

    /// Copies the members into a new `Vec`, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` if the set has been disposed.
    pub fn to_vec(&self) -> SequenceResult<Vec<T>> {
        self.read(|m| m.iter().cloned().collect())
    }

    /// Iterator over a copy of the members taken now.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` after disposal.
    pub fn snapshot(&self) -> SequenceResult<Snapshot<T>> {
        Ok(Snapshot::new(self.to_vec()?))
    }

    /// Copies every member into `destination` starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::InsufficientCapacity` if the members do not fit in
    /// `destination` from `offset`, `SequenceError::Disposed` after disposal.
    pub fn copy_to(&self, destination: &mut [T], offset: usize) -> SequenceResult<()> {
        self.read(|m| -> SequenceResult<()> {
            let available = destination.len().saturating_sub(offset);
            if offset > destination.len() || m.len() > available {
                return Err(SequenceError::InsufficientCapacity {
                    offset,
                    required: m.len(),
                    available,
                });
            }
            for (slot, item) in destination[offset..].iter_mut().zip(m.iter()) {
                slot.clone_from(item);
            }
            Ok(())
        })?
    }

    // =========================================================================
    // RELATIONS
    // =========================================================================

    /// Every member is in `other`.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` after disposal.
    pub fn is_subset_of(&self, other: impl IntoIterator<Item = T>) -> SequenceResult<bool> {
        let other = self.distinct(other);
        self.read(|m| m.iter().all(|item| other.contains(item)))
    }

    /// Subset of `other`, which holds at least one element more.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` after disposal.
    pub fn is_proper_subset_of(&self, other: impl IntoIterator<Item = T>) -> SequenceResult<bool> {
        let other = self.distinct(other);
        self.read(|m| m.len() < other.len() && m.iter().all(|item| other.contains(item)))
    }

    /// Every element of `other` is a member.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` after disposal.
    pub fn is_superset_of(&self, other: impl IntoIterator<Item = T>) -> SequenceResult<bool> {
        let other = self.distinct(other);
        self.read(|m| other.iter().all(|item| m.contains(item)))
    }

    /// Superset of `other`, holding at least one element more.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` after disposal.
    pub fn is_proper_superset_of(&self, other: impl IntoIterator<Item = T>) -> SequenceResult<bool> {
        let other = self.distinct(other);
        self.read(|m| m.len() > other.len() && other.iter().all(|item| m.contains(item)))
    }

    /// At least one element of `other` is a member.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` after disposal.
    pub fn overlaps(&self, other: impl IntoIterator<Item = T>) -> SequenceResult<bool> {
        let other = self.distinct(other);
        self.read(|m| other.iter().any(|item| m.contains(item)))
    }

    /// Members and the distinct elements of `other` coincide.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` after disposal.
    pub fn set_equals(&self, other: impl IntoIterator<Item = T>) -> SequenceResult<bool> {
        let other = self.distinct(other);
        self.read(|m| m.len() == other.len() && other.iter().all(|item| m.contains(item)))
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Adds `value`. `Ok(false)` if an equivalent member exists.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::ReentrantMutation` if called from one of its own
    /// handlers, `SequenceError::Disposed` after disposal.
    pub fn add(&self, value: T) -> SequenceResult<bool> {
        self.commit(
            |m| {
                if m.contains(&value) {
                    Ok(Step::Finish(false))
                } else {
                    Ok(Step::Proceed(value))
                }
            },
            |m, value| {
                m.insert(value.clone());
                Ok(value)
            },
            |m, value| {
                self.publish(m.len(), SetChange::Added(vec![value]));
                true
            },
        )
    }

    /// Removes the member equivalent to `value`. `Ok(false)` if there is none.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::ReentrantMutation` if called from one of its own
    /// handlers, `SequenceError::Disposed` after disposal.
    pub fn remove(&self, value: &T) -> SequenceResult<bool> {
        self.commit(
            |m| {
                if m.contains(value) {
                    Ok(Step::Proceed(()))
                } else {
                    Ok(Step::Finish(false))
                }
            },
            |m, ()| Ok(m.remove(value)),
            |m, removed| {
                if let Some(removed) = removed {
                    self.publish(m.len(), SetChange::Removed(vec![removed]));
                }
                true
            },
        )
    }

    /// Removes every member. Fires nothing when already empty.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::ReentrantMutation` if called from one of its own
    /// handlers, `SequenceError::Disposed` after disposal.
    pub fn clear(&self) -> SequenceResult<()> {
        self.commit(
            |m| {
                if m.is_empty() {
                    Ok(Step::Finish(()))
                } else {
                    Ok(Step::Proceed(()))
                }
            },
            |m, ()| {
                m.clear();
                Ok(())
            },
            |m, ()| self.publish(m.len(), SetChange::Reset),
        )
    }

    /// Adds every element of `other` not yet a member. Returns how many were added.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::ReentrantMutation` if called from one of its own
    /// handlers, `SequenceError::Disposed` after disposal.
    pub fn union_with(&self, other: impl IntoIterator<Item = T>) -> SequenceResult<usize> {
        let other = self.distinct(other);
        self.commit(
            |m| {
                let added: Vec<T> = other.iter().filter(|item| !m.contains(item)).cloned().collect();
                if added.is_empty() {
                    Ok(Step::Finish(0))
                } else {
                    Ok(Step::Proceed(added))
                }
            },
            |m, added| {
                for item in &added {
                    m.insert(item.clone());
                }
                Ok(added)
            },
            |m, added| {
                let count = added.len();
                self.publish(m.len(), SetChange::Added(added));
                count
            },
        )
    }

    /// Keeps only members also in `other`. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Same as [`union_with`](Self::union_with).
    pub fn intersect_with(&self, other: impl IntoIterator<Item = T>) -> SequenceResult<usize> {
        let other = self.distinct(other);
        self.commit(
            |m| {
                let doomed: Vec<T> = m.iter().filter(|item| !other.contains(item)).cloned().collect();
                if doomed.is_empty() {
                    Ok(Step::Finish(0))
                } else {
                    Ok(Step::Proceed(doomed))
                }
            },
            |m, doomed| Ok(remove_all(m, &doomed)),
            |m, removed| {
                let count = removed.len();
                self.publish(m.len(), SetChange::Removed(removed));
                count
            },
        )
    }

    /// Removes every member found in `other`. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Same as [`union_with`](Self::union_with).
    pub fn except_with(&self, other: impl IntoIterator<Item = T>) -> SequenceResult<usize> {
        let other = self.distinct(other);
        self.commit(
            |m| {
                let doomed: Vec<T> = other.iter().filter(|item| m.contains(item)).cloned().collect();
                if doomed.is_empty() {
                    Ok(Step::Finish(0))
                } else {
                    Ok(Step::Proceed(doomed))
                }
            },
            |m, doomed| Ok(remove_all(m, &doomed)),
            |m, removed| {
                let count = removed.len();
                self.publish(m.len(), SetChange::Removed(removed));
                count
            },
        )
    }

    /// Keeps the elements in exactly one of `self` and `other`.
    ///
    /// Announces `Added` then `Removed`, each only when non-empty. Returns
    /// how many elements changed membership.
    ///
    /// # Errors
    ///
    /// Same as [`union_with`](Self::union_with).
    pub fn symmetric_except_with(&self, other: impl IntoIterator<Item = T>) -> SequenceResult<usize> {
        let other = self.distinct(other);
        self.commit(
            |m| {
                let (doomed, added): (Vec<T>, Vec<T>) =
                    other.iter().cloned().partition(|item| m.contains(item));
                if doomed.is_empty() && added.is_empty() {
                    Ok(Step::Finish(0))
                } else {
                    Ok(Step::Proceed((added, doomed)))
                }
            },
            |m, (added, doomed)| {
                let removed = remove_all(m, &doomed);
                for item in &added {
                    m.insert(item.clone());
                }
                Ok((added, removed))
            },
            |m, (added, removed)| {
                let count = added.len() + removed.len();
                if !added.is_empty() {
                    self.publish(m.len() + removed.len(), SetChange::Added(added));
                }
                if !removed.is_empty() {
                    self.publish(m.len(), SetChange::Removed(removed));
                }
                count
            },
        )
    }

    // =========================================================================
    // SUBSCRIPTIONS & LIFECYCLE
    // =========================================================================

    fn ensure_live(&self) -> SequenceResult<()> {
        if self.lock.is_disposed() {
            Err(SequenceError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Subscribes to structural changes.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` if the set has been disposed.
    pub fn subscribe<F>(&self, handler: F) -> SequenceResult<Subscription>
    where
        F: Fn(&SetChange<T>) + Send + Sync + 'static,
    {
        self.ensure_live()?;
        Ok(self.feed.subscribe_changes(handler))
    }

    /// Subscribes to `Count` / `Item[]` notices.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` if the set has been disposed.
    pub fn subscribe_properties<F>(&self, handler: F) -> SequenceResult<Subscription>
    where
        F: Fn(PropertyName) + Send + Sync + 'static,
    {
        self.ensure_live()?;
        Ok(self.feed.subscribe_properties(handler))
    }

    /// Subscribes to both feeds, in emission order.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Disposed` if the set has been disposed.
    pub fn subscribe_events<F>(&self, handler: F) -> SequenceResult<Subscription>
    where
        F: Fn(&SetEvent<T>) + Send + Sync + 'static,
    {
        self.ensure_live()?;
        Ok(self.feed.subscribe_all(handler))
    }

    /// Subscribes a channel bounded by the configured `feed_capacity`.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::ZeroCapacity` if the configured `feed_capacity` is 0,
    /// `SequenceError::Disposed` after disposal.
    pub fn subscribe_channel(&self) -> SequenceResult<(Subscription, Receiver<SetEvent<T>>)> {
        self.subscribe_channel_bounded(self.config.feed_capacity)
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
    ) -> SequenceResult<(Subscription, Receiver<SetEvent<T>>)> {
        self.ensure_live()?;
        if capacity == 0 {
            return Err(SequenceError::ZeroCapacity);
        }
        Ok(self.feed.subscribe_channel(capacity))
    }

    /// Disposes the set: later calls fail with `Disposed` and all subscribers
    /// are dropped. Idempotent.
    pub fn dispose(&self) {
        if self.lock.dispose() {
            self.feed.clear();
            tracing::debug!(collection = %self.config.label, "set disposed");
        }
    }

    /// Returns whether [`dispose`](Self::dispose) has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.lock.is_disposed()
    }
}

/// Removes each of `doomed` and returns the members actually taken out.
fn remove_all<T, S: Equivalence<T>>(members: &mut Members<T, S>, doomed: &[T]) -> Vec<T> {
    doomed.iter().filter_map(|item| members.remove(item)).collect()
}

impl<T> Default for SynchronizedHashSet<T, NaturalEquality>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for SynchronizedHashSet<T, NaturalEquality>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_source(iter)
    }
}

impl<T, S> std::fmt::Debug for SynchronizedHashSet<T, S>
where
    T: std::fmt::Debug + Clone + Send + Sync + 'static,
    S: Equivalence<T>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynchronizedHashSet")
            .field("label", &self.config.label)
            .field("count", &self.len().ok())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}
