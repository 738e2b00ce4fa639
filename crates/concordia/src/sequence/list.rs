//! Shared implementation of the ordered, observable, synchronized list.
//!
//! Both public sequence types are thin wrappers around [`ObservableList`].
//! They differ only in the [`MembershipIndex`] kept in lock-step with the
//! items: none for the plain sequence, an equivalence index for the unique one.

use crate::config::SequenceConfig;
use crate::error::{SequenceError, SequenceResult};
use crate::notify::{ChangeFeed, CollectionChange, PropertyName, SequenceEvent, Subscription};
use crate::sync::{LockCoordinator, Step};

use super::snapshot::Snapshot;

/// Property notices for a change that altered the count.
const COUNT_AND_ITEMS: &[PropertyName] = &[PropertyName::Count, PropertyName::Items];

/// Property notices for a change that kept the count.
const ITEMS_ONLY: &[PropertyName] = &[PropertyName::Items];

/// Secondary index updated inside the same exclusive section as the items.
///
/// The `record_*` hooks must not fail: all validation happens in `admits*`
/// before storage is touched, which keeps items and index in lock-step.
pub(crate) trait MembershipIndex<T> {
    /// Whether `value` may be inserted as a new element.
    fn admits(&self, value: &T) -> bool;

    /// Whether `value` may overwrite `current` in place.
    fn admits_replacement(&self, current: &T, value: &T) -> bool;

    /// `value` was inserted into the items.
    fn record_insert(&mut self, value: &T);

    /// `value` was removed from the items.
    fn record_remove(&mut self, value: &T);

    /// The items were emptied.
    fn record_clear(&mut self);
}

/// Index of the plain sequence: admits everything, tracks nothing.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Unindexed;

impl<T> MembershipIndex<T> for Unindexed {
    #[inline]
    fn admits(&self, _value: &T) -> bool {
        true
    }

    #[inline]
    fn admits_replacement(&self, _current: &T, _value: &T) -> bool {
        true
    }

    #[inline]
    fn record_insert(&mut self, _value: &T) {}

    #[inline]
    fn record_remove(&mut self, _value: &T) {}

    #[inline]
    fn record_clear(&mut self) {}
}

/// State protected by the coordinator.
pub(crate) struct Storage<T, I> {
    pub(crate) items: Vec<T>,
    pub(crate) index: I,
}

impl<T, I> Storage<T, I> {
    fn check_index(&self, index: usize) -> SequenceResult<()> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(SequenceError::IndexOutOfRange {
                index,
                len: self.items.len(),
            })
        }
    }

    fn check_insert_index(&self, index: usize) -> SequenceResult<()> {
        if index <= self.items.len() {
            Ok(())
        } else {
            Err(SequenceError::IndexOutOfRange {
                index,
                len: self.items.len(),
            })
        }
    }
}

/// Ordered list + lock coordinator + change feed.
pub(crate) struct ObservableList<T, I> {
    lock: LockCoordinator<Storage<T, I>>,
    feed: ChangeFeed<CollectionChange<T>>,
    config: SequenceConfig,
}

impl<T, I> ObservableList<T, I>
where
    T: Clone + Send + Sync + 'static,
    I: MembershipIndex<T>,
{
    /// Wraps already-consistent `items` and `index`.
    pub(crate) fn from_parts(mut items: Vec<T>, index: I, config: SequenceConfig) -> Self {
        items.reserve(config.initial_capacity.saturating_sub(items.len()));
        tracing::debug!(
            collection = %config.label,
            count = items.len(),
            "sequence created"
        );
        Self {
            lock: LockCoordinator::new(Storage { items, index }),
            feed: ChangeFeed::new(config.label.clone()),
            config,
        }
    }

    pub(crate) fn config(&self) -> &SequenceConfig {
        &self.config
    }

    /// Shared section over the raw storage.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&Storage<T, I>) -> R) -> SequenceResult<R> {
        Ok(self.lock.read(f)?)
    }

    /// Decide → mutate → notify with the error type pinned to [`SequenceError`].
    fn commit<P, Q, R>(
        &self,
        decide: impl FnOnce(&Storage<T, I>) -> SequenceResult<Step<P, R>>,
        mutate: impl FnOnce(&mut Storage<T, I>, P) -> SequenceResult<Q>,
        notify: impl FnOnce(&Storage<T, I>, Q) -> R,
    ) -> SequenceResult<R> {
        self.lock.read_then_write_then_read(decide, mutate, notify)
    }

    fn publish(
        &self,
        properties: &[PropertyName],
        len: usize,
        change: impl FnOnce() -> CollectionChange<T>,
    ) {
        if self.feed.has_subscribers() {
            let change = change();
            tracing::trace!(
                collection = %self.config.label,
                kind = ?change.kind(),
                count = len,
                "mutation committed"
            );
            self.feed.emit_all(properties, change);
        } else {
            tracing::trace!(collection = %self.config.label, count = len, "mutation committed");
        }
    }

    // =========================================================================
    // READS
    // =========================================================================

    pub(crate) fn get(&self, index: usize) -> SequenceResult<T> {
        self.read(|s| -> SequenceResult<T> {
            s.check_index(index)?;
            Ok(s.items[index].clone())
        })?
    }

    pub(crate) fn len(&self) -> SequenceResult<usize> {
        self.read(|s| s.items.len())
    }

    pub(crate) fn first(&self) -> SequenceResult<Option<T>> {
        self.read(|s| s.items.first().cloned())
    }

    pub(crate) fn last(&self) -> SequenceResult<Option<T>> {
        self.read(|s| s.items.last().cloned())
    }

    pub(crate) fn position(&self, matches: impl Fn(&I, &T) -> bool) -> SequenceResult<Option<usize>> {
        self.read(|s| s.items.iter().position(|item| matches(&s.index, item)))
    }

    pub(crate) fn copy_to(&self, destination: &mut [T], offset: usize) -> SequenceResult<()> {
        self.read(|s| -> SequenceResult<()> {
            let available = destination.len().saturating_sub(offset);
            if offset > destination.len() || s.items.len() > available {
                return Err(SequenceError::InsufficientCapacity {
                    offset,
                    required: s.items.len(),
                    available,
                });
            }
            destination[offset..offset + s.items.len()].clone_from_slice(&s.items);
            Ok(())
        })?
    }

    pub(crate) fn to_vec(&self) -> SequenceResult<Vec<T>> {
        self.read(|s| s.items.clone())
    }

    pub(crate) fn snapshot(&self) -> SequenceResult<Snapshot<T>> {
        Ok(Snapshot::new(self.to_vec()?))
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Overwrites the element at `index`. `Ok(false)` if the index rejects it.
    pub(crate) fn set(&self, index: usize, value: T) -> SequenceResult<bool> {
        self.commit(
            |s| {
                s.check_index(index)?;
                if s.index.admits_replacement(&s.items[index], &value) {
                    Ok(Step::Proceed(value))
                } else {
                    Ok(Step::Finish(false))
                }
            },
            |s, value| {
                let old = std::mem::replace(&mut s.items[index], value);
                s.index.record_remove(&old);
                s.index.record_insert(&s.items[index]);
                Ok(old)
            },
            |s, old| {
                self.publish(ITEMS_ONLY, s.items.len(), || CollectionChange::Replace {
                    new_item: s.items[index].clone(),
                    old_item: old,
                    index,
                });
                true
            },
        )
    }

    /// Inserts at `index`, or appends when `index` is `None`.
    /// `Ok(false)` if the index rejects the value.
    pub(crate) fn insert(&self, index: Option<usize>, value: T) -> SequenceResult<bool> {
        self.commit(
            |s| {
                let at = match index {
                    Some(at) => {
                        s.check_insert_index(at)?;
                        at
                    }
                    None => s.items.len(),
                };
                if s.index.admits(&value) {
                    Ok(Step::Proceed((at, value)))
                } else {
                    Ok(Step::Finish(false))
                }
            },
            |s, (at, value)| {
                s.index.record_insert(&value);
                s.items.insert(at, value);
                Ok(at)
            },
            |s, at| {
                self.publish(COUNT_AND_ITEMS, s.items.len(), || CollectionChange::Add {
                    items: vec![s.items[at].clone()],
                    index: at,
                });
                true
            },
        )
    }

    /// Inserts every admitted element of `values` contiguously at `index`
    /// (appends when `None`).
    ///
    /// Returns how many were inserted; one `Add` carries all of them.
    pub(crate) fn insert_many(&self, index: Option<usize>, values: Vec<T>) -> SequenceResult<usize> {
        self.commit(
            |s| {
                let at = match index {
                    Some(at) => {
                        s.check_insert_index(at)?;
                        at
                    }
                    None => s.items.len(),
                };
                if values.is_empty() {
                    Ok(Step::Finish(0))
                } else {
                    Ok(Step::Proceed((at, values)))
                }
            },
            |s, (at, values)| {
                let mut admitted = Vec::with_capacity(values.len());
                for value in values {
                    if s.index.admits(&value) {
                        s.index.record_insert(&value);
                        admitted.push(value);
                    }
                }
                let added = admitted.len();
                s.items.splice(at..at, admitted);
                Ok((at, added))
            },
            |s, (at, added)| {
                if added > 0 {
                    self.publish(COUNT_AND_ITEMS, s.items.len(), || CollectionChange::Add {
                        items: s.items[at..at + added].to_vec(),
                        index: at,
                    });
                }
                added
            },
        )
    }

    /// Removes and returns the element at `index`.
    pub(crate) fn remove_at(&self, index: usize) -> SequenceResult<T> {
        self.commit(
            |s| {
                s.check_index(index)?;
                Ok(Step::Proceed(()))
            },
            |s, ()| {
                let removed = s.items.remove(index);
                s.index.record_remove(&removed);
                Ok(removed)
            },
            |s, removed| {
                self.publish(COUNT_AND_ITEMS, s.items.len(), || CollectionChange::Remove {
                    items: vec![removed.clone()],
                    index,
                });
                removed
            },
        )
    }

    /// Removes the first element matching `matches`. `Ok(false)` if none does.
    pub(crate) fn remove_first(&self, matches: impl Fn(&I, &T) -> bool) -> SequenceResult<bool> {
        self.commit(
            |s| match s.items.iter().position(|item| matches(&s.index, item)) {
                Some(at) => Ok(Step::Proceed(at)),
                None => Ok(Step::Finish(false)),
            },
            |s, at| {
                let removed = s.items.remove(at);
                s.index.record_remove(&removed);
                Ok((at, removed))
            },
            |s, (at, removed)| {
                self.publish(COUNT_AND_ITEMS, s.items.len(), || CollectionChange::Remove {
                    items: vec![removed],
                    index: at,
                });
                true
            },
        )
    }

    /// Empties the list. Silent when already empty.
    pub(crate) fn clear(&self) -> SequenceResult<()> {
        self.commit(
            |s| {
                if s.items.is_empty() {
                    Ok(Step::Finish(()))
                } else {
                    Ok(Step::Proceed(()))
                }
            },
            |s, ()| {
                s.items.clear();
                s.index.record_clear();
                Ok(())
            },
            |s, ()| self.publish(COUNT_AND_ITEMS, s.items.len(), || CollectionChange::Reset),
        )
    }

    /// Moves the element at `old_index` to `new_index`.
    pub(crate) fn move_item(&self, old_index: usize, new_index: usize) -> SequenceResult<()> {
        self.commit(
            |s| {
                s.check_index(old_index)?;
                s.check_index(new_index)?;
                Ok(Step::Proceed(()))
            },
            |s, ()| {
                let item = s.items.remove(old_index);
                s.items.insert(new_index, item);
                Ok(())
            },
            |s, ()| {
                self.publish(ITEMS_ONLY, s.items.len(), || CollectionChange::Move {
                    item: s.items[new_index].clone(),
                    old_index,
                    new_index,
                });
            },
        )
    }

    // =========================================================================
    // CAPACITY
    // =========================================================================

    pub(crate) fn reserve(&self, additional: usize) -> SequenceResult<()> {
        Ok(self.lock.write(|s| s.items.reserve(additional))?)
    }

    pub(crate) fn shrink_to_fit(&self) -> SequenceResult<()> {
        Ok(self.lock.write(|s| s.items.shrink_to_fit())?)
    }

    pub(crate) fn capacity(&self) -> SequenceResult<usize> {
        self.read(|s| s.items.capacity())
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

    pub(crate) fn subscribe_changes<F>(&self, handler: F) -> SequenceResult<Subscription>
    where
        F: Fn(&CollectionChange<T>) + Send + Sync + 'static,
    {
        self.ensure_live()?;
        Ok(self.feed.subscribe_changes(handler))
    }

    pub(crate) fn subscribe_properties<F>(&self, handler: F) -> SequenceResult<Subscription>
    where
        F: Fn(PropertyName) + Send + Sync + 'static,
    {
        self.ensure_live()?;
        Ok(self.feed.subscribe_properties(handler))
    }

    pub(crate) fn subscribe_events<F>(&self, handler: F) -> SequenceResult<Subscription>
    where
        F: Fn(&SequenceEvent<T>) + Send + Sync + 'static,
    {
        self.ensure_live()?;
        Ok(self.feed.subscribe_all(handler))
    }

    pub(crate) fn subscribe_channel(
        &self,
        capacity: usize,
    ) -> SequenceResult<(Subscription, crossbeam_channel::Receiver<SequenceEvent<T>>)> {
        self.ensure_live()?;
        if capacity == 0 {
            return Err(SequenceError::ZeroCapacity);
        }
        Ok(self.feed.subscribe_channel(capacity))
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.lock.is_disposed()
    }

    /// Releases the lock and every subscriber. Idempotent; items are kept.
    pub(crate) fn dispose(&self) {
        if self.lock.dispose() {
            self.feed.clear();
            tracing::debug!(collection = %self.config.label, "sequence disposed");
        }
    }
}
