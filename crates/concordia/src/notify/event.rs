//! Notification records.
//!
//! Every record is a point-in-time fact about a committed mutation. Items are
//! cloned out of storage, so a record never aliases the live collection.

use std::fmt;

/// Names published on the named-property feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyName {
    /// The element count changed.
    Count,
    /// The "all items" sentinel: some element or position changed.
    Items,
}

impl PropertyName {
    /// Binding-layer name of the property.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Count => "Count",
            Self::Items => "Item[]",
        }
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a structural change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Elements were inserted.
    Add,
    /// Elements were removed.
    Remove,
    /// One element was overwritten in place.
    Replace,
    /// One element changed position.
    Move,
    /// The collection was emptied.
    Reset,
}

/// Structural change of an ordered sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectionChange<T> {
    /// `items` now occupy `index..index + items.len()`.
    Add {
        /// Inserted elements, in order.
        items: Vec<T>,
        /// Position of the first inserted element.
        index: usize,
    },
    /// `items` used to occupy `index..index + items.len()`.
    Remove {
        /// Removed elements, in order.
        items: Vec<T>,
        /// Former position of the first removed element.
        index: usize,
    },
    /// `old_item` at `index` was overwritten with `new_item`.
    Replace {
        /// Value now stored at `index`.
        new_item: T,
        /// Value previously stored at `index`.
        old_item: T,
        /// Affected position.
        index: usize,
    },
    /// `item` moved from `old_index` to `new_index`.
    Move {
        /// The moved element.
        item: T,
        /// Position before the move.
        old_index: usize,
        /// Position after the move.
        new_index: usize,
    },
    /// Every element was removed.
    Reset,
}

impl<T> CollectionChange<T> {
    /// Returns the kind of this change.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        match self {
            Self::Add { .. } => ChangeKind::Add,
            Self::Remove { .. } => ChangeKind::Remove,
            Self::Replace { .. } => ChangeKind::Replace,
            Self::Move { .. } => ChangeKind::Move,
            Self::Reset => ChangeKind::Reset,
        }
    }
}

/// Structural change of an unordered set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetChange<T> {
    /// Elements that became members.
    Added(Vec<T>),
    /// Elements that stopped being members.
    Removed(Vec<T>),
    /// Every element was removed.
    Reset,
}

impl<T> SetChange<T> {
    /// Returns the kind of this change.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        match self {
            Self::Added(_) => ChangeKind::Add,
            Self::Removed(_) => ChangeKind::Remove,
            Self::Reset => ChangeKind::Reset,
        }
    }
}

/// One entry of a collection's combined notification stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification<C> {
    /// A named property changed.
    Property(PropertyName),
    /// A structural change was committed.
    Change(C),
}

/// Notification stream of a sequence.
pub type SequenceEvent<T> = Notification<CollectionChange<T>>;

/// Notification stream of a set.
pub type SetEvent<T> = Notification<SetChange<T>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_names() {
        assert_eq!(PropertyName::Count.as_str(), "Count");
        assert_eq!(PropertyName::Items.to_string(), "Item[]");
    }

    #[test]
    fn test_change_kinds() {
        let add = CollectionChange::Add { items: vec![1], index: 0 };
        assert_eq!(add.kind(), ChangeKind::Add);
        let moved = CollectionChange::Move { item: 1, old_index: 2, new_index: 0 };
        assert_eq!(moved.kind(), ChangeKind::Move);
        assert_eq!(CollectionChange::<u8>::Reset.kind(), ChangeKind::Reset);
        assert_eq!(SetChange::Removed(vec!['a']).kind(), ChangeKind::Remove);
    }
}
