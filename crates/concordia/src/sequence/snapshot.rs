//! Point-in-time iteration.

use std::iter::FusedIterator;

/// Owning iterator over a copy of a collection taken at call time.
///
/// The copy is made under a shared lock which is released before the
/// `Snapshot` is returned, so iterating never blocks writers and never observes
/// their changes. Each call to `snapshot()` takes a fresh copy.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    inner: std::vec::IntoIter<T>,
}

impl<T> Snapshot<T> {
    pub(crate) fn new(items: Vec<T>) -> Self {
        Self {
            inner: items.into_iter(),
        }
    }

    /// Elements not yet yielded.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        self.inner.as_slice()
    }
}

impl<T> Iterator for Snapshot<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for Snapshot<T> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        self.inner.next_back()
    }
}

impl<T> ExactSizeIterator for Snapshot<T> {}

impl<T> FusedIterator for Snapshot<T> {}
