//! # Collection Error Types
//!
//! All errors that can be returned by the synchronized collections.
//!
//! Outcomes that are expected in normal operation (removing an absent value,
//! adding a duplicate to a unique collection) are NOT errors: they are reported
//! as `Ok(false)` and fire no notification.

use thiserror::Error;

use crate::sync::LockError;

/// Errors that can occur when operating on a synchronized collection.
///
/// Every error leaves the collection exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    /// A positional argument was outside the valid range.
    ///
    /// The valid range is `[0, len)` for reads, replacements, removals and
    /// moves, and `[0, len]` for insertions.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Length observed under the lock.
        len: usize,
    },

    /// The collection was disposed before this call.
    #[error("collection has been disposed")]
    Disposed,

    /// `copy_to` destination is too small.
    #[error("destination too small: need {required} slots from offset {offset}, have {available}")]
    InsufficientCapacity {
        /// Offset into the destination where copying would start.
        offset: usize,
        /// Number of elements to copy.
        required: usize,
        /// Number of destination slots available from `offset`.
        available: usize,
    },

    /// A mutation was attempted from inside a section of the same collection,
    /// e.g. from a change handler.
    #[error("collection mutated from inside its own lock section")]
    ReentrantMutation,

    /// A channel subscription asked for room for zero pending events.
    ///
    /// A zero-capacity channel is a rendezvous channel: with non-blocking
    /// delivery it would never receive anything.
    #[error("channel capacity must be at least 1")]
    ZeroCapacity,
}

impl From<LockError> for SequenceError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Disposed => Self::Disposed,
            LockError::Reentrant => Self::ReentrantMutation,
        }
    }
}

/// Errors raised while loading a [`SequenceConfig`](crate::config::SequenceConfig).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(String),

    /// The document parsed but holds an unusable value.
    #[error("invalid configuration value: {0}")]
    Invalid(String),
}

/// Result type for collection operations.
pub type SequenceResult<T> = Result<T, SequenceError>;
