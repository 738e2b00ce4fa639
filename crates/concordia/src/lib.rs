//! # Concordia
//!
//! Thread-safe, change-notifying, order-preserving collections:
//! - Any number of threads read and write through `&self`
//! - Every committed mutation is announced before the call returns
//! - Notifications are totally ordered with the mutations they describe
//!
//! ## Architecture Rules
//!
//! 1. **One mutation path** - storage changes only inside
//!    [`LockCoordinator::read_then_write_then_read`]
//! 2. **Validate, then mutate** - a failing call leaves the collection untouched
//! 3. **Copies out, never references** - readers get values, snapshots or slices
//!    copied under a shared lock
//!
//! ## Collections
//!
//! | Type | Order | Duplicates | Structural feed |
//! |------|-------|------------|-----------------|
//! | [`SynchronizedSequence`] | insertion | allowed | [`CollectionChange`] |
//! | [`UniqueSynchronizedSequence`] | insertion | rejected under [`Equivalence`] | [`CollectionChange`] |
//! | [`SynchronizedHashSet`] | none | rejected under [`Equivalence`] | [`SetChange`] |
//!
//! ## Example
//!
//! ```rust,ignore
//! use concordia::{CollectionChange, UniqueSynchronizedSequence};
//!
//! let seq = UniqueSynchronizedSequence::from_source([1, 2, 3]);
//! let _sub = seq.subscribe(|change: &CollectionChange<i32>| println!("{change:?}"))?;
//!
//! assert!(!seq.add(3)?);   // duplicate: no-op, nothing fired
//! assert!(seq.add(4)?);    // fires Count, Item[], Add([4], 3)
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod equivalence;
pub mod error;
pub mod notify;
pub mod sequence;
pub mod set;
pub mod sync;

pub use config::SequenceConfig;
pub use equivalence::{Equivalence, EquivalenceIndex, KeyEquivalence, NaturalEquality};
pub use error::{ConfigError, SequenceError, SequenceResult};
pub use notify::{
    ChangeKind, CollectionChange, Notification, PropertyName, SequenceEvent, SetChange, SetEvent,
    Subscription,
};
pub use sequence::{Snapshot, SynchronizedSequence, UniqueSynchronizedSequence};
pub use set::SynchronizedHashSet;
pub use sync::{LockCoordinator, LockError, Step};
