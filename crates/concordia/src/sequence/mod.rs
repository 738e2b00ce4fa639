//! # Synchronized Sequences
//!
//! Ordered, index-addressable, thread-safe lists that report every committed
//! mutation to their subscribers.
//!
//! ```text
//!   caller thread                          LockCoordinator
//!   ─────────────                          ───────────────
//!   seq.add(x) ──> decide   (intent lock)  duplicate? range?
//!                  mutate   (exclusive)    items (+ index)
//!                  notify   (intent lock)  Count, Item[], Add{x, i}
//!              <── Ok(true)
//! ```
//!
//! [`SynchronizedSequence`] accepts any element. [`UniqueSynchronizedSequence`]
//! keeps an equivalence index in lock-step with the items and refuses
//! duplicates.

mod list;
mod snapshot;
mod synchronized;
mod unique;

pub use snapshot::Snapshot;
pub use synchronized::SynchronizedSequence;
pub use unique::UniqueSynchronizedSequence;
