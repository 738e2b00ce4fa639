//! # Lock Coordination for Observable Collections
//!
//! ## The Problem
//!
//! ```text
//! Thread 1:  idx = index_of(x)   ......   remove_at(idx)   -> wrong element!
//! Thread 2:              insert(0, y)
//! ```
//!
//! A writer that first looks at storage and then mutates it must not let
//! another writer in between. Observers must also never see a notification
//! for a state that is no longer (or not yet) in storage.
//!
//! ## The Solution: Intent Lock Across Three Phases
//!
//! ```text
//!   intent (upgradable) ─────────────────────────────────────────┐
//!   │ decide (shared)  │ mutate (exclusive) │ notify (shared)    │
//!   └──────────────────┴────────────────────┴────────────────────┘
//!         readers OK         no readers          readers OK
//! ```
//!
//! Only one intent lock exists at a time, so writers are totally ordered, and
//! notifications leave in the same order as the mutations they describe.

mod coordinator;

pub use coordinator::{LockCoordinator, LockError, Step};
