//! Reader/writer lock wrapper owning the protected state.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::{RwLock, RwLockUpgradableReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Source of per-coordinator identities for re-entrancy tracking.
static NEXT_COORDINATOR_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Coordinators the current thread is inside a section of.
    static HELD_SECTIONS: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

/// Errors raised by the lock primitives themselves.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockError {
    /// The coordinator was disposed.
    #[error("lock coordinator has been disposed")]
    Disposed,
    /// An exclusive section was requested from inside a section of the same
    /// coordinator on the same thread.
    #[error("exclusive section requested while already inside a section")]
    Reentrant,
}

/// Outcome of the `decide` phase of [`LockCoordinator::read_then_write_then_read`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<P, R> {
    /// Continue to `mutate` and `notify` with the decided value.
    Proceed(P),
    /// Return this result immediately. Nothing is mutated or notified.
    Finish(R),
}

/// Marks the current thread as inside a section until dropped.
struct SectionMarker {
    id: u64,
}

impl SectionMarker {
    fn enter(id: u64) -> Self {
        HELD_SECTIONS.with(|held| held.borrow_mut().push(id));
        Self { id }
    }

    fn is_held(id: u64) -> bool {
        HELD_SECTIONS.with(|held| held.borrow().contains(&id))
    }
}

impl Drop for SectionMarker {
    fn drop(&mut self) {
        HELD_SECTIONS.with(|held| {
            let mut held = held.borrow_mut();
            if let Some(pos) = held.iter().rposition(|&id| id == self.id) {
                held.remove(pos);
            }
        });
    }
}

/// Reader/writer lock protocol around a single piece of state.
///
/// The state is only reachable through the three section primitives:
///
/// - [`read`](Self::read): shared section, re-entrant per thread
/// - [`read_then_write_then_read`](Self::read_then_write_then_read):
///   decide → mutate → notify as one atomic unit
/// - [`write`](Self::write): plain exclusive section
///
/// Every guard is released on all exit paths, including panics.
pub struct LockCoordinator<S> {
    id: u64,
    state: RwLock<S>,
    disposed: AtomicBool,
}

impl<S> LockCoordinator<S> {
    /// Creates a coordinator owning `state`.
    #[must_use]
    pub fn new(state: S) -> Self {
        Self {
            id: NEXT_COORDINATOR_ID.fetch_add(1, Ordering::Relaxed),
            state: RwLock::new(state),
            disposed: AtomicBool::new(false),
        }
    }

    /// Returns whether [`dispose`](Self::dispose) has been called.
    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Returns whether the current thread is inside a section of this coordinator.
    #[inline]
    #[must_use]
    pub fn is_held_by_current_thread(&self) -> bool {
        SectionMarker::is_held(self.id)
    }

    /// Disposes the coordinator. Later sections fail with [`LockError::Disposed`].
    ///
    /// Returns `true` only for the call that performed the disposal; repeated
    /// calls are no-ops.
    pub fn dispose(&self) -> bool {
        !self.disposed.swap(true, Ordering::AcqRel)
    }

    #[inline]
    fn ensure_live(&self) -> Result<(), LockError> {
        if self.is_disposed() {
            Err(LockError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Runs `f` inside a shared section.
    ///
    /// If the calling thread is already inside a section of this coordinator
    /// (for instance a change handler reading the collection that notified it),
    /// the shared lock is taken recursively, which never waits on queued writers.
    ///
    /// # Errors
    ///
    /// Returns `LockError::Disposed` after [`dispose`](Self::dispose).
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> Result<R, LockError> {
        self.ensure_live()?;

        if SectionMarker::is_held(self.id) {
            let guard = self.state.read_recursive();
            return Ok(f(&guard));
        }

        let guard = self.state.read();
        let _marker = SectionMarker::enter(self.id);
        Ok(f(&guard))
    }

    /// Runs the check → mutate → notify pattern as one atomic unit.
    ///
    /// 1. Takes the intent (upgradable) lock and calls `decide`. Readers may
    ///    run concurrently; other writers wait.
    /// 2. On [`Step::Proceed`], upgrades to exclusive and hands the decided
    ///    value to `mutate`.
    /// 3. Downgrades back to the intent lock and hands whatever `mutate`
    ///    returned to `notify`.
    ///
    /// The intent lock is held from step 1 to the end of step 3, so the state
    /// `decide` observed is the state `mutate` changes, and no other writer can
    /// commit before `notify` has returned.
    ///
    /// If `decide` or `mutate` fails, the error is returned, `notify` is not
    /// called and every lock is released. `mutate` must validate before it
    /// changes anything.
    ///
    /// # Errors
    ///
    /// Returns `LockError::Reentrant` (converted into `E`) if the calling thread
    /// is already inside a section of this coordinator, `LockError::Disposed`
    /// after disposal, or whatever `decide` or `mutate` returned.
    pub fn read_then_write_then_read<P, Q, R, E>(
        &self,
        decide: impl FnOnce(&S) -> Result<Step<P, R>, E>,
        mutate: impl FnOnce(&mut S, P) -> Result<Q, E>,
        notify: impl FnOnce(&S, Q) -> R,
    ) -> Result<R, E>
    where
        E: From<LockError>,
    {
        self.ensure_live()?;
        if SectionMarker::is_held(self.id) {
            return Err(LockError::Reentrant.into());
        }

        let intent = self.state.upgradable_read();
        let _marker = SectionMarker::enter(self.id);

        let decided = match decide(&intent)? {
            Step::Proceed(decided) => decided,
            Step::Finish(result) => return Ok(result),
        };

        let mut exclusive = RwLockUpgradableReadGuard::upgrade(intent);
        let mutated = mutate(&mut exclusive, decided)?;

        let committed = RwLockWriteGuard::downgrade_to_upgradable(exclusive);
        Ok(notify(&committed, mutated))
    }

    /// Runs `f` inside a plain exclusive section.
    ///
    /// Reserved for changes with no observable effect; nothing is notified.
    ///
    /// # Errors
    ///
    /// Returns `LockError::Reentrant` from inside a section of this coordinator,
    /// `LockError::Disposed` after disposal.
    pub fn write<R>(&self, f: impl FnOnce(&mut S) -> R) -> Result<R, LockError> {
        self.ensure_live()?;
        if SectionMarker::is_held(self.id) {
            return Err(LockError::Reentrant);
        }

        let mut guard = self.state.write();
        let _marker = SectionMarker::enter(self.id);
        Ok(f(&mut guard))
    }
}

impl<S: Default> Default for LockCoordinator<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> std::fmt::Debug for LockCoordinator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockCoordinator")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}
