/*!
 * Condition Gate
 *
 * Monitor over a piece of state: a `parking_lot::Mutex` guarding `S` paired
 * with a `parking_lot::Condvar`. Producers mutate the state through
 * [`ConditionGate::notify`]; consumers block in [`ConditionGate::wait_until`]
 * until a predicate over the state holds. The gate can be signalled any
 * number of times.
 *
 * # Invariants
 *
 * - The state is only read or written while the mutex is held. There is no
 *   accessor that hands out `&mut S` outside a closure run under the lock.
 * - A wake is issued only after the mutation is committed and the guard is
 *   dropped.
 * - Every wait re-checks its predicate before the first sleep and after every
 *   wake, so a notify issued before the waiter arrives is never lost and a
 *   spurious wakeup never returns early.
 *
 * # Liveness
 *
 * [`ConditionGate::wait_until`] has no deadline. If no producer ever makes the
 * predicate true, the waiter blocks forever; that deadlock is not detected.
 * Callers that need a liveness guarantee use
 * [`ConditionGate::wait_until_timeout`].
 *
 * # Sharing
 *
 * Construct the gate before spawning threads and hand each party an
 * `Arc<ConditionGate<S>>`; the gate lives as long as its last reference.
 */

use super::traits::{WakeMode, WakeResult};
use crate::core::errors::WaitError;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::trace;

/// Repeatable monitor-based handoff
///
/// # Example
///
/// ```
/// use thread_handoff::core::sync::{ConditionGate, WakeMode};
/// use std::sync::Arc;
/// use std::thread;
///
/// let gate = Arc::new(ConditionGate::new(false));
/// let waiter = {
///     let gate = gate.clone();
///     thread::spawn(move || gate.wait_until(|ready| *ready))
/// };
///
/// gate.notify(|ready| *ready = true, WakeMode::All);
/// waiter.join().unwrap();
/// ```
pub struct ConditionGate<S> {
    state: Mutex<S>,
    condvar: Condvar,
    waiters: AtomicUsize,
}

impl<S> ConditionGate<S> {
    /// Create a gate around an initial state
    pub const fn new(state: S) -> Self {
        Self {
            state: Mutex::new(state),
            condvar: Condvar::new(),
            waiters: AtomicUsize::new(0),
        }
    }

    /// Block until `predicate` holds for the guarded state
    pub fn wait_until<P>(&self, predicate: P)
    where
        P: FnMut(&S) -> bool,
    {
        self.wait_until_with(predicate, |_| ())
    }

    /// Block until `predicate` holds, then run `f` on the state under the same lock
    ///
    /// `f` observes exactly the state that satisfied the predicate.
    pub fn wait_until_with<P, F, R>(&self, mut predicate: P, f: F) -> R
    where
        P: FnMut(&S) -> bool,
        F: FnOnce(&S) -> R,
    {
        let mut guard = self.state.lock();
        if !predicate(&*guard) {
            self.waiters.fetch_add(1, Ordering::Relaxed);
            while !predicate(&*guard) {
                self.condvar.wait(&mut guard);
            }
            self.waiters.fetch_sub(1, Ordering::Relaxed);
        }
        f(&*guard)
    }

    /// Block until `predicate` holds or `timeout` elapses
    ///
    /// The budget is measured against a fixed deadline, so spurious wakeups do
    /// not extend it. A predicate that becomes true exactly at the deadline
    /// still counts as success.
    pub fn wait_until_timeout<P>(
        &self,
        mut predicate: P,
        timeout: Duration,
    ) -> Result<(), WaitError>
    where
        P: FnMut(&S) -> bool,
    {
        let deadline = Instant::now().checked_add(timeout);
        let mut guard = self.state.lock();
        if predicate(&*guard) {
            return Ok(());
        }

        self.waiters.fetch_add(1, Ordering::Relaxed);
        let result = loop {
            let timed_out = match deadline {
                Some(deadline) => self.condvar.wait_until(&mut guard, deadline).timed_out(),
                // Deadline overflowed Instant: treat as unbounded
                None => {
                    self.condvar.wait(&mut guard);
                    false
                }
            };

            if predicate(&*guard) {
                break Ok(());
            }
            if timed_out {
                break Err(WaitError::Timeout(timeout));
            }
        };
        self.waiters.fetch_sub(1, Ordering::Relaxed);
        result
    }

    /// Mutate the state under the lock, release it, then wake waiters
    ///
    /// Returns the number of waiters the condvar reported as woken.
    pub fn notify<M>(&self, mutator: M, mode: WakeMode) -> WakeResult
    where
        M: FnOnce(&mut S),
    {
        {
            let mut guard = self.state.lock();
            mutator(&mut *guard);
        }

        let result = match mode {
            WakeMode::One => {
                if self.condvar.notify_one() {
                    WakeResult::Woken(1)
                } else {
                    WakeResult::NoWaiters
                }
            }
            WakeMode::All => match self.condvar.notify_all() {
                0 => WakeResult::NoWaiters,
                n => WakeResult::Woken(n),
            },
        };
        trace!(?mode, woken = result.count(), "Condition gate notified");
        result
    }

    /// Run `f` on the state under the lock without waiting
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        f(&*self.state.lock())
    }

    /// Get approximate count of blocked waiters (for diagnostics)
    #[inline]
    pub fn waiter_count(&self) -> usize {
        self.waiters.load(Ordering::Relaxed)
    }

    /// Consume the gate and return the state
    pub fn into_inner(self) -> S {
        self.state.into_inner()
    }
}

impl<S: Default> Default for ConditionGate<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for ConditionGate<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionGate")
            .field("state", &*self.state.lock())
            .field("waiters", &self.waiter_count())
            .finish()
    }
}
