/*!
 * Atomic Flag Gate
 *
 * Lock-free handoff: a payload slot guarded by an `AtomicBool` used as a
 * release/acquire fence. The publisher writes the payload and then
 * release-stores `true`; the claimer acquire-loads `true`, takes the payload,
 * and release-stores `false` to hand the slot back.
 *
 * # Ordering Contract
 *
 * The payload is not atomic. It is safe only because:
 *
 * 1. The publisher writes the payload strictly before the release-store of
 *    `true`, and only while the flag reads `false`.
 * 2. The claimer reads the payload strictly after an acquire-load of `true`,
 *    and hands the slot back with a release-store of `false`.
 *
 * Swapping either pair (flag before payload, read before flag) is the
 * classic bug in this pattern and the single most common source of
 * intermittent, non-reproducible failures in code like this. The gate keeps
 * both orders inside its own methods so callers cannot get them wrong, and
 * the `&mut self` receivers on [`FlagPublisher`] and [`FlagClaimer`] keep it to
 * one publisher and one claimer. Nothing else may be shared through the flag
 * without an equivalent fence.
 *
 * # Reset Policy
 *
 * A successful claim resets the flag to `false` itself. There is no separate
 * reset operation.
 *
 * # When To Use
 *
 * Rarely. Claiming is a poll, not a block: [`FlagClaimer::poll_claim`] spins,
 * yields, and sleeps on a backoff, and never parks on a condvar. Default to a
 * `ConditionGate` or a `OneShotSignal` unless profiling shows that blocking
 * wake latency is the bottleneck. There is no failure channel either: carry a
 * `Result` in `V` if the consumer needs to see errors. A claimer polling a gate
 * whose publisher has gone away polls forever unless it uses
 * [`FlagClaimer::poll_claim_until`].
 */

use super::backoff::Backoff;
use super::config::BackoffConfig;
use crate::core::errors::WaitError;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

/// Shared core of a flag-gated handoff
///
/// Obtained only through [`AtomicFlagGate::channel`], which returns the two
/// capabilities that are allowed to touch the payload.
pub struct AtomicFlagGate<V> {
    ready: AtomicBool,
    payload: UnsafeCell<Option<V>>,
    backoff: BackoffConfig,
}

// SAFETY: the payload is only accessed by the single publisher while `ready`
// is false and by the single claimer while `ready` is true, with
// release/acquire pairs on every transition. `V: Send` is enough since a value
// is moved between threads, never shared.
unsafe impl<V: Send> Send for AtomicFlagGate<V> {}
unsafe impl<V: Send> Sync for AtomicFlagGate<V> {}

impl<V> AtomicFlagGate<V> {
    /// Create an empty gate with default backoff
    pub fn channel() -> (FlagPublisher<V>, FlagClaimer<V>) {
        Self::channel_with(BackoffConfig::default())
    }

    /// Create an empty gate whose blocking helpers use `backoff`
    pub fn channel_with(backoff: BackoffConfig) -> (FlagPublisher<V>, FlagClaimer<V>) {
        let gate = Arc::new(Self {
            ready: AtomicBool::new(false),
            payload: UnsafeCell::new(None),
            backoff,
        });
        (
            FlagPublisher { gate: gate.clone() },
            FlagClaimer { gate },
        )
    }

    /// Whether a published payload is waiting to be claimed
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

impl<V> std::fmt::Debug for AtomicFlagGate<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomicFlagGate")
            .field("ready", &self.is_ready())
            .field("backoff", &self.backoff)
            .finish()
    }
}

/// Write side of an [`AtomicFlagGate`]
#[derive(Debug)]
pub struct FlagPublisher<V> {
    gate: Arc<AtomicFlagGate<V>>,
}

impl<V> FlagPublisher<V> {
    /// Publish `value` if the previous round has been claimed
    ///
    /// Hands `value` back when the slot is still occupied.
    pub fn try_publish(&mut self, value: V) -> Result<(), V> {
        if self.gate.ready.load(Ordering::Acquire) {
            return Err(value);
        }

        // SAFETY: `ready` is false, so the claimer is not touching the slot,
        // and its release-store of false synchronized with the acquire-load
        // above, so its last read of the slot is complete.
        unsafe {
            *self.gate.payload.get() = Some(value);
        }
        self.gate.ready.store(true, Ordering::Release);
        trace!("Flag gate published");
        Ok(())
    }

    /// Publish `value`, backing off until the previous round is claimed
    pub fn publish(&mut self, value: V) {
        let mut backoff = Backoff::new(self.gate.backoff);
        let mut value = value;
        loop {
            match self.try_publish(value) {
                Ok(()) => return,
                Err(unclaimed) => {
                    value = unclaimed;
                    backoff.snooze();
                }
            }
        }
    }

    /// Whether the last published payload is still unclaimed
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.gate.is_ready()
    }
}

/// Read side of an [`AtomicFlagGate`]
#[derive(Debug)]
pub struct FlagClaimer<V> {
    gate: Arc<AtomicFlagGate<V>>,
}

impl<V> FlagClaimer<V> {
    /// Claim the payload if one is published, without blocking
    pub fn try_claim(&mut self) -> Option<V> {
        if !self.gate.ready.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: `ready` is true, so the publisher is not touching the slot,
        // and its release-store of true synchronized with the acquire-load
        // above, so the payload write is fully visible.
        let value = unsafe { (*self.gate.payload.get()).take() };
        self.gate.ready.store(false, Ordering::Release);
        trace!("Flag gate claimed");
        value
    }

    /// Poll until a payload is claimed, sleeping at most `max_backoff` per step
    ///
    /// This is a busy wait with backoff, never a blocking wait.
    pub fn poll_claim(&mut self, max_backoff: Duration) -> V {
        let mut backoff = Backoff::capped(max_backoff);
        loop {
            if let Some(value) = self.try_claim() {
                return value;
            }
            backoff.snooze();
        }
    }

    /// Poll with the gate's configured backoff until `deadline`
    pub fn poll_claim_until(&mut self, deadline: Instant) -> Result<V, WaitError> {
        let start = Instant::now();
        let mut backoff = Backoff::new(self.gate.backoff);
        loop {
            if let Some(value) = self.try_claim() {
                return Ok(value);
            }
            if Instant::now() >= deadline {
                return Err(WaitError::Timeout(deadline.saturating_duration_since(start)));
            }
            backoff.snooze_until(Some(deadline));
        }
    }

    /// Whether a published payload is waiting to be claimed
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }
}
