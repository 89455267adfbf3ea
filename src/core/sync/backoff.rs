/*!
 * Adaptive Backoff with Exponential Sleep
 *
 * Used by every polling loop in the crate (claiming and publishing on an
 * `AtomicFlagGate`). Three phases:
 *
 * 1. **Tight spin phase** (`< spin_limit`): just `spin_loop()` hint
 * 2. **Yield phase** (`< yield_limit`): `yield_now()` every iteration
 * 3. **Sleep phase**: sleep, doubling from `initial_sleep` up to `max_sleep`
 *
 * A sleep step that rounds to zero (zero cap, or a deadline about to pass)
 * yields instead, so no phase degenerates into a hot loop.
 *
 * A poll loop built on this is still a busy wait; it only trades latency for
 * CPU once the wait gets long.
 */

use super::config::BackoffConfig;
use crate::core::limits::MIN_BACKOFF_SLEEP;
use std::thread;
use std::time::{Duration, Instant};

/// Stateful backoff for one polling loop
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    step: u32,
    sleep: Duration,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            step: 0,
            sleep: config.initial_sleep,
        }
    }

    /// Backoff with default phases, sleeping at most `max_sleep` per step
    pub fn capped(max_sleep: Duration) -> Self {
        let mut config = BackoffConfig::default().with_max_sleep(max_sleep);
        if config.initial_sleep > max_sleep {
            config.initial_sleep = max_sleep;
        }
        Self::new(config)
    }

    /// Iterations performed since creation or the last reset
    #[inline]
    pub fn step(&self) -> u32 {
        self.step
    }

    /// Whether the backoff has reached the sleep phase
    #[inline]
    pub fn is_sleeping(&self) -> bool {
        self.step >= self.config.yield_limit
    }

    pub fn reset(&mut self) {
        self.step = 0;
        self.sleep = self.config.initial_sleep;
    }

    /// Wait for one backoff step
    pub fn snooze(&mut self) {
        self.snooze_until(None);
    }

    /// Wait for one backoff step, never sleeping past `deadline`
    pub fn snooze_until(&mut self, deadline: Option<Instant>) {
        if self.step < self.config.spin_limit {
            std::hint::spin_loop();
        } else if self.step < self.config.yield_limit {
            thread::yield_now();
        } else {
            let mut nap = self.sleep;
            if let Some(deadline) = deadline {
                nap = nap.min(deadline.saturating_duration_since(Instant::now()));
            }
            if nap.is_zero() {
                thread::yield_now();
            } else {
                thread::sleep(nap);
            }
            self.sleep = self
                .sleep
                .saturating_mul(2)
                .max(MIN_BACKOFF_SLEEP)
                .min(self.config.max_sleep);
        }
        self.step = self.step.saturating_add(1);
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}
