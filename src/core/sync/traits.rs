/*!
 * Handoff Vocabulary
 *
 * Shared types for wake semantics and the strategy-selection contract.
 *
 * # Choosing a Strategy
 *
 * | Event shape                          | Strategy        |
 * |--------------------------------------|-----------------|
 * | Happens exactly once (start, stop)   | `OneShotSignal` |
 * | Happens repeatedly, consumers block  | `ConditionGate` |
 * | Repeated, sub-millisecond, profiled  | `AtomicFlagGate`|
 *
 * The atomic flag is the fastest and the easiest to get wrong: payload
 * ordering mistakes around a raw flag are the most common source of
 * intermittent, non-reproducible bugs in this kind of code. It is only
 * recommended when the caller has measured that blocking is too slow.
 */

use serde::{Deserialize, Serialize};

/// How many blocked waiters a notify should wake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WakeMode {
    /// Wake a single waiter
    One,
    /// Wake every waiter
    All,
}

/// Result of a wake operation
///
/// Counts come from the condvar's own report of threads it unparked. A woken
/// thread may still find its predicate false and go back to sleep; use the
/// count for diagnostics, never for correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeResult {
    /// Woke N waiters (N >= 1)
    Woken(usize),
    /// No waiters were waiting
    NoWaiters,
}

impl WakeResult {
    /// Check if any waiters were woken
    #[inline(always)]
    pub fn is_woken(&self) -> bool {
        matches!(self, WakeResult::Woken(_))
    }

    /// Get number of woken waiters (0 if none)
    #[inline(always)]
    pub fn count(&self) -> usize {
        match self {
            WakeResult::Woken(n) => *n,
            WakeResult::NoWaiters => 0,
        }
    }
}

/// The three handoff strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffKind {
    /// Mutex + condvar over a predicate, signalled any number of times
    Condition,
    /// Single-use promise/future pair
    OneShot,
    /// Lock-free flag with a polled payload slot
    AtomicFlag,
}

/// What a caller knows about one communication channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HandoffProfile {
    /// The event fires more than once over the channel's lifetime
    pub repeatable: bool,
    /// Wake latency must stay below a millisecond
    pub latency_critical: bool,
    /// Profiling showed that blocking waits are the bottleneck
    pub profiled: bool,
}

impl HandoffProfile {
    /// A one-time event such as a start-up barrier or shutdown signal
    pub const fn one_time() -> Self {
        Self {
            repeatable: false,
            latency_critical: false,
            profiled: false,
        }
    }

    /// A repeated event with blocking consumers
    pub const fn repeated() -> Self {
        Self {
            repeatable: true,
            latency_critical: false,
            profiled: false,
        }
    }

    /// A repeated event whose measured wake latency is too high for blocking
    pub const fn hot_path() -> Self {
        Self {
            repeatable: true,
            latency_critical: true,
            profiled: true,
        }
    }
}

impl HandoffKind {
    /// Recommend a strategy for the given profile
    ///
    /// Defaults to the blocking strategies. The atomic flag is only chosen
    /// when the channel is repeatable, latency-critical, and profiled.
    pub fn recommend(profile: &HandoffProfile) -> Self {
        match (profile.repeatable, profile.latency_critical && profile.profiled) {
            (true, true) => HandoffKind::AtomicFlag,
            (true, false) => HandoffKind::Condition,
            (false, _) => HandoffKind::OneShot,
        }
    }

    /// Whether a consumer may block the calling thread
    pub fn blocks(&self) -> bool {
        !matches!(self, HandoffKind::AtomicFlag)
    }

    /// Whether the channel can be signalled more than once
    pub fn is_repeatable(&self) -> bool {
        !matches!(self, HandoffKind::OneShot)
    }

    /// Get strategy name for debugging
    pub fn name(&self) -> &'static str {
        match self {
            HandoffKind::Condition => "condition",
            HandoffKind::OneShot => "oneshot",
            HandoffKind::AtomicFlag => "atomic_flag",
        }
    }
}
