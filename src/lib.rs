/*!
 * Thread Handoff Library
 *
 * Coordination primitives for handing a result or a readiness signal from one
 * thread to another, once or repeatedly, without races or missed wakeups.
 */

pub mod core;
pub mod monitoring;

// Re-exports
pub use crate::core::errors::{
    BrokenContract, ConfigError, HandoffError, HandoffResult, ResolvedAs, SignalError, WaitError,
};
pub use crate::core::sync::{
    spawn_signalled, AtomicFlagGate, Backoff, BackoffConfig, ConditionGate, Consumer,
    FlagClaimer, FlagPublisher, HandoffConfig, HandoffKind, HandoffProfile, OneShotSignal,
    Producer, SpawnedTask, WakeMode, WakeResult,
};
pub use monitoring::{init_tracing, WaitSpan};
