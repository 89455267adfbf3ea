/*!
 * Thread Handoff Primitives
 *
 * Three independent ways to hand a "ready" fact, plus an optional payload,
 * from a producer thread to consumer threads:
 * - `ConditionGate`: mutex + condvar over a predicate, repeatable, blocking
 * - `OneShotSignal`: single-use promise/future pair, blocking
 * - `AtomicFlagGate`: release/acquire flag over a payload slot, polling
 *
 * # Architecture
 *
 * Each strategy is an explicitly constructed, explicitly owned object handed
 * to both sides; none of them is a process-wide global. Where the type system
 * can express a rule (one producer per one-shot, one publisher and one claimer
 * per flag), it does. Pick exactly one strategy per channel; see
 * `HandoffKind::recommend`.
 *
 * # Blocking
 *
 * `ConditionGate::wait_until` and `Consumer::get` (while pending) are the only
 * calls that park the thread. Flag claiming never parks; `poll_claim` only
 * sleeps through its backoff.
 */

mod backoff;
mod condition;
mod config;
mod flag;
mod oneshot;
mod traits;

pub use backoff::Backoff;
pub use condition::ConditionGate;
pub use config::{BackoffConfig, HandoffConfig};
pub use flag::{AtomicFlagGate, FlagClaimer, FlagPublisher};
pub use oneshot::{spawn_signalled, Consumer, OneShotSignal, Producer, SpawnedTask};
pub use traits::{HandoffKind, HandoffProfile, WakeMode, WakeResult};
