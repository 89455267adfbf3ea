/*!
 * One-Shot Signal
 *
 * Single-use promise/future pair. The producer resolves the shared slot with
 * a value or an error exactly once; any number of consumers block until then
 * and afterwards all observe the same resolution.
 *
 * # Capabilities
 *
 * - [`Producer`] is not `Clone`: there is exactly one per signal, enforced by
 *   ownership. Resolving it a second time returns [`BrokenContract`] and
 *   leaves the first resolution untouched.
 * - [`Consumer`] is `Clone` and can be handed to as many threads as needed.
 * - Dropping the producer while the slot is still pending resolves consumers
 *   with [`SignalError::BrokenPromise`] instead of leaving them blocked.
 *
 * # Limitations
 *
 * `Consumer::get` has no timeout. A producer that stays alive but never
 * resolves keeps its consumers blocked; this is a documented limitation, not
 * a defect. Use `try_get` to poll, or a `ConditionGate` when a bounded wait is
 * needed.
 *
 * Compared to a `ConditionGate<bool>`, this cannot be signalled twice and the
 * consumer never re-checks a predicate, which makes it the right choice for
 * start-up barriers and shutdown signals.
 */

use crate::core::errors::{BrokenContract, ResolvedAs, SignalError};
use parking_lot::{Condvar, Mutex};
use std::convert::Infallible;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

enum Slot<V, E> {
    Pending,
    Ready(V),
    Failed(E),
    Abandoned,
    Panicked(String),
}

impl<V: Clone, E: Clone> Slot<V, E> {
    fn outcome(&self) -> Option<Result<V, SignalError<E>>> {
        match self {
            Slot::Pending => None,
            Slot::Ready(v) => Some(Ok(v.clone())),
            Slot::Failed(e) => Some(Err(SignalError::Failed(e.clone()))),
            Slot::Abandoned => Some(Err(SignalError::BrokenPromise)),
            Slot::Panicked(msg) => Some(Err(SignalError::Panicked(msg.clone()))),
        }
    }
}

impl<V, E> Slot<V, E> {
    fn resolved_as(&self) -> Option<ResolvedAs> {
        match self {
            Slot::Pending => None,
            Slot::Ready(_) => Some(ResolvedAs::Value),
            _ => Some(ResolvedAs::Error),
        }
    }
}

struct Shared<V, E> {
    slot: Mutex<Slot<V, E>>,
    resolved: Condvar,
}

impl<V, E> Shared<V, E> {
    /// Transition `Pending -> slot`, then wake every consumer
    fn resolve(&self, slot: Slot<V, E>) -> Result<(), BrokenContract> {
        {
            let mut guard = self.slot.lock();
            if let Some(previous) = guard.resolved_as() {
                return Err(BrokenContract { previous });
            }
            *guard = slot;
        }
        self.resolved.notify_all();
        Ok(())
    }
}

/// Single-use signal carrying a `V` or an `E`
///
/// # Example
///
/// ```
/// use thread_handoff::core::sync::OneShotSignal;
/// use std::thread;
///
/// let signal = OneShotSignal::<u32>::new();
/// let consumer = signal.consumer();
/// let producer = signal.producer();
///
/// let reader = thread::spawn(move || consumer.get());
/// producer.set(42).unwrap();
/// assert_eq!(reader.join().unwrap(), Ok(42));
/// ```
pub struct OneShotSignal<V, E = Infallible> {
    shared: Arc<Shared<V, E>>,
}

impl<V, E> OneShotSignal<V, E> {
    /// Create a pending signal
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot::Pending),
                resolved: Condvar::new(),
            }),
        }
    }

    /// Create a pending signal and split it into its two capabilities
    pub fn channel() -> (Producer<V, E>, Consumer<V, E>) {
        let signal = Self::new();
        let consumer = signal.consumer();
        (signal.producer(), consumer)
    }

    /// Get a consumer capability; may be called any number of times
    pub fn consumer(&self) -> Consumer<V, E> {
        Consumer {
            shared: self.shared.clone(),
        }
    }

    /// Turn the signal into its single producer capability
    pub fn producer(self) -> Producer<V, E> {
        Producer {
            shared: self.shared,
        }
    }
}

impl<V, E> Default for OneShotSignal<V, E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Write side of a [`OneShotSignal`]
pub struct Producer<V, E = Infallible> {
    shared: Arc<Shared<V, E>>,
}

impl<V, E> Producer<V, E> {
    /// Resolve the signal with a value
    pub fn set(&self, value: V) -> Result<(), BrokenContract> {
        self.resolve(Slot::Ready(value))
    }

    /// Resolve the signal with an error every consumer will observe
    pub fn set_error(&self, error: E) -> Result<(), BrokenContract> {
        self.resolve(Slot::Failed(error))
    }

    /// Whether the signal has already been resolved
    pub fn is_resolved(&self) -> bool {
        self.shared.slot.lock().resolved_as().is_some()
    }

    fn resolve(&self, slot: Slot<V, E>) -> Result<(), BrokenContract> {
        match self.shared.resolve(slot) {
            Ok(()) => {
                debug!("One-shot signal resolved");
                Ok(())
            }
            Err(err) => {
                warn!(previous = %err.previous, "Rejected second resolution of one-shot signal");
                Err(err)
            }
        }
    }
}

impl<V, E> Drop for Producer<V, E> {
    fn drop(&mut self) {
        if self.shared.resolve(Slot::Abandoned).is_ok() {
            warn!("One-shot producer dropped while pending; consumers see a broken promise");
        }
    }
}

/// Read side of a [`OneShotSignal`]
pub struct Consumer<V, E = Infallible> {
    shared: Arc<Shared<V, E>>,
}

impl<V, E> Clone for Consumer<V, E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<V: Clone, E: Clone> Consumer<V, E> {
    /// Block until the signal resolves, then return a copy of its outcome
    ///
    /// Once resolved, every call returns immediately with the same outcome.
    pub fn get(&self) -> Result<V, SignalError<E>> {
        let mut guard = self.shared.slot.lock();
        loop {
            if let Some(outcome) = guard.outcome() {
                return outcome;
            }
            self.shared.resolved.wait(&mut guard);
        }
    }

    /// Return the outcome if resolved, without blocking
    pub fn try_get(&self) -> Option<Result<V, SignalError<E>>> {
        self.shared.slot.lock().outcome()
    }
}

impl<V, E> Consumer<V, E> {
    /// Block until the signal resolves, discarding the outcome
    pub fn wait(&self) {
        let mut guard = self.shared.slot.lock();
        while guard.resolved_as().is_none() {
            self.shared.resolved.wait(&mut guard);
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.shared.slot.lock().resolved_as().is_some()
    }
}

/// A named worker thread whose outcome resolves a one-shot signal
pub struct SpawnedTask<V, E = Infallible> {
    consumer: Consumer<V, E>,
    handle: JoinHandle<()>,
}

impl<V, E> SpawnedTask<V, E> {
    /// Consumer observing the task's outcome; clone it for other threads
    pub fn consumer(&self) -> &Consumer<V, E> {
        &self.consumer
    }

    pub fn thread_name(&self) -> Option<&str> {
        self.handle.thread().name()
    }
}

impl<V: Clone, E: Clone> SpawnedTask<V, E> {
    /// Wait for the outcome and reap the thread
    pub fn join(self) -> Result<V, SignalError<E>> {
        let outcome = self.consumer.get();
        let name = self.handle.thread().name().map(str::to_owned);
        if let Err(payload) = self.handle.join() {
            warn!(
                task = name.as_deref().unwrap_or("<unnamed>"),
                panic = %panic_message(payload.as_ref()),
                "Signalled task thread panicked outside its body"
            );
        }
        outcome
    }
}

/// Run `task` on a named thread and resolve a one-shot signal with its outcome
///
/// A panic inside `task` resolves the signal with [`SignalError::Panicked`].
pub fn spawn_signalled<V, E, F>(
    name: impl Into<String>,
    task: F,
) -> std::io::Result<SpawnedTask<V, E>>
where
    V: Send + 'static,
    E: Send + 'static,
    F: FnOnce() -> Result<V, E> + Send + 'static,
{
    let name = name.into();
    let (producer, consumer) = OneShotSignal::channel();

    let handle = thread::Builder::new().name(name.clone()).spawn(move || {
        let resolution = match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(Ok(value)) => producer.set(value),
            Ok(Err(error)) => producer.set_error(error),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(task = %name, panic = %message, "Signalled task panicked");
                producer.resolve(Slot::Panicked(message))
            }
        };
        debug_assert!(resolution.is_ok(), "fresh producer cannot be resolved twice");
    })?;

    Ok(SpawnedTask { consumer, handle })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
