/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 *
 * Only contract breaches and bounded-wait expiry are reported through return
 * types. Deadlock (waiting on a gate nobody will ever signal) and ordering
 * violations on a raw flag are not detectable at runtime; the APIs are shaped
 * so that those mistakes are either impossible to express or documented at
 * the call site.
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// How a one-shot signal was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedAs {
    Value,
    Error,
}

impl fmt::Display for ResolvedAs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedAs::Value => f.write_str("value"),
            ResolvedAs::Error => f.write_str("error"),
        }
    }
}

/// A one-shot producer tried to resolve its signal a second time
///
/// The first resolution stays in place; this error only reports the rejected
/// attempt. It is fatal to the caller's logic and should be propagated.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[error("Broken contract: one-shot signal already resolved (previous outcome: {previous})")]
#[diagnostic(
    code(handoff::broken_contract),
    help("A one-shot signal can be resolved exactly once. Use a ConditionGate for repeated events.")
)]
pub struct BrokenContract {
    pub previous: ResolvedAs,
}

/// Errors observed by a one-shot consumer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError<E> {
    /// The producer resolved the signal with an error
    #[error("Producer failed: {0}")]
    Failed(E),

    /// The producer went away without resolving the signal
    #[error("Broken promise: producer dropped before resolving the signal")]
    BrokenPromise,

    /// The task driving the producer panicked
    #[error("Producer task panicked: {0}")]
    Panicked(String),
}

impl<E> SignalError<E> {
    /// Returns the producer's error, if that is what this is
    pub fn into_failure(self) -> Option<E> {
        match self {
            SignalError::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Bounded wait errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
pub enum WaitError {
    #[error("Wait timed out after {0:?}")]
    #[diagnostic(
        code(handoff::timeout),
        help("No producer signalled within the budget. Check that the producer is alive.")
    )]
    Timeout(Duration),
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("Malformed configuration: {0}")]
    #[diagnostic(
        code(handoff::config::malformed),
        help("Configuration must be a JSON object matching HandoffConfig.")
    )]
    Malformed(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(handoff::config::invalid))]
    Invalid(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Malformed(err.to_string())
    }
}

/// Unified handoff error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum HandoffError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    BrokenContract(#[from] BrokenContract),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Wait(#[from] WaitError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("Signal error: {0}")]
    #[diagnostic(code(handoff::signal))]
    Signal(String),
}

impl<E: fmt::Display> From<SignalError<E>> for HandoffError {
    fn from(err: SignalError<E>) -> Self {
        HandoffError::Signal(err.to_string())
    }
}

/// Result type for operations that mix handoff strategies
pub type HandoffResult<T> = Result<T, HandoffError>;
