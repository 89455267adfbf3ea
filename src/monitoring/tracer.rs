/*!
 * Handoff Tracing
 * Structured tracing for blocking handoff waits using the tracing crate
 *
 * Features:
 * - JSON-formatted logs for structured parsing
 * - Wait spans that report how long a consumer was blocked
 * - Slow-wait warnings
 */

use crate::core::limits::TRACE_JSON_ENV_VAR;
use crate::core::sync::HandoffKind;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Waits longer than this are reported at warn level
const SLOW_WAIT_THRESHOLD: Duration = Duration::from_millis(10);

static NEXT_WAIT_ID: AtomicU64 = AtomicU64::new(1);

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - HANDOFF_TRACE_JSON: Enable JSON output (default: false)
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(TRACE_JSON_ENV_VAR)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "Handoff tracing initialized");
    }
}

/// Span covering one consumer wait on a handoff primitive
///
/// Create it right before blocking; dropping it records the wait duration.
pub struct WaitSpan {
    span: tracing::Span,
    start: Instant,
    kind: HandoffKind,
    wait_id: u64,
}

impl WaitSpan {
    pub fn new(kind: HandoffKind) -> Self {
        let wait_id = NEXT_WAIT_ID.fetch_add(1, Ordering::Relaxed);
        let span = span!(
            Level::DEBUG,
            "handoff_wait",
            wait_id = wait_id,
            strategy = kind.name(),
            duration_us = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            kind,
            wait_id,
        }
    }

    pub fn wait_id(&self) -> u64 {
        self.wait_id
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for WaitSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        if duration > SLOW_WAIT_THRESHOLD {
            warn!(
                wait_id = self.wait_id,
                strategy = self.kind.name(),
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow handoff wait"
            );
        } else {
            debug!(
                wait_id = self.wait_id,
                strategy = self.kind.name(),
                duration_us = duration.as_micros() as u64,
                "handoff wait completed"
            );
        }
    }
}
