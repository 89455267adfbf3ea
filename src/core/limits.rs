/*!
 * Handoff Limits and Constants
 *
 * Centralized location for backoff thresholds and configuration names.
 *
 * ## Conventions
 * - Performance-critical constants are marked with [PERF]
 */

use std::time::Duration;

// =============================================================================
// BACKOFF
// =============================================================================

/// Tight-spin iterations before yielding (10 iterations)
/// [PERF] Covers waits below ~100ns with only a `spin_loop` hint
pub const DEFAULT_SPIN_LIMIT: u32 = 10;

/// Iteration at which yielding stops and sleeping starts (50 iterations)
/// [PERF] Good for 100ns-10µs waits
pub const DEFAULT_YIELD_LIMIT: u32 = 50;

/// First sleep in the sleep phase (1µs), doubled every iteration
pub const DEFAULT_INITIAL_SLEEP: Duration = Duration::from_micros(1);

/// Floor for the doubling sleep (1µs); a zero sleep never grows on its own
pub const MIN_BACKOFF_SLEEP: Duration = Duration::from_micros(1);

/// Upper bound for a single backoff sleep (1ms)
/// [PERF] Keeps claim latency under a millisecond once the payload lands
pub const DEFAULT_MAX_SLEEP: Duration = Duration::from_millis(1);

/// Low-latency preset: spin longer before yielding
pub const LOW_LATENCY_SPIN_LIMIT: u32 = 100;

/// Low-latency preset: yield longer before sleeping
pub const LOW_LATENCY_YIELD_LIMIT: u32 = 500;

/// Low-latency preset sleep cap (50µs)
pub const LOW_LATENCY_MAX_SLEEP: Duration = Duration::from_micros(50);

/// Long-wait preset sleep cap (10ms)
/// [PERF] Polling producers that rarely publish should not burn a core
pub const LONG_WAIT_MAX_SLEEP: Duration = Duration::from_millis(10);

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Environment variable holding a JSON `HandoffConfig`
pub const CONFIG_ENV_VAR: &str = "HANDOFF_CONFIG";

/// Environment variable switching tracing output to JSON
pub const TRACE_JSON_ENV_VAR: &str = "HANDOFF_TRACE_JSON";
