//! Lease timing defaults.

/// Grace period applied when (re)arming a lease, in minutes.
pub const DEFAULT_PROMPT_MINUTES: f64 = 1.0;

/// Minimum spacing between heartbeats, in virtual milliseconds.
pub const DEFAULT_HEARTBEAT_PERIOD_MS: i64 = 10_000;

/// How far the clock feed advances virtual time on each interval tick.
pub const DEFAULT_CLOCK_STEP_MS: i64 = 1_000;
