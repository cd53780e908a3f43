//! State store key layout for the lock lease record.
//!
//! Every `LeaseState` field persists under its own etcd-style key so the
//! store contract stays "keys and defaults are exactly the state fields".

/// Prefix under which all lock lease fields live.
pub const LOCK_KEY_PREFIX: &str = "/registry/lock/";

/// Logical resource namespace being claimed (e.g. a table name).
pub const KEY_MODULE: &str = "/registry/lock/module";

/// Identity of the claimed record.
pub const KEY_RECORD_ID: &str = "/registry/lock/record_id";

/// Identity of the claimant.
pub const KEY_USER_ID: &str = "/registry/lock/user_id";

/// Virtual instant at which the current grace period expires.
pub const KEY_DEADLINE_MS: &str = "/registry/lock/deadline_ms";

/// Whether the lease loop is currently active.
pub const KEY_LOOP_RUNNING: &str = "/registry/lock/loop_running";

/// Minimum spacing between heartbeats.
pub const KEY_HEARTBEAT_PERIOD_MS: &str = "/registry/lock/heartbeat_period_ms";

/// Virtual time of the last successful heartbeat.
pub const KEY_LAST_HEARTBEAT_AT_MS: &str = "/registry/lock/last_heartbeat_at_ms";

/// True once the expiry modal has been triggered for the current arm period.
pub const KEY_MODAL_SHOWN: &str = "/registry/lock/modal_shown";

/// Externally observable open-the-modal signal.
pub const KEY_SHOULD_OPEN_MODAL: &str = "/registry/lock/should_open_modal";

/// Last-computed countdown value, cached for display.
pub const KEY_SECONDS_LEFT: &str = "/registry/lock/seconds_left";

/// Grace-period length used when (re)arming, in minutes.
pub const KEY_PROMPT_MINUTES: &str = "/registry/lock/prompt_minutes";

/// The externally injected virtual clock.
pub const KEY_CLOCK_NOW_MS: &str = "/registry/lock/clock_now_ms";
