use serde::{Deserialize, Serialize};

use pkg_constants::lease::{DEFAULT_HEARTBEAT_PERIOD_MS, DEFAULT_PROMPT_MINUTES};

// --- Lease record ---

/// One soft record-lock claim: identity, deadline, heartbeat bookkeeping,
/// and modal flags. Owned by the claiming session, not shared across
/// sessions. All timestamps live in the virtual-clock millisecond domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseState {
    /// Logical resource namespace (e.g. a table name).
    #[serde(default)]
    pub module: Option<String>,
    /// Identity of the claimed record.
    #[serde(default)]
    pub record_id: Option<i64>,
    /// Identity of the claimant.
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Virtual instant at which the current grace period expires.
    #[serde(default)]
    pub deadline_ms: i64,
    /// Whether the lease loop is currently active.
    #[serde(default)]
    pub loop_running: bool,
    /// Minimum spacing between heartbeats.
    #[serde(default = "default_heartbeat_period_ms")]
    pub heartbeat_period_ms: i64,
    /// Virtual time of the last successful heartbeat.
    #[serde(default)]
    pub last_heartbeat_at_ms: i64,
    /// True once the expiry modal has been triggered for the current arm
    /// period. Only a rearm resets it.
    #[serde(default)]
    pub modal_shown: bool,
    /// Externally observable open-the-modal signal. Mirrors `modal_shown`
    /// but can be raised/cleared independently for manual signaling.
    #[serde(default)]
    pub should_open_modal: bool,
    /// Last-computed countdown value, cached for display.
    #[serde(default)]
    pub seconds_left: i64,
    /// Grace-period length used when (re)arming, in minutes.
    #[serde(default = "default_prompt_minutes")]
    pub prompt_minutes: f64,
    /// The externally injected virtual clock. Never the system clock.
    #[serde(default)]
    pub clock_now_ms: i64,
}

fn default_heartbeat_period_ms() -> i64 {
    DEFAULT_HEARTBEAT_PERIOD_MS
}

fn default_prompt_minutes() -> f64 {
    DEFAULT_PROMPT_MINUTES
}

impl Default for LeaseState {
    fn default() -> Self {
        Self {
            module: None,
            record_id: None,
            user_id: None,
            deadline_ms: 0,
            loop_running: false,
            heartbeat_period_ms: DEFAULT_HEARTBEAT_PERIOD_MS,
            last_heartbeat_at_ms: 0,
            modal_shown: false,
            should_open_modal: false,
            seconds_left: 0,
            prompt_minutes: DEFAULT_PROMPT_MINUTES,
            clock_now_ms: 0,
        }
    }
}

impl LeaseState {
    /// Check if the grace period has run out at the given virtual time.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.deadline_ms
    }

    /// Derive the lifecycle phase at the given virtual time.
    pub fn phase(&self, now_ms: i64) -> LeasePhase {
        if !self.loop_running {
            LeasePhase::Idle
        } else if self.modal_shown {
            LeasePhase::ModalShown
        } else if self.is_expired(now_ms) {
            LeasePhase::Expiring
        } else {
            LeasePhase::Armed
        }
    }

    /// Read-only identity snapshot of the claim.
    pub fn context(&self) -> LeaseContext {
        LeaseContext {
            module: self.module.clone(),
            record_id: self.record_id,
            user_id: self.user_id,
        }
    }
}

// --- Lifecycle phase ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LeasePhase {
    /// No active claim.
    Idle,
    /// Deadline set, countdown running, modal not yet shown.
    Armed,
    /// Countdown hit zero, modal not yet shown.
    Expiring,
    /// Expiry signaled to the user; waiting for renew or release.
    ModalShown,
}

impl std::fmt::Display for LeasePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeasePhase::Idle => write!(f, "Idle"),
            LeasePhase::Armed => write!(f, "Armed"),
            LeasePhase::Expiring => write!(f, "Expiring"),
            LeasePhase::ModalShown => write!(f, "ModalShown"),
        }
    }
}

// --- Claim identity ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaseContext {
    pub module: Option<String>,
    pub record_id: Option<i64>,
    pub user_id: Option<i64>,
}

// --- Start options ---

/// Caller-supplied overrides when starting a claim. `None` leaves the
/// stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartOptions {
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub record_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub heartbeat_period_ms: Option<i64>,
    #[serde(default)]
    pub prompt_minutes: Option<f64>,
    /// Virtual time to arm from; defaults to the stored clock.
    #[serde(default)]
    pub now_ms: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_state(loop_running: bool, modal_shown: bool, deadline_ms: i64) -> LeaseState {
        LeaseState {
            loop_running,
            modal_shown,
            deadline_ms,
            ..LeaseState::default()
        }
    }

    #[test]
    fn defaults_match_install_table() {
        let s = LeaseState::default();
        assert_eq!(s.prompt_minutes, 1.0);
        assert_eq!(s.heartbeat_period_ms, 10_000);
        assert!(!s.loop_running);
        assert!(!s.modal_shown);
        assert!(!s.should_open_modal);
        assert_eq!(s.deadline_ms, 0);
        assert_eq!(s.seconds_left, 0);
        assert_eq!(s.clock_now_ms, 0);
        assert_eq!(s.module, None);
    }

    #[test]
    fn phase_transitions() {
        assert_eq!(make_state(false, false, 60_000).phase(0), LeasePhase::Idle);
        assert_eq!(make_state(true, false, 60_000).phase(0), LeasePhase::Armed);
        assert_eq!(
            make_state(true, false, 60_000).phase(60_000),
            LeasePhase::Expiring
        );
        assert_eq!(
            make_state(true, true, 60_000).phase(61_000),
            LeasePhase::ModalShown
        );
    }

    #[test]
    fn stopped_lease_reads_idle_even_after_expiry() {
        let s = make_state(false, true, 1_000);
        assert_eq!(s.phase(5_000), LeasePhase::Idle);
    }
}
