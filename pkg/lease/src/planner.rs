//! Pure per-tick decision logic.
//!
//! Two postures on purpose: [`plan`] is lenient and never fails (it runs in
//! a user-facing loop where crashing is worse than self-correcting), while
//! [`plan_strict`] fails fast on garbage inputs: a caller that supplies a
//! non-finite timestamp has a programming bug, not a transient data problem.

use thiserror::Error;

use pkg_constants::lease::DEFAULT_HEARTBEAT_PERIOD_MS;
use pkg_types::plan::TickPlan;

use crate::time;

/// Invalid timing input handed to [`plan_strict`]. One variant per
/// offending argument; these propagate uncaught.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TickError {
    #[error("tick planned with a non-finite now")]
    InvalidNow,
    #[error("tick planned with a non-finite deadline")]
    InvalidDeadline,
    #[error("tick planned with a non-finite last-heartbeat")]
    InvalidLastHeartbeat,
    #[error("tick planned with a non-finite or non-positive heartbeat period")]
    InvalidPeriod,
}

/// Decide what this tick should do.
///
/// The expiry signal fires at most once per arm period: once `modal_shown`
/// is set, repeated ticks past the deadline stay quiet until a rearm.
/// Heartbeat eligibility is independent of the countdown: the claim keeps
/// proving liveness to the server even while the user-facing countdown runs
/// to zero. A non-positive period falls back to the default rather than
/// firing on every tick.
pub fn plan(
    now_ms: i64,
    deadline_ms: i64,
    modal_shown: bool,
    loop_running: bool,
    last_heartbeat_at_ms: i64,
    heartbeat_period_ms: i64,
) -> TickPlan {
    let period = if heartbeat_period_ms > 0 {
        heartbeat_period_ms
    } else {
        DEFAULT_HEARTBEAT_PERIOD_MS
    };
    let seconds_left = time::seconds_left(deadline_ms, now_ms);

    TickPlan {
        now_ms,
        seconds_left,
        should_open_modal: seconds_left <= 0 && !modal_shown,
        should_heartbeat: loop_running && time::due_since(now_ms, last_heartbeat_at_ms, period),
    }
}

/// Strict variant of [`plan`] over raw numeric inputs.
///
/// Validates that `now_ms`, `deadline_ms` and `last_heartbeat_at_ms` are
/// finite and that `heartbeat_period_ms` is finite and positive; the first
/// violation is returned as its own [`TickError`]. Takes only the four
/// timing inputs, so the expiry signal here is simply "the countdown hit
/// zero"; the once-per-arm-period bookkeeping belongs to the stateful
/// layer.
pub fn plan_strict(
    now_ms: f64,
    deadline_ms: f64,
    last_heartbeat_at_ms: f64,
    heartbeat_period_ms: f64,
) -> Result<TickPlan, TickError> {
    if !now_ms.is_finite() {
        return Err(TickError::InvalidNow);
    }
    if !deadline_ms.is_finite() {
        return Err(TickError::InvalidDeadline);
    }
    if !last_heartbeat_at_ms.is_finite() {
        return Err(TickError::InvalidLastHeartbeat);
    }
    if !heartbeat_period_ms.is_finite() || heartbeat_period_ms <= 0.0 {
        return Err(TickError::InvalidPeriod);
    }

    // comparisons stay in the float domain so fractional inputs behave
    let ms_left = (deadline_ms - now_ms).max(0.0);
    let seconds_left = (ms_left / 1000.0).ceil() as i64;

    Ok(TickPlan {
        now_ms: now_ms as i64,
        seconds_left,
        should_open_modal: seconds_left <= 0,
        should_heartbeat: (now_ms - last_heartbeat_at_ms) >= heartbeat_period_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_before_deadline_stays_quiet() {
        let p = plan(59_000, 60_000, false, true, 0, 10_000);
        assert_eq!(p.seconds_left, 1);
        assert!(!p.should_open_modal);
    }

    #[test]
    fn expiry_signal_fires_once_per_arm_period() {
        // first tick at the deadline fires
        let p = plan(60_000, 60_000, false, true, 0, 10_000);
        assert_eq!(p.seconds_left, 0);
        assert!(p.should_open_modal);

        // repeated ticks after the modal was shown do not re-trigger
        let p = plan(61_000, 60_000, true, true, 0, 10_000);
        assert_eq!(p.seconds_left, 0);
        assert!(!p.should_open_modal);
    }

    #[test]
    fn heartbeat_due_at_exact_period_boundary() {
        let p = plan(9_999, 60_000, false, true, 0, 10_000);
        assert!(!p.should_heartbeat);

        let p = plan(10_000, 60_000, false, true, 0, 10_000);
        assert!(p.should_heartbeat);
    }

    #[test]
    fn heartbeat_is_independent_of_countdown() {
        // lease expired, modal already shown, and the claim still heartbeats
        let p = plan(120_000, 60_000, true, true, 100_000, 10_000);
        assert_eq!(p.seconds_left, 0);
        assert!(p.should_heartbeat);
    }

    #[test]
    fn stopped_loop_never_heartbeats() {
        let p = plan(120_000, 60_000, false, false, 0, 10_000);
        assert!(!p.should_heartbeat);
    }

    #[test]
    fn non_positive_period_falls_back_to_default() {
        // period 0 must not fire on every tick
        let p = plan(5_000, 60_000, false, true, 0, 0);
        assert!(!p.should_heartbeat);

        let p = plan(10_000, 60_000, false, true, 0, -5);
        assert!(p.should_heartbeat);
    }

    #[test]
    fn strict_rejects_each_bad_argument_distinctly() {
        assert_eq!(
            plan_strict(f64::NAN, 60_000.0, 0.0, 10_000.0),
            Err(TickError::InvalidNow)
        );
        assert_eq!(
            plan_strict(0.0, f64::INFINITY, 0.0, 10_000.0),
            Err(TickError::InvalidDeadline)
        );
        assert_eq!(
            plan_strict(0.0, 60_000.0, f64::NAN, 10_000.0),
            Err(TickError::InvalidLastHeartbeat)
        );
        assert_eq!(
            plan_strict(0.0, 60_000.0, 0.0, f64::NAN),
            Err(TickError::InvalidPeriod)
        );
        assert_eq!(
            plan_strict(0.0, 60_000.0, 0.0, 0.0),
            Err(TickError::InvalidPeriod)
        );
        assert_eq!(
            plan_strict(0.0, 60_000.0, 0.0, -1.0),
            Err(TickError::InvalidPeriod)
        );
    }

    #[test]
    fn strict_plan_matches_the_lenient_math() {
        let p = plan_strict(59_000.0, 60_000.0, 50_000.0, 10_000.0).unwrap();
        assert_eq!(p.now_ms, 59_000);
        assert_eq!(p.seconds_left, 1);
        assert!(!p.should_open_modal);
        assert!(!p.should_heartbeat);

        let p = plan_strict(60_000.0, 60_000.0, 50_000.0, 10_000.0).unwrap();
        assert_eq!(p.seconds_left, 0);
        assert!(p.should_open_modal);
        assert!(p.should_heartbeat);
    }
}
