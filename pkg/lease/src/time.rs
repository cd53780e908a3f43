//! Numeric coercion and millisecond arithmetic.
//!
//! Everything here degrades to a safe default instead of failing; the
//! strict validation lives in the planner.

use pkg_constants::lease::DEFAULT_PROMPT_MINUTES;

/// Coerce to a finite number, falling back to `default`.
pub fn finite_or(value: f64, default: f64) -> f64 {
    if value.is_finite() { value } else { default }
}

/// Read a number out of an untyped store value. Absent, non-numeric, and
/// non-finite values all collapse to `default`.
pub fn json_num_or(value: Option<&serde_json::Value>, default: f64) -> f64 {
    value
        .and_then(serde_json::Value::as_f64)
        .filter(|n| n.is_finite())
        .unwrap_or(default)
}

/// Milliseconds from `now_ms` until `deadline_ms`, clamped at zero.
pub fn millis_until(deadline_ms: i64, now_ms: i64) -> i64 {
    deadline_ms.saturating_sub(now_ms).max(0)
}

/// Whole seconds until the deadline, rounded up. Never negative.
pub fn seconds_left(deadline_ms: i64, now_ms: i64) -> i64 {
    (millis_until(deadline_ms, now_ms) as u64).div_ceil(1000) as i64
}

/// True once at least `period_ms` has elapsed since `last_ms`.
pub fn due_since(now_ms: i64, last_ms: i64, period_ms: i64) -> bool {
    now_ms.saturating_sub(last_ms) >= period_ms
}

/// Deadline for a grace period of `prompt_minutes` starting at `now_ms`.
/// Minutes may be fractional; non-finite values fall back to the default
/// and negatives clamp to zero.
pub fn deadline_from_prompt(now_ms: i64, prompt_minutes: f64) -> i64 {
    let minutes = finite_or(prompt_minutes, DEFAULT_PROMPT_MINUTES).max(0.0);
    now_ms.saturating_add((minutes * 60_000.0).round() as i64)
}

/// Render a countdown as `MM:SS`, clamped at zero.
pub fn format_mm_ss(total_seconds: i64) -> String {
    let s = total_seconds.max(0);
    format!("{:02}:{:02}", s / 60, s % 60)
}
