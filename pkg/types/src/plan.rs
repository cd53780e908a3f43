use serde::{Deserialize, Serialize};

/// What one tick evaluation decided. The caller carries out the side
/// effects (send a heartbeat, open the modal); the planner only decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickPlan {
    /// The virtual time the plan was computed against.
    pub now_ms: i64,
    /// Whole seconds until the deadline, never negative.
    pub seconds_left: i64,
    /// True when the expiry modal should be opened this tick.
    pub should_open_modal: bool,
    /// True when a heartbeat is due this tick.
    pub should_heartbeat: bool,
}
