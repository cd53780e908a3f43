use anyhow::Result;
use serde_json::{Value, json};
use tracing::info;

use pkg_constants::lease::DEFAULT_PROMPT_MINUTES;
use pkg_constants::state::{
    KEY_CLOCK_NOW_MS, KEY_DEADLINE_MS, KEY_HEARTBEAT_PERIOD_MS, KEY_LAST_HEARTBEAT_AT_MS,
    KEY_LOOP_RUNNING, KEY_MODAL_SHOWN, KEY_MODULE, KEY_PROMPT_MINUTES, KEY_RECORD_ID,
    KEY_SECONDS_LEFT, KEY_SHOULD_OPEN_MODAL, KEY_USER_ID,
};
use pkg_state::store::StateBackend;
use pkg_types::lease::{LeaseContext, LeasePhase, LeaseState, StartOptions};
use pkg_types::plan::TickPlan;

use crate::planner;
use crate::time;

/// Lifecycle operations for one lock lease claim.
///
/// The session owns the authoritative in-memory [`LeaseState`]; every
/// mutation updates memory synchronously and then awaits a per-field JSON
/// commit to the injected store, so decision logic stays synchronous while
/// persistence remains an explicit, ordered step.
///
/// Operations never fail on data: numeric garbage in the store collapses
/// to documented defaults at hydration. The only errors that surface are
/// store I/O failures.
pub struct LeaseSession<S: StateBackend> {
    state: LeaseState,
    store: S,
}

impl<S: StateBackend> LeaseSession<S> {
    /// Open a session over the given store: install defaults for any lease
    /// key that is absent, then hydrate the in-memory record, coercing
    /// unreadable numerics to their defaults.
    pub async fn open(store: S) -> Result<Self> {
        let mut session = Self {
            state: LeaseState::default(),
            store,
        };
        session.install_defaults().await?;
        session.load().await?;
        Ok(session)
    }

    /// The current in-memory lease record.
    pub fn state(&self) -> &LeaseState {
        &self.state
    }

    /// Read-only `{module, record_id, user_id}` snapshot.
    pub fn context(&self) -> LeaseContext {
        self.state.context()
    }

    /// Lifecycle phase at `now_ms`, defaulting to the stored clock.
    pub fn phase(&self, now_ms: Option<i64>) -> LeasePhase {
        self.state.phase(now_ms.unwrap_or(self.state.clock_now_ms))
    }

    /// Claim the record: apply caller overrides, arm the deadline from the
    /// supplied (or stored) virtual now, and mark the loop running.
    /// Idempotent: calling twice simply re-arms.
    pub async fn start(&mut self, opts: StartOptions) -> Result<()> {
        self.install_defaults().await?;

        if let Some(module) = opts.module {
            self.state.module = Some(module);
            self.write_value(KEY_MODULE, &json!(self.state.module)).await?;
        }
        if let Some(record_id) = opts.record_id {
            self.state.record_id = Some(record_id);
            self.write_value(KEY_RECORD_ID, &json!(record_id)).await?;
        }
        if let Some(user_id) = opts.user_id {
            self.state.user_id = Some(user_id);
            self.write_value(KEY_USER_ID, &json!(user_id)).await?;
        }
        if let Some(period_ms) = opts.heartbeat_period_ms {
            self.state.heartbeat_period_ms = period_ms;
            self.write_value(KEY_HEARTBEAT_PERIOD_MS, &json!(period_ms)).await?;
        }
        if let Some(minutes) = opts.prompt_minutes {
            self.state.prompt_minutes = time::finite_or(minutes, DEFAULT_PROMPT_MINUTES);
            self.write_value(KEY_PROMPT_MINUTES, &json!(self.state.prompt_minutes)).await?;
        }

        let deadline = self.rearm_from_prompt(opts.now_ms).await?;
        self.state.loop_running = true;
        self.write_value(KEY_LOOP_RUNNING, &json!(true)).await?;

        info!(
            "Lease loop started for {:?}/{:?} (deadline {}ms)",
            self.state.module, self.state.record_id, deadline
        );
        Ok(())
    }

    /// Re-arm the grace period from `now_ms` (or the stored clock) and
    /// clear the modal flags. Returns the new deadline. Callable on its own
    /// for a "still working" renewal.
    pub async fn rearm_from_prompt(&mut self, now_ms: Option<i64>) -> Result<i64> {
        let now = now_ms.unwrap_or(self.state.clock_now_ms);
        let deadline = time::deadline_from_prompt(now, self.state.prompt_minutes);

        self.state.deadline_ms = deadline;
        self.state.modal_shown = false;
        self.state.should_open_modal = false;

        self.write_value(KEY_DEADLINE_MS, &json!(deadline)).await?;
        self.write_value(KEY_MODAL_SHOWN, &json!(false)).await?;
        self.write_value(KEY_SHOULD_OPEN_MODAL, &json!(false)).await?;
        Ok(deadline)
    }

    /// Release the claim loop. Deadline and modal flags are retained so the
    /// record stays inspectable after the fact.
    pub async fn stop(&mut self) -> Result<()> {
        self.state.loop_running = false;
        self.write_value(KEY_LOOP_RUNNING, &json!(false)).await?;
        info!("Lease loop stopped for {:?}/{:?}", self.state.module, self.state.record_id);
        Ok(())
    }

    /// Evaluate the tick plan against live state. `now_ms` defaults to the
    /// stored clock. Read-only: carrying out the plan and recording its
    /// bookkeeping is the caller's job.
    pub fn tick_plan(&self, now_ms: Option<i64>) -> TickPlan {
        let now = now_ms.unwrap_or(self.state.clock_now_ms);
        planner::plan(
            now,
            self.state.deadline_ms,
            self.state.modal_shown,
            self.state.loop_running,
            self.state.last_heartbeat_at_ms,
            self.state.heartbeat_period_ms,
        )
    }

    /// Persist a computed countdown value for display.
    pub async fn apply_countdown(&mut self, seconds_left: i64) -> Result<()> {
        self.state.seconds_left = seconds_left.max(0);
        self.write_value(KEY_SECONDS_LEFT, &json!(self.state.seconds_left)).await
    }

    /// Record that the expiry modal was presented. Called by the caller
    /// after showing it, never by the planner.
    pub async fn mark_modal_shown(&mut self) -> Result<()> {
        self.state.modal_shown = true;
        self.state.should_open_modal = true;
        self.write_value(KEY_MODAL_SHOWN, &json!(true)).await?;
        self.write_value(KEY_SHOULD_OPEN_MODAL, &json!(true)).await?;
        info!("Expiry modal shown for {:?}/{:?}", self.state.module, self.state.record_id);
        Ok(())
    }

    /// Record a successful heartbeat at `now_ms` (or the stored clock).
    /// The caller invokes this only after the renewal actually succeeded;
    /// the timestamp never moves backward within a session.
    pub async fn mark_heartbeat(&mut self, now_ms: Option<i64>) -> Result<()> {
        let now = now_ms.unwrap_or(self.state.clock_now_ms);
        self.state.last_heartbeat_at_ms = self.state.last_heartbeat_at_ms.max(now);
        self.write_value(KEY_LAST_HEARTBEAT_AT_MS, &json!(self.state.last_heartbeat_at_ms))
            .await
    }

    /// Force the open-the-modal signal on, independent of the countdown.
    /// Used for externally triggered events, e.g. a server-pushed
    /// "record taken" notice.
    pub async fn raise_signal(&mut self) -> Result<()> {
        self.state.should_open_modal = true;
        self.write_value(KEY_SHOULD_OPEN_MODAL, &json!(true)).await
    }

    /// Clear the open-the-modal signal without touching the modal-shown
    /// bookkeeping.
    pub async fn clear_signal(&mut self) -> Result<()> {
        self.state.should_open_modal = false;
        self.write_value(KEY_SHOULD_OPEN_MODAL, &json!(false)).await
    }

    /// Publish a fresh virtual now. The clock feed is the only caller; no
    /// other operation writes the clock.
    pub async fn set_clock_now(&mut self, now_ms: i64) -> Result<()> {
        self.state.clock_now_ms = now_ms;
        self.write_value(KEY_CLOCK_NOW_MS, &json!(now_ms)).await
    }

    // --- store plumbing ---

    /// Write defaults for any lease key that is currently absent or null.
    async fn install_defaults(&self) -> Result<()> {
        let d = LeaseState::default();
        let defaults: [(&str, Value); 12] = [
            (KEY_MODULE, json!(d.module)),
            (KEY_RECORD_ID, json!(d.record_id)),
            (KEY_USER_ID, json!(d.user_id)),
            (KEY_DEADLINE_MS, json!(d.deadline_ms)),
            (KEY_LOOP_RUNNING, json!(d.loop_running)),
            (KEY_HEARTBEAT_PERIOD_MS, json!(d.heartbeat_period_ms)),
            (KEY_LAST_HEARTBEAT_AT_MS, json!(d.last_heartbeat_at_ms)),
            (KEY_MODAL_SHOWN, json!(d.modal_shown)),
            (KEY_SHOULD_OPEN_MODAL, json!(d.should_open_modal)),
            (KEY_SECONDS_LEFT, json!(d.seconds_left)),
            (KEY_PROMPT_MINUTES, json!(d.prompt_minutes)),
            (KEY_CLOCK_NOW_MS, json!(d.clock_now_ms)),
        ];

        for (key, value) in &defaults {
            let unset = matches!(self.read_value(key).await?, None | Some(Value::Null));
            if unset {
                self.write_value(key, value).await?;
            }
        }
        Ok(())
    }

    /// Hydrate the in-memory record from the store, field by field.
    async fn load(&mut self) -> Result<()> {
        let d = LeaseState::default();

        self.state.module = self
            .read_value(KEY_MODULE)
            .await?
            .as_ref()
            .and_then(|v| v.as_str().map(String::from));
        self.state.record_id = self.read_value(KEY_RECORD_ID).await?.as_ref().and_then(Value::as_i64);
        self.state.user_id = self.read_value(KEY_USER_ID).await?.as_ref().and_then(Value::as_i64);

        self.state.deadline_ms = self.read_num(KEY_DEADLINE_MS, d.deadline_ms as f64).await? as i64;
        self.state.heartbeat_period_ms = self
            .read_num(KEY_HEARTBEAT_PERIOD_MS, d.heartbeat_period_ms as f64)
            .await? as i64;
        self.state.last_heartbeat_at_ms = self
            .read_num(KEY_LAST_HEARTBEAT_AT_MS, d.last_heartbeat_at_ms as f64)
            .await? as i64;
        self.state.seconds_left = self.read_num(KEY_SECONDS_LEFT, d.seconds_left as f64).await? as i64;
        self.state.prompt_minutes = self.read_num(KEY_PROMPT_MINUTES, d.prompt_minutes).await?;
        self.state.clock_now_ms = self.read_num(KEY_CLOCK_NOW_MS, d.clock_now_ms as f64).await? as i64;

        self.state.loop_running = self.read_bool(KEY_LOOP_RUNNING).await?;
        self.state.modal_shown = self.read_bool(KEY_MODAL_SHOWN).await?;
        self.state.should_open_modal = self.read_bool(KEY_SHOULD_OPEN_MODAL).await?;
        Ok(())
    }

    async fn read_value(&self, key: &str) -> Result<Option<Value>> {
        Ok(self
            .store
            .get(key)
            .await?
            .and_then(|bytes| serde_json::from_slice(&bytes).ok()))
    }

    async fn read_num(&self, key: &str, default: f64) -> Result<f64> {
        Ok(time::json_num_or(self.read_value(key).await?.as_ref(), default))
    }

    async fn read_bool(&self, key: &str) -> Result<bool> {
        Ok(self
            .read_value(key)
            .await?
            .as_ref()
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    async fn write_value(&self, key: &str, value: &Value) -> Result<()> {
        let data = serde_json::to_vec(value)?;
        self.store.put(key, &data).await
    }
}
