use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{info, warn};

use pkg_state::store::StateBackend;
use pkg_types::lease::LeaseContext;

use crate::session::LeaseSession;

/// Renews the server-side claim. Invoked only when a tick plan asks for a
/// heartbeat. On failure the driver records nothing, so the next due tick
/// retries; retry policy beyond that belongs to the implementation.
#[async_trait]
pub trait HeartbeatSender: Send + Sync {
    async fn send(&self, ctx: &LeaseContext) -> Result<()>;
}

/// Presents the expiry modal to the user. After a successful presentation
/// the driver records `mark_modal_shown`; the user's eventual answer
/// (renew via `rearm_from_prompt`, release via `stop`) comes back through
/// the session owner.
#[async_trait]
pub trait ModalPresenter: Send + Sync {
    async fn present(&self, seconds_left: i64) -> Result<()>;
}

/// The tick loop: consumes virtual time from a clock feed, evaluates the
/// plan against the session, and carries out the side effects through the
/// collaborators. One driver per lease; there is no internal timer and no
/// concurrency; each tick completes before the next is read.
pub struct LeaseDriver<S: StateBackend> {
    session: LeaseSession<S>,
    heartbeat: Box<dyn HeartbeatSender>,
    modal: Box<dyn ModalPresenter>,
}

impl<S: StateBackend> LeaseDriver<S> {
    pub fn new(
        session: LeaseSession<S>,
        heartbeat: Box<dyn HeartbeatSender>,
        modal: Box<dyn ModalPresenter>,
    ) -> Self {
        Self {
            session,
            heartbeat,
            modal,
        }
    }

    pub fn session(&self) -> &LeaseSession<S> {
        &self.session
    }

    /// Run until the clock feed closes, then hand the session back.
    pub async fn run(mut self, mut clock: watch::Receiver<i64>) -> Result<LeaseSession<S>> {
        info!("LeaseDriver started for {:?}", self.session.context());
        while clock.changed().await.is_ok() {
            let now_ms = *clock.borrow_and_update();
            self.step(now_ms).await?;
        }
        Ok(self.session)
    }

    /// One tick: publish the clock into state, evaluate the plan, cache the
    /// countdown, then fire whatever the plan asked for.
    pub async fn step(&mut self, now_ms: i64) -> Result<()> {
        self.session.set_clock_now(now_ms).await?;
        let plan = self.session.tick_plan(None);
        self.session.apply_countdown(plan.seconds_left).await?;

        if plan.should_heartbeat {
            let ctx = self.session.context();
            match self.heartbeat.send(&ctx).await {
                Ok(()) => self.session.mark_heartbeat(Some(now_ms)).await?,
                Err(e) => warn!("Heartbeat failed, retrying next tick: {}", e),
            }
        }

        if plan.should_open_modal {
            match self.modal.present(plan.seconds_left).await {
                Ok(()) => self.session.mark_modal_shown().await?,
                Err(e) => warn!("Modal presenter failed, retrying next tick: {}", e),
            }
        }
        Ok(())
    }

    /// Tear down the loop and reclaim the session without waiting for the
    /// feed to close.
    pub fn into_session(self) -> LeaseSession<S> {
        self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg_state::memory::MemoryStore;
    use pkg_types::lease::StartOptions;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingSender {
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl HeartbeatSender for Arc<RecordingSender> {
        async fn send(&self, _ctx: &LeaseContext) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err(anyhow::anyhow!("connection refused"))
            } else {
                Ok(())
            }
        }
    }

    #[derive(Default)]
    struct RecordingPresenter {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ModalPresenter for Arc<RecordingPresenter> {
        async fn present(&self, _seconds_left: i64) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn make_driver(
        sender: Arc<RecordingSender>,
        presenter: Arc<RecordingPresenter>,
    ) -> LeaseDriver<MemoryStore> {
        let mut session = LeaseSession::open(MemoryStore::new()).await.unwrap();
        session
            .start(StartOptions {
                module: Some("orders".to_string()),
                record_id: Some(42),
                user_id: Some(7),
                heartbeat_period_ms: Some(10_000),
                prompt_minutes: Some(1.0),
                now_ms: Some(0),
            })
            .await
            .unwrap();
        LeaseDriver::new(session, Box::new(sender), Box::new(presenter))
    }

    #[tokio::test]
    async fn failed_heartbeat_is_retried_until_it_succeeds() {
        let sender = Arc::new(RecordingSender::default());
        let presenter = Arc::new(RecordingPresenter::default());
        sender.fail.store(true, Ordering::SeqCst);
        let mut driver = make_driver(sender.clone(), presenter).await;

        driver.step(10_000).await.unwrap();
        assert_eq!(sender.calls.load(Ordering::SeqCst), 1);
        assert_eq!(driver.session().state().last_heartbeat_at_ms, 0);

        // still due on the very next tick because nothing was recorded
        driver.step(11_000).await.unwrap();
        assert_eq!(sender.calls.load(Ordering::SeqCst), 2);

        sender.fail.store(false, Ordering::SeqCst);
        driver.step(12_000).await.unwrap();
        assert_eq!(sender.calls.load(Ordering::SeqCst), 3);
        assert_eq!(driver.session().state().last_heartbeat_at_ms, 12_000);

        // success recorded, so quiet until the period elapses again
        driver.step(13_000).await.unwrap();
        assert_eq!(sender.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn modal_presented_once_then_bookkept() {
        let sender = Arc::new(RecordingSender::default());
        let presenter = Arc::new(RecordingPresenter::default());
        let mut driver = make_driver(sender, presenter.clone()).await;

        driver.step(59_000).await.unwrap();
        assert_eq!(presenter.calls.load(Ordering::SeqCst), 0);
        assert_eq!(driver.session().state().seconds_left, 1);

        driver.step(60_000).await.unwrap();
        assert_eq!(presenter.calls.load(Ordering::SeqCst), 1);
        assert!(driver.session().state().modal_shown);

        driver.step(61_000).await.unwrap();
        assert_eq!(presenter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn run_consumes_the_feed_and_returns_the_session() {
        let sender = Arc::new(RecordingSender::default());
        let presenter = Arc::new(RecordingPresenter::default());
        let driver = make_driver(sender, presenter).await;

        let (tx, rx) = watch::channel(0_i64);
        let handle = tokio::spawn(driver.run(rx));
        tx.send(59_000).unwrap();
        drop(tx);

        let session = handle.await.unwrap().unwrap();
        assert_eq!(session.state().clock_now_ms, 59_000);
        assert_eq!(session.state().seconds_left, 1);
    }
}
