use clap::Parser;
use std::time::Duration;
use tracing::info;

use pkg_constants::lease::{
    DEFAULT_CLOCK_STEP_MS, DEFAULT_HEARTBEAT_PERIOD_MS, DEFAULT_PROMPT_MINUTES,
};
use pkg_lease::feed::ClockFeed;
use pkg_lease::session::LeaseSession;
use pkg_lease::time::format_mm_ss;
use pkg_state::client::StateStore;
use pkg_state::memory::MemoryStore;
use pkg_state::store::StateBackend;
use pkg_types::config::{DevConfigFile, load_config_file};
use pkg_types::lease::StartOptions;

#[derive(Parser, Debug)]
#[command(name = "softlock-dev", about = "softlock lease session simulator")]
struct Cli {
    /// Path to YAML config file
    #[arg(long, short, default_value = "/etc/softlock/config.yaml")]
    config: String,

    /// Directory for SlateDB state storage (in-memory when omitted)
    #[arg(long)]
    data_dir: Option<String>,

    /// Grace period in minutes
    #[arg(long)]
    prompt_minutes: Option<f64>,

    /// Heartbeat period in virtual milliseconds
    #[arg(long)]
    heartbeat_period_ms: Option<i64>,

    /// Wall-clock milliseconds between simulated ticks
    #[arg(long)]
    tick_ms: Option<u64>,

    /// How many times the simulated user renews before releasing
    #[arg(long)]
    renewals: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    // Load config file (returns defaults if file not found)
    let file_cfg: DevConfigFile = load_config_file(&cli.config)?;
    info!("Config file: {}", cli.config);

    // Merge: CLI args > config file > defaults
    let prompt_minutes = cli
        .prompt_minutes
        .or(file_cfg.prompt_minutes)
        .unwrap_or(DEFAULT_PROMPT_MINUTES);
    let heartbeat_period_ms = cli
        .heartbeat_period_ms
        .or(file_cfg.heartbeat_period_ms)
        .unwrap_or(DEFAULT_HEARTBEAT_PERIOD_MS);
    let tick_ms = cli.tick_ms.or(file_cfg.tick_ms).unwrap_or(100);
    let renewals = cli.renewals.or(file_cfg.renewals).unwrap_or(1);

    info!("Starting softlock-dev");
    info!("  Prompt:    {}min", prompt_minutes);
    info!("  Heartbeat: {}ms", heartbeat_period_ms);
    info!("  Tick:      {}ms wall / {}ms virtual", tick_ms, DEFAULT_CLOCK_STEP_MS);
    info!("  Renewals:  {}", renewals);

    match cli.data_dir.or(file_cfg.data_dir) {
        Some(dir) => {
            info!("  Data dir:  {}", dir);
            let store = StateStore::new(&dir).await?;
            simulate(store, prompt_minutes, heartbeat_period_ms, tick_ms, renewals).await
        }
        None => {
            simulate(
                MemoryStore::new(),
                prompt_minutes,
                heartbeat_period_ms,
                tick_ms,
                renewals,
            )
            .await
        }
    }
}

/// Drive one claim through its whole life: arm, heartbeat, expire, renew a
/// configured number of times, release. Time is virtual throughout; the
/// interval only paces the simulation.
async fn simulate<S: StateBackend>(
    store: S,
    prompt_minutes: f64,
    heartbeat_period_ms: i64,
    tick_ms: u64,
    mut renewals: u32,
) -> anyhow::Result<()> {
    let mut session = LeaseSession::open(store).await?;
    session
        .start(StartOptions {
            module: Some("orders".to_string()),
            record_id: Some(42),
            user_id: Some(7),
            heartbeat_period_ms: Some(heartbeat_period_ms),
            prompt_minutes: Some(prompt_minutes),
            now_ms: Some(0),
        })
        .await?;

    let (feed, mut clock) =
        ClockFeed::new(Duration::from_millis(tick_ms), DEFAULT_CLOCK_STEP_MS).start();

    while clock.changed().await.is_ok() {
        let now_ms = *clock.borrow_and_update();
        session.set_clock_now(now_ms).await?;
        let plan = session.tick_plan(None);
        session.apply_countdown(plan.seconds_left).await?;
        info!(
            "[{:>7}ms] {} countdown {}",
            now_ms,
            session.phase(None),
            format_mm_ss(plan.seconds_left)
        );

        if plan.should_heartbeat {
            let ctx = session.context();
            info!("Heartbeat sent for {:?}/{:?}", ctx.module, ctx.record_id);
            session.mark_heartbeat(None).await?;
        }

        if plan.should_open_modal {
            if renewals > 0 {
                renewals -= 1;
                let deadline = session.rearm_from_prompt(None).await?;
                info!("User kept editing, re-armed to {}ms ({} renewals left)", deadline, renewals);
            } else {
                session.stop().await?;
                info!("User released the record, simulation done");
                break;
            }
        }
    }

    drop(clock);
    feed.abort();
    Ok(())
}
