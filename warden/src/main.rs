//! Replays recorded packet traces through the detection engine.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use warden_core::config::keys;
use warden_core::update::{DEFAULT_RELEASE_URL, GithubReleases};
use warden_core::{ConfigStore, Severity, Warden};
use warden_utils::clock::{Clock, ManualClock, SystemClock};

use crate::replay::{ReplayReport, Replayer};

mod logging;
mod replay;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "warden", version, about = "Movement anomaly detection trace replay")]
struct Cli {
    /// Configuration file (JSON5).
    #[arg(short, long, value_name = "FILE", default_value = "warden.json5")]
    config: PathBuf,

    /// Log filter, overriding the configured one.
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// JSON-lines trace to replay. Reads stdin when omitted.
    #[arg(value_name = "TRACE")]
    trace: Option<PathBuf>,
}

#[cfg(feature = "deadlock_detection")]
fn spawn_deadlock_detector() {
    use std::thread;
    use std::time::Duration;

    thread::spawn(|| {
        loop {
            thread::sleep(Duration::from_secs(10));
            let deadlocks = parking_lot::deadlock::check_deadlock();
            if deadlocks.is_empty() {
                continue;
            }
            log::error!("{} deadlocks detected", deadlocks.len());
            for (i, threads) in deadlocks.iter().enumerate() {
                log::error!("Deadlock #{i}");
                for t in threads {
                    log::error!("Thread Id {:#?}", t.thread_id());
                    log::error!("{:#?}", t.backtrace());
                }
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigStore::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.get_string(keys::LOG_LEVEL, "info").to_owned());
    logging::init(&level)?;

    #[cfg(feature = "deadlock_detection")]
    spawn_deadlock_detector();

    let start = SystemClock.now_millis();
    let clock = Arc::new(ManualClock::new(start));
    let mut builder = Warden::builder(config.clone()).clock(clock.clone());
    if config.get_bool(keys::UPDATE_CHECK_ENABLED, false) {
        let url = config.get_string(keys::UPDATE_CHECK_URL, DEFAULT_RELEASE_URL);
        let source = GithubReleases::new(url).context("failed to build the release client")?;
        builder = builder
            .release_source(Arc::new(source))
            .local_version(env!("CARGO_PKG_VERSION"));
    }
    let warden = builder.build();
    let mut events = warden
        .take_events()
        .context("event receiver already taken")?;

    let collector = tokio::spawn(async move {
        let mut detections = Vec::new();
        while let Some(event) = events.recv().await {
            detections.push(event);
        }
        detections
    });

    let mut replayer = Replayer::new(warden, clock, start);
    match &cli.trace {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            replayer.run(BufReader::new(file))?;
        }
        None => replayer.run(io::stdin().lock())?,
    }

    let (stats, warden) = replayer.finish();
    let dropped_events = warden.events().dropped();
    let kicks_recorded = warden.kick_stats().total();
    // Dropping the engine closes the event channel so the collector can finish.
    drop(warden);
    let detections = collector.await.context("event collector panicked")?;

    let report = ReplayReport {
        stats,
        detections,
        dropped_events,
    };
    print_summary(&report, start, kicks_recorded);
    Ok(())
}

fn print_summary(report: &ReplayReport, start: u64, kicks_recorded: u64) {
    let stats = &report.stats;
    log::info!(
        "Replayed {} events: {} connects, {} inbound packets, {} teleports",
        stats.lines,
        stats.connects,
        stats.inbound,
        stats.teleports
    );
    log::info!(
        "{} packets cancelled, {} for unknown players",
        stats.cancelled,
        stats.unknown
    );
    log::info!(
        "{} detections: {} mitigated, {} kicked, {} banned ({} punishments counted)",
        report.detections.len(),
        report.count(Severity::Mitigate),
        report.count(Severity::Kick),
        report.count(Severity::Ban),
        kicks_recorded
    );
    if report.dropped_events > 0 {
        log::warn!("{} detection events were dropped", report.dropped_events);
    }
    for event in &report.detections {
        let check = event
            .kind
            .map_or_else(|| String::from("unknown"), |kind| kind.to_string());
        log::info!(
            "  +{}ms {} {} {} (VL {}): {}",
            event.at_millis.saturating_sub(start),
            event.player_name,
            event.severity,
            check,
            event.violations,
            event.debug_info
        );
    }
}
