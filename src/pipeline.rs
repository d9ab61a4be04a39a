use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::db::Pool;
use crate::model::Game;
use crate::notify::{send_batches, Notifier, NotifySummary};
use crate::scheduler::fan_out;
use crate::steam::NewsSource;

/// Per-run knobs taken from the configuration.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub games: Vec<Game>,
    pub user_id: String,
    pub workers: usize,
    pub batch_size: usize,
}

impl RunSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            games: cfg.games.clone(),
            user_id: cfg.discord.user_id.clone(),
            workers: cfg.app.workers,
            batch_size: cfg.app.batch_size,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub changes: usize,
    pub fetch_failures: usize,
    pub store_failures: usize,
    pub notify: NotifySummary,
}

impl RunSummary {
    pub fn failures(&self) -> usize {
        self.fetch_failures + self.store_failures
    }

    pub fn updates_sent(&self) -> bool {
        self.notify.sent > 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "processed {} games", self.processed)?;
        let failures = self.failures();
        if failures > 0 {
            write!(f, " ({failures} failed)")?;
        }
        if self.changes == 0 {
            return write!(f, ", no updates");
        }
        write!(
            f,
            ", {} updates in {} messages ({} sent, {} failed)",
            self.changes, self.notify.batches, self.notify.sent, self.notify.failed
        )
    }
}

/// One full pass: fetch and diff every game, then send the detected changes
/// in batches. Never fails; problems are logged and counted in the summary.
#[instrument(skip_all)]
pub async fn run_once(
    settings: &RunSettings,
    pool: &Pool,
    source: &dyn NewsSource,
    notifier: &dyn Notifier,
) -> RunSummary {
    info!(games = settings.games.len(), "checking news");
    let report = fan_out(&settings.games, source, pool, settings.workers).await;
    if report.failures() > 0 {
        warn!(
            fetch = report.fetch_failures,
            store = report.store_failures,
            "some games were skipped this run"
        );
    }
    let notify = send_batches(
        notifier,
        &settings.user_id,
        &report.changes,
        settings.batch_size,
    )
    .await;

    let summary = RunSummary {
        processed: report.processed,
        changes: report.changes.len(),
        fetch_failures: report.fetch_failures,
        store_failures: report.store_failures,
        notify,
    };
    info!(%summary, updates_sent = summary.updates_sent(), "run finished");
    summary
}

/// Repeat [`run_once`] every `interval` until `shutdown` resolves. A shutdown
/// that fires during a run ends the loop once that run completes. Returns the
/// number of runs.
pub async fn watch<F>(
    settings: &RunSettings,
    pool: &Pool,
    source: &dyn NewsSource,
    notifier: &dyn Notifier,
    interval: Duration,
    shutdown: F,
) -> usize
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut runs = 0;
    loop {
        run_once(settings, pool, source, notifier).await;
        runs += 1;
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = &mut shutdown => {
                info!(runs, "shutdown requested");
                break;
            }
        }
    }
    runs
}
