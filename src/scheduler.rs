//! Bounded fan-out of fetch + change detection across all configured games.
use futures::stream::{self, StreamExt};
use tracing::{debug, instrument, warn};

use crate::db::Pool;
use crate::detector::detect_change;
use crate::error::ProcessError;
use crate::model::{ChangeRecord, Game};
use crate::steam::NewsSource;

/// Outcome of one fan-out pass.
#[derive(Debug, Default)]
pub struct FanOutReport {
    /// Detected changes in completion order.
    pub changes: Vec<ChangeRecord>,
    pub processed: usize,
    pub unchanged: usize,
    pub fetch_failures: usize,
    pub store_failures: usize,
}

impl FanOutReport {
    pub fn failures(&self) -> usize {
        self.fetch_failures + self.store_failures
    }
}

/// Fetch and diff a single game.
pub async fn process_game(
    game: &Game,
    source: &dyn NewsSource,
    pool: &Pool,
) -> Result<Option<ChangeRecord>, ProcessError> {
    let announcement = source.latest(game).await?;
    Ok(detect_change(pool, game, &announcement).await?)
}

/// Run [`process_game`] for every game with at most `workers` in flight and
/// wait for all of them. A failing game is logged and counted; it never stops
/// the others.
#[instrument(skip_all, fields(games = games.len(), workers = workers))]
pub async fn fan_out(
    games: &[Game],
    source: &dyn NewsSource,
    pool: &Pool,
    workers: usize,
) -> FanOutReport {
    let mut report = FanOutReport::default();
    let mut outcomes = stream::iter(games)
        .map(|game| async move { (game, process_game(game, source, pool).await) })
        .buffer_unordered(workers.max(1));

    while let Some((game, outcome)) = outcomes.next().await {
        report.processed += 1;
        match outcome {
            Ok(Some(change)) => report.changes.push(change),
            Ok(None) => {
                debug!(appid = game.appid, name = %game.name, "no change");
                report.unchanged += 1;
            }
            Err(ProcessError::Fetch(err)) => {
                warn!(appid = game.appid, name = %game.name, error = %err, "fetch failed; skipping");
                report.fetch_failures += 1;
            }
            Err(ProcessError::Store(err)) => {
                warn!(appid = game.appid, name = %game.name, error = %err, "store update failed; skipping");
                report.store_failures += 1;
            }
        }
    }

    report
}
