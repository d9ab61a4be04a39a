use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use steam_news_watch::config;
use steam_news_watch::db;
use steam_news_watch::logging;
use steam_news_watch::notify::DiscordWebhook;
use steam_news_watch::pipeline::{self, RunSettings};
use steam_news_watch::steam::SteamNewsClient;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Post new Steam announcements for a list of games to a Discord webhook"
)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Keep running, checking again every `app.poll_interval_secs`
    #[arg(long)]
    watch: bool,

    /// Append logs to this file instead of stderr (e.g. steamnews.log)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_file.as_deref())?;

    if !args.config.exists() {
        config::write_example(&args.config)?;
        warn!(
            path = %args.config.display(),
            "config not found; wrote an example. Fill in discord.user_id and discord.webhook_url, then run again"
        );
        return Ok(());
    }

    let cfg = config::load(Some(&args.config))?;
    if cfg.is_unconfigured() {
        warn!(
            path = %args.config.display(),
            "config still holds placeholder values; discord.user_id and discord.webhook_url are required. Exiting"
        );
        return Ok(());
    }
    cfg.ensure_dirs()?;

    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| cfg.database_url());
    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;
    info!(tracked = db::count_states(&pool).await?, "state store ready");

    let source = SteamNewsClient::from_config(&cfg)?;
    let notifier = DiscordWebhook::from_config(&cfg)?;
    let settings = RunSettings::from_config(&cfg);

    if !args.watch {
        pipeline::run_once(&settings, &pool, &source, &notifier).await;
        pool.close().await;
        return Ok(());
    }

    // Register the handler before the first run so a Ctrl-C during a run is
    // not lost.
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop_tx.send(());
        }
    });
    let shutdown = async {
        if stop_rx.await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    let interval = cfg.poll_interval();
    info!(every_secs = interval.as_secs(), "watching for news");
    pipeline::watch(&settings, &pool, &source, &notifier, interval, shutdown).await;
    pool.close().await;
    Ok(())
}
