//! Batching of detected changes and delivery through a Discord webhook.
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::json;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::NotifyError;
use crate::model::ChangeRecord;

/// Delivers one rendered message.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, content: &str) -> Result<(), NotifyError>;
}

#[derive(Clone)]
pub struct DiscordWebhook {
    http: Client,
    url: Url,
    timeout: Duration,
}

impl fmt::Debug for DiscordWebhook {
    // The webhook URL embeds its token.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordWebhook")
            .field("host", &self.url.host_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl DiscordWebhook {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url.trim()).context("invalid webhook URL")?;
        let http = Client::builder()
            .user_agent(concat!("steam-news-watch/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, url, timeout })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            &cfg.discord.webhook_url,
            Duration::from_secs(cfg.discord.timeout_secs),
        )
    }
}

#[async_trait]
impl Notifier for DiscordWebhook {
    async fn send(&self, content: &str) -> Result<(), NotifyError> {
        let res = self
            .http
            .post(self.url.clone())
            .timeout(self.timeout)
            .json(&json!({ "content": content }))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(NotifyError::Status { status, body });
        }
        Ok(())
    }
}

/// Result of delivering one run's changes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NotifySummary {
    pub batches: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Split `changes` into contiguous groups of at most `size`, keeping order.
pub fn batches(changes: &[ChangeRecord], size: usize) -> std::slice::Chunks<'_, ChangeRecord> {
    changes.chunks(size.max(1))
}

/// Message body for one batch: the mention, then one block per change
/// separated by a blank line.
pub fn render_batch(user_id: &str, batch: &[ChangeRecord]) -> String {
    let blocks: Vec<String> = batch.iter().map(ChangeRecord::to_string).collect();
    format!("<@{}>\n{}", user_id, blocks.join("\n\n"))
}

/// Send every batch once, in order. A failed send is logged and the next
/// batch is still attempted.
#[instrument(skip_all, fields(changes = changes.len(), batch_size = batch_size))]
pub async fn send_batches(
    notifier: &dyn Notifier,
    user_id: &str,
    changes: &[ChangeRecord],
    batch_size: usize,
) -> NotifySummary {
    let mut summary = NotifySummary::default();
    if changes.is_empty() {
        info!("no updates");
        return summary;
    }

    for (index, batch) in batches(changes, batch_size).enumerate() {
        summary.batches += 1;
        let content = render_batch(user_id, batch);
        debug!(batch = index, records = batch.len(), "sending batch");
        match notifier.send(&content).await {
            Ok(()) => summary.sent += 1,
            Err(err) => {
                warn!(batch = index, records = batch.len(), error = %err, "failed to send batch");
                summary.failed += 1;
            }
        }
    }
    summary
}
