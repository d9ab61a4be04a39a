//! Error kinds raised while processing one run.
//!
//! None of these abort a run: callers log them with the app they belong to
//! and skip that unit of work.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("feed returned {0}")]
    Status(StatusCode),
    #[error("invalid feed response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("feed has no announcement for app {appid}")]
    MissingItem { appid: i64 },
    #[error("announcement for app {appid} has invalid date {date}")]
    InvalidDate { appid: i64, date: i64 },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("webhook returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Failure of the fetch-then-detect pipeline for a single app.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
