use super::model::StateRecord;
use crate::error::StoreError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use tracing::instrument;

pub type Pool = SqlitePool;
pub type Tx<'c> = Transaction<'c, Sqlite>;

/// Open the store, creating the database file if it does not exist yet.
pub async fn init_pool(database_url: &str) -> Result<Pool, StoreError> {
    let normalized = prepare_sqlite_url(database_url);
    // Enable WAL and stricter durability.
    let options = SqliteConnectOptions::from_str(&normalized)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full);
    // One connection: writers are serialized, and an in-memory database is
    // never dropped behind our back.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/` and ensure the parent
/// directory exists. Leaves in-memory URLs untouched. Returns possibly-updated URL.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);
    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };
    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded_path = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    let mut rebuilt = format!("sqlite://{expanded_path}");
    if let Some(q) = query_part {
        rebuilt.push('?');
        rebuilt.push_str(q);
    }
    rebuilt
}

pub async fn run_migrations(pool: &Pool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn begin(pool: &Pool) -> Result<Tx<'static>, StoreError> {
    Ok(pool.begin().await?)
}

pub async fn find_state(tx: &mut Tx<'_>, appid: i64) -> Result<Option<StateRecord>, StoreError> {
    let record = sqlx::query_as::<_, StateRecord>(
        "SELECT appid, title, url, date FROM news WHERE appid = ?",
    )
    .bind(appid)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(record)
}

pub async fn insert_state(
    tx: &mut Tx<'_>,
    appid: i64,
    title: &str,
    url: &str,
    checked_at: &str,
) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO news (appid, title, url, date) VALUES (?, ?, ?, ?)")
        .bind(appid)
        .bind(title)
        .bind(url)
        .bind(checked_at)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn update_state(
    tx: &mut Tx<'_>,
    appid: i64,
    title: &str,
    url: &str,
    checked_at: &str,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE news SET title = ?, url = ?, date = ? WHERE appid = ?")
        .bind(title)
        .bind(url)
        .bind(checked_at)
        .bind(appid)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[cfg(test)]
pub async fn get_state(pool: &Pool, appid: i64) -> Result<Option<StateRecord>, StoreError> {
    let record = sqlx::query_as::<_, StateRecord>(
        "SELECT appid, title, url, date FROM news WHERE appid = ?",
    )
    .bind(appid)
    .fetch_optional(pool)
    .await?;
    Ok(record)
}

#[instrument(skip_all)]
pub async fn count_states(pool: &Pool) -> Result<i64, StoreError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
