use chrono::Local;
use tracing::{info, instrument};

use crate::db::{self, Pool};
use crate::error::StoreError;
use crate::model::{Announcement, ChangeKind, ChangeRecord, Game, TIMESTAMP_FORMAT};

/// Compare `announcement` with the stored state for its app and persist it if
/// it is new or its title or url changed.
///
/// Returns `None` when title and url both match the stored record; in that
/// case nothing is written. Lookup, comparison and write share one
/// transaction.
#[instrument(skip_all, fields(appid = announcement.entity_id))]
pub async fn detect_change(
    pool: &Pool,
    game: &Game,
    announcement: &Announcement,
) -> Result<Option<ChangeRecord>, StoreError> {
    let checked_at = Local::now().format(TIMESTAMP_FORMAT).to_string();
    let appid = announcement.entity_id;
    let title = announcement.title.as_str();
    let url = announcement.url.as_str();

    let mut tx = db::begin(pool).await?;
    let kind = match db::find_state(&mut tx, appid).await? {
        None => {
            db::insert_state(&mut tx, appid, title, url, &checked_at).await?;
            Some(ChangeKind::New)
        }
        Some(stored) if stored.title != title || stored.url != url => {
            db::update_state(&mut tx, appid, title, url, &checked_at).await?;
            Some(ChangeKind::Updated)
        }
        Some(_) => None,
    };
    tx.commit().await?;

    if let Some(kind) = kind {
        info!(name = %game.name, kind = kind.as_str(), title, url, "announcement changed");
    }
    Ok(kind.map(|kind| ChangeRecord::new(kind, &game.name, announcement)))
}
