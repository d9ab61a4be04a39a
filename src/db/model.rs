//! Rows of the `news` table.

/// Last-known announcement for one app.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StateRecord {
    pub appid: i64,
    pub title: String,
    pub url: String,
    /// Local time of the last write, `YYYY-MM-DD HH:MM`.
    #[sqlx(rename = "date")]
    pub last_checked: String,
}
