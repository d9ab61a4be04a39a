use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Display format shared by the store's `date` column and rendered messages.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A tracked Steam app.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Game {
    pub name: String,
    #[serde(deserialize_with = "appid_from_int_or_str")]
    pub appid: i64,
}

impl Game {
    pub fn new(name: impl Into<String>, appid: i64) -> Self {
        Self {
            name: name.into(),
            appid,
        }
    }
}

/// Accepts `427520` as well as `"427520"`.
fn appid_from_int_or_str<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Int(i64),
        Str(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Int(id) => Ok(id),
        Repr::Str(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("appid `{s}` is not an integer"))),
    }
}

/// Latest announcement the feed reported for one app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub entity_id: i64,
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    New,
    Updated,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::New => "new",
            ChangeKind::Updated => "updated",
        }
    }
}

/// A detected new-or-changed announcement waiting to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub entity_name: String,
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
}

impl ChangeRecord {
    pub fn new(kind: ChangeKind, entity_name: &str, announcement: &Announcement) -> Self {
        Self {
            kind,
            entity_name: entity_name.to_string(),
            title: announcement.title.clone(),
            url: announcement.url.clone(),
            published_at: announcement.published_at,
        }
    }

    /// Publish time in local time, e.g. `2023-11-14 22:13`.
    pub fn published_local(&self) -> String {
        self.published_at
            .with_timezone(&Local)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Game: {} ({})\nPosted: {}\nTitle: {}\nLink: {}",
            self.entity_name,
            self.kind.as_str(),
            self.published_local(),
            self.title,
            self.url
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn announcement() -> Announcement {
        Announcement {
            entity_id: 427520,
            title: "Update 1".into(),
            url: "http://x/1".into(),
            published_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn game_appid_accepts_string_or_int() {
        let g: Game = serde_yaml::from_str("name: Factorio\nappid: \"427520\"").unwrap();
        assert_eq!(g, Game::new("Factorio", 427520));
        let g: Game = serde_yaml::from_str("name: Factorio\nappid: 427520").unwrap();
        assert_eq!(g.appid, 427520);
        assert!(serde_yaml::from_str::<Game>("name: Factorio\nappid: nope").is_err());
    }

    #[test]
    fn change_record_renders_labeled_block() {
        let change = ChangeRecord::new(ChangeKind::New, "Factorio", &announcement());
        let text = change.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Game: Factorio (new)");
        assert!(lines[1].starts_with("Posted: "));
        assert_eq!(lines[2], "Title: Update 1");
        assert_eq!(lines[3], "Link: http://x/1");
    }
}
