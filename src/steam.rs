//! Steam Web API client: latest community announcement per app.
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::FetchError;
use crate::model::{Announcement, Game};

const NEWS_PATH: &str = "ISteamNews/GetNewsForApp/v2/";
const ANNOUNCEMENTS_FEED: &str = "steam_community_announcements";

/// Source of the latest announcement for a game.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn latest(&self, game: &Game) -> Result<Announcement, FetchError>;
}

#[derive(Clone)]
pub struct SteamNewsClient {
    http: Client,
    endpoint: Url,
    max_length: u32,
    timeout: Duration,
}

impl fmt::Debug for SteamNewsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SteamNewsClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    appnews: AppNews,
}

#[derive(Debug, Deserialize)]
struct AppNews {
    #[serde(default)]
    newsitems: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    title: String,
    url: String,
    /// Unix seconds.
    date: i64,
}

impl SteamNewsClient {
    pub fn new(base_url: &str, max_length: u32, timeout: Duration) -> Result<Self> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let endpoint = Url::parse(&base)
            .and_then(|b| b.join(NEWS_PATH))
            .with_context(|| format!("invalid Steam base URL {base_url}"))?;
        let http = Client::builder()
            .user_agent(concat!("steam-news-watch/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            endpoint,
            max_length,
            timeout,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            &cfg.steam.base_url,
            cfg.steam.max_length,
            Duration::from_secs(cfg.steam.timeout_secs),
        )
    }

    pub fn build_request(&self, appid: i64) -> Result<reqwest::Request, FetchError> {
        self.http
            .get(self.endpoint.clone())
            .query(&[
                ("appid", appid.to_string()),
                ("count", "1".to_string()),
                ("maxlength", self.max_length.to_string()),
                ("feeds", ANNOUNCEMENTS_FEED.to_string()),
            ])
            .timeout(self.timeout)
            .build()
            .map_err(FetchError::Http)
    }
}

#[async_trait]
impl NewsSource for SteamNewsClient {
    async fn latest(&self, game: &Game) -> Result<Announcement, FetchError> {
        let request = self.build_request(game.appid)?;
        debug!(url = %request.url(), appid = game.appid, "fetching news");
        let res = self.http.execute(request).await.map_err(FetchError::Http)?;

        if !res.status().is_success() {
            return Err(FetchError::Status(res.status()));
        }

        let payload: NewsResponse = res.json().await.map_err(FetchError::Decode)?;
        let item = payload
            .appnews
            .newsitems
            .into_iter()
            .next()
            .ok_or(FetchError::MissingItem { appid: game.appid })?;
        announcement_from_item(game.appid, item)
    }
}

fn announcement_from_item(appid: i64, item: NewsItem) -> Result<Announcement, FetchError> {
    let published_at = DateTime::<Utc>::from_timestamp(item.date, 0).ok_or(
        FetchError::InvalidDate {
            appid,
            date: item.date,
        },
    )?;
    Ok(Announcement {
        entity_id: appid,
        title: item.title,
        url: item.url,
        published_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_feed_query() {
        let client =
            SteamNewsClient::new("https://api.steampowered.com", 10, Duration::from_secs(5))
                .unwrap();
        let req = client.build_request(427520).unwrap();
        assert_eq!(req.url().path(), "/ISteamNews/GetNewsForApp/v2/");
        let query = req.url().query().unwrap();
        assert!(query.contains("appid=427520"));
        assert!(query.contains("count=1"));
        assert!(query.contains("maxlength=10"));
        assert!(query.contains("feeds=steam_community_announcements"));
        assert_eq!(req.timeout(), Some(&Duration::from_secs(5)));
    }

    #[test]
    fn base_url_with_path_is_kept() {
        let client =
            SteamNewsClient::new("http://proxy.local/steam", 10, Duration::from_secs(5)).unwrap();
        let req = client.build_request(1).unwrap();
        assert_eq!(req.url().path(), "/steam/ISteamNews/GetNewsForApp/v2/");
    }

    #[test]
    fn item_date_is_epoch_seconds() {
        let item = NewsItem {
            title: "Update 1".into(),
            url: "http://x/1".into(),
            date: 1_700_000_000,
        };
        let a = announcement_from_item(1, item).unwrap();
        assert_eq!(a.published_at.timestamp(), 1_700_000_000);
        assert_eq!(a.entity_id, 1);
    }

    #[test]
    fn out_of_range_date_is_rejected() {
        let item = NewsItem {
            title: "t".into(),
            url: "u".into(),
            date: i64::MAX,
        };
        let err = announcement_from_item(9, item).unwrap_err();
        assert!(matches!(err, FetchError::InvalidDate { appid: 9, .. }));
    }
}
