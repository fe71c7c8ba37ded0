//! External song details API client
//!
//! New songs arrive as just (group, song). Release date, link and lyrics
//! come from an external HTTP service:
//! `GET <url>?group=<group>&song=<song>` → `{release_date, link, text}`.

use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;
use thiserror::Error;

use crate::models::SongDetails;

const USER_AGENT: &str = concat!("muslib/", env!("CARGO_PKG_VERSION"));

/// Song details lookup errors
#[derive(Debug, Error)]
pub enum SongDetailsError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected status {0}")]
    Status(u16),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

/// Source of metadata for songs being added
#[async_trait]
pub trait SongDetailsFetcher: Send + Sync {
    async fn fetch(&self, group: &str, song: &str) -> Result<SongDetails, SongDetailsError>;
}

/// reqwest-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpSongDetailsClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl HttpSongDetailsClient {
    /// Build a client for `base_url`
    ///
    /// The URL must be absolute http(s); every request is bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SongDetailsError> {
        let base_url =
            Url::parse(base_url).map_err(|e| SongDetailsError::InvalidUrl(e.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(SongDetailsError::InvalidUrl(format!(
                "unsupported scheme: {}",
                base_url.scheme()
            )));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SongDetailsError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl SongDetailsFetcher for HttpSongDetailsClient {
    async fn fetch(&self, group: &str, song: &str) -> Result<SongDetails, SongDetailsError> {
        tracing::debug!(group = %group, song = %song, url = %self.base_url, "Querying song details API");

        let response = self
            .http_client
            .get(self.base_url.clone())
            .query(&[("group", group), ("song", song)])
            .send()
            .await
            .map_err(|e| SongDetailsError::Network(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(SongDetailsError::Status(status.as_u16()));
        }

        response
            .json::<SongDetails>()
            .await
            .map_err(|e| SongDetailsError::Decode(e.to_string()))
    }
}
