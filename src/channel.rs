use crate::config::Config;
use crate::pipeline::FeedEntry;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

/// Fetch failures, split so the operator-facing message can tell "the
/// provider is unreachable" apart from "the channel exists but holds no
/// data". A decode failure reads as a connectivity problem on the dashboard;
/// the payload detail goes to the logs only.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("telemetry channel unreachable: {0}")]
    Network(#[source] reqwest::Error),
    #[error("channel has no data yet")]
    EmptyChannel,
    #[error("telemetry channel unreachable")]
    Decode(#[source] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct FeedsEnvelope {
    #[serde(default)]
    feeds: Vec<FeedEntry>,
}

/// Read-only client for one provider channel.
#[derive(Debug, Clone)]
pub struct ChannelClient {
    http: Client,
    base_url: String,
    channel_id: u64,
    read_api_key: Option<String>,
}

impl ChannelClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            channel_id: config.channel_id,
            read_api_key: config.read_api_key.clone(),
        })
    }

    /// Fetches the channel's most recent feed entry.
    pub async fn fetch_latest(&self) -> Result<FeedEntry, FetchError> {
        let url = format!(
            "{}/channels/{}/feeds/last.json",
            self.base_url, self.channel_id
        );
        let body = self.get_text(&url, &[]).await?;
        let entry = decode_entry(&body)?;
        if entry.entry_id.is_none() {
            return Err(FetchError::EmptyChannel);
        }
        Ok(entry)
    }

    /// Fetches the trailing window of up to `results` entries, oldest first,
    /// as the provider returns them.
    pub async fn fetch_window(&self, results: u32) -> Result<Vec<FeedEntry>, FetchError> {
        let url = format!("{}/channels/{}/feeds.json", self.base_url, self.channel_id);
        let body = self
            .get_text(&url, &[("results", results.to_string())])
            .await?;
        // An empty channel answers the bare `-1` here too; report that as a
        // zero-entry window rather than an error.
        if channel_is_empty(&body) {
            return Ok(Vec::new());
        }
        let envelope: FeedsEnvelope = decode_json(&body)?;
        Ok(envelope.feeds)
    }

    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, FetchError> {
        let mut request = self.http.get(url);
        for (key, value) in query {
            request = request.query(&[(*key, value.as_str())]);
        }
        if let Some(key) = &self.read_api_key {
            request = request.query(&[("api_key", key.as_str())]);
        }
        let response = request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(FetchError::Network)?;
        response.text().await.map_err(FetchError::Network)
    }
}

fn decode_entry(body: &str) -> Result<FeedEntry, FetchError> {
    if channel_is_empty(body) {
        return Err(FetchError::EmptyChannel);
    }
    decode_json(body)
}

fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, FetchError> {
    serde_json::from_str(body).map_err(|err| {
        tracing::warn!(error = %err, "channel payload failed to decode");
        FetchError::Decode(err)
    })
}

/// The provider answers a bare `-1` (not JSON-wrapped) for a channel that has
/// never received an entry.
fn channel_is_empty(body: &str) -> bool {
    let trimmed = body.trim();
    trimmed.is_empty() || trimmed == "-1" || trimmed == "null"
}
