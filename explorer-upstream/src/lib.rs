//! The upstream time-series source this system caches against.
//!
//! [`UpstreamClient`] is the seam the fetch planner (`explorer-server`)
//! depends on; [`HttpUpstreamClient`] is the one real implementation, a
//! thin `reqwest` wrapper over the upstream contract. Tests exercise the
//! planner against a fake implementation instead of a live network.

mod parse;

use std::time::Duration;

use async_trait::async_trait;
use explorer_core::{Sample, TagInfo};

pub use parse::{parse_taglist_response, parse_values_response};

/// Wall-clock budget for a single upstream call. Exceeding it is treated
/// the same as a transport failure: an empty result and a logged,
/// non-fatal warning.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);

/// A connector to the upstream time-series source.
///
/// Fetches are idempotent: retrying a previously-failed gap is safe and is
/// how this system recovers from transient upstream failures (the fetch
/// planner never retries automatically — only a subsequent user request
/// over the same range does).
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Fetches samples for `tag` within `[start_sec, end_sec]`. Returns an
    /// empty list on timeout or transport failure; never returns an error,
    /// since a failed fetch leaves the requested gap uncovered rather than
    /// aborting the caller.
    async fn fetch_samples(&self, tag: &str, start_sec: i64, end_sec: i64) -> Vec<Sample>;

    /// Fetches the current taglist. Returns an empty list on failure.
    async fn fetch_taglist(&self) -> Vec<TagInfo>;
}

/// A `reqwest`-backed [`UpstreamClient`] talking to the HTTP contract in
/// this system's external interface spec: `GET /taglist` and
/// `GET /values?tag=..&startDateUnixSeconds=..&endDateUnixSeconds=..`.
pub struct HttpUpstreamClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUpstreamClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .expect("reqwest client with static config must build");
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    async fn fetch_samples(&self, tag: &str, start_sec: i64, end_sec: i64) -> Vec<Sample> {
        let url = format!("{}/values", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("tag", tag.to_string()),
                ("startDateUnixSeconds", start_sec.to_string()),
                ("endDateUnixSeconds", end_sec.to_string()),
            ])
            .send()
            .await;

        let response = match response {
            Ok(resp) => resp,
            Err(err) => {
                tracing::warn!(%tag, %err, "upstream fetch failed");
                return Vec::new();
            }
        };

        match response.json::<Vec<serde_json::Value>>().await {
            Ok(body) => parse_values_response(&body),
            Err(err) => {
                tracing::warn!(%tag, %err, "upstream response was not valid JSON");
                Vec::new()
            }
        }
    }

    async fn fetch_taglist(&self) -> Vec<TagInfo> {
        let url = format!("{}/taglist", self.base_url);
        let response = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(err) => {
                tracing::warn!(%err, "upstream taglist fetch failed");
                return Vec::new();
            }
        };

        match response.json::<Vec<serde_json::Value>>().await {
            Ok(body) => parse_taglist_response(&body),
            Err(err) => {
                tracing::warn!(%err, "upstream taglist response was not valid JSON");
                Vec::new()
            }
        }
    }
}
