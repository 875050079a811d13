//! Crypto news fetching from the Apify scraper actor.
//!
//! The actor is started with `run-sync-get-dataset-items`, which blocks until
//! the scrape is done and answers `201 Created` with the dataset as a JSON
//! array. Scrapes are slow, so the request carries a long timeout. Any failure
//! is logged and yields an empty list; there is no retry.

use crate::config::AppConfig;
use crate::models::NewsItem;
use crate::utils::{base_url, truncate_for_log};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument};
use url::Url;

/// Source of news items for one run.
pub trait NewsSource {
    /// Fetch the current batch. Failures yield an empty list.
    async fn fetch(&self) -> Vec<NewsItem>;
}

/// Parse the dataset returned by the actor.
pub fn parse_items(body: &str) -> Result<Vec<NewsItem>, serde_json::Error> {
    serde_json::from_str(body)
}

/// [`NewsSource`] backed by a synchronous run of the Apify scraper actor.
///
/// The endpoint (with the API token in its query string) is built once at
/// construction; every [`NewsSource::fetch`] is a single POST bounded by the
/// configured fetch timeout.
pub struct ApifySource {
    http: Client,
    endpoint: Url,
    timeout: Duration,
}

impl fmt::Debug for ApifySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApifySource")
            .field("path", &self.endpoint.path())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ApifySource {
    /// # Arguments
    ///
    /// * `http` - Shared HTTP client
    /// * `config` - Supplies the Apify base URL, actor id, token and timeout
    ///
    /// # Returns
    ///
    /// The source, or a parse error for an invalid `apify_base_url`.
    pub fn new(http: Client, config: &AppConfig) -> Result<Self, url::ParseError> {
        let base = base_url(&config.apify_base_url)?;
        let mut endpoint = base.join(&format!(
            "v2/acts/{}/run-sync-get-dataset-items",
            config.apify_actor
        ))?;
        endpoint
            .query_pairs_mut()
            .append_pair("token", &config.apify_api_token);
        Ok(Self {
            http,
            endpoint,
            timeout: config.fetch_timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn try_fetch(&self) -> Result<Vec<NewsItem>, String> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("failed reading body: {e}"))?;

        if status != StatusCode::CREATED {
            return Err(format!("{}: {}", status.as_u16(), truncate_for_log(&body, 500)));
        }

        parse_items(&body).map_err(|e| {
            format!(
                "undecodable dataset ({e}): {}",
                truncate_for_log(&body, 300)
            )
        })
    }
}

impl NewsSource for ApifySource {
    #[instrument(level = "info", skip_all)]
    async fn fetch(&self) -> Vec<NewsItem> {
        let t0 = Instant::now();
        match self.try_fetch().await {
            Ok(items) => {
                info!(
                    count = items.len(),
                    elapsed_ms = t0.elapsed().as_millis(),
                    "Fetched news items"
                );
                debug!(titles = ?items.iter().map(|i| i.title.as_deref()).collect::<Vec<_>>(), "Fetched titles");
                items
            }
            Err(e) => {
                error!(error = %e, elapsed_ms = t0.elapsed().as_millis(), "Apify fetch failed");
                Vec::new()
            }
        }
    }
}
