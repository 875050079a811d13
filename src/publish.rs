//! Facebook page publishing.
//!
//! Translated captions can be posted to a Facebook page through the Graph API
//! using one of two strategies:
//!
//! | Strategy | Endpoint | Form fields |
//! |----------|----------|-------------|
//! | [`PublishStrategy::Photo`] | `/{page_id}/photos` | `url`, `message`, `access_token` |
//! | [`PublishStrategy::Feed`] | `/{page_id}/feed` | `message`, `link` (when known), `access_token` |
//!
//! Publishing is best effort: a single form-encoded POST, success on `200 OK`,
//! no retry. Without page credentials nothing is sent and the result is
//! `false`.

use crate::config::{AppConfig, PageCredentials};
use crate::utils::truncate_for_log;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::fmt;
use tracing::{error, info, instrument};
use url::Url;

/// How a translated item is posted to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PublishStrategy {
    /// Photo post captioned with the translation. Needs an image URL.
    #[default]
    Photo,
    /// Plain feed post, linking back to the source when available.
    Feed,
}

impl PublishStrategy {
    pub fn requires_image(self) -> bool {
        matches!(self, PublishStrategy::Photo)
    }

    fn edge(self) -> &'static str {
        match self {
            PublishStrategy::Photo => "photos",
            PublishStrategy::Feed => "feed",
        }
    }
}

/// Content of a single page post.
#[derive(Debug, Clone, Copy)]
pub struct PagePost<'a> {
    pub caption: &'a str,
    pub image_url: Option<&'a str>,
    pub link: Option<&'a str>,
}

/// Something that can post to a page.
pub trait Publish {
    /// Whether credentials are available. Unconfigured publishers never post.
    fn is_configured(&self) -> bool;

    fn strategy(&self) -> PublishStrategy;

    /// Post once; `true` on success.
    async fn publish(&self, post: &PagePost<'_>) -> bool;
}

/// Graph API publisher for one Facebook page.
///
/// Holds the page credentials (if any) and the strategy picked at startup.
/// Without credentials [`Publish::publish`] returns `false` without sending
/// anything.
pub struct FacebookPublisher {
    http: Client,
    graph_base: Url,
    credentials: Option<PageCredentials>,
    strategy: PublishStrategy,
}

impl fmt::Debug for FacebookPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacebookPublisher")
            .field("graph_base", &self.graph_base.as_str())
            .field("credentials", &self.credentials)
            .field("strategy", &self.strategy)
            .finish()
    }
}

impl FacebookPublisher {
    /// Create a publisher from the resolved configuration.
    ///
    /// # Arguments
    ///
    /// * `http` - Shared HTTP client
    /// * `config` - Supplies the Graph API base URL, page credentials and strategy
    ///
    /// # Returns
    ///
    /// The publisher, or a parse error for an invalid `graph_base_url`.
    pub fn new(http: Client, config: &AppConfig) -> Result<Self, url::ParseError> {
        Ok(Self {
            http,
            graph_base: Url::parse(&config.graph_base_url)?,
            credentials: config.page.clone(),
            strategy: config.publish_strategy,
        })
    }

    /// Page-scoped endpoint for the configured strategy, if credentials exist.
    pub fn endpoint(&self) -> Option<Url> {
        let page = self.credentials.as_ref()?;
        let mut url = self.graph_base.clone();
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .push(&page.page_id)
            .push(self.strategy.edge());
        Some(url)
    }

    /// Form body for `post`. The access token is always the last field.
    pub fn form_fields(&self, post: &PagePost<'_>) -> Vec<(&'static str, String)> {
        let mut fields = Vec::with_capacity(3);
        match self.strategy {
            PublishStrategy::Photo => {
                fields.push(("url", post.image_url.unwrap_or_default().to_string()));
                fields.push(("message", post.caption.to_string()));
            }
            PublishStrategy::Feed => {
                fields.push(("message", post.caption.to_string()));
                if let Some(link) = post.link.filter(|l| !l.is_empty()) {
                    fields.push(("link", link.to_string()));
                }
            }
        }
        if let Some(page) = &self.credentials {
            fields.push(("access_token", page.access_token.clone()));
        }
        fields
    }
}

impl Publish for FacebookPublisher {
    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    fn strategy(&self) -> PublishStrategy {
        self.strategy
    }

    #[instrument(level = "info", skip_all, fields(strategy = ?self.strategy))]
    async fn publish(&self, post: &PagePost<'_>) -> bool {
        let Some(endpoint) = self.endpoint() else {
            info!("Facebook config not found; skipping post");
            return false;
        };

        let response = match self
            .http
            .post(endpoint)
            .form(&self.form_fields(post))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Post request failed");
                return false;
            }
        };

        let status = response.status();
        if status == StatusCode::OK {
            info!("Post published");
            true
        } else {
            let body = response.text().await.unwrap_or_default();
            error!(
                status = status.as_u16(),
                body = %truncate_for_log(&body, 300),
                "Post rejected"
            );
            false
        }
    }
}
