//! The per-item translation pipeline.
//!
//! ```text
//! fetch ──▶ for each item: translate ──▶ (publish)? ──▶ record ──▶ sleep
//!       └─▶ save document
//! ```
//!
//! Items are processed strictly one after another. A failed translation drops
//! the item; a skipped or failed post still records it as ready for posting.
//! The output document is written even when nothing succeeded.

use crate::api::AskAsync;
use crate::config::AppConfig;
use crate::fetch::NewsSource;
use crate::models::{NewsItem, PostStatus, TranslationResult};
use crate::outputs::json;
use crate::publish::{PagePost, Publish};
use crate::translate::Translator;
use crate::utils::now_iso;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

/// Counts for one finished run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub translated: usize,
    pub posted: usize,
    pub skipped: usize,
}

/// One batch run: fetch, translate each item, optionally post it, and write
/// the output document.
///
/// Items are handled strictly one after another with `item_delay` between
/// recorded items.
pub struct Pipeline<S, A, P> {
    source: S,
    translator: Translator<A>,
    publisher: P,
    item_delay: Duration,
    output_path: PathBuf,
}

impl<S, A, P> Pipeline<S, A, P>
where
    S: NewsSource,
    A: AskAsync,
    P: Publish,
{
    /// # Arguments
    ///
    /// * `source` - Where the news items come from
    /// * `translator` - Produces the Malay caption for each item
    /// * `publisher` - Posts captions when configured
    /// * `config` - Supplies the inter-item delay and the output path
    pub fn new(source: S, translator: Translator<A>, publisher: P, config: &AppConfig) -> Self {
        Self {
            source,
            translator,
            publisher,
            item_delay: config.item_delay,
            output_path: config.output_path.clone(),
        }
    }

    /// Translate one item and try to post it. `None` when translation failed.
    #[instrument(level = "info", skip_all, fields(item = index + 1))]
    pub async fn process_item(&self, index: usize, item: &NewsItem) -> Option<TranslationResult> {
        let caption = match self.translator.translate(&item.full_text()).await {
            Ok(caption) => caption,
            Err(e) => {
                warn!(error = %e, "Translation failed; skipping item");
                return None;
            }
        };

        let image_url = item.image_url();
        let posted = if !self.publisher.is_configured() {
            info!("Facebook config missing; saving preview only");
            false
        } else if self.publisher.strategy().requires_image() && image_url.is_none() {
            info!("No image URL; skipping post for now");
            false
        } else {
            let link = Some(item.original_url()).filter(|l| !l.is_empty());
            self.publisher
                .publish(&PagePost {
                    caption: &caption,
                    image_url,
                    link,
                })
                .await
        };

        Some(TranslationResult {
            title: item.title.clone(),
            original_url: item.original_url().to_string(),
            image_url: item.image.clone().unwrap_or_default(),
            translated_text: caption,
            timestamp: item.time.clone().unwrap_or_else(now_iso),
            status: PostStatus::from_posted(posted),
        })
    }

    /// Run the whole job and write the output document.
    ///
    /// Only a failure to write the document is returned as an error.
    #[instrument(level = "info", skip_all, fields(output = %self.output_path.display()))]
    pub async fn run(&self) -> Result<RunSummary, Box<dyn Error>> {
        let items = self.source.fetch().await;
        let mut summary = RunSummary {
            fetched: items.len(),
            ..RunSummary::default()
        };
        let mut results = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            info!(item = index + 1, total = items.len(), "Processing news item");
            match self.process_item(index, item).await {
                Some(result) => {
                    if result.status == PostStatus::Posted {
                        summary.posted += 1;
                    }
                    results.push(result);
                }
                None => {
                    summary.skipped += 1;
                    continue;
                }
            }

            if !self.item_delay.is_zero() {
                sleep(self.item_delay).await;
            }
        }

        summary.translated = results.len();
        json::write_document(results, &self.output_path).await?;
        info!(
            fetched = summary.fetched,
            translated = summary.translated,
            posted = summary.posted,
            skipped = summary.skipped,
            "Run complete"
        );
        Ok(summary)
    }
}
