//! # Crypto News Translator
//!
//! A batch job that fetches crypto news from an Apify scraper actor, turns
//! each story into a short Malay summary with Gemini, optionally posts it to
//! a Facebook page, and saves the results to `translated_news.json`.
//!
//! ## Usage
//!
//! ```sh
//! export GEMINI_API_KEY=... APIFY_API_TOKEN=...
//! # Optional: enables posting
//! export FB_PAGE_ACCESS_TOKEN=... FB_PAGE_ID=...
//! cryptonews_translator --publish-strategy photo
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: one synchronous actor run returns the news batch
//! 2. **Translating**: each item goes through Gemini, with backoff on 429
//! 3. **Publishing**: optional page post (photo or feed strategy)
//! 4. **Output**: every translated item is written to one JSON document

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod api;
mod cli;
mod config;
mod fetch;
#[cfg(test)]
mod mock;
mod models;
mod outputs;
mod pipeline;
mod publish;
mod translate;
mod utils;

use api::GeminiClient;
use cli::Cli;
use config::AppConfig;
use fetch::ApifySource;
use pipeline::Pipeline;
use publish::FacebookPublisher;
use translate::Translator;
use utils::ensure_writable_parent;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("cryptonews_translator starting up");

    let args = Cli::parse();
    debug!(config = ?args.config, output = ?args.output, "Parsed CLI arguments");

    let config = match AppConfig::from_cli(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration; nothing was fetched");
            return Err(e.into());
        }
    };
    if !config.publishing_enabled() {
        info!("Facebook config not found; results will be saved as previews");
    }

    if let Err(e) = ensure_writable_parent(&config.output_path).await {
        error!(
            path = %config.output_path.display(),
            error = %e,
            "Output location is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let http = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let source = ApifySource::new(http.clone(), &config)?;
    let gemini = GeminiClient::new(http.clone(), &config)?;
    debug!(
        apify = source.endpoint().path(),
        gemini = gemini.endpoint().path(),
        "Resolved API endpoints"
    );
    let translator = Translator::new(gemini, &config);
    let publisher = FacebookPublisher::new(http, &config)?;

    let summary = Pipeline::new(source, translator, publisher, &config)
        .run()
        .await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        fetched = summary.fetched,
        translated = summary.translated,
        posted = summary.posted,
        "Execution complete"
    );

    Ok(())
}
