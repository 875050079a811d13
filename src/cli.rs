//! Command-line interface definitions for the crypto news translator.
//!
//! Secrets are normally supplied through the environment; every one of them
//! can also be passed as a flag. Non-secret tuning lives in the optional
//! settings file (see [`crate::config`]).

use crate::publish::PublishStrategy;
use clap::Parser;

/// Command-line arguments for a single translation run.
///
/// # Examples
///
/// ```sh
/// # Preview only (no Facebook credentials)
/// GEMINI_API_KEY=... APIFY_API_TOKEN=... cryptonews_translator
///
/// # Post as feed entries instead of photos, with a settings file
/// cryptonews_translator -c settings.yaml --publish-strategy feed
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Apify API token used to run the news scraper actor
    #[arg(long, env = "APIFY_API_TOKEN", hide_env_values = true)]
    pub apify_api_token: Option<String>,

    /// Facebook page access token (posting is skipped without it)
    #[arg(long, env = "FB_PAGE_ACCESS_TOKEN", hide_env_values = true)]
    pub fb_page_access_token: Option<String>,

    /// Facebook page id (posting is skipped without it)
    #[arg(long, env = "FB_PAGE_ID")]
    pub fb_page_id: Option<String>,

    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output path for the translated news document
    #[arg(short, long)]
    pub output: Option<String>,

    /// How translated posts are published to the page
    #[arg(long, value_enum)]
    pub publish_strategy: Option<PublishStrategy>,

    /// Never post, even when page credentials are present
    #[arg(long)]
    pub no_publish: bool,
}
