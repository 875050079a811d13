//! Run configuration.
//!
//! [`AppConfig`] is resolved once at startup from the CLI/environment and an
//! optional YAML settings file, then handed by reference to every component.
//! Precedence is flag/env, then settings file, then built-in default.

use crate::cli::Cli;
use crate::publish::PublishStrategy;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

pub const DEFAULT_OUTPUT_PATH: &str = "translated_news.json";
pub const DEFAULT_APIFY_BASE_URL: &str = "https://api.apify.com";
pub const DEFAULT_APIFY_ACTOR: &str = "buseta~crypto-news";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.facebook.com";

/// Placeholder replaced by the news text inside a prompt template.
pub const PROMPT_PLACEHOLDER: &str = "{text}";

/// Default Gemini prompt: a short, casual Malay summary of the news.
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"
Translate the following news into Malay.
Then, kindly write a short conclusion or summary of the news in less than 280 characters in 1 paragraph.
Only return the short conclusion without any explanation, heading, or intro phrase.
Use natural, conversational, friendly Malaysian Malay — like how a friend shares info.
Keep it simple, relaxed, and easy to understand.
Avoid using exaggerated slang words or interjections (such as "Eh," "Korang," "Woi," "Wooohooo," "Wooo," or anything similar).
No shouting words or unnecessary excitement.
Keep it informative, approachable, and casual — but clean and neutral.
Do not use emojis unless they appear in the original text.
Do not translate brand names or product names.
Do not phrase the summary as if it is referring to a news source — write it as a general insight or observation instead.
⚠️ Do NOT include phrases like "Terjemahan:", "Kesimpulan:", "Baiklah,", "Secara ringkas", "**Conclusion:**", "**Translation:**", or anything similar. Just give the final sentence.


Original news:
'{text}'
"#;

/// Errors raised while resolving [`AppConfig`]. All of them abort the run
/// before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required credential: {0}")]
    MissingCredential(&'static str),

    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Facebook page credentials. Both halves must be present for posting.
#[derive(Clone)]
pub struct PageCredentials {
    pub page_id: String,
    pub access_token: String,
}

impl std::fmt::Debug for PageCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCredentials")
            .field("page_id", &self.page_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Optional YAML settings file. Every key falls back to a default.
///
/// ```yaml
/// output_path: out/translated_news.json
/// publish_strategy: feed
/// item_delay_secs: 2
/// gemini_model: gemini-1.5-flash
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub output_path: Option<String>,
    pub publish_strategy: Option<PublishStrategy>,
    pub item_delay_secs: Option<u64>,
    pub fetch_timeout_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub apify_base_url: Option<String>,
    pub apify_actor: Option<String>,
    pub gemini_base_url: Option<String>,
    pub gemini_model: Option<String>,
    pub graph_base_url: Option<String>,
    pub prompt_template: Option<String>,
}

impl Settings {
    /// Load settings from a YAML file.
    #[instrument(level = "info")]
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        // An empty file is a valid "all defaults" settings file.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini_api_key: String,
    pub apify_api_token: String,
    /// `None` disables publishing without failing the run.
    pub page: Option<PageCredentials>,
    pub publish_strategy: PublishStrategy,
    pub output_path: PathBuf,
    pub item_delay: Duration,
    pub fetch_timeout: Duration,
    pub max_attempts: u32,
    pub apify_base_url: String,
    pub apify_actor: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub graph_base_url: String,
    pub prompt_template: String,
}

impl AppConfig {
    /// Resolve configuration from parsed CLI arguments, loading the settings
    /// file when one was given.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let settings = match cli.config.as_deref() {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        Self::resolve(cli, settings)
    }

    /// Merge CLI arguments over `settings` and validate the result.
    pub fn resolve(cli: &Cli, settings: Settings) -> Result<Self, ConfigError> {
        let gemini_api_key = non_empty(cli.gemini_api_key.as_deref())
            .ok_or(ConfigError::MissingCredential("GEMINI_API_KEY"))?;
        let apify_api_token = non_empty(cli.apify_api_token.as_deref())
            .ok_or(ConfigError::MissingCredential("APIFY_API_TOKEN"))?;

        let page = if cli.no_publish {
            None
        } else {
            match (
                non_empty(cli.fb_page_id.as_deref()),
                non_empty(cli.fb_page_access_token.as_deref()),
            ) {
                (Some(page_id), Some(access_token)) => Some(PageCredentials {
                    page_id,
                    access_token,
                }),
                _ => None,
            }
        };

        let max_attempts = settings.max_attempts.unwrap_or(5);
        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }

        let prompt_template = settings
            .prompt_template
            .unwrap_or_else(|| DEFAULT_PROMPT_TEMPLATE.to_string());
        if !prompt_template.contains(PROMPT_PLACEHOLDER) {
            return Err(ConfigError::Invalid {
                key: "prompt_template",
                reason: format!("must contain the {PROMPT_PLACEHOLDER} placeholder"),
            });
        }

        let config = Self {
            gemini_api_key,
            apify_api_token,
            page,
            publish_strategy: cli
                .publish_strategy
                .or(settings.publish_strategy)
                .unwrap_or_default(),
            output_path: PathBuf::from(
                cli.output
                    .clone()
                    .or(settings.output_path)
                    .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string()),
            ),
            item_delay: Duration::from_secs(settings.item_delay_secs.unwrap_or(1)),
            fetch_timeout: Duration::from_secs(settings.fetch_timeout_secs.unwrap_or(600)),
            max_attempts,
            apify_base_url: settings
                .apify_base_url
                .unwrap_or_else(|| DEFAULT_APIFY_BASE_URL.to_string()),
            apify_actor: settings
                .apify_actor
                .unwrap_or_else(|| DEFAULT_APIFY_ACTOR.to_string()),
            gemini_base_url: settings
                .gemini_base_url
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            gemini_model: settings
                .gemini_model
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            graph_base_url: settings
                .graph_base_url
                .unwrap_or_else(|| DEFAULT_GRAPH_BASE_URL.to_string()),
            prompt_template,
        };
        debug!(
            output = %config.output_path.display(),
            strategy = ?config.publish_strategy,
            publishing = config.page.is_some(),
            "Resolved configuration"
        );
        Ok(config)
    }

    /// Whether page credentials are available for posting.
    pub fn publishing_enabled(&self) -> bool {
        self.page.is_some()
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
