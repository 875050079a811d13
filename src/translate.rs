//! News translation on top of an [`AskAsync`] backend.
//!
//! [`Translator`] turns a composite news text into a short Malay summary. It
//! rejects blank input before touching the network and wraps the backend in
//! [`RetryAsk`] so rate-limited calls are retried with backoff.

use crate::api::{AskAsync, AskError, RetryAsk};
use crate::config::{AppConfig, PROMPT_PLACEHOLDER};
use std::time::Duration;
use thiserror::Error;
use tracing::{instrument, warn};

/// Base delay of the rate-limit backoff.
const BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Why an item could not be translated. Any variant means "skip the item".
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("input text is empty")]
    EmptyInput,

    #[error("model returned an empty translation")]
    EmptyResponse,

    #[error("still rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),
}

/// Malay translator and summarizer over any [`AskAsync`] backend.
///
/// Every call goes through [`RetryAsk`], so rate-limited requests are retried
/// with exponential backoff before a [`TranslateError::RateLimited`] is
/// returned.
pub struct Translator<A> {
    api: RetryAsk<A>,
    template: String,
}

impl<A: AskAsync> Translator<A> {
    /// Wrap `backend` with the configured attempt budget and prompt template.
    pub fn new(backend: A, config: &AppConfig) -> Self {
        Self {
            api: RetryAsk::new(backend, config.max_attempts, BACKOFF_BASE),
            template: config.prompt_template.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &A {
        self.api.inner()
    }

    pub fn build_prompt(&self, text: &str) -> String {
        self.template.replace(PROMPT_PLACEHOLDER, text)
    }

    /// Translate and summarize `text`.
    #[instrument(level = "info", skip_all, fields(text_bytes = text.len()))]
    pub async fn translate(&self, text: &str) -> Result<String, TranslateError> {
        if text.trim().is_empty() {
            return Err(TranslateError::EmptyInput);
        }

        let prompt = self.build_prompt(text);
        self.api.ask(&prompt).await.map_err(|e| {
            warn!(error = %e, "Translation failed");
            match e {
                AskError::RateLimited => TranslateError::RateLimited {
                    attempts: self.api.max_attempts(),
                },
                AskError::Status { status, body } => TranslateError::Api { status, body },
                AskError::Transport(msg) => TranslateError::Transport(msg),
                AskError::EmptyResponse => TranslateError::EmptyResponse,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use crate::mock::ScriptedAsk;

    #[tokio::test]
    async fn test_blank_input_skips_network() {
        let translator = Translator::new(ScriptedAsk::new(vec![]), &test_config());

        for input in ["", "   ", "\n\t  \n"] {
            let result = translator.translate(input).await;
            assert!(matches!(result, Err(TranslateError::EmptyInput)));
        }
        assert_eq!(translator.backend().calls(), 0);
    }

    #[tokio::test]
    async fn test_prompt_embeds_text() {
        let backend = ScriptedAsk::new(vec![Ok("Bitcoin naik.".to_string())]);
        let translator = Translator::new(backend, &test_config());

        let out = translator.translate("BTC hits 100k").await.unwrap();
        assert_eq!(out, "Bitcoin naik.");

        let prompts = translator.backend().prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Original news:\n'BTC hits 100k'"));
        assert!(prompts[0].contains("Translate the following news into Malay."));
        assert!(!prompts[0].contains(PROMPT_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_empty_model_output_is_failure() {
        let backend = ScriptedAsk::new(vec![Err(AskError::EmptyResponse)]);
        let translator = Translator::new(backend, &test_config());
        assert!(matches!(
            translator.translate("news").await,
            Err(TranslateError::EmptyResponse)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_exhaustion_maps_to_attempt_count() {
        let backend = ScriptedAsk::new((0..5).map(|_| Err(AskError::RateLimited)).collect());
        let translator = Translator::new(backend, &test_config());

        let result = translator.translate("news").await;
        assert!(matches!(result, Err(TranslateError::RateLimited { attempts: 5 })));
        assert_eq!(translator.backend().calls(), 5);
    }

    #[tokio::test]
    async fn test_api_error_is_surfaced() {
        let backend = ScriptedAsk::new(vec![Err(AskError::Status {
            status: 403,
            body: "forbidden".to_string(),
        })]);
        let translator = Translator::new(backend, &test_config());
        assert!(matches!(
            translator.translate("news").await,
            Err(TranslateError::Api { status: 403, .. })
        ));
    }
}
