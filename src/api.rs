//! Gemini API interaction with exponential backoff on rate limiting.
//!
//! # Architecture
//!
//! - [`AskAsync`]: core trait for sending a prompt and receiving text
//! - [`GeminiClient`]: `generateContent` over HTTP
//! - [`RetryAsk`]: decorator that retries rate-limited calls
//!
//! # Retry Strategy
//!
//! Only [`AskError::RateLimited`] (HTTP 429) is retried. After failed attempt
//! `n` the decorator sleeps `base_delay * 2^(n-1)`, so with the default
//! settings the gaps are 1s, 2s, 4s and 8s across 5 attempts. Every other
//! error is returned immediately.

use crate::config::AppConfig;
use crate::utils::{base_url, truncate_for_log};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use url::Url;

/// Failure of a single generative API call.
#[derive(Debug, Error)]
pub enum AskError {
    #[error("rate limited by the API")]
    RateLimited,

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("response contained no text")]
    EmptyResponse,
}

impl From<reqwest::Error> for AskError {
    fn from(e: reqwest::Error) -> Self {
        AskError::Transport(e.to_string())
    }
}

/// Trait for async prompt/response interaction with a language model.
pub trait AskAsync {
    /// Send `prompt` and return the model's trimmed, non-empty text.
    async fn ask(&self, prompt: &str) -> Result<String, AskError>;
}

/// `generateContent` request body: `{contents:[{parts:[{text}]}]}`.
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
pub struct RequestContent<'a> {
    pub parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
pub struct RequestPart<'a> {
    pub text: &'a str,
}

impl<'a> GenerateRequest<'a> {
    pub fn from_prompt(prompt: &'a str) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        }
    }
}

/// The subset of the `generateContent` response we read.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

/// Extract `candidates[0].content.parts[0].text`, trimmed. Blank text counts
/// as missing.
pub fn extract_text(response: GenerateResponse) -> Option<String> {
    let text = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .next()?
        .text?;
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// HTTP client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    endpoint: Url,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The endpoint carries the API key in its query string.
        f.debug_struct("GeminiClient")
            .field("host", &self.endpoint.host_str())
            .field("path", &self.endpoint.path())
            .finish()
    }
}

impl GeminiClient {
    pub fn new(http: Client, config: &AppConfig) -> Result<Self, url::ParseError> {
        let base = base_url(&config.gemini_base_url)?;
        let mut endpoint = base.join(&format!(
            "v1beta/models/{}:generateContent",
            config.gemini_model
        ))?;
        endpoint
            .query_pairs_mut()
            .append_pair("key", &config.gemini_api_key);
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl AskAsync for GeminiClient {
    #[instrument(level = "debug", skip_all, fields(prompt_bytes = prompt.len()))]
    async fn ask(&self, prompt: &str) -> Result<String, AskError> {
        let t0 = Instant::now();
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&GenerateRequest::from_prompt(prompt))
            .send()
            .await
            .inspect_err(|e| warn!(error = %e, "Gemini request failed"))?;
        let status = response.status();
        let dt = t0.elapsed();

        match status {
            StatusCode::OK => {
                let body: GenerateResponse = response.json().await?;
                info!(elapsed_ms = dt.as_millis(), "Gemini responded");
                extract_text(body).ok_or(AskError::EmptyResponse)
            }
            StatusCode::TOO_MANY_REQUESTS => Err(AskError::RateLimited),
            other => {
                let body = response.text().await.unwrap_or_default();
                Err(AskError::Status {
                    status: other.as_u16(),
                    body: truncate_for_log(&body, 500),
                })
            }
        }
    }
}

/// Wrapper that retries rate-limited calls of any [`AskAsync`] implementation
/// with exponential backoff.
///
/// ```text
/// delay after failed attempt n = base_delay * 2^(n-1)
/// ```
pub struct RetryAsk<T> {
    inner: T,
    /// Total attempts, including the first one.
    max_attempts: u32,
    base_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    /// # Example
    ///
    /// ```ignore
    /// let api = RetryAsk::new(GeminiClient::new(http, &config)?, 5, Duration::from_secs(1));
    /// ```
    pub fn new(inner: T, max_attempts: u32, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &T {
        &self.inner
    }

    /// Backoff slept after failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> StdDuration {
        self.base_delay
            .saturating_mul(1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX))
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync,
{
    #[instrument(level = "info", skip_all)]
    async fn ask(&self, prompt: &str) -> Result<String, AskError> {
        let total_t0 = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.inner.ask(prompt).await {
                Ok(text) => return Ok(text),
                Err(AskError::RateLimited) if attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        attempt,
                        max = self.max_attempts,
                        ?delay,
                        "Rate limited; backing off"
                    );
                    sleep(delay).await;
                }
                Err(AskError::RateLimited) => {
                    error!(
                        attempt,
                        max = self.max_attempts,
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        "Rate limited; retries exhausted"
                    );
                    return Err(AskError::RateLimited);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
