//! LLM summarization providers with exponential backoff retry logic.
//!
//! This module turns an item's title, description and url into a short
//! summary by calling a hosted chat model. It is used only by the enricher.
//!
//! # Architecture
//!
//! - [`Summarizer`]: the one capability every provider offers
//! - [`OpenAiSummarizer`] / [`AnthropicSummarizer`]: the two wire shapes
//! - [`SummaryProvider`]: runtime choice between them, selected by [`ProviderKind`]
//! - [`RetrySummarize`]: decorator that retries transient failures
//!
//! All providers share the same prompt, response budget and request timeout;
//! only the request/response JSON and the authentication headers differ.
//!
//! # Retry Strategy
//!
//! - Only transient failures are retried (transport errors, HTTP 429, HTTP 5xx)
//! - Exponential backoff starting at the configured base delay
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use crate::utils::truncate_for_log;
use rand::{Rng, rng};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, InvalidHeaderValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// Hard timeout for a single summarization request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Response budget, in model tokens.
pub const MAX_TOKENS: u32 = 200;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// What a summarizer is given.
#[derive(Debug, Clone, Copy)]
pub struct SummaryRequest<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub url: &'a str,
}

/// Errors a provider call can end with.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed provider response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("provider response contained no text")]
    Empty,
    #[error("invalid credential header: {0}")]
    Header(#[from] InvalidHeaderValue),
}

impl SummarizeError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SummarizeError::Http(_) => true,
            SummarizeError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            SummarizeError::Json(_) | SummarizeError::Empty | SummarizeError::Header(_) => false,
        }
    }
}

/// Trait for async summarization.
///
/// Implementors turn one [`SummaryRequest`] into one short text, or fail.
pub trait Summarizer {
    async fn summarize(&self, req: &SummaryRequest<'_>) -> Result<String, SummarizeError>;
}

/// Build the fixed prompt sent to every provider.
///
/// The display audience reads Chinese, so the model is asked to answer in
/// Chinese with a one-line takeaway and the intended reader.
pub fn build_prompt(req: &SummaryRequest<'_>) -> String {
    let description = if req.description.trim().is_empty() {
        "N/A"
    } else {
        req.description
    };
    format!(
        "Summarize this tech news in Chinese for developers:\n\
         Title: {}\n\
         Description: {}\n\
         Link: {}\n\
         \n\
         Output format (in Chinese):\n\
         - 一句话结论\n\
         - 适合谁看（如：AI工程师/前端开发/全栈等）",
        req.title, description, req.url
    )
}

/// Which wire shape to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderKind {
    #[value(name = "openai")]
    OpenAi,
    #[value(name = "anthropic")]
    Anthropic,
}

impl ProviderKind {
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Anthropic => "claude-3-haiku-20240307",
        }
    }
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

fn non_empty(text: Option<String>) -> Result<String, SummarizeError> {
    text.map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(SummarizeError::Empty)
}

/// Pull the reply text out of a chat-completions response body.
pub fn parse_openai_reply(body: &str) -> Result<String, SummarizeError> {
    let resp: OpenAiResponse = serde_json::from_str(body)?;
    non_empty(resp.choices.into_iter().next().and_then(|c| c.message.content))
}

/// Pull the first text block out of a messages-API response body.
pub fn parse_anthropic_reply(body: &str) -> Result<String, SummarizeError> {
    let resp: AnthropicResponse = serde_json::from_str(body)?;
    non_empty(
        resp.content
            .into_iter()
            .find(|b| b.kind == "text")
            .and_then(|b| b.text),
    )
}

async fn post_json(
    http: &reqwest::Client,
    url: &str,
    headers: HeaderMap,
    body: &ChatRequest<'_>,
) -> Result<String, SummarizeError> {
    let resp = http
        .post(url)
        .headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .json(body)
        .send()
        .await?;
    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        return Err(SummarizeError::Status {
            status,
            body: truncate_for_log(&text, 300),
        });
    }
    Ok(text)
}

/// OpenAI chat completions (or any compatible endpoint via `base_url`).
pub struct OpenAiSummarizer {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiSummarizer {
    pub fn new(http: reqwest::Client, api_key: &str, model: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap, SummarizeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

impl Summarizer for OpenAiSummarizer {
    #[instrument(level = "debug", skip_all, fields(model = %self.model))]
    async fn summarize(&self, req: &SummaryRequest<'_>) -> Result<String, SummarizeError> {
        let prompt = build_prompt(req);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![WireMessage {
                role: "user",
                content: &prompt,
            }],
            max_tokens: MAX_TOKENS,
        };
        let url = format!("{}/chat/completions", self.base_url);
        let text = post_json(&self.http, &url, self.headers()?, &body).await?;
        parse_openai_reply(&text)
    }
}

/// Anthropic messages API.
pub struct AnthropicSummarizer {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicSummarizer {
    pub fn new(http: reqwest::Client, api_key: &str, model: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: ANTHROPIC_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap, SummarizeError> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

impl Summarizer for AnthropicSummarizer {
    #[instrument(level = "debug", skip_all, fields(model = %self.model))]
    async fn summarize(&self, req: &SummaryRequest<'_>) -> Result<String, SummarizeError> {
        let prompt = build_prompt(req);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![WireMessage {
                role: "user",
                content: &prompt,
            }],
            max_tokens: MAX_TOKENS,
        };
        let url = format!("{}/messages", self.base_url);
        let text = post_json(&self.http, &url, self.headers()?, &body).await?;
        parse_anthropic_reply(&text)
    }
}

/// The configured provider.
pub enum SummaryProvider {
    OpenAi(OpenAiSummarizer),
    Anthropic(AnthropicSummarizer),
}

impl SummaryProvider {
    /// Build the provider for `kind`. `model` and `base_url` fall back to the
    /// provider's defaults when `None`.
    pub fn new(
        kind: ProviderKind,
        api_key: &str,
        model: Option<&str>,
        base_url: Option<&str>,
    ) -> Self {
        let http = reqwest::Client::new();
        let model = model.unwrap_or(kind.default_model());
        match kind {
            ProviderKind::OpenAi => {
                let p = OpenAiSummarizer::new(http, api_key, model);
                SummaryProvider::OpenAi(match base_url {
                    Some(url) => p.with_base_url(url),
                    None => p,
                })
            }
            ProviderKind::Anthropic => {
                let p = AnthropicSummarizer::new(http, api_key, model);
                SummaryProvider::Anthropic(match base_url {
                    Some(url) => p.with_base_url(url),
                    None => p,
                })
            }
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            SummaryProvider::OpenAi(_) => ProviderKind::OpenAi,
            SummaryProvider::Anthropic(_) => ProviderKind::Anthropic,
        }
    }
}

impl fmt::Debug for SummaryProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the credential.
        f.debug_tuple("SummaryProvider").field(&self.kind()).finish()
    }
}

impl Summarizer for SummaryProvider {
    async fn summarize(&self, req: &SummaryRequest<'_>) -> Result<String, SummarizeError> {
        match self {
            SummaryProvider::OpenAi(p) => p.summarize(req).await,
            SummaryProvider::Anthropic(p) => p.summarize(req).await,
        }
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`Summarizer`].
///
/// # Backoff Strategy
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..=max_jitter)
/// ```
pub struct RetrySummarize<T> {
    /// The underlying summarizer.
    inner: T,
    /// Retries after the first attempt; `0` disables retrying.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: Duration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: Duration,
    /// Upper bound of the random jitter added to every delay.
    max_jitter: Duration,
}

impl<T> RetrySummarize<T>
where
    T: Summarizer,
{
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
            max_jitter: Duration::from_millis(250),
        }
    }

    #[cfg(test)]
    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    #[cfg(test)]
    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let shift = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX).min(16);
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms: u64 =
            rng().random_range(0..=u64::try_from(self.max_jitter.as_millis()).unwrap_or(250));
        delay + Duration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetrySummarize<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrySummarize")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> Summarizer for RetrySummarize<T>
where
    T: Summarizer,
{
    async fn summarize(&self, req: &SummaryRequest<'_>) -> Result<String, SummarizeError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.summarize(req).await {
                Ok(text) => {
                    debug!(
                        attempt,
                        elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                        "summarize succeeded"
                    );
                    return Ok(text);
                }
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries || !e.is_transient() {
                        return Err(e);
                    }
                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        ?delay,
                        error = %e,
                        "summarize attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
