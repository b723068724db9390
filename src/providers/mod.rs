use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::error::TranslateError;
use crate::settings::ProviderSettings;

mod deepseek;
mod gemini;
mod prompt;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    DeepSeek,
    #[serde(alias = "google")]
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Gemini => "gemini",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::DeepSeek => deepseek::DEFAULT_MODEL,
            ProviderKind::Gemini => gemini::DEFAULT_MODEL,
        }
    }
}

/// A single string to translate, together with the endpoint settings of the
/// current tick.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub settings: &'a ProviderSettings,
    pub api_key: &'a str,
    pub target_language: &'a str,
    pub text: &'a str,
}

impl CompletionRequest<'_> {
    fn model(&self) -> &str {
        self.settings
            .model()
            .unwrap_or_else(|| self.settings.kind.default_model())
    }
}

pub type ProviderFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, TranslateError>> + Send + 'a>>;

/// One outbound completion call. Implementations return the model's raw
/// reply text; extraction happens in the translator.
pub trait Provider: Clone + Send + Sync {
    fn complete<'a>(&'a self, request: CompletionRequest<'a>) -> ProviderFuture<'a>;
}

#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: reqwest::Client,
}

impl HttpProvider {
    pub fn new() -> Result<Self> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .with_context(|| "failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl Provider for HttpProvider {
    fn complete<'a>(&'a self, request: CompletionRequest<'a>) -> ProviderFuture<'a> {
        Box::pin(async move {
            match request.settings.kind {
                ProviderKind::DeepSeek => deepseek::complete(&self.client, request).await,
                ProviderKind::Gemini => gemini::complete(&self.client, request).await,
            }
        })
    }
}

/// Shared reading of a provider reply body. A JSON `error` object wins over
/// the HTTP status, since both APIs can report errors with a 200.
fn interpret_body<F>(
    provider: &str,
    status: StatusCode,
    body: &str,
    source_text: &str,
    reply_text: F,
) -> Result<String, TranslateError>
where
    F: Fn(&str) -> serde_json::Result<Option<String>>,
{
    if body.trim().is_empty() {
        return Err(TranslateError::EmptyOrUnparseableReply(
            "Empty response from API.".to_string(),
        ));
    }
    if let Some(message) = extract_error_message(body) {
        return Err(TranslateError::Provider(format!(
            "{} | Error text: {}",
            message, source_text
        )));
    }
    if !status.is_success() {
        return Err(TranslateError::Provider(format!(
            "{} API error ({}): {} | Error text: {}",
            provider,
            status,
            body.trim(),
            source_text
        )));
    }
    match reply_text(body) {
        Ok(Some(text)) if !text.trim().is_empty() => Ok(text),
        Ok(_) => Err(TranslateError::EmptyOrUnparseableReply(format!(
            "no reply text returned from {}",
            provider
        ))),
        Err(err) => Err(TranslateError::EmptyOrUnparseableReply(format!(
            "failed to parse {} response JSON: {}",
            provider, err
        ))),
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<ApiError>,
    }

    #[derive(Deserialize)]
    struct ApiError {
        message: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let error = parsed.error?;
    Some(
        error
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| "unknown error".to_string()),
    )
}

fn endpoint_base<'a>(request: &CompletionRequest<'a>, default: &'a str) -> &'a str {
    request
        .settings
        .base_url()
        .unwrap_or(default)
        .trim_end_matches('/')
}
