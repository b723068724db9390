use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::TranslateError;
use crate::extract::extract_translation;
use crate::providers::{CompletionRequest, Provider};
use crate::report::Diagnostics;
use crate::settings::ProviderSettings;

/// Translates single strings through one provider call each.
///
/// `translate` never fails: without an API key it passes text through, and
/// on any provider failure it records the message in [`Diagnostics`] and
/// returns the source text unchanged.
#[derive(Debug, Clone)]
pub struct Translator<P: Provider> {
    provider: P,
    settings: ProviderSettings,
    diagnostics: Arc<Diagnostics>,
}

impl<P: Provider> Translator<P> {
    pub fn new(provider: P, settings: ProviderSettings, diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            provider,
            settings,
            diagnostics,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.api_key().is_some()
    }

    pub async fn translate(&self, text: &str, target_language: &str) -> String {
        match self.try_translate(text, target_language).await {
            Ok(translated) => {
                if translated != text {
                    self.diagnostics.record_translation();
                }
                translated
            }
            Err(TranslateError::CredentialMissing) => text.to_string(),
            Err(err) => {
                warn!("translation of '{}' failed: {}", text, err);
                self.diagnostics.record_error(err.to_string());
                text.to_string()
            }
        }
    }

    /// Like [`Translator::translate`] but surfaces the failure instead of
    /// falling back, and leaves diagnostics untouched.
    pub async fn try_translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<String, TranslateError> {
        let api_key = self
            .settings
            .api_key()
            .ok_or(TranslateError::CredentialMissing)?;
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let request = CompletionRequest {
            settings: &self.settings,
            api_key,
            target_language,
            text,
        };
        let raw = self.provider.complete(request).await?;
        debug!("{} reply: {:?}", self.settings.kind.as_str(), raw);

        extract_translation(&raw).ok_or_else(|| {
            TranslateError::EmptyOrUnparseableReply(format!(
                "no translation found in reply | Error text: {}",
                text
            ))
        })
    }
}
