use tera::{Context, Tera};

use super::CompletionRequest;
use crate::error::TranslateError;

pub(super) const DEEPSEEK_TEMPLATE: &str = "Translate this to {{ target_language }}: {{ text }}";
pub(super) const GEMINI_TEMPLATE: &str = "translate en to {{ target_language }}\n\n{{ text }}\n";

pub(super) fn render(
    template: &str,
    request: &CompletionRequest<'_>,
) -> Result<String, TranslateError> {
    let mut context = Context::new();
    context.insert("target_language", request.target_language);
    context.insert("text", request.text);
    Tera::one_off(template, &context, false)
        .map_err(|err| TranslateError::Provider(format!("failed to render prompt: {}", err)))
}
