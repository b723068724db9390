use serde::Deserialize;
use serde_json::{Value, json};

use super::{CompletionRequest, endpoint_base, interpret_body, prompt};
use crate::error::TranslateError;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub(crate) const DEFAULT_MODEL: &str = "gemini-2.0-flash";

pub(super) async fn complete(
    client: &reqwest::Client,
    request: CompletionRequest<'_>,
) -> Result<String, TranslateError> {
    let url = format!(
        "{}/{}:generateContent",
        endpoint_base(&request, BASE_URL),
        request.model()
    );
    let body = request_body(&request)?;

    let response = client
        .post(&url)
        .header("x-goog-api-key", request.api_key)
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;
    interpret_body("Gemini", status, &text, request.text, extract_reply)
}

fn request_body(request: &CompletionRequest<'_>) -> Result<Value, TranslateError> {
    let content = prompt::render(prompt::GEMINI_TEMPLATE, request)?;
    Ok(json!({
        "contents": [
            {
                "role": "user",
                "parts": [{"text": content}]
            }
        ],
        "generationConfig": {
            "temperature": 1,
            "topK": 40,
            "topP": 0.95,
            "maxOutputTokens": 8192,
            "responseMimeType": "text/plain"
        }
    }))
}

fn extract_reply(body: &str) -> serde_json::Result<Option<String>> {
    let payload: GeminiResponse = serde_json::from_str(body)?;
    Ok(payload
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text)))
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}
