use serde::Deserialize;
use serde_json::{Value, json};

use super::{CompletionRequest, endpoint_base, interpret_body, prompt};
use crate::error::TranslateError;

const BASE_URL: &str = "https://api.deepseek.com";
pub(crate) const DEFAULT_MODEL: &str = "deepseek-chat";
const TEMPERATURE: f64 = 1.3;
const MAX_TOKENS: u32 = 1024;

pub(super) async fn complete(
    client: &reqwest::Client,
    request: CompletionRequest<'_>,
) -> Result<String, TranslateError> {
    let url = format!("{}/chat/completions", endpoint_base(&request, BASE_URL));
    let body = request_body(&request)?;

    let response = client
        .post(&url)
        .bearer_auth(request.api_key)
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;
    interpret_body("DeepSeek", status, &text, request.text, extract_reply)
}

fn request_body(request: &CompletionRequest<'_>) -> Result<Value, TranslateError> {
    let content = prompt::render(prompt::DEEPSEEK_TEMPLATE, request)?;
    Ok(json!({
        "model": request.model(),
        "messages": [
            {"role": "user", "content": content}
        ],
        "temperature": TEMPERATURE,
        "max_tokens": MAX_TOKENS,
        "stream": false
    }))
}

fn extract_reply(body: &str) -> serde_json::Result<Option<String>> {
    let payload: ChatResponse = serde_json::from_str(body)?;
    Ok(payload
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content))
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}
