use std::sync::Arc;
use std::time::Duration;

use product_translator::{
    CompletionRequest, Diagnostics, HttpProvider, Provider, ProviderKind, ProviderSettings,
    TranslateError, Translator,
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

fn settings(kind: ProviderKind, server: &MockServer) -> ProviderSettings {
    ProviderSettings::new(kind)
        .with_api_key("sk-test")
        .with_base_url(server.uri())
}

fn request<'a>(settings: &'a ProviderSettings, text: &'a str) -> CompletionRequest<'a> {
    CompletionRequest {
        settings,
        api_key: "sk-test",
        target_language: "es",
        text,
    }
}

#[tokio::test]
async fn deepseek_posts_chat_completion_with_bearer_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "deepseek-chat",
            "stream": false,
            "messages": [{"role": "user", "content": "Translate this to es: Red Shoes"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "**Zapatos Rojos**"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings(ProviderKind::DeepSeek, &server);
    let provider = HttpProvider::new().unwrap();
    let reply = provider.complete(request(&settings, "Red Shoes")).await.unwrap();

    assert_eq!(reply, "**Zapatos Rojos**");
}

#[tokio::test]
async fn gemini_posts_generate_content_with_api_key_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gemini-2.0-flash:generateContent"))
        .and(header("x-goog-api-key", "sk-test"))
        .and(body_partial_json(json!({
            "contents": [{"role": "user"}],
            "generationConfig": {"topK": 40, "maxOutputTokens": 8192}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "Zapatos Rojos\nAlternativas: ..."}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings(ProviderKind::Gemini, &server);
    let provider = HttpProvider::new().unwrap();
    let reply = provider.complete(request(&settings, "Red Shoes")).await.unwrap();

    assert_eq!(reply, "Zapatos Rojos\nAlternativas: ...");
}

#[tokio::test]
async fn error_object_in_ok_response_is_a_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"message": "Insufficient Balance"}
        })))
        .mount(&server)
        .await;

    let settings = settings(ProviderKind::DeepSeek, &server);
    let provider = HttpProvider::new().unwrap();
    let err = provider
        .complete(request(&settings, "Red Shoes"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        TranslateError::Provider("Insufficient Balance | Error text: Red Shoes".to_string())
    );
}

#[tokio::test]
async fn server_error_status_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let settings = settings(ProviderKind::DeepSeek, &server);
    let provider = HttpProvider::new().unwrap();
    let err = provider
        .complete(request(&settings, "Red Shoes"))
        .await
        .unwrap_err();

    match err {
        TranslateError::Provider(message) => {
            assert!(message.starts_with("DeepSeek API error (503"));
            assert!(message.contains("overloaded"));
            assert!(message.ends_with("| Error text: Red Shoes"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn slow_endpoint_times_out_as_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(2))
                .set_body_json(json!({"choices": []})),
        )
        .mount(&server)
        .await;

    let settings = settings(ProviderKind::DeepSeek, &server);
    let provider = HttpProvider::with_timeout(Duration::from_millis(100)).unwrap();
    let err = provider
        .complete(request(&settings, "Blue Hat"))
        .await
        .unwrap_err();

    assert!(matches!(err, TranslateError::Transport(_)), "{:?}", err);
}

#[tokio::test]
async fn translator_round_trip_extracts_and_counts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Here you go: **Zapatos Rojos** (formal)"}}]
        })))
        .mount(&server)
        .await;

    let diagnostics = Arc::new(Diagnostics::in_memory());
    let translator = Translator::new(
        HttpProvider::new().unwrap(),
        settings(ProviderKind::DeepSeek, &server),
        diagnostics.clone(),
    );

    assert_eq!(translator.translate("Red Shoes", "es").await, "Zapatos Rojos");
    let report = diagnostics.snapshot();
    assert_eq!(report.translation_count, 1);
    assert_eq!(report.last_error, None);
}

#[tokio::test]
async fn translator_returns_input_when_endpoint_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string(""))
        .mount(&server)
        .await;

    let diagnostics = Arc::new(Diagnostics::in_memory());
    let translator = Translator::new(
        HttpProvider::new().unwrap(),
        settings(ProviderKind::Gemini, &server),
        diagnostics.clone(),
    );

    assert_eq!(translator.translate("Blue Hat", "es").await, "Blue Hat");
    let report = diagnostics.snapshot();
    assert_eq!(report.translation_count, 0);
    assert_eq!(report.last_error.as_deref(), Some("Empty response from API."));
}
