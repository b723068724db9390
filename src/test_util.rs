use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::TranslateError;
use crate::providers::{CompletionRequest, Provider, ProviderFuture};

/// Provider double answering from a table keyed by source text. Calls are
/// logged as `lang:text`.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedProvider {
    replies: HashMap<String, Result<String, TranslateError>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(mut self, text: &str, raw: &str) -> Self {
        self.replies.insert(text.to_string(), Ok(raw.to_string()));
        self
    }

    pub(crate) fn fail(mut self, text: &str, err: TranslateError) -> Self {
        self.replies.insert(text.to_string(), Err(err));
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl Provider for ScriptedProvider {
    fn complete<'a>(&'a self, request: CompletionRequest<'a>) -> ProviderFuture<'a> {
        Box::pin(async move {
            self.calls
                .lock()
                .expect("calls lock")
                .push(format!("{}:{}", request.target_language, request.text));
            self.replies.get(request.text).cloned().unwrap_or_else(|| {
                Err(TranslateError::Transport(format!(
                    "no scripted reply for '{}'",
                    request.text
                )))
            })
        })
    }
}
