use thiserror::Error;

/// Ways a single translation can fail. `Translator::translate` absorbs all of
/// them and hands back the source text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranslateError {
    #[error("no API key configured")]
    CredentialMissing,
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("{0}")]
    Provider(String),
    #[error("{0}")]
    EmptyOrUnparseableReply(String),
}

impl From<reqwest::Error> for TranslateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TranslateError::Transport(format!("timed out: {}", err))
        } else {
            TranslateError::Transport(err.to_string())
        }
    }
}
