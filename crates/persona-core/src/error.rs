use std::time::Duration;

use thiserror::Error;

/// Failure of a single completion call.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("{provider} API error {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0} returned an empty reply")]
    EmptyReply(&'static str),

    #[error("no reply after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Provider(String),
}

/// What the visitor is told when a completion fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Quota,
    Timeout,
    Generic,
}

impl FailureKind {
    pub fn classify(err: &CompletionError) -> Self {
        if let CompletionError::Timeout(_) = err {
            return FailureKind::Timeout;
        }
        let text = err.to_string();
        if text.contains("429") || text.to_lowercase().contains("quota") {
            FailureKind::Quota
        } else {
            FailureKind::Generic
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            FailureKind::Quota => "Sorry, the limit has been reached, please try again tomorrow.",
            FailureKind::Timeout => "Sorry, the reply took too long, please try again.",
            FailureKind::Generic => "There is some error, please try again.",
        }
    }
}
