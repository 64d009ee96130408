use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode chat response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("chat response contained no message content")]
    EmptyResponse,

    #[error("API key is not set")]
    MissingApiKey,
}

impl ChatError {
    /// `true` for failures a later attempt might not hit (network, 429, 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            ChatError::Http(_) | ChatError::EmptyResponse => true,
            ChatError::Status { status, .. } => *status == 429 || *status >= 500,
            ChatError::Decode(_) | ChatError::MissingApiKey => false,
        }
    }
}
