use thiserror::Error;

#[derive(Debug, Error)]
pub enum TicketflowError {
    #[error("missing environment variables: {}", .0.join(", "))]
    MissingEnv(Vec<String>),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("input file does not exist: {0}")]
    InputNotFound(String),

    #[error("unsupported file type '{0}': use .txt, .pdf, or .docx")]
    UnsupportedFormat(String),

    #[error("failed to extract text from {path}: {reason}")]
    Extraction { path: String, reason: String },

    #[error("invalid ticket entry at index {index}: missing required fields {}", .missing.join(", "))]
    InvalidTicketEntry { index: usize, missing: Vec<String> },

    #[error("ticket registry must be a JSON array")]
    RegistryNotArray,

    #[error("no tickets found in {0}")]
    EmptyRegistry(String),

    #[error("no tasks could be parsed from the model output")]
    NoTasks,

    #[error("no usable issue type in project {project}: available {available:?}")]
    NoIssueType {
        project: String,
        available: Vec<String>,
    },

    #[error("{service} API returned {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("unexpected {service} response: {detail}")]
    UnexpectedResponse {
        service: &'static str,
        detail: String,
    },

    #[error(transparent)]
    Chat(#[from] groq_chat::ChatError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TicketflowError>;
