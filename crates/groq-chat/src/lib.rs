//! `groq-chat`: blocking driver for OpenAI-compatible chat completions.
//!
//! The ticketflow pipeline talks to its language model through this crate:
//! the ticket stage sends one extraction prompt, the test-case stage sends one
//! prompt per task wrapped in a bounded retry loop.
//!
//! # Architecture
//!
//! ```text
//! ChatRequest
//!     │
//!     ▼
//! ChatModel::complete   ← trait seam; GroqClient is the HTTP implementation
//!     │
//!     ▼
//! complete_with_retry   ← RetryPolicy: bounded attempts, exponential sleep
//!     │
//!     ▼
//! String                ← first choice's message content
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use groq_chat::{complete_with_retry, ChatRequest, GroqClient, RetryPolicy};
//!
//! let client = GroqClient::new(std::env::var("GROQ_API_KEY")?)?;
//! let req = ChatRequest::new("llama3-70b-8192", "You are terse.", "Say hello.");
//! let text = complete_with_retry(&client, &req, RetryPolicy::default())?;
//! ```

pub mod client;
pub mod error;
pub mod retry;
pub mod types;


pub use client::{ChatModel, GroqClient, DEFAULT_BASE_URL};
pub use error::ChatError;
pub use retry::{complete_with_retry, RetryPolicy};
pub use types::{ChatMessage, ChatRequest, ChatResponse, Role};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, ChatError>;
