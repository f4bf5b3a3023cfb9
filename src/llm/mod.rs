//! Language model provider access
//!
//! The knowledge call (`LlmClient::complete` with [`prompts::knowledge_messages`])
//! and the synthesis relay (`LlmClient::stream` with
//! [`prompts::synthesis_messages`]) share one client.

mod client;
pub mod frames;
pub mod models;
pub mod prompts;
pub mod relay;

pub use client::LlmClient;
pub use models::{ChatMessage, Role};
pub use prompts::CompletionRequest;
pub use relay::{RelayError, RelayStream};

use thiserror::Error;

/// Failure of a model provider call before any output was produced
#[derive(Debug, Error)]
pub enum LlmError {
    /// The provider answered with a non-success status
    #[error("model API error: HTTP {status}")]
    Status { status: u16 },
    /// The request never got a response
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The payload could not be encoded or decoded
    #[error("malformed payload: {0}")]
    Decode(String),
    /// The provider answered without any content
    #[error("completion had no content")]
    EmptyCompletion,
}
