use async_trait::async_trait;
use teetime_core::credentials::CredentialError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model credential unavailable: {0}")]
    Credential(#[from] CredentialError),
    #[error("model provider request failed: {0}")]
    Transport(String),
    #[error("model provider returned {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("model provider response could not be read: {0}")]
    Decode(String),
}

/// One system prompt plus one user message in, one reply out. No history.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, message: &str) -> Result<String, LlmError>;
}
