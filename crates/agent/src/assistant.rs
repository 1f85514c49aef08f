use std::sync::Arc;

use teetime_core::errors::{ApplicationError, DomainError};
use thiserror::Error;
use tracing::{info, warn};

use crate::llm::{LlmClient, LlmError};

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("message must not be empty")]
    EmptyMessage,
    #[error(transparent)]
    Provider(#[from] LlmError),
}

impl From<AssistantError> for ApplicationError {
    fn from(error: AssistantError) -> Self {
        match error {
            AssistantError::EmptyMessage => ApplicationError::Domain(DomainError::InvalidRequest {
                field: "message".to_string(),
                reason: "must not be empty".to_string(),
            }),
            AssistantError::Provider(error) => ApplicationError::Integration(error.to_string()),
        }
    }
}

/// Stateless booking help: each message is answered on its own.
pub struct BookingAssistant {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
}

impl BookingAssistant {
    pub fn new(llm: Arc<dyn LlmClient>, system_prompt: impl Into<String>) -> Self {
        Self { llm, system_prompt: system_prompt.into() }
    }

    pub async fn chat(&self, message: &str, correlation_id: &str) -> Result<String, AssistantError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AssistantError::EmptyMessage);
        }

        match self.llm.complete(&self.system_prompt, message).await {
            Ok(reply) => {
                info!(
                    event_name = "assistant.chat.replied",
                    correlation_id = %correlation_id,
                    reply_chars = reply.chars().count(),
                    "assistant replied"
                );
                Ok(reply)
            }
            Err(error) => {
                warn!(
                    event_name = "assistant.chat.failed",
                    correlation_id = %correlation_id,
                    error = %error,
                    "assistant provider call failed"
                );
                Err(error.into())
            }
        }
    }
}
