//! Booking assistant: forwards one user message, with a fixed system prompt,
//! to an OpenAI-compatible model and returns the reply as-is.
//!
//! The model never touches bookings. It only answers questions.

pub mod assistant;
pub mod llm;
pub mod openai;

pub use assistant::{AssistantError, BookingAssistant};
pub use llm::{LlmClient, LlmError};
pub use openai::OpenAiChatClient;
