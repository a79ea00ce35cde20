//! # mealcraft-llm
//!
//! The "text completion service" boundary used by the meal agents.
//!
//! ## Core Concepts
//! - **ChatMessage**: role/content pairs sent to the model
//! - **LlmProvider**: trait-based completion calls (OpenAI-compatible APIs such as Groq)
//! - **ProviderConfig**: endpoint, model, credentials and timeouts
//! - **UsageTracker**: token accounting across a planning run

pub mod error;
pub mod provider;

pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
    OpenAIProvider, ProviderConfig, ProviderError, ProviderType, Role, Usage, UsageTracker,
};
