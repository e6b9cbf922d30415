//! LLM client abstraction.
//!
//! Speaks the OpenAI-compatible chat completions wire format. The orchestrator
//! only depends on the `LlmClient` trait, which offers a blocking call and a
//! streaming call; `OpenRouterClient` is the production implementation.

mod openrouter;

pub use openrouter::OpenRouterClient;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("LLM API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed LLM response: {0}")]
    Malformed(String),

    #[error("LLM event stream error: {0}")]
    Stream(String),
}

/// Message roles in a chat conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One message in the conversation history.
///
/// History is append-only for the lifetime of a request: messages are never
/// mutated or reordered once pushed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// Set on tool-role messages: the id of the invocation being answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// A tool invocation requested by the model. Never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique within the step
    pub id: String,

    #[serde(rename = "type", default = "function_call_type")]
    pub call_type: String,

    pub function: FunctionCall,
}

fn function_call_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,

    /// Raw JSON text of the arguments, exactly as proposed by the model.
    /// Validated against the tool's schema before execution.
    pub arguments: String,
}

/// Result of a non-streaming chat completion.
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// Incremental events from a streaming chat completion.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A fragment of assistant text, in production order.
    Token(String),
    /// Fully accumulated tool invocations for this step.
    ToolCalls(Vec<ToolCall>),
    /// The stream is finished; no further events follow.
    Done,
}

pub type ChatStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// Capability to call a model with a message list and tool schemas.
///
/// The terminal step of an orchestration run streams its text to the client,
/// so both a blocking and a streaming variant are required.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[Value]>,
    ) -> Result<ChatCompletion, LlmError>;

    async fn chat_completion_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[Value]>,
    ) -> Result<ChatStream, LlmError>;
}
