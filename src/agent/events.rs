//! Events emitted during an orchestration run.

use serde::Serialize;
use serde_json::Value;

/// Progress and output events for one run, consumed by the SSE layer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Incremental assistant text, in production order.
    TextDelta { content: String },
    /// The model requested a tool invocation.
    ToolCall { id: String, name: String, args: Value },
    /// A tool invocation finished.
    ToolResult { id: String, name: String, success: bool },
    /// The run reached a terminal outcome; no further events follow.
    Done { outcome: &'static str },
    /// The run aborted with a request-level error.
    Error { message: String },
}

impl AgentEvent {
    /// SSE event name.
    pub fn event_name(&self) -> &'static str {
        match self {
            AgentEvent::TextDelta { .. } => "text",
            AgentEvent::ToolCall { .. } => "tool_call",
            AgentEvent::ToolResult { .. } => "tool_result",
            AgentEvent::Done { .. } => "done",
            AgentEvent::Error { .. } => "error",
        }
    }
}
