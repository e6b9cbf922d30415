//! Tool execution: lookup, validation, timeout isolation, result envelopes.
//!
//! All tool side effects happen here and only here. Every fault a tool can
//! produce, from an unknown name to a panic-free internal error to a timeout,
//! is normalized into a [`ToolResult`] with `success = false`; tool failures
//! never abort the orchestration loop.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{schema, ToolRegistry};
use crate::llm::ToolCall;

/// Uniform result envelope for one tool invocation.
///
/// Exactly one is produced per invocation; it is appended to history as a
/// tool-role message answering the invocation's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub invocation_id: String,
    pub tool_name: String,
    pub success: bool,

    /// Structured data on success, `null` on failure
    pub payload: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    fn success(invocation_id: &str, tool_name: &str, payload: Value) -> Self {
        Self {
            invocation_id: invocation_id.to_string(),
            tool_name: tool_name.to_string(),
            success: true,
            payload,
            error: None,
        }
    }

    fn failure(invocation_id: &str, tool_name: &str, message: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.to_string(),
            tool_name: tool_name.to_string(),
            success: false,
            payload: Value::Null,
            error: Some(message.into()),
        }
    }
}

/// Dispatches validated invocations to registered tools.
#[derive(Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    /// Execute a single invocation, normalizing every fault into the envelope.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        let name = call.function.name.as_str();
        let id = call.id.as_str();

        let Some(tool) = self.registry.lookup(name) else {
            return ToolResult::failure(id, name, format!("tool not found: {}", name));
        };

        // Models occasionally send an empty argument string for no-arg calls;
        // required-field validation still applies afterwards.
        let raw_arguments = call.function.arguments.trim();
        let raw: Value = if raw_arguments.is_empty() {
            Value::Object(Default::default())
        } else {
            match serde_json::from_str(raw_arguments) {
                Ok(value) => value,
                Err(e) => {
                    return ToolResult::failure(
                        id,
                        name,
                        format!("arguments are not valid JSON: {}", e),
                    );
                }
            }
        };

        let args = match schema::validate_arguments(&tool.parameters_schema(), raw) {
            Ok(args) => args,
            Err(e) => return ToolResult::failure(id, name, e.to_string()),
        };

        let started = std::time::Instant::now();
        let outcome = tokio::time::timeout(self.timeout, tool.execute(args)).await;
        let elapsed = started.elapsed();

        match outcome {
            Err(_) => {
                tracing::warn!(tool = name, timeout_secs = self.timeout.as_secs(), "tool timed out");
                ToolResult::failure(
                    id,
                    name,
                    format!("tool timed out after {} seconds", self.timeout.as_secs()),
                )
            }
            Ok(Err(e)) => {
                tracing::warn!(tool = name, error = %e, "tool failed");
                ToolResult::failure(id, name, e.to_string())
            }
            Ok(Ok(payload)) => {
                tracing::debug!(tool = name, elapsed_ms = elapsed.as_millis() as u64, "tool succeeded");
                ToolResult::success(id, name, payload)
            }
        }
    }

    /// Execute all invocations of one step concurrently.
    ///
    /// Results come back in invocation order regardless of completion order,
    /// which keeps history replay deterministic.
    pub async fn execute_all(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        futures::future::join_all(calls.iter().map(|call| self.execute(call))).await
    }
}
