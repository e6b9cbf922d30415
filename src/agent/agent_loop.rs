//! Core agent loop implementation.
//!
//! A small state machine coordinating the model (an untrusted planner) with
//! the tool executor (deterministic side effects), bounded by a hard step
//! budget. One run owns its history exclusively; the history is append-only
//! and every tool invocation gets its matching result appended before the
//! next model call.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::llm::{ChatMessage, LlmClient, LlmError, Role, StreamEvent, ToolCall};
use crate::tools::{ToolExecutor, ToolRegistry};

use super::events::AgentEvent;
use super::prompt::build_system_prompt;

/// Terminal outcome of one orchestration run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The model answered without requesting further tools.
    FinalAnswer(String),
    /// The step budget ran out before a final answer; carries the best
    /// partial assistant text produced along the way, if any.
    BudgetExhausted { partial: Option<String> },
    /// Unrecoverable fault (model client failure, client disconnect).
    Aborted(String),
}

impl RunOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            RunOutcome::FinalAnswer(_) => "final_answer",
            RunOutcome::BudgetExhausted { .. } => "budget_exhausted",
            RunOutcome::Aborted(_) => "aborted",
        }
    }
}

/// Everything a finished run leaves behind.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub history: Vec<ChatMessage>,
    pub steps: usize,
}

enum StepError {
    Llm(LlmError),
    Cancelled,
}

/// The tool-calling agent.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    executor: ToolExecutor,
    model: String,
    max_steps: usize,
}

impl Agent {
    /// Create a new agent over the given model client and tool registry.
    pub fn new(llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>, config: &Config) -> Self {
        let executor = ToolExecutor::new(
            tools.clone(),
            Duration::from_secs(config.tool_timeout_secs),
        );
        Self {
            llm,
            tools,
            executor,
            model: config.default_model.clone(),
            max_steps: config.max_steps,
        }
    }

    /// Run one orchestration over the given conversation.
    ///
    /// With an event sender, model calls stream and text deltas are forwarded
    /// as produced; a closed channel means the client disconnected and the
    /// run stops before dispatching further invocations. Without one, model
    /// calls are plain blocking completions.
    pub async fn run(
        &self,
        mut history: Vec<ChatMessage>,
        events: Option<mpsc::Sender<AgentEvent>>,
    ) -> RunReport {
        if !matches!(history.first(), Some(m) if m.role == Role::System) {
            history.insert(
                0,
                ChatMessage {
                    role: Role::System,
                    content: Some(build_system_prompt(&self.tools)),
                    tool_calls: None,
                    tool_call_id: None,
                },
            );
        }

        let tool_schemas = self.tools.get_tool_schemas();
        let mut steps = 0;
        let mut partial: Option<String> = None;

        while steps < self.max_steps {
            tracing::debug!(step = steps + 1, budget = self.max_steps, "agent step");

            let (text, tool_calls) = match self
                .model_step(&history, &tool_schemas, events.as_ref())
                .await
            {
                Ok(step) => step,
                Err(StepError::Cancelled) => {
                    return RunReport {
                        outcome: RunOutcome::Aborted("client disconnected".to_string()),
                        history,
                        steps,
                    };
                }
                Err(StepError::Llm(e)) => {
                    tracing::error!(error = %e, "model call failed");
                    return RunReport {
                        outcome: RunOutcome::Aborted(format!("model call failed: {}", e)),
                        history,
                        steps,
                    };
                }
            };

            // No tool invocations: this is the final answer.
            if tool_calls.is_empty() {
                if text.is_empty() {
                    return RunReport {
                        outcome: RunOutcome::Aborted("model returned an empty response".to_string()),
                        history,
                        steps,
                    };
                }
                history.push(ChatMessage {
                    role: Role::Assistant,
                    content: Some(text.clone()),
                    tool_calls: None,
                    tool_call_id: None,
                });
                return RunReport {
                    outcome: RunOutcome::FinalAnswer(text),
                    history,
                    steps,
                };
            }

            tracing::info!(
                step = steps + 1,
                tools = ?tool_calls.iter().map(|c| c.function.name.as_str()).collect::<Vec<_>>(),
                "executing tool invocations"
            );

            history.push(ChatMessage {
                role: Role::Assistant,
                content: if text.is_empty() { None } else { Some(text.clone()) },
                tool_calls: Some(tool_calls.clone()),
                tool_call_id: None,
            });
            if !text.is_empty() {
                partial = Some(text);
            }

            let mut cancelled = false;
            for call in &tool_calls {
                let args: Value =
                    serde_json::from_str(&call.function.arguments).unwrap_or(Value::Null);
                if !emit(
                    events.as_ref(),
                    AgentEvent::ToolCall {
                        id: call.id.clone(),
                        name: call.function.name.clone(),
                        args,
                    },
                )
                .await
                {
                    cancelled = true;
                    break;
                }
            }
            if cancelled {
                return RunReport {
                    outcome: RunOutcome::Aborted("client disconnected".to_string()),
                    history,
                    steps,
                };
            }

            // Invocations within one step run concurrently; results come back
            // in invocation order so history replay stays deterministic.
            let results = self.executor.execute_all(&tool_calls).await;
            steps += 1;

            for result in results {
                if !cancelled {
                    cancelled = !emit(
                        events.as_ref(),
                        AgentEvent::ToolResult {
                            id: result.invocation_id.clone(),
                            name: result.tool_name.clone(),
                            success: result.success,
                        },
                    )
                    .await;
                }
                let content = serde_json::to_string(&result).unwrap_or_else(|_| {
                    r#"{"success":false,"error":"unserializable tool result"}"#.to_string()
                });
                history.push(ChatMessage {
                    role: Role::Tool,
                    content: Some(content),
                    tool_calls: None,
                    tool_call_id: Some(result.invocation_id),
                });
            }
            if cancelled {
                return RunReport {
                    outcome: RunOutcome::Aborted("client disconnected".to_string()),
                    history,
                    steps,
                };
            }
        }

        tracing::warn!(budget = self.max_steps, "step budget exhausted");
        RunReport {
            outcome: RunOutcome::BudgetExhausted { partial },
            history,
            steps,
        }
    }

    /// One model round-trip: streaming when an event sender is attached,
    /// blocking otherwise.
    async fn model_step(
        &self,
        history: &[ChatMessage],
        tool_schemas: &[Value],
        events: Option<&mpsc::Sender<AgentEvent>>,
    ) -> Result<(String, Vec<ToolCall>), StepError> {
        let Some(tx) = events else {
            let completion = self
                .llm
                .chat_completion(&self.model, history, Some(tool_schemas))
                .await
                .map_err(StepError::Llm)?;
            return Ok((
                completion.content.unwrap_or_default(),
                completion.tool_calls.unwrap_or_default(),
            ));
        };

        let mut stream = self
            .llm
            .chat_completion_stream(&self.model, history, Some(tool_schemas))
            .await
            .map_err(StepError::Llm)?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();

        while let Some(event) = stream.next().await {
            match event {
                Ok(StreamEvent::Token(token)) => {
                    text.push_str(&token);
                    if tx
                        .send(AgentEvent::TextDelta { content: token })
                        .await
                        .is_err()
                    {
                        return Err(StepError::Cancelled);
                    }
                }
                Ok(StreamEvent::ToolCalls(calls)) => tool_calls.extend(calls),
                Ok(StreamEvent::Done) => break,
                Err(e) => return Err(StepError::Llm(e)),
            }
        }

        Ok((text, tool_calls))
    }
}

async fn emit(events: Option<&mpsc::Sender<AgentEvent>>, event: AgentEvent) -> bool {
    match events {
        Some(tx) => tx.send(event).await.is_ok(),
        None => true,
    }
}
