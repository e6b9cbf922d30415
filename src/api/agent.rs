//! The agent endpoint: accepts a conversation, streams the answer.
//!
//! `POST /api/agent` runs one orchestration and responds with an SSE stream
//! of `text`, `tool_call` and `tool_result` events, terminated by a `done`
//! event. Faults that occur before any output was produced are answered with
//! a plain JSON error envelope instead of a stream.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    Json,
};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::agent::{AgentEvent, RunOutcome};
use crate::llm::{ChatMessage, Role};

use super::types::{AgentRequest, ErrorResponse, IncomingMessage};
use super::AppState;

/// Streamed to the client when the step budget runs out without a final
/// answer, after any partial text the run already produced.
const BUDGET_NOTICE: &str =
    "I wasn't able to finish within the allowed number of steps. \
     The partial results above are the best I could gather.";

pub async fn respond(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AgentRequest>,
) -> Response {
    let history = match convert_messages(request.messages) {
        Ok(history) => history,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse { error: message }),
            )
                .into_response();
        }
    };
    if history.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "messages must not be empty".to_string(),
            }),
        )
            .into_response();
    }

    let request_id = Uuid::new_v4();
    tracing::info!(request_id = %request_id, messages = history.len(), "agent request");

    let (tx, mut rx) = mpsc::channel::<AgentEvent>(64);
    let agent = state.agent.clone();
    tokio::spawn(async move {
        let report = agent.run(history, Some(tx.clone())).await;
        tracing::info!(
            request_id = %request_id,
            outcome = report.outcome.name(),
            steps = report.steps,
            "agent run finished"
        );
        match report.outcome {
            RunOutcome::FinalAnswer(_) => {
                let _ = tx.send(AgentEvent::Done { outcome: "final_answer" }).await;
            }
            RunOutcome::BudgetExhausted { .. } => {
                let _ = tx
                    .send(AgentEvent::TextDelta {
                        content: BUDGET_NOTICE.to_string(),
                    })
                    .await;
                let _ = tx
                    .send(AgentEvent::Done {
                        outcome: "budget_exhausted",
                    })
                    .await;
            }
            RunOutcome::Aborted(reason) => {
                tracing::error!(request_id = %request_id, reason = %reason, "agent run aborted");
                let _ = tx
                    .send(AgentEvent::Error {
                        message: "Failed to process agent request".to_string(),
                    })
                    .await;
            }
        }
    });

    // Peek at the first event: a run that dies before producing any output
    // gets a JSON error envelope and a 500 rather than an event stream.
    let first = rx.recv().await;
    match first {
        None | Some(AgentEvent::Error { .. }) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to process agent request".to_string(),
            }),
        )
            .into_response(),
        Some(first) => {
            let stream = async_stream::stream! {
                let mut pending = Some(first);
                loop {
                    let event = match pending.take() {
                        Some(event) => event,
                        None => match rx.recv().await {
                            Some(event) => event,
                            None => break,
                        },
                    };
                    let terminal =
                        matches!(event, AgentEvent::Done { .. } | AgentEvent::Error { .. });
                    match Event::default().event(event.event_name()).json_data(&event) {
                        Ok(sse) => yield Ok::<_, Infallible>(sse),
                        Err(e) => {
                            tracing::error!(request_id = %request_id, error = %e, "failed to serialize SSE event; dropping");
                        }
                    }
                    if terminal {
                        break;
                    }
                }
            };

            Sse::new(stream)
                .keep_alive(
                    KeepAlive::new()
                        .interval(Duration::from_secs(15))
                        .text("keepalive"),
                )
                .into_response()
        }
    }
}

fn convert_messages(messages: Vec<IncomingMessage>) -> Result<Vec<ChatMessage>, String> {
    messages
        .into_iter()
        .map(|message| {
            let role = match message.role.as_str() {
                "system" => Role::System,
                "user" => Role::User,
                "assistant" => Role::Assistant,
                other => return Err(format!("unsupported message role: {}", other)),
            };
            Ok(ChatMessage {
                role,
                content: Some(message.content),
                tool_calls: None,
                tool_call_id: None,
            })
        })
        .collect()
}
