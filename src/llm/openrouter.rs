//! OpenRouter-backed LLM client (OpenAI-compatible API).

use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use serde_json::{json, Value};

use super::{
    ChatCompletion, ChatMessage, ChatStream, FunctionCall, LlmClient, LlmError, StreamEvent,
    ToolCall,
};

const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// LLM client talking to OpenRouter's chat completions endpoint.
pub struct OpenRouterClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenRouterClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: OPENROUTER_BASE_URL.to_string(),
            api_key,
        }
    }

    /// Override the base URL (OpenAI-compatible endpoints, local gateways).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_body(
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[Value]>,
        stream: bool,
    ) -> Value {
        let mut body = json!({
            "model": model,
            "messages": messages,
        });
        if let Some(tools) = tools {
            if !tools.is_empty() {
                body["tools"] = Value::Array(tools.to_vec());
            }
        }
        if stream {
            body["stream"] = Value::Bool(true);
        }
        body
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenRouterClient {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[Value]>,
    ) -> Result<ChatCompletion, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(model, messages, tools, false);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, message });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Malformed(format!("{}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Malformed("response contained no choices".to_string()))?;

        Ok(ChatCompletion {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls,
        })
    }

    async fn chat_completion_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[Value]>,
    ) -> Result<ChatStream, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(model, messages, tools, true);

        let builder = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body);

        let mut source = EventSource::new(builder)
            .map_err(|e| LlmError::Stream(format!("failed to open event stream: {}", e)))?;

        let stream = async_stream::stream! {
            let mut state = StreamState::default();

            while let Some(event) = source.next().await {
                match event {
                    Ok(Event::Open) => continue,
                    Ok(Event::Message(message)) => {
                        if message.data == "[DONE]" {
                            break;
                        }
                        match serde_json::from_str::<StreamChunk>(&message.data) {
                            Ok(chunk) => {
                                for out in state.absorb(chunk) {
                                    yield Ok(out);
                                }
                            }
                            Err(e) => {
                                tracing::debug!(data = %message.data, error = %e, "unparseable SSE chunk");
                            }
                        }
                    }
                    Err(reqwest_eventsource::Error::StreamEnded) => break,
                    Err(e) => {
                        yield Err(LlmError::Stream(format!("{}", e)));
                        source.close();
                        return;
                    }
                }
            }
            source.close();

            if let Some(tool_calls) = state.finish() {
                yield Ok(StreamEvent::ToolCalls(tool_calls));
            }
            yield Ok(StreamEvent::Done);
        };

        Ok(Box::pin(stream))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(serde::Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(serde::Deserialize)]
struct CompletionMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

/// One SSE chunk of a streaming completion.
#[derive(serde::Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(serde::Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(serde::Deserialize)]
struct StreamDelta {
    content: Option<String>,
    tool_calls: Option<Vec<StreamToolCall>>,
}

/// Tool call fragment: the id and name arrive first, argument text follows
/// in pieces across subsequent chunks.
#[derive(serde::Deserialize)]
struct StreamToolCall {
    index: usize,
    id: Option<String>,
    function: Option<StreamFunctionCall>,
}

#[derive(serde::Deserialize)]
struct StreamFunctionCall {
    name: Option<String>,
    arguments: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Stream accumulation
// ─────────────────────────────────────────────────────────────────────────────

/// Accumulates partial tool calls across streaming chunks.
#[derive(Default)]
struct ToolCallAccumulator {
    id: String,
    function_name: String,
    arguments: String,
}

#[derive(Default)]
struct StreamState {
    tool_calls: Vec<ToolCallAccumulator>,
}

impl StreamState {
    /// Fold one chunk into the state, returning any events it completes.
    fn absorb(&mut self, chunk: StreamChunk) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        for choice in chunk.choices {
            if let Some(content) = choice.delta.content {
                if !content.is_empty() {
                    events.push(StreamEvent::Token(content));
                }
            }

            if let Some(fragments) = choice.delta.tool_calls {
                for fragment in fragments {
                    while self.tool_calls.len() <= fragment.index {
                        self.tool_calls.push(ToolCallAccumulator::default());
                    }
                    let acc = &mut self.tool_calls[fragment.index];

                    if let Some(id) = fragment.id {
                        acc.id = id;
                    }
                    if let Some(function) = fragment.function {
                        if let Some(name) = function.name {
                            acc.function_name = name;
                        }
                        if let Some(arguments) = function.arguments {
                            acc.arguments.push_str(&arguments);
                        }
                    }
                }
            }

            if choice.finish_reason.as_deref() == Some("tool_calls") {
                if let Some(tool_calls) = self.finish() {
                    events.push(StreamEvent::ToolCalls(tool_calls));
                }
            }
        }

        events
    }

    /// Drain accumulated tool calls, if any completed ones exist.
    fn finish(&mut self) -> Option<Vec<ToolCall>> {
        let calls: Vec<ToolCall> = std::mem::take(&mut self.tool_calls)
            .into_iter()
            .filter(|acc| !acc.id.is_empty())
            .map(|acc| ToolCall {
                id: acc.id,
                call_type: "function".to_string(),
                function: FunctionCall {
                    name: acc.function_name,
                    arguments: acc.arguments,
                },
            })
            .collect();

        if calls.is_empty() {
            None
        } else {
            Some(calls)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(data: &str) -> StreamChunk {
        serde_json::from_str(data).unwrap()
    }

    #[test]
    fn absorbs_content_tokens() {
        let mut state = StreamState::default();
        let events = state.absorb(chunk(
            r#"{"choices":[{"delta":{"content":"Hello"},"finish_reason":null}]}"#,
        ));
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], StreamEvent::Token(t) if t == "Hello"));
    }

    #[test]
    fn accumulates_tool_call_fragments() {
        let mut state = StreamState::default();

        state.absorb(chunk(
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_1","function":{"name":"calculate","arguments":""}}]},"finish_reason":null}]}"#,
        ));
        state.absorb(chunk(
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"expression\":"}}]},"finish_reason":null}]}"#,
        ));
        let events = state.absorb(chunk(
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"\"2+2\"}"}}]},"finish_reason":"tool_calls"}]}"#,
        ));

        assert_eq!(events.len(), 1);
        match &events[0] {
            StreamEvent::ToolCalls(calls) => {
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].id, "call_1");
                assert_eq!(calls[0].function.name, "calculate");
                assert_eq!(calls[0].function.arguments, r#"{"expression":"2+2"}"#);
            }
            other => panic!("expected tool calls, got {:?}", other),
        }
    }

    #[test]
    fn interleaves_parallel_tool_calls_by_index() {
        let mut state = StreamState::default();

        state.absorb(chunk(
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"a","function":{"name":"calculate","arguments":"{}"}},{"index":1,"id":"b","function":{"name":"analyze_text","arguments":"{}"}}]},"finish_reason":null}]}"#,
        ));
        let calls = state.finish().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "a");
        assert_eq!(calls[1].id, "b");
    }

    #[test]
    fn finish_skips_incomplete_accumulators() {
        let mut state = StreamState::default();
        state.absorb(chunk(
            r#"{"choices":[{"delta":{"tool_calls":[{"index":1,"id":"b","function":{"name":"calculate","arguments":"{}"}}]},"finish_reason":null}]}"#,
        ));
        // Index 0 was never filled in; only the real call survives.
        let calls = state.finish().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "b");
    }
}
