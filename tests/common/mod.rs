//! Shared fakes for integration tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use ragline::knowledge::{Document, KnowledgeBase, KnowledgeError};
use ragline::llm::{
    ChatCompletion, ChatMessage, ChatStream, FunctionCall, LlmClient, LlmError, StreamEvent,
    ToolCall,
};
use ragline::tools::Tool;

/// Scripted model client: pops one completion per call and records the
/// history each call received.
pub struct FakeLlm {
    script: Mutex<VecDeque<ChatCompletion>>,
    pub seen_histories: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeLlm {
    pub fn new(script: Vec<ChatCompletion>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            seen_histories: Mutex::new(Vec::new()),
        }
    }

    pub fn calls_made(&self) -> usize {
        self.seen_histories.lock().unwrap().len()
    }

    fn next(&self, messages: &[ChatMessage]) -> Result<ChatCompletion, LlmError> {
        self.seen_histories.lock().unwrap().push(messages.to_vec());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::Malformed("script exhausted".to_string()))
    }
}

#[async_trait]
impl LlmClient for FakeLlm {
    async fn chat_completion(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        _tools: Option<&[Value]>,
    ) -> Result<ChatCompletion, LlmError> {
        self.next(messages)
    }

    async fn chat_completion_stream(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        _tools: Option<&[Value]>,
    ) -> Result<ChatStream, LlmError> {
        let completion = self.next(messages)?;
        let mut events = Vec::new();
        if let Some(content) = completion.content {
            if !content.is_empty() {
                events.push(Ok(StreamEvent::Token(content)));
            }
        }
        if let Some(calls) = completion.tool_calls {
            if !calls.is_empty() {
                events.push(Ok(StreamEvent::ToolCalls(calls)));
            }
        }
        events.push(Ok(StreamEvent::Done));
        Ok(Box::pin(futures::stream::iter(events)))
    }
}

pub fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        call_type: "function".to_string(),
        function: FunctionCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        },
    }
}

pub fn wants_tools(calls: Vec<ToolCall>) -> ChatCompletion {
    ChatCompletion {
        content: None,
        tool_calls: Some(calls),
    }
}

pub fn answers(text: &str) -> ChatCompletion {
    ChatCompletion {
        content: Some(text.to_string()),
        tool_calls: None,
    }
}

/// In-memory knowledge base with fixed documents.
pub struct FakeKnowledgeBase {
    pub documents: Vec<Document>,
}

#[async_trait]
impl KnowledgeBase for FakeKnowledgeBase {
    async fn retrieve(&self, _query: &str) -> Result<Vec<Document>, KnowledgeError> {
        Ok(self.documents.clone())
    }
}

/// Tool that sleeps before answering, for ordering tests.
pub struct SleepyTool {
    pub name: &'static str,
    pub delay_ms: u64,
}

#[async_trait]
impl Tool for SleepyTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "sleeps, then echoes its own name"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: Value) -> anyhow::Result<Value> {
        tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        Ok(json!({"tool": self.name}))
    }
}
