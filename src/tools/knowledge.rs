//! Knowledge-base search tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;
use crate::knowledge::{format_documents, KnowledgeBase};

/// Search the knowledge base for relevant document excerpts.
pub struct SearchKnowledgeBase {
    kb: Arc<dyn KnowledgeBase>,
}

impl SearchKnowledgeBase {
    pub fn new(kb: Arc<dyn KnowledgeBase>) -> Self {
        Self { kb }
    }
}

#[async_trait]
impl Tool for SearchKnowledgeBase {
    fn name(&self) -> &str {
        "search_knowledge_base"
    }

    fn description(&self) -> &str {
        "Search the knowledge base for relevant information from stored documents."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to find relevant information"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let query = args["query"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'query' argument"))?;

        let documents = self
            .kb
            .retrieve(query)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to search knowledge base: {}", e))?;

        Ok(json!({
            "data": format_documents(&documents),
            "document_count": documents.len(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{Document, KnowledgeError};

    struct FakeKb {
        documents: Vec<Document>,
    }

    #[async_trait]
    impl KnowledgeBase for FakeKb {
        async fn retrieve(&self, _query: &str) -> Result<Vec<Document>, KnowledgeError> {
            Ok(self.documents.clone())
        }
    }

    struct BrokenKb;

    #[async_trait]
    impl KnowledgeBase for BrokenKb {
        async fn retrieve(&self, _query: &str) -> Result<Vec<Document>, KnowledgeError> {
            Err(KnowledgeError::Api(503))
        }
    }

    #[tokio::test]
    async fn returns_formatted_excerpts_and_count() {
        let tool = SearchKnowledgeBase::new(Arc::new(FakeKb {
            documents: vec![Document {
                text: "Rust ships a borrow checker.".to_string(),
                source: Some("book.md".to_string()),
                score: Some(0.9),
            }],
        }));

        let result = tool.execute(json!({"query": "borrow checker"})).await.unwrap();
        assert_eq!(result["document_count"], 1);
        assert!(result["data"]
            .as_str()
            .unwrap()
            .contains("Rust ships a borrow checker."));
    }

    #[tokio::test]
    async fn backend_failure_becomes_tool_error() {
        let tool = SearchKnowledgeBase::new(Arc::new(BrokenKb));
        let err = tool.execute(json!({"query": "anything"})).await.unwrap_err();
        assert!(err.to_string().contains("Failed to search knowledge base"));
    }
}
