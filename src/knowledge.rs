//! Knowledge-base retrieval collaborator.
//!
//! The agent core only depends on the `KnowledgeBase` trait; the production
//! implementation talks HTTP to a configured vector retrieval service. The
//! formatting of retrieved documents into model-readable context lives here
//! too, so the knowledge tool stays a thin adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::KnowledgeConfig;

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("knowledge base is not configured (set KNOWLEDGE_ENDPOINT)")]
    NotConfigured,

    #[error("retrieval request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("retrieval API error (status {0})")]
    Api(u16),
}

/// A retrieved document excerpt with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub text: String,

    #[serde(default)]
    pub source: Option<String>,

    /// Similarity score reported by the retrieval backend
    #[serde(default)]
    pub score: Option<f64>,
}

/// Nearest-neighbor document retrieval over the knowledge base.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>, KnowledgeError>;
}

/// Format retrieved documents into a context block for the model.
pub fn format_documents(documents: &[Document]) -> String {
    if documents.is_empty() {
        return "No relevant documents found in the knowledge base.".to_string();
    }

    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            let mut entry = format!("[{}] {}", i + 1, doc.text.trim());
            if let Some(source) = &doc.source {
                entry.push_str(&format!("\nSource: {}", source));
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// HTTP-backed retrieval client for a vector search service.
pub struct HttpKnowledgeBase {
    client: reqwest::Client,
    config: KnowledgeConfig,
}

impl HttpKnowledgeBase {
    pub fn new(config: KnowledgeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl KnowledgeBase for HttpKnowledgeBase {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>, KnowledgeError> {
        let endpoint = self
            .config
            .endpoint
            .as_deref()
            .ok_or(KnowledgeError::NotConfigured)?;

        let url = format!("{}/retrieve", endpoint.trim_end_matches('/'));
        let mut request = self.client.post(&url).json(&serde_json::json!({
            "query": query,
            "top_k": self.config.top_k,
        }));

        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(KnowledgeError::Api(response.status().as_u16()));
        }

        let parsed: RetrieveResponse = response.json().await?;
        Ok(parsed.documents)
    }
}

#[derive(Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    documents: Vec<Document>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_documents_with_sources() {
        let docs = vec![
            Document {
                text: "Rust is a systems language.".to_string(),
                source: Some("intro.md".to_string()),
                score: Some(0.92),
            },
            Document {
                text: "Tokio is an async runtime.".to_string(),
                source: None,
                score: None,
            },
        ];

        let formatted = format_documents(&docs);
        assert!(formatted.starts_with("[1] Rust is a systems language."));
        assert!(formatted.contains("Source: intro.md"));
        assert!(formatted.contains("[2] Tokio is an async runtime."));
    }

    #[test]
    fn formats_empty_result_set() {
        assert_eq!(
            format_documents(&[]),
            "No relevant documents found in the knowledge base."
        );
    }

    #[tokio::test]
    async fn unconfigured_backend_reports_not_configured() {
        let kb = HttpKnowledgeBase::new(KnowledgeConfig::default());
        let err = kb.retrieve("anything").await.unwrap_err();
        assert!(matches!(err, KnowledgeError::NotConfigured));
    }
}
