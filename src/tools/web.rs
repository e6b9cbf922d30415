//! Web search tool backed by the Serper API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::Tool;

const SERPER_URL: &str = "https://google.serper.dev/search";
const DEFAULT_RESULTS: usize = 5;
const MAX_RESULTS: usize = 10;

/// HTTP client for the Serper web search API.
///
/// The API key is injected at construction; a missing key is reported at call
/// time as a graceful failure, not a startup error, so the rest of the agent
/// keeps working without web access.
pub struct SerperClient {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl SerperClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<SerperResponse> {
        let Some(api_key) = &self.api_key else {
            anyhow::bail!("web search API key is not configured");
        };

        let response = self
            .client
            .post(SERPER_URL)
            .header("X-API-KEY", api_key)
            .json(&json!({ "q": query, "num": max_results }))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("search API error: {}", response.status());
        }

        Ok(response.json().await?)
    }
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,

    #[serde(rename = "answerBox")]
    answer_box: Option<AnswerBox>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OrganicResult {
    title: String,
    link: String,
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnswerBox {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    link: Option<String>,
}

/// Search the web for current information.
pub struct SearchWeb {
    search: SerperClient,
}

impl SearchWeb {
    pub fn new(search: SerperClient) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Tool for SearchWeb {
    fn name(&self) -> &str {
        "search_web"
    }

    fn description(&self) -> &str {
        "Search the web for current information and real-time data. Use for recent events or anything not in the knowledge base."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "max_results": {
                    "type": "number",
                    "description": "Maximum number of results to return (default: 5, max: 10)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let query = args["query"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'query' argument"))?;
        let max_results = clamp_results(args.get("max_results").and_then(Value::as_f64));

        if !self.search.is_configured() {
            anyhow::bail!(
                "Web search API key not configured. Set SERPER_API_KEY, or use the \
                 search_knowledge_base tool for information available in the knowledge base."
            );
        }

        let response = self.search.search(query, max_results).await.map_err(|e| {
            anyhow::anyhow!(
                "Failed to search the web: {}. Please try again or use the \
                 search_knowledge_base tool.",
                e
            )
        })?;

        let results: Vec<&OrganicResult> = response.organic.iter().take(max_results).collect();

        Ok(json!({
            "query": query,
            "results_count": results.len(),
            "results": results,
            "answer_box": response.answer_box,
            "searched_at": chrono::Utc::now().to_rfc3339(),
        }))
    }
}

/// Apply the default and the hard ceiling to a model-proposed result cap.
fn clamp_results(raw: Option<f64>) -> usize {
    match raw {
        Some(value) if value >= 1.0 => (value as usize).min(MAX_RESULTS),
        Some(_) => DEFAULT_RESULTS,
        None => DEFAULT_RESULTS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_result_cap_to_ceiling() {
        assert_eq!(clamp_results(None), 5);
        assert_eq!(clamp_results(Some(3.0)), 3);
        assert_eq!(clamp_results(Some(25.0)), 10);
        assert_eq!(clamp_results(Some(0.0)), 5);
    }

    #[test]
    fn deserializes_serper_payload() {
        let body = r#"{
            "organic": [
                {"title": "Rust", "link": "https://rust-lang.org", "snippet": "A language", "date": "2024-01-01"},
                {"title": "Tokio", "link": "https://tokio.rs"}
            ],
            "answerBox": {"answer": "Rust is a systems language", "source": "rust-lang.org"}
        }"#;

        let parsed: SerperResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.organic.len(), 2);
        assert_eq!(parsed.organic[0].title, "Rust");
        assert!(parsed.organic[1].snippet.is_none());
        assert_eq!(
            parsed.answer_box.unwrap().answer.as_deref(),
            Some("Rust is a systems language")
        );
    }

    #[tokio::test]
    async fn missing_key_fails_with_knowledge_base_hint() {
        let tool = SearchWeb::new(SerperClient::new(None));
        let err = tool
            .execute(json!({"query": "latest rust release"}))
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("not configured"));
        assert!(message.contains("search_knowledge_base"));
    }
}
