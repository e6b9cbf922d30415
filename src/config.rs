//! Configuration management for ragline.
//!
//! Configuration can be set via environment variables:
//! - `OPENROUTER_API_KEY` - Required. Your OpenRouter API key.
//! - `DEFAULT_MODEL` - Optional. The default LLM model to use. Defaults to `openai/gpt-4o-mini`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.
//! - `MAX_STEPS` - Optional. Maximum agent loop steps per request. Defaults to `5`.
//! - `TOOL_TIMEOUT_SECS` - Optional. Per-tool execution timeout. Defaults to `30`.
//! - `SERPER_API_KEY` - Optional. API key for web search. Without it the web
//!   search tool reports failure and suggests knowledge-base search instead.
//! - `KNOWLEDGE_ENDPOINT` - Optional. Base URL of the vector retrieval service.
//! - `KNOWLEDGE_API_KEY` - Optional. Bearer token for the retrieval service.
//! - `KNOWLEDGE_TOP_K` - Optional. Documents to retrieve per query. Defaults to `5`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Knowledge-base retrieval configuration.
#[derive(Debug, Clone)]
pub struct KnowledgeConfig {
    /// Base URL of the retrieval service
    pub endpoint: Option<String>,

    /// Bearer token for the retrieval service
    pub api_key: Option<String>,

    /// Number of documents to retrieve per query
    pub top_k: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            top_k: 5,
        }
    }
}

impl KnowledgeConfig {
    /// Check if knowledge retrieval is enabled (endpoint configured)
    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }
}

/// Agent server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenRouter API key
    pub api_key: String,

    /// Default LLM model identifier (OpenRouter format)
    pub default_model: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum steps per orchestration run (one step = one model round-trip)
    pub max_steps: usize,

    /// Per-tool execution timeout in seconds
    pub tool_timeout_secs: u64,

    /// API key for the Serper web search collaborator
    pub serper_api_key: Option<String>,

    /// Knowledge-base retrieval configuration
    pub knowledge: KnowledgeConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `OPENROUTER_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENROUTER_API_KEY".to_string()))?;

        let default_model =
            std::env::var("DEFAULT_MODEL").unwrap_or_else(|_| "openai/gpt-4o-mini".to_string());

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let max_steps = std::env::var("MAX_STEPS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("MAX_STEPS".to_string(), format!("{}", e)))?;

        let tool_timeout_secs = std::env::var("TOOL_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("TOOL_TIMEOUT_SECS".to_string(), format!("{}", e))
            })?;

        let knowledge = KnowledgeConfig {
            endpoint: std::env::var("KNOWLEDGE_ENDPOINT").ok(),
            api_key: std::env::var("KNOWLEDGE_API_KEY").ok(),
            top_k: std::env::var("KNOWLEDGE_TOP_K")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|e| {
                    ConfigError::InvalidValue("KNOWLEDGE_TOP_K".to_string(), format!("{}", e))
                })?,
        };

        Ok(Self {
            api_key,
            default_model,
            host,
            port,
            max_steps,
            tool_timeout_secs,
            serper_api_key: std::env::var("SERPER_API_KEY").ok(),
            knowledge,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, default_model: String) -> Self {
        Self {
            api_key,
            default_model,
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_steps: 5,
            tool_timeout_secs: 30,
            serper_api_key: None,
            knowledge: KnowledgeConfig::default(),
        }
    }
}
