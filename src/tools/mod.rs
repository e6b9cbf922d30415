//! Tool contracts and the startup-time registry.
//!
//! Every capability the model may request implements [`Tool`]. Tools are
//! registered exactly once at process start into a [`ToolRegistry`]; the set
//! is closed for the lifetime of the process and shared read-only across
//! requests. Unknown tool names at run time are a data-level error handled by
//! the executor, never a panic.

mod analyze;
mod calc;
mod knowledge;
mod schema;
mod web;

pub mod executor;

pub use analyze::AnalyzeText;
pub use calc::Calculate;
pub use executor::{ToolExecutor, ToolResult};
pub use knowledge::SearchKnowledgeBase;
pub use schema::{validate_arguments, ValidationError};
pub use web::{SearchWeb, SerperClient};

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

/// A capability the model may request with structured arguments.
///
/// `execute` receives arguments that already passed schema validation and
/// returns the success payload; any `Err` becomes a failed tool result and
/// never aborts the orchestration loop.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name, as advertised to the model.
    fn name(&self) -> &str;

    /// Description shown to the model.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with validated arguments.
    async fn execute(&self, args: Value) -> anyhow::Result<Value>;
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate tool name registered: {0}")]
    DuplicateName(String),
}

/// Name and description of a registered tool (for prompt building).
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// The closed set of tools available to the model, built once at startup.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Build a registry from the given tools.
    ///
    /// Duplicate names are a configuration error and abort startup rather
    /// than surfacing at request time.
    pub fn build(tools: Vec<Box<dyn Tool>>) -> Result<Self, RegistryError> {
        let mut seen = std::collections::HashSet::new();
        for tool in &tools {
            if !seen.insert(tool.name().to_string()) {
                return Err(RegistryError::DuplicateName(tool.name().to_string()));
            }
        }
        Ok(Self { tools })
    }

    /// Look up a tool by name.
    pub fn lookup(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// List registered tool names and descriptions.
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    /// Tool schemas in the function-calling format the model expects.
    pub fn get_tool_schemas(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name(),
                        "description": t.description(),
                        "parameters": t.parameters_schema(),
                    }
                })
            })
            .collect()
    }
}
