//! # ragline
//!
//! A multi-step tool-calling agent server with knowledge-base retrieval.
//!
//! This library provides:
//! - An HTTP API that accepts a conversation and streams the answer
//! - A budget-bounded agent loop coordinating model calls with tool execution
//! - Built-in tools: knowledge-base search, web search, calculation, text analysis
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Receive a conversation via the API
//! 2. Call the LLM with the history and available tool schemas
//! 3. Validate and execute any requested tool invocations, feed results back
//! 4. Repeat until the LLM answers directly or the step budget is exhausted
//!
//! ## Example
//!
//! ```rust,ignore
//! use ragline::{api, config::Config};
//!
//! let config = Config::from_env()?;
//! api::serve(config).await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod knowledge;
pub mod llm;
pub mod tools;

pub use config::Config;
