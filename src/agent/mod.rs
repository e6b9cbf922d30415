//! Agent module - the core orchestration logic.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Build context with system prompt and conversation history
//! 2. Call LLM with available tool schemas
//! 3. If the LLM requests tool invocations, execute them and feed results back
//! 4. Repeat until the LLM produces a final answer or the step budget is hit

mod agent_loop;
mod events;
mod prompt;

pub use agent_loop::{Agent, RunOutcome, RunReport};
pub use events::AgentEvent;
pub use prompt::build_system_prompt;
