//! API request and response types.

use serde::{Deserialize, Serialize};

/// Inbound agent request: the client's conversation so far.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentRequest {
    pub messages: Vec<IncomingMessage>,
}

/// One message as sent by the chat client.
///
/// Clients only submit plain-text turns; tool traffic is produced and
/// consumed server-side within a single request.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub role: String,
    pub content: String,
}

/// Error envelope for request-level failures.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}
