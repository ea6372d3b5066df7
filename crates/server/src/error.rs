//! Errors raised by the MCP host layer itself.
//!
//! Agent and storage failures arrive as `offline_core::Error` and convert
//! through its own mapping.

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Tool arguments the agent cannot represent (e.g., empty method).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A report could not be encoded as JSON.
    #[error("SERIALIZE_FAILED: {0}")]
    SerializeFailed(String),
}

impl From<serde_json::Error> for HostError {
    fn from(err: serde_json::Error) -> Self {
        HostError::SerializeFailed(err.to_string())
    }
}

impl From<HostError> for McpError {
    fn from(err: HostError) -> Self {
        let (code, message) = match &err {
            HostError::InvalidInput(msg) => (-32602, msg.clone()),
            HostError::SerializeFailed(msg) => (-32603, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
