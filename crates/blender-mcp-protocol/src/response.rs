//! Responses sent from Blender back to the bridge

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Reply to exactly one [`Command`](crate::Command)
///
/// Serialized as `{"status": ..., "result": ..., "message": ...}`. `result`
/// is omitted when null and `message` when absent; some successful commands
/// only carry a human-readable `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    /// Successful response carrying a result value
    pub fn success(result: Value) -> Self {
        Self {
            status: Status::Success,
            result,
            message: None,
        }
    }

    /// Successful response carrying only a message
    pub fn acknowledged(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            result: Value::Null,
            message: Some(message.into()),
        }
    }

    /// Error response; the message is what the caller will see verbatim
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            result: Value::Null,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Split into the result value or the error message
    pub fn into_result(self) -> Result<Value, String> {
        match self.status {
            Status::Success => Ok(self.result),
            Status::Error => Err(self
                .message
                .unwrap_or_else(|| "Unknown error".to_string())),
        }
    }
}
