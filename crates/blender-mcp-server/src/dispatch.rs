//! Tool dispatch: validate, forward over the bridge, reshape the reply

use blender_mcp_client::{BridgeClient, BridgeError};
use blender_mcp_protocol::{CommandKind, Response};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

use crate::schema::{SchemaError, ValidationError};
use crate::tools::{self, ArgumentError, ToolSpec};

/// Why a tool call produced no result
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Rejected before anything was sent
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The tool's own argument schema is broken
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Blender could not be reached or answered garbage
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// Blender ran the command and reported an error; the message is Blender's
    #[error("{message}")]
    Execution { message: String },
}

impl From<ArgumentError> for ToolError {
    fn from(err: ArgumentError) -> Self {
        match err {
            ArgumentError::Invalid(err) => Self::Validation(err),
            ArgumentError::Schema(err) => Self::Schema(err),
        }
    }
}

/// Routes tool calls to Blender
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    bridge: BridgeClient,
}

impl Dispatcher {
    pub fn new(bridge: BridgeClient) -> Self {
        Self { bridge }
    }

    pub fn bridge(&self) -> &BridgeClient {
        &self.bridge
    }

    /// All tools this dispatcher serves
    pub fn tools(&self) -> &'static [ToolSpec] {
        tools::CATALOGUE
    }

    pub fn descriptor(&self, name: &str) -> Option<&'static ToolSpec> {
        tools::find(name)
    }

    /// Run a tool call end to end
    ///
    /// Unknown names and invalid arguments fail before any connection is
    /// opened. Nothing is retried: a mutating command whose reply was lost
    /// may already have been applied.
    pub async fn invoke(&self, name: &str, arguments: &Map<String, Value>) -> Result<Value, ToolError> {
        let tool = self
            .descriptor(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let params = tool.validate(arguments)?;
        debug!(tool = name, command = %tool.command, "dispatching tool call");
        self.query(tool.command, params).await
    }

    /// Send a command directly, bypassing tool validation
    ///
    /// Used for the read-only commands behind resources, which have no tool.
    pub async fn query(&self, kind: CommandKind, params: Map<String, Value>) -> Result<Value, ToolError> {
        let response = self.bridge.call(kind, params).await?;
        tool_result(response)
    }
}

/// A successful reply's result, or a `{"message": ...}` object for replies
/// that only carry a message
fn tool_result(response: Response) -> Result<Value, ToolError> {
    let message = response.message.clone();
    match response.into_result() {
        Ok(Value::Null) => Ok(json!({ "message": message.unwrap_or_default() })),
        Ok(result) => Ok(result),
        Err(message) => Err(ToolError::Execution { message }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blender_mcp_client::BridgeConfig;
    use std::time::Duration;
    use tokio::net::TcpListener;

    /// A dispatcher pointed at a port nobody listens on
    async fn unreachable() -> Dispatcher {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let config = BridgeConfig::default()
            .with_host("127.0.0.1")
            .with_port(port)
            .with_timeout(Duration::from_secs(2));
        Dispatcher::new(BridgeClient::new(config))
    }

    #[test]
    fn test_message_only_reply_becomes_object() {
        let value = tool_result(Response::acknowledged("Object 'Cube' deleted")).unwrap();
        assert_eq!(value, json!({"message": "Object 'Cube' deleted"}));
    }

    #[test]
    fn test_error_reply_keeps_message_verbatim() {
        let err = tool_result(Response::error("Object 'Ghost' not found")).unwrap_err();
        assert!(matches!(&err, ToolError::Execution { message } if message == "Object 'Ghost' not found"));
        assert_eq!(err.to_string(), "Object 'Ghost' not found");
    }

    #[test]
    fn test_error_reply_without_message() {
        let mut response = Response::error("");
        response.message = None;
        let err = tool_result(response).unwrap_err();
        assert!(matches!(&err, ToolError::Execution { message } if message == "Unknown error"));
    }

    #[test]
    fn test_result_wins_over_message() {
        let mut response = Response::success(json!({"name": "Cube"}));
        response.message = Some("ignored".to_string());
        assert_eq!(tool_result(response).unwrap(), json!({"name": "Cube"}));
    }

    #[tokio::test]
    async fn test_unknown_tool_fails_before_connecting() {
        let dispatcher = unreachable().await;
        let err = dispatcher.invoke("melt_scene", &Map::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(name) if name == "melt_scene"));
    }

    #[tokio::test]
    async fn test_validation_fails_before_connecting() {
        let dispatcher = unreachable().await;
        let err = dispatcher.invoke("create_object", &Map::new()).await.unwrap_err();
        // Had it connected, this would be a Bridge error
        assert!(matches!(err, ToolError::Validation(_)));
    }

    #[tokio::test]
    async fn test_valid_call_reaches_the_network() {
        let dispatcher = unreachable().await;
        let err = dispatcher.invoke("get_scene_info", &Map::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::Bridge(BridgeError::Connection { .. })));
    }
}
