//! One-connection-per-call bridge client

use std::time::Duration;

use blender_mcp_protocol::frame;
use blender_mcp_protocol::{Command, CommandKind, Response};
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

use crate::config::BridgeConfig;
use crate::error::BridgeError;

/// Sends commands to Blender's listener
///
/// Cheap to clone; holds nothing but configuration.
#[derive(Debug, Clone, Default)]
pub struct BridgeClient {
    config: BridgeConfig,
}

impl BridgeClient {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Send a command of a known kind using the configured timeout
    pub async fn call(
        &self,
        kind: CommandKind,
        params: Map<String, Value>,
    ) -> Result<Response, BridgeError> {
        self.execute(&Command::from_kind(kind, params), self.config.timeout)
            .await
    }

    /// Send one command and wait for its response
    ///
    /// `timeout` bounds the whole exchange. If the connect itself cannot
    /// complete in that time the failure is a [`BridgeError::Connection`];
    /// once connected, running out of time is a [`BridgeError::Timeout`] and
    /// whatever was read so far is discarded with the socket.
    pub async fn execute(
        &self,
        command: &Command,
        timeout: Duration,
    ) -> Result<Response, BridgeError> {
        let addr = self.config.address();
        let started = Instant::now();
        let deadline = started + timeout;

        let mut stream = match time::timeout_at(deadline, TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => {
                return Err(BridgeError::Connection {
                    addr,
                    reason: err.to_string(),
                });
            }
            Err(_) => {
                return Err(BridgeError::Connection {
                    addr,
                    reason: format!("connect did not complete within {timeout:?}"),
                });
            }
        };
        if let Err(err) = stream.set_nodelay(true) {
            debug!("could not set TCP_NODELAY: {err}");
        }

        let max_frame_len = self.config.max_frame_len;
        let exchange = async {
            frame::write_message(&mut stream, command).await?;
            frame::read_message::<Response, _>(&mut stream, max_frame_len).await
        };

        let result = match time::timeout_at(deadline, exchange).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => Err(BridgeError::from_frame(&addr, err)),
            Err(_) => Err(BridgeError::Timeout {
                addr: addr.clone(),
                timeout,
            }),
        };

        // Best effort: the socket is dropped right after either way.
        let _ = stream.shutdown().await;

        match &result {
            Ok(response) => debug!(
                command = command.name(),
                status = ?response.status,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "bridge call complete"
            ),
            Err(err) => warn!(command = command.name(), "bridge call failed: {err}"),
        }

        result
    }
}
