//! Socket listener and the per-connection command loop
//!
//! Each connection moves through
//!
//! ```text
//! CONNECTED -> AWAITING_COMMAND -> EXECUTING -> AWAITING_COMMAND -> ... -> CLOSED
//! ```
//!
//! and closes when the peer hangs up, sends `disconnect`, or sends a frame
//! that cannot be skipped over. A body that is merely not valid JSON gets an
//! error reply and the loop carries on.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use blender_mcp_protocol::frame::{self, FrameError};
use blender_mcp_protocol::{Command, CommandKind, Response};
use serde_json::error::Category;
use tokio::net::{TcpListener, TcpStream};
use tokio::time;
use tracing::{debug, info, trace, warn};

use crate::config::HostConfig;
use crate::context::{ContextStopped, SceneContext};

/// Accepts bridge connections and feeds their commands to the scene thread
pub struct HostServer {
    listener: TcpListener,
    context: SceneContext,
    config: HostConfig,
}

impl HostServer {
    /// Bind the listener; port 0 picks a free port
    pub async fn bind(config: HostConfig, context: SceneContext) -> io::Result<Self> {
        let listener = TcpListener::bind(config.address()).await?;
        info!(addr = %listener.local_addr()?, "listening for bridge connections");
        Ok(Self {
            listener,
            context,
            config,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until the task is dropped
    pub async fn serve(self) -> io::Result<()> {
        self.serve_until(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves
    ///
    /// Connections already accepted keep running to completion on their own
    /// tasks; only the accept loop stops.
    pub async fn serve_until(self, shutdown: impl Future<Output = ()>) -> io::Result<()> {
        let Self {
            listener,
            context,
            config,
        } = self;
        let config = Arc::new(config);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("listener shutting down");
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let connection = Connection::new(stream, peer, context.clone(), Arc::clone(&config));
                        tokio::spawn(connection.run());
                    }
                    // Typically fd exhaustion; the listener itself is still fine
                    Err(err) => warn!("accept failed: {err}"),
                },
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Connected,
    AwaitingCommand,
    Executing,
    Closed,
}

struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    context: SceneContext,
    config: Arc<HostConfig>,
    state: ConnectionState,
}

impl Connection {
    fn new(stream: TcpStream, peer: SocketAddr, context: SceneContext, config: Arc<HostConfig>) -> Self {
        Self {
            stream,
            peer,
            context,
            config,
            state: ConnectionState::Connected,
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        trace!(peer = %self.peer, from = ?self.state, to = ?next, "connection state");
        self.state = next;
    }

    async fn run(mut self) {
        info!(peer = %self.peer, "bridge connected");
        self.transition(ConnectionState::AwaitingCommand);

        while self.state != ConnectionState::Closed {
            let next = self.serve_one().await;
            self.transition(next);
        }

        info!(peer = %self.peer, "bridge disconnected");
    }

    /// Read one frame, answer it, and say where the connection goes next
    async fn serve_one(&mut self) -> ConnectionState {
        let body = match frame::read_frame(&mut self.stream, self.config.max_frame_len).await {
            Ok(body) => body,
            Err(FrameError::Closed) => return ConnectionState::Closed,
            Err(err @ FrameError::TooLarge { .. }) => {
                // The body is still on the wire and cannot be skipped safely
                warn!(peer = %self.peer, "{err}");
                let _ = self.reply(&Response::error(err.to_string())).await;
                return ConnectionState::Closed;
            }
            Err(err) => {
                debug!(peer = %self.peer, "read failed: {err}");
                return ConnectionState::Closed;
            }
        };

        let command: Command = match frame::decode_body(&body) {
            Ok(command) => command,
            Err(err) => {
                let message = match &err {
                    FrameError::Json(json) if json.classify() == Category::Data => {
                        format!("Invalid command: {json}")
                    }
                    _ => "Invalid JSON".to_string(),
                };
                return self.reply_and_continue(&Response::error(message)).await;
            }
        };

        self.transition(ConnectionState::Executing);
        let closing = command.kind() == Ok(CommandKind::Disconnect);
        let response = self.execute(command).await;

        let next = self.reply_and_continue(&response).await;
        if closing {
            ConnectionState::Closed
        } else {
            next
        }
    }

    async fn execute(&self, command: Command) -> Response {
        let name = command.name().to_string();
        let read_only = command.kind().is_ok_and(CommandKind::is_read_only);
        debug!(peer = %self.peer, command = %name, read_only, "executing");

        match time::timeout(self.config.exec_timeout, self.context.submit(command)).await {
            Ok(Ok(response)) => response,
            Ok(Err(ContextStopped)) => Response::error("Scene thread is not running"),
            Err(_) => {
                warn!(peer = %self.peer, command = %name, "execution timed out");
                Response::error("Command execution timeout")
            }
        }
    }

    async fn reply(&mut self, response: &Response) -> Result<(), FrameError> {
        frame::write_message(&mut self.stream, response).await
    }

    async fn reply_and_continue(&mut self, response: &Response) -> ConnectionState {
        match self.reply(response).await {
            Ok(()) => ConnectionState::AwaitingCommand,
            Err(err) => {
                debug!(peer = %self.peer, "write failed: {err}");
                ConnectionState::Closed
            }
        }
    }
}
