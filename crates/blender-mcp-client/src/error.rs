//! Bridge call failures

use std::time::Duration;

use blender_mcp_protocol::FrameError;
use thiserror::Error;

/// Errors that can occur while talking to Blender
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Blender's listener could not be reached (refused, unresolvable, or
    /// the connect attempt ran past the timeout) or the socket broke
    #[error("cannot reach Blender at {addr}: {reason}")]
    Connection { addr: String, reason: String },

    /// No complete response frame arrived before the deadline
    #[error("no response from Blender at {addr} within {timeout:?}")]
    Timeout { addr: String, timeout: Duration },

    /// The response frame could not be decoded
    #[error("malformed response from Blender: {0}")]
    Protocol(FrameError),
}

impl BridgeError {
    pub(crate) fn from_frame(addr: &str, err: FrameError) -> Self {
        match err {
            FrameError::Io(io) => Self::Connection {
                addr: addr.to_string(),
                reason: io.to_string(),
            },
            other => Self::Protocol(other),
        }
    }

    /// Short machine-readable category, used in structured tool failures
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "connection",
            Self::Timeout { .. } => "timeout",
            Self::Protocol(_) => "protocol",
        }
    }
}
