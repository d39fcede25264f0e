//! Blender MCP Protocol - the wire format spoken between the MCP bridge and Blender
//!
//! Every exchange is a single request frame followed by a single response frame
//! on a fresh TCP connection. A frame is a 4-byte big-endian length prefix
//! followed by a UTF-8 JSON body:
//!
//! ```text
//! request:  {"command": "create_object", "params": {"object_type": "CUBE"}}
//! response: {"status": "success", "result": {"name": "Cube.001"}}
//! ```
//!
//! There is no request ID. Responses are correlated by the
//! one-outstanding-request-per-connection discipline, so connection reuse or
//! multiplexing would need an explicit correlation field first.

pub mod command;
pub mod frame;
pub mod response;

pub use command::{Command, CommandKind, UnknownCommand};
pub use frame::{DEFAULT_MAX_FRAME_LEN, FrameError, LENGTH_PREFIX_LEN};
pub use response::{Response, Status};

/// Default TCP port of the Blender-side listener
pub const DEFAULT_PORT: u16 = 8765;

/// Default host of the Blender-side listener
pub const DEFAULT_HOST: &str = "localhost";

/// Largest render edge in pixels either side will accept
pub const MAX_RESOLUTION: u32 = 8192;
