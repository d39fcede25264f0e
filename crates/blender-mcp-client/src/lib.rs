//! Blender MCP Client - sends one command to Blender per connection
//!
//! The client is stateless: every [`BridgeClient::execute`] opens a new TCP
//! connection, writes one command frame, reads one response frame, and drops
//! the socket whatever the outcome. Concurrent callers therefore never share
//! a connection and need no locking.
//!
//! A call that times out abandons its socket, but Blender may already have
//! started applying the command. Delivery is at-most-once and unconfirmed, so
//! callers must not retry mutating commands blindly.

pub mod client;
pub mod config;
pub mod error;

pub use client::BridgeClient;
pub use config::{BridgeConfig, ConfigError, debug_enabled};
pub use error::BridgeError;
