//! Blender MCP Server Binary
//!
//! Runs the Blender MCP server on stdio transport. Blender must be running
//! with the bridge add-on listening (default `localhost:8765`).
//!
//! ## Usage
//!
//! Run directly:
//! ```bash
//! BLENDER_MCP_PORT=8765 blender-mcp
//! ```
//!
//! Or add to an MCP client's configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "blender": {
//!       "command": "blender-mcp"
//!     }
//!   }
//! }
//! ```

use anyhow::{Context, Result};
use rmcp::ServiceExt;
use rmcp::transport::io::stdio;
use tracing::info;

use blender_mcp_server::client::{BridgeClient, BridgeConfig, debug_enabled};
use blender_mcp_server::{BlenderMcpService, Dispatcher, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr only - stdout is reserved for MCP JSON-RPC
    logging::init(debug_enabled());

    let config = BridgeConfig::from_env().context("invalid bridge configuration")?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        blender = %config.address(),
        timeout = ?config.timeout,
        "Blender MCP server starting on stdio"
    );

    let service = BlenderMcpService::new(Dispatcher::new(BridgeClient::new(config)));
    let server = service
        .serve(stdio())
        .await
        .context("MCP handshake failed")?;

    // Wait for client to disconnect or error
    server.waiting().await?;

    info!("client disconnected, shutting down");
    Ok(())
}
