//! Listener configuration

use std::time::Duration;

use blender_mcp_protocol::{DEFAULT_HOST, DEFAULT_MAX_FRAME_LEN, DEFAULT_PORT};

/// How long a command may sit with the scene thread before the connection
/// answers with a timeout error
pub const DEFAULT_EXEC_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings for [`HostServer`](crate::HostServer)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub host: String,
    pub port: u16,
    /// Largest request body accepted
    pub max_frame_len: usize,
    pub exec_timeout: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            exec_timeout: DEFAULT_EXEC_TIMEOUT,
        }
    }
}

impl HostConfig {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    pub fn with_exec_timeout(mut self, exec_timeout: Duration) -> Self {
        self.exec_timeout = exec_timeout;
        self
    }

    /// `host:port` to bind
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
