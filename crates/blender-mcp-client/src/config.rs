//! Bridge configuration, loaded from the environment
//!
//! | Variable | Default |
//! |---|---|
//! | `BLENDER_MCP_HOST` | `localhost` |
//! | `BLENDER_MCP_PORT` | `8765` |
//! | `BLENDER_MCP_TIMEOUT_SECS` | `10` |
//! | `BLENDER_MCP_MAX_FRAME_BYTES` | `16777216` |
//! | `BLENDER_MCP_DEBUG` | off |

use std::str::FromStr;
use std::time::Duration;

use blender_mcp_protocol::{DEFAULT_HOST, DEFAULT_MAX_FRAME_LEN, DEFAULT_PORT};
use thiserror::Error;

pub const HOST_VAR: &str = "BLENDER_MCP_HOST";
pub const PORT_VAR: &str = "BLENDER_MCP_PORT";
pub const TIMEOUT_VAR: &str = "BLENDER_MCP_TIMEOUT_SECS";
pub const MAX_FRAME_VAR: &str = "BLENDER_MCP_MAX_FRAME_BYTES";
pub const DEBUG_VAR: &str = "BLENDER_MCP_DEBUG";

/// Default per-call deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A configuration value that could not be parsed
#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid value {value:?} for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Where Blender listens and how long to wait for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub host: String,
    pub port: u16,
    /// Deadline covering connect, write, and read of one call
    pub timeout: Duration,
    /// Largest response body accepted
    pub max_frame_len: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl BridgeConfig {
    /// Load from `BLENDER_MCP_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(host) = lookup(HOST_VAR) {
            let host = host.trim();
            if host.is_empty() {
                return Err(ConfigError {
                    var: HOST_VAR,
                    value: host.to_string(),
                    reason: "host must not be empty".to_string(),
                });
            }
            config.host = host.to_string();
        }
        if let Some(port) = parse_var::<u16>(&lookup, PORT_VAR)? {
            config.port = port;
        }
        if let Some(secs) = parse_var::<f64>(&lookup, TIMEOUT_VAR)? {
            config.timeout = duration_from_secs(TIMEOUT_VAR, secs)?;
        }
        if let Some(max) = parse_var::<usize>(&lookup, MAX_FRAME_VAR)? {
            config.max_frame_len = max;
        }

        Ok(config)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `host:port` as passed to the socket connect
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Whether `BLENDER_MCP_DEBUG` asks for debug logging
pub fn debug_enabled() -> bool {
    std::env::var(DEBUG_VAR).is_ok_and(|value| is_truthy(&value))
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    raw.trim().parse().map(Some).map_err(|err: T::Err| ConfigError {
        var,
        value: raw.clone(),
        reason: err.to_string(),
    })
}

/// Convert a user-supplied number of seconds into a timeout
pub fn duration_from_secs(var: &'static str, secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|d| !d.is_zero())
        .ok_or_else(|| ConfigError {
            var,
            value: secs.to_string(),
            reason: "timeout must be a positive number of seconds".to_string(),
        })
}
