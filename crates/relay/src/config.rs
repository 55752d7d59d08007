// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use clap::Parser;

/// Event relay: forwards one-shot trigger requests to live WebSocket sessions.
#[derive(Debug, Clone, Parser)]
#[command(name = "coop-relay", version, about)]
pub struct RelayConfig {
    /// Host to bind on.
    #[arg(long, default_value = "0.0.0.0", env = "COOP_RELAY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 3001, env = "COOP_RELAY_PORT")]
    pub port: u16,

    /// Origins allowed for cross-origin requests (`*` allows any).
    #[arg(
        long = "allowed-origin",
        default_value = "http://localhost:3000",
        env = "COOP_RELAY_ALLOWED_ORIGINS",
        value_delimiter = ','
    )]
    pub allowed_origins: Vec<String>,

    /// Outbound queue depth per connection. A full queue drops the event
    /// for that connection only.
    #[arg(long, default_value_t = 64, env = "COOP_RELAY_SEND_BUFFER")]
    pub send_buffer: usize,

    /// Keepalive ping interval in milliseconds.
    #[arg(long, default_value_t = 25000, env = "COOP_RELAY_PING_INTERVAL_MS")]
    pub ping_interval_ms: u64,

    /// Close a connection when no pong arrives this long after a ping.
    #[arg(long, default_value_t = 20000, env = "COOP_RELAY_PONG_TIMEOUT_MS")]
    pub pong_timeout_ms: u64,

    /// Log format (json or text).
    #[arg(long, default_value = "text", env = "COOP_RELAY_LOG_FORMAT")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "COOP_RELAY_LOG_LEVEL")]
    pub log_level: String,
}

impl RelayConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.send_buffer == 0 {
            anyhow::bail!("--send-buffer must be at least 1");
        }
        if self.ping_interval_ms == 0 || self.pong_timeout_ms == 0 {
            anyhow::bail!("--ping-interval-ms and --pong-timeout-ms must be non-zero");
        }
        if self.allowed_origins.iter().all(|o| o.trim().is_empty()) {
            anyhow::bail!("at least one --allowed-origin is required");
        }
        match self.log_format.as_str() {
            "json" | "text" => Ok(()),
            other => anyhow::bail!("invalid log format: {other}"),
        }
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    pub fn pong_timeout(&self) -> Duration {
        Duration::from_millis(self.pong_timeout_ms)
    }

    /// True when the origin list contains the `*` wildcard.
    pub fn any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o.trim() == "*")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
