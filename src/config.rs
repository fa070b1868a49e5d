// src/config.rs

//! Manages client configuration: loading, defaults, and validation.

use crate::core::commands::AbsentReplyPolicy;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use tracing::warn;

/// Connection and behaviour settings for a `SpinelClient`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClientConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Sent with `AUTH` on every new connection when set.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Logical database selected with `SELECT` on every new connection.
    #[serde(default)]
    pub database: usize,
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,
    /// How long to wait for a reply. Blocking commands get their own wait added on top.
    #[serde(with = "humantime_serde", default = "default_response_timeout")]
    pub response_timeout: Duration,
    /// Worker threads for a runtime owned by the client. Ignored when the client
    /// is attached to a caller-supplied runtime.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    #[serde(default)]
    pub absent_reply: AbsentReplyPolicy,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    7878
}
fn default_connect_timeout() -> Duration {
    Duration::from_secs(2)
}
fn default_response_timeout() -> Duration {
    Duration::from_secs(5)
}
fn default_worker_threads() -> usize {
    2
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: None,
            password: None,
            database: 0,
            connect_timeout: default_connect_timeout(),
            response_timeout: default_response_timeout(),
            worker_threads: default_worker_threads(),
            absent_reply: AbsentReplyPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Loads and validates a configuration from a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        Self::from_toml(&contents).with_context(|| format!("Invalid config file '{path}'"))
    }

    /// Parses and validates a configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: ClientConfig =
            toml::from_str(contents).context("Failed to parse client config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// The `host:port` address to connect to.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validates the configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.connect_timeout.is_zero() {
            return Err(anyhow!("connect_timeout cannot be 0"));
        }
        if self.response_timeout.is_zero() {
            return Err(anyhow!("response_timeout cannot be 0"));
        }
        if self.worker_threads == 0 {
            return Err(anyhow!("worker_threads cannot be 0"));
        }
        if self.username.is_some() && self.password.is_none() {
            return Err(anyhow!("username requires a password"));
        }
        if self.response_timeout < Duration::from_millis(100) {
            warn!(
                "very low response_timeout: {:?}. Replies may be abandoned under load.",
                self.response_timeout
            );
        }
        Ok(())
    }
}
