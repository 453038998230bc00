//! Client configuration.
//!
//! # Design Decisions
//! - All fields have defaults so an empty config is a working config
//! - Deserializable from TOML/JSON for embedding in host application config
//! - A timeout of zero means "no timeout", matching the legacy client

pub mod user_agent;

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a client / execution engine instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Connect timeout in milliseconds. `0` disables the timeout.
    pub connect_timeout_ms: u64,

    /// Maximum automatic redirect hops for body-less requests.
    pub max_redirects: u32,

    /// Override for the User-Agent header. `None` uses the built-in default.
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 0,
            max_redirects: 5,
            user_agent: None,
        }
    }
}

impl ClientConfig {
    /// The connect timeout as a `Duration`, `None` when disabled.
    pub fn connect_timeout(&self) -> Option<Duration> {
        if self.connect_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.connect_timeout_ms))
        }
    }
}
