//! Board configuration read from `board.toml`.
//!
//! Layering is file → environment → CLI flags. Every field has a default, so
//! an empty or missing file is valid.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 3000
//!
//! [source]
//! latency_ms = 500
//! base_url = "http://127.0.0.1:3000"
//!
//! [timing]
//! search_debounce_ms = 300
//! fetch_debounce_ms = 250
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::board::server::ServerConfig;
use crate::dashboard::Timing;
use crate::errors::ConfigError;

pub const CONFIG_FILE: &str = "board.toml";

pub const ENV_PORT: &str = "INQUIRY_BOARD_PORT";
pub const ENV_LATENCY_MS: &str = "INQUIRY_BOARD_LATENCY_MS";
pub const ENV_URL: &str = "INQUIRY_BOARD_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSection {
    /// Simulated latency of the in-memory store, in milliseconds.
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
    /// Board API the `board` and `move` commands talk to.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_latency_ms() -> u64 {
    500
}

fn default_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingSection {
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    #[serde(default = "default_fetch_debounce_ms")]
    pub fetch_debounce_ms: u64,
}

fn default_search_debounce_ms() -> u64 {
    300
}

fn default_fetch_debounce_ms() -> u64 {
    250
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            search_debounce_ms: default_search_debounce_ms(),
            fetch_debounce_ms: default_fetch_debounce_ms(),
        }
    }
}

/// The complete board.toml configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardToml {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub source: SourceSection,
    #[serde(default)]
    pub timing: TimingSection,
}

impl BoardToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse board.toml")
    }

    /// Load `board.toml` from `dir`, or defaults if there is none.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_PORT) {
            self.server.port = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_PORT,
                value: value.clone(),
                expected: "a port number",
            })?;
        }
        if let Some(value) = lookup(ENV_LATENCY_MS) {
            self.source.latency_ms =
                value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    var: ENV_LATENCY_MS,
                    value: value.clone(),
                    expected: "a number of milliseconds",
                })?;
        }
        if let Some(value) = lookup(ENV_URL) {
            let value = value.trim();
            if !value.is_empty() {
                self.source.base_url = value.to_string();
            }
        }
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_process_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    pub fn timing(&self) -> Timing {
        Timing {
            search_debounce: Duration::from_millis(self.timing.search_debounce_ms),
            fetch_debounce: Duration::from_millis(self.timing.fetch_debounce_ms),
        }
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.source.latency_ms)
    }

    /// Server settings before CLI flags are applied.
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.server.host.clone(),
            port: self.server.port,
            latency: self.latency(),
            ..ServerConfig::default()
        }
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.server.port == 0 {
            warnings.push("server.port is 0; an ephemeral port will be chosen".to_string());
        }
        if !self.source.base_url.starts_with("http://")
            && !self.source.base_url.starts_with("https://")
        {
            warnings.push(format!(
                "source.base_url '{}' is not an http(s) URL",
                self.source.base_url
            ));
        }
        if self.timing.search_debounce_ms == 0 {
            warnings.push("timing.search_debounce_ms is 0; every keystroke commits".to_string());
        }
        warnings
    }
}
