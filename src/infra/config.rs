//! Layered configuration: built-in defaults < TOML file < environment < CLI flags.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::session::SessionOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },
    #[error("{key} {reason}")]
    Invalid {
        key: &'static str,
        reason: &'static str,
    },
}

/// MCP control channel transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Stdio,
    Http,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Stdio => "stdio",
            Mode::Http => "http",
        })
    }
}

impl FromStr for Mode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Mode::Stdio),
            "http" | "server" => Ok(Mode::Http),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 25565,
            username: "LLMBot".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    pub mode: Mode,
    pub http_port: u16,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Stdio,
            http_port: 8080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub addr: String,
    pub spawn_timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3008".to_string(),
            spawn_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub mcp: McpConfig,
    pub bridge: BridgeConfig,
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub mode: Option<Mode>,
    pub http_port: Option<u16>,
    pub bridge_addr: Option<String>,
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env_value(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { key, value }),
    }
}

impl Config {
    /// Resolves the effective configuration from every layer.
    pub fn load(overrides: &Overrides) -> Result<Self, ConfigError> {
        let file = overrides
            .config_file
            .clone()
            .or_else(|| env_value("CONFIG_FILE").map(PathBuf::from));
        let mut cfg = match file {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };
        cfg.apply_env()?;
        cfg.apply_overrides(overrides);
        cfg.validate()?;
        Ok(cfg)
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let cfg = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        tracing::info!(path = %path.display(), "Loaded config file");
        Ok(cfg)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(host) = env_value("MC_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parsed("MC_PORT")? {
            self.server.port = port;
        }
        if let Some(username) = env_value("MC_USERNAME") {
            self.server.username = username;
        }
        if let Some(mode) = env_parsed("MODE")? {
            self.mcp.mode = mode;
        }
        if let Some(port) = env_parsed("HTTP_PORT")? {
            self.mcp.http_port = port;
        }
        if let Some(addr) = env_value("BRIDGE_ADDR") {
            self.bridge.addr = addr;
        }
        if let Some(ms) = env_parsed("SPAWN_TIMEOUT_MS")? {
            self.bridge.spawn_timeout_ms = ms;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, o: &Overrides) {
        if let Some(host) = &o.host {
            self.server.host = host.clone();
        }
        if let Some(port) = o.port {
            self.server.port = port;
        }
        if let Some(username) = &o.username {
            self.server.username = username.clone();
        }
        if let Some(mode) = o.mode {
            self.mcp.mode = mode;
        }
        if let Some(port) = o.http_port {
            self.mcp.http_port = port;
        }
        if let Some(addr) = &o.bridge_addr {
            self.bridge.addr = addr.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key, reason| Err(ConfigError::Invalid { key, reason });
        if self.server.host.trim().is_empty() {
            return invalid("server.host", "cannot be empty");
        }
        if self.server.port == 0 {
            return invalid("server.port", "cannot be 0");
        }
        if self.server.username.trim().is_empty() {
            return invalid("server.username", "cannot be empty");
        }
        if self.mcp.mode == Mode::Http && self.mcp.http_port == 0 {
            return invalid("mcp.http_port", "cannot be 0");
        }
        if self.bridge.addr.trim().is_empty() {
            return invalid("bridge.addr", "cannot be empty");
        }
        if self.bridge.spawn_timeout_ms == 0 {
            return invalid("bridge.spawn_timeout_ms", "cannot be 0");
        }
        Ok(())
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            host: self.server.host.clone(),
            port: self.server.port,
            username: self.server.username.clone(),
            bridge_addr: self.bridge.addr.clone(),
            spawn_timeout: Duration::from_millis(self.bridge.spawn_timeout_ms),
        }
    }
}
