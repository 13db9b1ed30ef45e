//! Runtime configuration for the relay service.
//!
//! Configuration layers, lowest priority first: built-in defaults, an
//! optional TOML file (`--config <path>`), then CLI flags / environment
//! variables applied by `main`.  Every field carries a serde default so a
//! partial file works and older files survive new fields:
//!
//! ```toml
//! log_level = "debug"
//!
//! [server]
//! port = 9030
//! bind = "0.0.0.0"
//!
//! [device]
//! name_prefix = "Dial"
//! auto_connect = true
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configured bind address/port pair is not a valid socket address.
    #[error("invalid bind address '{addr}': {source}")]
    InvalidBindAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

// ── Config schema ─────────────────────────────────────────────────────────────

/// Top-level relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    /// `tracing` log level used when `RUST_LOG` is unset: `"error"`,
    /// `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// WebSocket listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// TCP port the WebSocket server listens on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// IP address to bind.  `"0.0.0.0"` accepts connections from any
    /// interface; `"127.0.0.1"` restricts to local clients.
    #[serde(default = "default_bind")]
    pub bind: String,
}

/// Device selection policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    /// Only devices whose advertised name starts with this prefix are
    /// eligible.  Unset = any discovered device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_prefix: Option<String>,
    /// Connect to the first eligible device automatically.  When `false`
    /// the relay only logs discoveries and keeps scanning.
    #[serde(default = "default_true")]
    pub auto_connect: bool,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_port() -> u16 {
    9030
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            device: DeviceConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name_prefix: None,
            auto_connect: default_true(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl RelayConfig {
    /// Loads configuration from `path`, or returns the defaults when no path
    /// was given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the named file cannot be read (an
    /// explicitly requested file that is missing is an error, not a
    /// default), and [`ConfigError::Parse`] for malformed TOML.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Resolves the WebSocket bind address from the `[server]` section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBindAddress`] when `bind`/`port` do not
    /// form a parseable socket address.
    pub fn ws_bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.server.bind, self.server.port);
        addr.parse()
            .map_err(|source| ConfigError::InvalidBindAddress { addr, source })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = RelayConfig::default();
        assert_eq!(cfg.server.port, 9030);
        assert_eq!(cfg.server.bind, "0.0.0.0");
        assert_eq!(cfg.device.name_prefix, None);
        assert!(cfg.device.auto_connect);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_load_without_path_returns_defaults() {
        let cfg = RelayConfig::load(None).expect("defaults");
        assert_eq!(cfg, RelayConfig::default());
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let result = RelayConfig::load(Some(Path::new("/nonexistent/dial-relay.toml")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let cfg: RelayConfig = toml::from_str("").expect("empty config parses");
        assert_eq!(cfg, RelayConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides_only_named_fields() {
        let cfg: RelayConfig = toml::from_str(
            r#"
[server]
port = 9000

[device]
name_prefix = "Dial"
"#,
        )
        .expect("partial config parses");

        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.bind, "0.0.0.0", "unnamed fields keep defaults");
        assert_eq!(cfg.device.name_prefix.as_deref(), Some("Dial"));
        assert!(cfg.device.auto_connect);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut cfg = RelayConfig::default();
        cfg.server.port = 12345;
        cfg.device.name_prefix = Some("Dial".to_string());
        cfg.log_level = "debug".to_string();

        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: RelayConfig = toml::from_str(&text).expect("deserialize");
        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_none_name_prefix_is_omitted_from_toml() {
        let text = toml::to_string_pretty(&RelayConfig::default()).expect("serialize");
        assert!(!text.contains("name_prefix"));
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let result = RelayConfig::load(None).map(|_| ());
        assert!(result.is_ok());
        let parsed: Result<RelayConfig, _> = toml::from_str("[[[ not toml");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_ws_bind_addr_combines_bind_and_port() {
        let mut cfg = RelayConfig::default();
        cfg.server.bind = "127.0.0.1".to_string();
        cfg.server.port = 9000;
        assert_eq!(cfg.ws_bind_addr().unwrap().to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn test_ws_bind_addr_rejects_hostname() {
        // Only literal IPs are accepted; name resolution is out of scope.
        let mut cfg = RelayConfig::default();
        cfg.server.bind = "not.an.ip".to_string();
        assert!(matches!(
            cfg.ws_bind_addr(),
            Err(ConfigError::InvalidBindAddress { .. })
        ));
    }
}
