//! # Config Module
//!
//! Declarative YAML configuration for sinks and pools, with env-var
//! overrides for runtime knobs.
//!
//! ## Overview
//!
//! A service carries one [`ServiceConfig`] document describing the record
//! sinks to build and, optionally, a resource pool. Configuration is parsed
//! with `serde_yaml`, so malformed documents surface field-level errors at
//! startup; by the time a config struct reaches a component constructor it
//! is already validated and strongly typed.
//!
//! ```yaml
//! sinks:
//!   - type: tcp
//!     host: logs.internal
//!     port: 5170
//!   - type: udp
//!     host: 127.0.0.1
//!     port: 32144
//!     recovery_interval_ms: 1000
//!   - type: file
//!     path: /var/log/app/records.log
//! pool:
//!   max_size: 16
//!   min_idle: 2
//! ```
//!
//! ## Environment Variables
//!
//! [`RuntimeConfig::from_env`] reads `SVCKIT_`-prefixed overrides:
//!
//! - `SVCKIT_RECOVERY_INTERVAL_MS` — default sink recovery interval
//! - `SVCKIT_CHECKOUT_TIMEOUT_MS` — default pool checkout timeout

use std::env;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::pool::PoolConfig;
use crate::sink::{Connector, FileConnector, ResilientSink, TcpConnector, UdpConnector};

const DEFAULT_RECOVERY_INTERVAL_MS: u64 = 5000;

fn default_recovery_interval_ms() -> u64 {
    DEFAULT_RECOVERY_INTERVAL_MS
}

/// One record sink, tagged by transport.
///
/// `recovery_interval_ms` paces reopen attempts after a transport failure;
/// `lazy_start` defers the first open so a dead endpoint at bootstrap is
/// tolerated instead of fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    Tcp {
        host: String,
        port: u16,
        #[serde(default = "default_recovery_interval_ms")]
        recovery_interval_ms: u64,
        #[serde(default)]
        lazy_start: bool,
    },
    Udp {
        host: String,
        port: u16,
        #[serde(default = "default_recovery_interval_ms")]
        recovery_interval_ms: u64,
        #[serde(default)]
        lazy_start: bool,
    },
    File {
        path: PathBuf,
        #[serde(default = "default_recovery_interval_ms")]
        recovery_interval_ms: u64,
        #[serde(default)]
        lazy_start: bool,
    },
}

impl SinkConfig {
    pub fn recovery_interval(&self) -> Duration {
        let ms = match self {
            SinkConfig::Tcp {
                recovery_interval_ms,
                ..
            }
            | SinkConfig::Udp {
                recovery_interval_ms,
                ..
            }
            | SinkConfig::File {
                recovery_interval_ms,
                ..
            } => *recovery_interval_ms,
        };
        Duration::from_millis(ms)
    }

    pub fn lazy_start(&self) -> bool {
        match self {
            SinkConfig::Tcp { lazy_start, .. }
            | SinkConfig::Udp { lazy_start, .. }
            | SinkConfig::File { lazy_start, .. } => *lazy_start,
        }
    }

    /// The connector this configuration describes.
    pub fn connector(&self) -> Box<dyn Connector> {
        match self {
            SinkConfig::Tcp { host, port, .. } => Box::new(TcpConnector::new(host.clone(), *port)),
            SinkConfig::Udp { host, port, .. } => Box::new(UdpConnector::new(host.clone(), *port)),
            SinkConfig::File { path, .. } => Box::new(FileConnector::new(path.clone())),
        }
    }

    /// Build the configured sink.
    ///
    /// # Errors
    ///
    /// Propagates the open error for an eager (non-`lazy_start`) sink whose
    /// endpoint is unreachable — a startup error for the operator.
    pub fn build(&self, clock: Arc<dyn Clock>) -> io::Result<ResilientSink> {
        let connector = self.connector();
        let interval = self.recovery_interval();
        if self.lazy_start() {
            Ok(ResilientSink::new_lazy(connector, interval, clock))
        } else {
            ResilientSink::new(connector, interval, clock)
        }
    }
}

/// Root configuration document for a service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Record sinks to build at bootstrap.
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
    /// Optional pooled-resource sizing.
    #[serde(default)]
    pub pool: Option<PoolConfig>,
}

impl ServiceConfig {
    /// Load a configuration document from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Parse a configuration document from YAML text.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(raw).map_err(ConfigError::Parse)
    }
}

/// Configuration load failure, reported to the operator at startup.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    /// Malformed document; carries serde_yaml's field-level detail.
    Parse(serde_yaml::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config '{}': {}", path.display(), source)
            }
            ConfigError::Parse(e) => write!(f, "invalid config: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

/// Runtime knobs loaded from `SVCKIT_`-prefixed environment variables.
///
/// These are deployment-time overrides for values a YAML document may not
/// pin; unset or unparsable variables fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Default sink recovery interval in milliseconds.
    pub recovery_interval_ms: u64,
    /// Default pool checkout timeout in milliseconds.
    pub checkout_timeout_ms: u64,
}

impl RuntimeConfig {
    /// Load overrides from the environment.
    pub fn from_env() -> Self {
        Self {
            recovery_interval_ms: env_u64(
                "SVCKIT_RECOVERY_INTERVAL_MS",
                DEFAULT_RECOVERY_INTERVAL_MS,
            ),
            checkout_timeout_ms: env_u64("SVCKIT_CHECKOUT_TIMEOUT_MS", 5000),
        }
    }

    pub fn recovery_interval(&self) -> Duration {
        Duration::from_millis(self.recovery_interval_ms)
    }

    /// Pool config carrying the env-derived checkout timeout.
    pub fn pool_defaults(&self) -> PoolConfig {
        PoolConfig {
            checkout_timeout_ms: self.checkout_timeout_ms,
            ..PoolConfig::default()
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            recovery_interval_ms: DEFAULT_RECOVERY_INTERVAL_MS,
            checkout_timeout_ms: 5000,
        }
    }
}

fn env_u64(var: &str, default: u64) -> u64 {
    env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
