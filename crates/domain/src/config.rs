use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
}

// ── Node connection ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Host the node listens on.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the node listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// How long to wait for the transport to open before giving up.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// How long a correlated request waits for its reply.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl NodeConfig {
    /// The WebSocket URL for this node.
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "localhost".into()
}

fn default_port() -> u16 {
    12345
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

// ── Wallet storage ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Path of the wallet JSON file.
    #[serde(default = "default_wallet_path")]
    pub path: PathBuf,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            path: default_wallet_path(),
        }
    }
}

fn default_wallet_path() -> PathBuf {
    PathBuf::from("smpl-wallet.json")
}

// ── Loading ────────────────────────────────────────────────────────

impl Config {
    /// Strict load: the file must exist and parse as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&raw).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load `path`, falling back to defaults when the file is absent or
    /// invalid. An invalid file is logged, not fatal.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to load config, using defaults"
                );
                Self::default()
            }
        }
    }
}
