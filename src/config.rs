use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::from_str;

use crate::errors::{ConfigSource, SetupError, SetupResult};

pub const DEFAULT_CONFIG_PATH: &str = "tools/config.json";
pub const DEFAULT_GENESIS_PATH: &str = "tools/genesis.json";
pub const DEFAULT_TEMPLATE_DIR: &str = "tools/scripts";
pub const DEFAULT_BIN_DIR: &str = "../inery/2.0/bin";
pub const DEFAULT_PROFILE_NAME: &str = ".bashrc";

/// Accounts and peers a bootstrap run wires into the launch scripts.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RunConfiguration {
    #[serde(rename = "MASTER_ACCOUNT")]
    pub master_account: MasterAccount,
    #[serde(rename = "GENESIS_ACCOUNT")]
    pub genesis_account: GenesisAccount,
    #[serde(rename = "LITE_NODE")]
    pub lite_node: LiteNode,
    #[serde(rename = "PEERS")]
    pub peers: Vec<PeerConfig>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MasterAccount {
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "HTTP_ADDRESS")]
    pub http_address: String,
    #[serde(rename = "PEER_ADDRESS")]
    pub peer_address: String,
    #[serde(rename = "PUBLIC_KEY")]
    pub public_key: String,
    #[serde(rename = "PRIVATE_KEY")]
    pub private_key: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GenesisAccount {
    #[serde(rename = "PEER_ADDRESS")]
    pub peer_address: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LiteNode {
    #[serde(rename = "HTTP_ADDRESS")]
    pub http_address: String,
    #[serde(rename = "PEER_ADDRESS")]
    pub peer_address: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PeerConfig {
    #[serde(rename = "PEER_ADDRESS")]
    pub peer_address: String,
}

impl RunConfiguration {
    pub fn from_path(path: &Path) -> SetupResult<Self> {
        let contents = fs::read_to_string(path).map_err(|err| SetupError::Config {
            path: path.to_path_buf(),
            source: ConfigSource::Io(err),
        })?;
        Self::from_json(&contents).map_err(|err| SetupError::Config {
            path: path.to_path_buf(),
            source: ConfigSource::Json(err),
        })
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        from_str(contents)
    }

    /// Peer addresses in configuration order.
    pub fn peer_addresses(&self) -> impl Iterator<Item = &str> {
        self.peers.iter().map(|peer| peer.peer_address.as_str())
    }
}

/// Every path a run reads from or writes to, resolved up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub genesis_path: PathBuf,
    pub template_dir: PathBuf,
    pub bin_dir: PathBuf,
    pub profile_path: Option<PathBuf>,
}

impl Layout {
    /// Layout rooted at `root` with every other path at its default location.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config_path: root.join(DEFAULT_CONFIG_PATH),
            genesis_path: root.join(DEFAULT_GENESIS_PATH),
            template_dir: root.join(DEFAULT_TEMPLATE_DIR),
            bin_dir: root.join(DEFAULT_BIN_DIR),
            profile_path: default_profile_path(),
            root,
        }
    }

    pub fn with_config_path(mut self, path: Option<&Path>) -> Self {
        if let Some(path) = path {
            self.config_path = self.resolve_relative_path(path);
        }
        self
    }

    pub fn with_bin_dir(mut self, path: Option<&Path>) -> Self {
        if let Some(path) = path {
            self.bin_dir = self.resolve_relative_path(path);
        }
        self
    }

    pub fn with_profile_path(mut self, path: Option<&Path>) -> Self {
        if let Some(path) = path {
            self.profile_path = Some(path.to_path_buf());
        }
        self
    }

    pub fn resolve_relative_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        self.root.join(path)
    }

    pub fn profile_path(&self) -> SetupResult<&Path> {
        self.profile_path.as_deref().ok_or_else(|| {
            SetupError::Environment("HOME is not set and no --profile was given".to_string())
        })
    }
}

fn default_profile_path() -> Option<PathBuf> {
    match env::var_os("HOME") {
        Some(home) if !home.is_empty() => Some(PathBuf::from(home).join(DEFAULT_PROFILE_NAME)),
        _ => None,
    }
}
