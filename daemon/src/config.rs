// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::errors::DaemonError;
use romswitch::config::{SwitcherConfig, ROM_SLOT_ROOTS};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SOCKET_PATH: &str = "/dev/socket/romswitchd";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub socket_path: PathBuf,
    /// Permission bits applied to the socket after binding.
    pub socket_mode: u32,
    /// Directories whose subdirectories are secondary ROM slots.
    pub rom_roots: Vec<PathBuf>,
    /// Serve Prometheus metrics on this address when set.
    pub metrics_addr: Option<SocketAddr>,
    /// Seconds a connection may sit idle between requests. 0 disables.
    pub idle_timeout_secs: u64,
    pub switcher: SwitcherConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            socket_mode: 0o660,
            rom_roots: ROM_SLOT_ROOTS.iter().map(|root| PathBuf::from(*root)).collect(),
            metrics_addr: None,
            idle_timeout_secs: 60,
            switcher: SwitcherConfig::default(),
        }
    }
}

impl DaemonConfig {
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }

    /// Load a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, DaemonError> {
        let text = std::fs::read_to_string(path).map_err(|source| DaemonError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| DaemonError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
