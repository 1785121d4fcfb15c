use std::net::SocketAddr;
use std::path::Path;

use jrnl_ledger::DEFAULT_PROGRAM_ID;
use jrnl_types::Identity;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Programs deployed on this node.
    pub programs: Vec<Identity>,
    /// Deploy every program with the sample entries already present.
    pub seed_samples: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8899)),
            programs: vec![DEFAULT_PROGRAM_ID],
            seed_samples: false,
        }
    }
}

impl ServerConfig {
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| ServerError::Config(e.to_string()))
    }
}
