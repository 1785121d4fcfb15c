use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use jrnl_ledger::{LedgerError, RemoteConfig, SimulatedConfig, DEFAULT_PROGRAM_ID};
use jrnl_types::{Cluster, Commitment, Identity};
use serde::{Deserialize, Serialize};

/// Which [`LedgerClient`](jrnl_ledger::LedgerClient) implementation to build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Simulated,
    Remote,
}

/// Client configuration, usually read from a TOML file.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub cluster: Cluster,
    pub backend: Backend,
    /// Ledger node URL. Falls back to the cluster's well-known endpoint.
    pub endpoint: Option<String>,
    pub program_id: Identity,
    /// Per-cluster program identities, keyed by cluster name.
    pub program_overrides: BTreeMap<String, Identity>,
    pub commitment: Commitment,
    pub simulated_latency_ms: u64,
    /// Seed the simulated ledger with the sample entries.
    pub seed_samples: bool,
    /// Use the simulated ledger when the remote node cannot be reached.
    pub fallback_to_simulated: bool,
    pub request_timeout_secs: u64,
    /// Hex-encoded signing key file used for remote submissions.
    pub keypair: Option<PathBuf>,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            cluster: Cluster::default(),
            backend: Backend::default(),
            endpoint: None,
            program_id: DEFAULT_PROGRAM_ID,
            program_overrides: BTreeMap::new(),
            commitment: Commitment::default(),
            simulated_latency_ms: 1000,
            seed_samples: true,
            fallback_to_simulated: true,
            request_timeout_secs: 10,
            keypair: None,
        }
    }
}

impl JournalConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Program identity on `cluster`.
    pub fn program_for(&self, cluster: Cluster) -> Identity {
        self.program_overrides
            .get(cluster.as_str())
            .copied()
            .unwrap_or(self.program_id)
    }

    /// Program identity on the configured cluster.
    pub fn program(&self) -> Identity {
        self.program_for(self.cluster)
    }

    pub fn resolve_endpoint(&self) -> Result<String, ConfigError> {
        self.endpoint
            .clone()
            .or_else(|| self.cluster.default_endpoint().map(str::to_string))
            .ok_or(ConfigError::MissingEndpoint(self.cluster))
    }

    pub fn simulated_config(&self) -> SimulatedConfig {
        SimulatedConfig {
            submit_latency: Duration::from_millis(self.simulated_latency_ms),
            seed_samples: self.seed_samples,
            ..SimulatedConfig::default()
        }
    }

    pub fn remote_config(&self) -> Result<RemoteConfig, ConfigError> {
        let mut remote = RemoteConfig::new(self.resolve_endpoint()?, self.program());
        remote.commitment = self.commitment;
        remote.timeout = Duration::from_secs(self.request_timeout_secs);
        Ok(remote)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no endpoint configured for cluster {0}")]
    MissingEndpoint(Cluster),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
