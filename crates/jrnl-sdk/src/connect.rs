use std::sync::Arc;

use jrnl_crypto::SigningKey;
use jrnl_ledger::{
    LedgerClient, LedgerError, RemoteLedgerClient, SimulatedLedgerClient, PROTOCOL_VERSION,
};
use tracing::{info, warn};

use crate::config::{Backend, ConfigError, JournalConfig};
use crate::repository::EntryRepository;

/// Build the ledger client `config` asks for.
///
/// A remote node is health-checked first. When it is unreachable and
/// `fallback_to_simulated` is set, the simulated ledger is used instead.
pub async fn connect(
    config: &JournalConfig,
    signer: Option<SigningKey>,
) -> Result<Arc<dyn LedgerClient>, ConfigError> {
    let program = config.program();
    if config.backend == Backend::Simulated {
        info!(program = %program.short_id(), "using simulated ledger");
        return Ok(Arc::new(SimulatedLedgerClient::new(program, config.simulated_config())));
    }

    let mut client = RemoteLedgerClient::new(config.remote_config()?)?;
    if let Some(signer) = signer {
        client = client.with_signer(signer);
    }

    match client.health().await {
        Ok(health) => {
            if health.protocol_version != PROTOCOL_VERSION {
                warn!(
                    remote = health.protocol_version,
                    local = PROTOCOL_VERSION,
                    "ledger node speaks a different protocol version"
                );
            }
            info!(endpoint = client.endpoint(), version = %health.version, "connected to ledger node");
            if let Ok(false) = client.program_deployed(&program).await {
                warn!(program = %program.short_id(), "journal program is not deployed on this node");
            }
            Ok(Arc::new(client))
        }
        Err(err @ LedgerError::TransportUnavailable(_)) if config.fallback_to_simulated => {
            warn!(
                endpoint = client.endpoint(),
                error = %err,
                "ledger node unreachable, falling back to simulated ledger"
            );
            Ok(Arc::new(SimulatedLedgerClient::new(program, config.simulated_config())))
        }
        Err(err) => Err(err.into()),
    }
}

impl EntryRepository {
    /// Repository over the ledger client [`connect`] builds for `config`.
    pub async fn from_config(
        config: &JournalConfig,
        signer: Option<SigningKey>,
    ) -> Result<Self, ConfigError> {
        let ledger = connect(config, signer).await?;
        Ok(Self::new(ledger, config.program()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_remote(fallback: bool) -> JournalConfig {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        JournalConfig {
            backend: Backend::Remote,
            endpoint: Some(format!("http://127.0.0.1:{port}")),
            fallback_to_simulated: fallback,
            request_timeout_secs: 2,
            simulated_latency_ms: 0,
            ..JournalConfig::default()
        }
    }

    #[tokio::test]
    async fn simulated_backend() {
        let ledger = connect(&JournalConfig::default(), None).await.unwrap();
        assert_eq!(ledger.backend(), "simulated");
        assert_eq!(ledger.program(), JournalConfig::default().program());
    }

    #[tokio::test]
    async fn unreachable_node_falls_back() {
        let ledger = connect(&unreachable_remote(true), None).await.unwrap();
        assert_eq!(ledger.backend(), "simulated");
    }

    #[tokio::test]
    async fn unreachable_node_without_fallback_fails() {
        let err = connect(&unreachable_remote(false), None).await.err().unwrap();
        assert!(matches!(
            err,
            ConfigError::Ledger(LedgerError::TransportUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn repository_from_config_lists_samples() {
        let config = JournalConfig {
            simulated_latency_ms: 0,
            ..JournalConfig::default()
        };
        let repo = EntryRepository::from_config(&config, None).await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }
}
