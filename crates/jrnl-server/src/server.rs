use jrnl_ledger::JournalProgram;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::NodeState;

/// A ledger node hosting the configured journal programs.
pub struct LedgerNode {
    config: ServerConfig,
    state: NodeState,
}

impl LedgerNode {
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let state = NodeState::new();
        for id in &config.programs {
            let program = if config.seed_samples {
                JournalProgram::with_samples(*id)
            } else {
                JournalProgram::new(*id)
            };
            state.deploy(program)?;
        }
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Bind the configured address and serve until the process ends.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve_on(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve_on(self, listener: TcpListener) -> ServerResult<()> {
        let addr = listener.local_addr()?;
        tracing::info!(programs = self.config.programs.len(), "ledger node listening on {addr}");
        axum::serve(listener, self.router())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
