use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use jrnl_types::{Address, ConfirmationToken, Entry, Identity};
use tracing::{debug, info};

use crate::error::{LedgerError, LedgerResult};
use crate::instruction::Instruction;
use crate::program::JournalProgram;
use crate::traits::LedgerClient;

/// Configuration for the [`SimulatedLedgerClient`].
#[derive(Clone, Debug)]
pub struct SimulatedConfig {
    /// Delay before a submission is confirmed.
    pub submit_latency: Duration,
    /// Delay before a fetch returns.
    pub fetch_latency: Duration,
    /// Start with the fixed sample entries.
    pub seed_samples: bool,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            submit_latency: Duration::from_millis(1000),
            fetch_latency: Duration::ZERO,
            seed_samples: true,
        }
    }
}

impl SimulatedConfig {
    /// No latency, no samples. What most tests want.
    pub fn instant() -> Self {
        Self {
            submit_latency: Duration::ZERO,
            fetch_latency: Duration::ZERO,
            seed_samples: false,
        }
    }
}

/// In-memory ledger client for offline use, local demos, and tests.
///
/// Executes instructions through [`JournalProgram`] exactly like a ledger
/// node would, after an artificial confirmation delay. Well-formed
/// submissions always succeed unless a failure has been injected with
/// [`fail_submissions`](Self::fail_submissions).
pub struct SimulatedLedgerClient {
    config: SimulatedConfig,
    state: RwLock<JournalProgram>,
    failure: Mutex<Option<String>>,
    submits: AtomicU64,
    fetch_ones: AtomicU64,
    fetch_alls: AtomicU64,
}

impl SimulatedLedgerClient {
    pub fn new(program: Identity, config: SimulatedConfig) -> Self {
        let state = if config.seed_samples {
            JournalProgram::with_samples(program)
        } else {
            JournalProgram::new(program)
        };
        Self {
            config,
            state: RwLock::new(state),
            failure: Mutex::new(None),
            submits: AtomicU64::new(0),
            fetch_ones: AtomicU64::new(0),
            fetch_alls: AtomicU64::new(0),
        }
    }

    /// Make every following submission fail with `reason` without touching
    /// ledger state.
    pub fn fail_submissions(&self, reason: impl Into<String>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(reason.into());
        }
    }

    pub fn clear_failure(&self) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = None;
        }
    }

    /// Number of `submit` calls so far, failed ones included.
    pub fn submit_count(&self) -> u64 {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn fetch_one_count(&self) -> u64 {
        self.fetch_ones.load(Ordering::SeqCst)
    }

    pub fn fetch_all_count(&self) -> u64 {
        self.fetch_alls.load(Ordering::SeqCst)
    }

    pub fn entry_count(&self) -> LedgerResult<usize> {
        Ok(self.read_state()?.len())
    }

    fn read_state(&self) -> LedgerResult<std::sync::RwLockReadGuard<'_, JournalProgram>> {
        self.state
            .read()
            .map_err(|_| LedgerError::SubmissionFailed("simulated ledger lock poisoned".into()))
    }

    fn injected_failure(&self) -> Option<String> {
        self.failure.lock().ok().and_then(|failure| failure.clone())
    }
}

#[async_trait]
impl LedgerClient for SimulatedLedgerClient {
    fn program(&self) -> Identity {
        match self.state.read() {
            Ok(state) => state.id(),
            Err(poisoned) => poisoned.into_inner().id(),
        }
    }

    fn backend(&self) -> &'static str {
        "simulated"
    }

    async fn submit(
        &self,
        owner: &Identity,
        address: &Address,
        instruction: &Instruction,
    ) -> LedgerResult<ConfirmationToken> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.config.submit_latency).await;

        if let Some(reason) = self.injected_failure() {
            debug!(address = %address.short_hex(), %reason, "injected submission failure");
            return Err(LedgerError::SubmissionFailed(reason));
        }

        {
            let mut state = self.state.write().map_err(|_| {
                LedgerError::SubmissionFailed("simulated ledger lock poisoned".into())
            })?;
            state.execute(owner, address, instruction)?;
        }

        let token = ConfirmationToken::new(format!("sim-{}", uuid::Uuid::now_v7().simple()));
        info!(
            op = %instruction.kind(),
            address = %address.short_hex(),
            token = %token.short(),
            "simulated transaction confirmed"
        );
        Ok(token)
    }

    async fn fetch_one(&self, address: &Address) -> LedgerResult<Option<Entry>> {
        self.fetch_ones.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.config.fetch_latency).await;
        Ok(self.read_state()?.get(address).cloned())
    }

    async fn fetch_all(&self, program: &Identity) -> LedgerResult<Vec<(Address, Entry)>> {
        self.fetch_alls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.config.fetch_latency).await;
        let state = self.read_state()?;
        if state.id() != *program {
            return Err(LedgerError::ProgramNotDeployed(*program));
        }
        Ok(state.accounts())
    }

    async fn program_deployed(&self, program: &Identity) -> LedgerResult<bool> {
        Ok(self.read_state()?.id() == *program)
    }
}
