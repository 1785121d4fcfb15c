use async_trait::async_trait;
use jrnl_types::{Address, ConfirmationToken, Entry, Identity};

use crate::error::LedgerResult;
use crate::instruction::Instruction;

/// Capability interface to the ledger program that stores journal entries.
///
/// All implementations must satisfy the same contract:
/// - `submit` either returns a confirmation token for an applied instruction
///   or an error; a failed submission leaves ledger state unchanged.
/// - `fetch_one` returns `Ok(None)` when no account exists at the address.
/// - `fetch_all` re-runs its query on every call and returns a finite,
///   unordered snapshot. Reads against a program the ledger does not run
///   fail [`LedgerError::ProgramNotDeployed`](crate::LedgerError::ProgramNotDeployed)
///   rather than returning an empty snapshot.
/// - Unreachable endpoints surface as
///   [`LedgerError::TransportUnavailable`](crate::LedgerError::TransportUnavailable),
///   never as a panic.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Program this client submits to.
    fn program(&self) -> Identity;

    /// Short backend name for logs ("simulated", "remote").
    fn backend(&self) -> &'static str;

    /// Submit an instruction signed by `owner` against `address`.
    async fn submit(
        &self,
        owner: &Identity,
        address: &Address,
        instruction: &Instruction,
    ) -> LedgerResult<ConfirmationToken>;

    async fn fetch_one(&self, address: &Address) -> LedgerResult<Option<Entry>>;

    async fn fetch_all(&self, program: &Identity) -> LedgerResult<Vec<(Address, Entry)>>;

    /// Whether `program` is deployed on the ledger this client talks to.
    async fn program_deployed(&self, program: &Identity) -> LedgerResult<bool>;
}
