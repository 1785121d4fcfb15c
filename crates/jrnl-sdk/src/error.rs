use jrnl_crypto::DeriveError;
use jrnl_ledger::{LedgerError, ProgramError};
use jrnl_types::{Address, Identity, TypeError};
use thiserror::Error;

/// Everything an [`EntryRepository`](crate::EntryRepository) operation can
/// fail with.
///
/// `Clone` so that one in-flight fetch result can be handed to every caller
/// waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoError {
    /// Title or message limits violated. Detected locally; the ledger is
    /// never contacted.
    #[error("validation failed: {0}")]
    Validation(#[from] TypeError),

    #[error("no wallet connected")]
    WalletNotConnected,

    #[error("entry not found: {0}")]
    EntryNotFound(Address),

    #[error("entry already exists: {0}")]
    DuplicateEntry(Address),

    #[error("submission failed: {0}")]
    SubmissionFailed(String),

    /// The ledger endpoint cannot be reached at all. Callers should fall back
    /// to the simulated ledger or a read-only mode rather than retry.
    #[error("ledger transport unavailable: {0}")]
    TransportUnavailable(String),

    #[error("fetch failed: {0}")]
    FetchFailed(String),

    /// The selected cluster does not run the journal program.
    #[error("program not deployed on this cluster: {0}")]
    ProgramNotDeployed(Identity),
}

impl RepoError {
    /// Map a failed submission against `address` onto the taxonomy.
    pub(crate) fn from_submit(err: LedgerError, address: Address) -> Self {
        match err {
            LedgerError::TransportUnavailable(cause) => Self::TransportUnavailable(cause),
            LedgerError::ProgramNotDeployed(program) => Self::ProgramNotDeployed(program),
            LedgerError::Rejected(ProgramError::AccountInUse) => Self::DuplicateEntry(address),
            LedgerError::Rejected(ProgramError::AccountNotFound) => Self::EntryNotFound(address),
            LedgerError::SubmissionFailed(cause) => Self::SubmissionFailed(cause),
            other => Self::SubmissionFailed(other.to_string()),
        }
    }

    pub(crate) fn from_fetch(err: LedgerError) -> Self {
        match err {
            LedgerError::TransportUnavailable(cause) => Self::TransportUnavailable(cause),
            LedgerError::ProgramNotDeployed(program) => Self::ProgramNotDeployed(program),
            other => Self::FetchFailed(other.to_string()),
        }
    }

    /// Whether the caller should switch backends instead of retrying.
    pub fn recommends_fallback(&self) -> bool {
        matches!(self, Self::TransportUnavailable(_))
    }
}

impl From<DeriveError> for RepoError {
    fn from(err: DeriveError) -> Self {
        match err {
            DeriveError::InvalidTitle(e) => Self::Validation(e),
            other => Self::SubmissionFailed(format!("address derivation failed: {other}")),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;
