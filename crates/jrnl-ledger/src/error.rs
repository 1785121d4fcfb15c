use jrnl_types::Identity;

use crate::program::ProgramError;

/// Errors produced by ledger clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger endpoint unreachable: {0}")]
    TransportUnavailable(String),

    #[error("operation rejected by program: {0}")]
    Rejected(ProgramError),

    #[error("submission failed: {0}")]
    SubmissionFailed(String),

    #[error("remote error {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("program not deployed: {0}")]
    ProgramNotDeployed(Identity),

    #[error("no signer configured for submissions")]
    MissingSigner,

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<ProgramError> for LedgerError {
    fn from(err: ProgramError) -> Self {
        Self::Rejected(err)
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
