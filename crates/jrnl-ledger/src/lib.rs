//! Ledger access for journal entries.
//!
//! This crate provides:
//! - The [`LedgerClient`] capability trait (submit, fetch one, fetch all,
//!   program check)
//! - [`JournalProgram`]: the rules the journal program enforces on accounts
//! - [`SimulatedLedgerClient`]: in-memory stand-in with artificial latency
//! - [`RemoteLedgerClient`]: JSON-over-HTTP client for a live ledger node
//! - Wire types shared with the ledger node

pub mod error;
pub mod instruction;
pub mod program;
pub mod remote;
pub mod simulated;
pub mod traits;
pub mod wire;

pub use error::{LedgerError, LedgerResult};
pub use instruction::{Instruction, OperationKind};
pub use program::{JournalProgram, ProgramError, DEFAULT_PROGRAM_ID};
pub use remote::{RemoteConfig, RemoteLedgerClient};
pub use simulated::{SimulatedConfig, SimulatedLedgerClient};
pub use traits::LedgerClient;
pub use wire::{endpoints, HealthResponse, ProgramInfo, PROTOCOL_VERSION};
