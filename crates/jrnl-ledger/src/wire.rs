//! JSON wire format spoken between [`RemoteLedgerClient`](crate::RemoteLedgerClient)
//! and a ledger node.

use jrnl_crypto::Signature;
use jrnl_types::{Address, Commitment, ConfirmationToken, Entry, Identity};
use serde::{Deserialize, Serialize};

use crate::instruction::Instruction;

pub const PROTOCOL_VERSION: u32 = 1;

/// Domain tag prepended to the signed submission bytes.
const SUBMIT_DOMAIN: &[u8] = b"jrnl-submit-v1:";

/// HTTP endpoint paths.
pub mod endpoints {
    use jrnl_types::{Address, Identity};

    pub const HEALTH: &str = "/v1/health";
    pub const PROGRAM_ROUTE: &str = "/v1/programs/:program";
    pub const SUBMIT_ROUTE: &str = "/v1/programs/:program/submit";
    pub const ENTRIES_ROUTE: &str = "/v1/programs/:program/entries";
    pub const ENTRY_ROUTE: &str = "/v1/programs/:program/entries/:address";

    pub fn program(program: &Identity) -> String {
        format!("/v1/programs/{program}")
    }

    pub fn submit(program: &Identity) -> String {
        format!("/v1/programs/{program}/submit")
    }

    pub fn entries(program: &Identity) -> String {
        format!("/v1/programs/{program}/entries")
    }

    pub fn entry(program: &Identity, address: &Address) -> String {
        format!("/v1/programs/{program}/entries/{address}")
    }
}

/// The part of a submission covered by the owner's signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitPayload {
    pub program: Identity,
    pub owner: Identity,
    pub address: Address,
    pub instruction: Instruction,
    /// Makes every signed payload, and so every token, unique.
    pub nonce: String,
}

impl SubmitPayload {
    /// Canonical bytes the owner signs and the node verifies.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut bytes = SUBMIT_DOMAIN.to_vec();
        bytes.extend(serde_json::to_vec(self)?);
        Ok(bytes)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub payload: SubmitPayload,
    pub signature: Signature,
    #[serde(default)]
    pub commitment: Commitment,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub token: ConfirmationToken,
}

/// One account in a listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub address: Address,
    pub entry: Entry,
}

/// A program deployed on the node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramInfo {
    pub program: Identity,
    pub accounts: usize,
}

/// Body of every non-success response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// [`ProgramError`](crate::ProgramError) code when the program rejected
    /// the instruction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
    /// Set when the request named a program the node does not run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_program: Option<Identity>,
    pub message: String,
}

/// Query string accepted by the read endpoints.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct CommitmentQuery {
    #[serde(default)]
    pub commitment: Commitment,
}

/// Health check response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub protocol_version: u32,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            protocol_version: PROTOCOL_VERSION,
        }
    }
}
