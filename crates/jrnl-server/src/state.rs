use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use jrnl_crypto::VerifyingKey;
use jrnl_ledger::wire::{ProgramInfo, SubmitRequest};
use jrnl_ledger::{JournalProgram, ProgramError};
use jrnl_types::{Address, ConfirmationToken, Entry, Identity};
use tracing::info;

use crate::error::{ServerError, ServerResult};

/// Account state of every program deployed on the node.
#[derive(Clone, Default)]
pub struct NodeState {
    programs: Arc<RwLock<HashMap<Identity, JournalProgram>>>,
}

impl NodeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy `program`, replacing any program with the same identity.
    pub fn deploy(&self, program: JournalProgram) -> ServerResult<()> {
        let id = program.id();
        self.write()?.insert(id, program);
        info!(program = %id.short_id(), "program deployed");
        Ok(())
    }

    pub fn programs(&self) -> ServerResult<Vec<Identity>> {
        let mut ids: Vec<_> = self.read()?.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    /// Verify the owner's signature over the payload, then execute it.
    ///
    /// The confirmation token is the hex signature, unique per payload
    /// because every payload carries a fresh nonce.
    pub fn submit(&self, program: &Identity, request: &SubmitRequest) -> ServerResult<ConfirmationToken> {
        let payload = &request.payload;
        if payload.program != *program {
            return Err(ServerError::ProgramMismatch {
                path: *program,
                payload: payload.program,
            });
        }

        let bytes = payload
            .signing_bytes()
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        VerifyingKey::from_identity(&payload.owner)
            .and_then(|key| key.verify(&bytes, &request.signature))
            .map_err(|_| ProgramError::InvalidSignature)?;

        let mut programs = self.write()?;
        let state = programs
            .get_mut(program)
            .ok_or(ServerError::ProgramNotFound(*program))?;
        state.execute(&payload.owner, &payload.address, &payload.instruction)?;

        let token = ConfirmationToken::new(request.signature.to_hex());
        info!(
            program = %program.short_id(),
            op = %payload.instruction.kind(),
            address = %payload.address.short_hex(),
            commitment = %request.commitment,
            "transaction confirmed"
        );
        Ok(token)
    }

    pub fn program(&self, program: &Identity) -> ServerResult<ProgramInfo> {
        let programs = self.read()?;
        let state = programs
            .get(program)
            .ok_or(ServerError::ProgramNotFound(*program))?;
        Ok(ProgramInfo {
            program: *program,
            accounts: state.len(),
        })
    }

    pub fn entry(&self, program: &Identity, address: &Address) -> ServerResult<Option<Entry>> {
        let programs = self.read()?;
        let state = programs
            .get(program)
            .ok_or(ServerError::ProgramNotFound(*program))?;
        Ok(state.get(address).cloned())
    }

    /// Every account of `program`.
    pub fn entries(&self, program: &Identity) -> ServerResult<Vec<(Address, Entry)>> {
        let programs = self.read()?;
        let state = programs
            .get(program)
            .ok_or(ServerError::ProgramNotFound(*program))?;
        Ok(state.accounts())
    }

    fn read(&self) -> ServerResult<std::sync::RwLockReadGuard<'_, HashMap<Identity, JournalProgram>>> {
        self.programs
            .read()
            .map_err(|e| ServerError::Internal(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> ServerResult<std::sync::RwLockWriteGuard<'_, HashMap<Identity, JournalProgram>>> {
        self.programs
            .write()
            .map_err(|e| ServerError::Internal(format!("lock poisoned: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jrnl_crypto::{AddressDeriver, SigningKey};
    use jrnl_ledger::wire::SubmitPayload;
    use jrnl_ledger::Instruction;
    use jrnl_types::Commitment;

    const PROGRAM: Identity = Identity::from_bytes([0x77; 32]);

    fn node() -> NodeState {
        let node = NodeState::new();
        node.deploy(JournalProgram::new(PROGRAM)).unwrap();
        node
    }

    fn signed(key: &SigningKey, owner: Identity, instruction: Instruction) -> SubmitRequest {
        let address = AddressDeriver::ENTRY
            .derive(instruction.title(), &owner, &PROGRAM)
            .unwrap()
            .0;
        let payload = SubmitPayload {
            program: PROGRAM,
            owner,
            address,
            instruction,
            nonce: "n".into(),
        };
        SubmitRequest {
            signature: key.sign(&payload.signing_bytes().unwrap()),
            payload,
            commitment: Commitment::default(),
        }
    }

    #[test]
    fn signed_create_is_executed() {
        let node = node();
        let key = SigningKey::generate();
        let request = signed(&key, key.identity(), Instruction::create("Day 1", "Hello"));
        let token = node.submit(&PROGRAM, &request).unwrap();
        assert_eq!(token.as_str(), request.signature.to_hex());
        assert_eq!(
            node.entry(&PROGRAM, &request.payload.address).unwrap(),
            Some(Entry::new(key.identity(), "Day 1", "Hello"))
        );
    }

    #[test]
    fn signature_from_another_key_is_rejected() {
        let node = node();
        let owner = SigningKey::generate();
        let forger = SigningKey::generate();
        let request = signed(&forger, owner.identity(), Instruction::create("Day 1", "Hello"));
        assert!(matches!(
            node.submit(&PROGRAM, &request),
            Err(ServerError::Program(ProgramError::InvalidSignature))
        ));
        assert!(node.entries(&PROGRAM).unwrap().is_empty());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let node = node();
        let key = SigningKey::generate();
        let mut request = signed(&key, key.identity(), Instruction::create("Day 1", "Hello"));
        request.payload.nonce = "other".into();
        assert!(matches!(
            node.submit(&PROGRAM, &request),
            Err(ServerError::Program(ProgramError::InvalidSignature))
        ));
    }

    #[test]
    fn path_and_payload_must_agree() {
        let node = node();
        let key = SigningKey::generate();
        let request = signed(&key, key.identity(), Instruction::create("Day 1", "Hello"));
        assert!(matches!(
            node.submit(&Identity::SYSTEM, &request),
            Err(ServerError::ProgramMismatch { .. })
        ));
    }

    #[test]
    fn unknown_program() {
        let node = NodeState::new();
        let key = SigningKey::generate();
        let request = signed(&key, key.identity(), Instruction::create("Day 1", "Hello"));
        assert!(matches!(
            node.submit(&PROGRAM, &request),
            Err(ServerError::ProgramNotFound(_))
        ));
        assert!(matches!(
            node.entries(&PROGRAM),
            Err(ServerError::ProgramNotFound(id)) if id == PROGRAM
        ));
        assert!(matches!(
            node.entry(&PROGRAM, &request.payload.address),
            Err(ServerError::ProgramNotFound(_))
        ));
        assert!(matches!(node.program(&PROGRAM), Err(ServerError::ProgramNotFound(_))));
    }

    #[test]
    fn program_info_counts_accounts() {
        let node = node();
        let key = SigningKey::generate();
        node.submit(&PROGRAM, &signed(&key, key.identity(), Instruction::create("Day 1", "Hello")))
            .unwrap();
        assert_eq!(
            node.program(&PROGRAM).unwrap(),
            ProgramInfo {
                program: PROGRAM,
                accounts: 1
            }
        );
    }

    #[test]
    fn deploy_lists_programs() {
        let node = node();
        node.deploy(JournalProgram::with_samples(Identity::SYSTEM)).unwrap();
        assert_eq!(node.programs().unwrap(), vec![Identity::SYSTEM, PROGRAM]);
        assert_eq!(node.entries(&Identity::SYSTEM).unwrap().len(), 2);
    }
}
