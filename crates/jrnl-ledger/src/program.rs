use std::collections::BTreeMap;

use jrnl_crypto::AddressDeriver;
use jrnl_types::{validate_message, validate_title, Address, Entry, Identity, TypeError};
use tracing::debug;

use crate::instruction::Instruction;

/// Identity of the deployed journal program.
pub const DEFAULT_PROGRAM_ID: Identity = Identity::from_bytes([
    0x4f, 0xbd, 0x5c, 0x03, 0xe5, 0x8a, 0xd8, 0x52, 0x68, 0xa0, 0x52, 0x09, 0x34, 0xc5, 0x5f, 0x8a,
    0x0b, 0x50, 0x57, 0x36, 0x4a, 0xf3, 0x2c, 0xf6, 0x8b, 0x79, 0x5a, 0x0f, 0x49, 0x00, 0x80, 0xd5,
]);

/// Title and message of the entries every fresh simulated ledger starts with.
pub const SAMPLE_ENTRIES: [(&str, &str); 2] = [
    ("Mock Entry 1", "This is a mock journal entry from enhanced mock"),
    ("Mock Entry 2", "This is another enhanced mock entry"),
];

/// Reasons the journal program rejects an instruction.
///
/// Each variant has a stable numeric code so a rejection survives the trip
/// over the wire and decodes to the same variant on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProgramError {
    #[error("account already in use")]
    AccountInUse,

    #[error("account not found")]
    AccountNotFound,

    #[error("owner signature missing or invalid")]
    InvalidSignature,

    #[error("account address does not match its seeds")]
    SeedsMismatch,

    #[error("signer does not own this entry")]
    Unauthorized,

    #[error("title must not be empty")]
    EmptyTitle,

    #[error("title exceeds 280 bytes")]
    TitleTooLong,

    #[error("message exceeds 280 bytes")]
    MessageTooLong,
}

impl ProgramError {
    pub fn code(&self) -> u32 {
        match self {
            Self::AccountInUse => 1,
            Self::AccountNotFound => 2,
            Self::InvalidSignature => 3,
            Self::SeedsMismatch => 4,
            Self::Unauthorized => 5,
            Self::EmptyTitle => 6,
            Self::TitleTooLong => 7,
            Self::MessageTooLong => 8,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::AccountInUse),
            2 => Some(Self::AccountNotFound),
            3 => Some(Self::InvalidSignature),
            4 => Some(Self::SeedsMismatch),
            5 => Some(Self::Unauthorized),
            6 => Some(Self::EmptyTitle),
            7 => Some(Self::TitleTooLong),
            8 => Some(Self::MessageTooLong),
            _ => None,
        }
    }
}

impl From<TypeError> for ProgramError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::EmptyTitle => Self::EmptyTitle,
            TypeError::MessageTooLong { .. } => Self::MessageTooLong,
            _ => Self::TitleTooLong,
        }
    }
}

/// Account state and instruction rules of one deployed journal program.
///
/// Both the simulated client and the ledger node execute instructions
/// through this type, so they accept and reject exactly the same inputs.
#[derive(Clone, Debug)]
pub struct JournalProgram {
    id: Identity,
    accounts: BTreeMap<Address, Entry>,
}

impl JournalProgram {
    /// An empty program.
    pub fn new(id: Identity) -> Self {
        Self {
            id,
            accounts: BTreeMap::new(),
        }
    }

    /// A program holding the fixed sample entries, owned by
    /// [`Identity::SYSTEM`].
    pub fn with_samples(id: Identity) -> Self {
        let mut program = Self::new(id);
        for (title, message) in SAMPLE_ENTRIES {
            if let Ok((address, _)) = AddressDeriver::ENTRY.derive(title, &Identity::SYSTEM, &id) {
                program
                    .accounts
                    .insert(address, Entry::new(Identity::SYSTEM, title, message));
            }
        }
        program
    }

    pub fn id(&self) -> Identity {
        self.id
    }

    /// Apply one instruction signed by `owner` to the account at `address`.
    ///
    /// The account state is unchanged when an error is returned.
    pub fn execute(
        &mut self,
        owner: &Identity,
        address: &Address,
        instruction: &Instruction,
    ) -> Result<(), ProgramError> {
        validate_title(instruction.title())?;
        if let Some(message) = instruction.message() {
            validate_message(message)?;
        }
        AddressDeriver::ENTRY
            .verify(address, instruction.title(), owner, &self.id)
            .map_err(|_| ProgramError::SeedsMismatch)?;

        match instruction {
            Instruction::Create { title, message } => {
                if self.accounts.contains_key(address) {
                    return Err(ProgramError::AccountInUse);
                }
                self.accounts
                    .insert(*address, Entry::new(*owner, title.clone(), message.clone()));
            }
            Instruction::Update { message, .. } => {
                let entry = self
                    .accounts
                    .get_mut(address)
                    .ok_or(ProgramError::AccountNotFound)?;
                if entry.owner != *owner {
                    return Err(ProgramError::Unauthorized);
                }
                entry.message = message.clone();
            }
            Instruction::Delete { .. } => {
                let entry = self
                    .accounts
                    .get(address)
                    .ok_or(ProgramError::AccountNotFound)?;
                if entry.owner != *owner {
                    return Err(ProgramError::Unauthorized);
                }
                self.accounts.remove(address);
            }
        }

        debug!(
            program = %self.id.short_id(),
            address = %address.short_hex(),
            op = %instruction.kind(),
            "instruction executed"
        );
        Ok(())
    }

    pub fn get(&self, address: &Address) -> Option<&Entry> {
        self.accounts.get(address)
    }

    /// Snapshot of every account, in address order.
    pub fn accounts(&self) -> Vec<(Address, Entry)> {
        self.accounts
            .iter()
            .map(|(address, entry)| (*address, entry.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
