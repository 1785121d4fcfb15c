use jrnl_types::{validate_title, Address, Identity, TypeError};

/// Deterministic, program-scoped account address derivation.
///
/// An address is the domain-separated BLAKE3 hash of the length-prefixed
/// seeds, a one-byte salt and the program identity. Salts are tried from 255
/// downwards and the first candidate that is *not* a valid ed25519 point is
/// kept, so no private key can ever exist for a derived account.
///
/// Derivation is pure: no I/O, no state, safe to call from anywhere.
pub struct AddressDeriver {
    domain: &'static str,
}

impl AddressDeriver {
    /// Deriver for journal entry accounts, seeded by (title, owner).
    pub const ENTRY: Self = Self {
        domain: "jrnl-entry-address-v1",
    };

    /// Create a deriver with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Derive the entry address and its salt for `(title, owner)` under
    /// `program`.
    ///
    /// The title is checked against the entry limits before any hashing.
    pub fn derive(
        &self,
        title: &str,
        owner: &Identity,
        program: &Identity,
    ) -> Result<(Address, u8), DeriveError> {
        validate_title(title)?;
        self.find_address(&[title.as_bytes(), owner.as_bytes()], program)
    }

    /// Search salts 255..=0 for the first off-curve address.
    pub fn find_address(
        &self,
        seeds: &[&[u8]],
        program: &Identity,
    ) -> Result<(Address, u8), DeriveError> {
        for salt in (0..=u8::MAX).rev() {
            let candidate = self.create_address(seeds, salt, program);
            if !is_on_curve(candidate.as_bytes()) {
                return Ok((candidate, salt));
            }
        }
        Err(DeriveError::NoViableSalt)
    }

    /// Single derivation step for a fixed salt. Does not check the curve.
    pub fn create_address(&self, seeds: &[&[u8]], salt: u8, program: &Identity) -> Address {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        for seed in seeds {
            hasher.update(&(seed.len() as u64).to_le_bytes());
            hasher.update(seed);
        }
        hasher.update(&[salt]);
        hasher.update(program.as_bytes());
        Address::from_bytes(*hasher.finalize().as_bytes())
    }

    /// Check that `address` is the canonical address of `(title, owner)`.
    /// Returns the salt on success.
    pub fn verify(
        &self,
        address: &Address,
        title: &str,
        owner: &Identity,
        program: &Identity,
    ) -> Result<u8, DeriveError> {
        let (expected, salt) = self.derive(title, owner, program)?;
        if expected != *address {
            return Err(DeriveError::AddressMismatch);
        }
        Ok(salt)
    }

    /// The domain tag used by this deriver.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

fn is_on_curve(bytes: &[u8; 32]) -> bool {
    ed25519_dalek::VerifyingKey::from_bytes(bytes).is_ok()
}

/// Errors from address derivation.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DeriveError {
    #[error("invalid title: {0}")]
    InvalidTitle(#[from] TypeError),

    #[error("no salt produced an off-curve address")]
    NoViableSalt,

    #[error("address does not match its seeds")]
    AddressMismatch,
}
