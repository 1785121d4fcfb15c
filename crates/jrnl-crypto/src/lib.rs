//! Cryptographic primitives for the journal ledger.
//!
//! Provides domain-separated BLAKE3 derivation of entry addresses and
//! Ed25519 signing/verification of submissions.
//!
//! All crypto operations wrap established libraries.

pub mod derive;
pub mod signer;

pub use derive::{AddressDeriver, DeriveError};
pub use signer::{Signature, SignatureError, SigningKey, VerifyingKey};
