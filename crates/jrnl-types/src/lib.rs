//! Foundation types for the journal ledger.
//!
//! Every other `jrnl-*` crate depends on these types.
//!
//! # Key Types
//!
//! - [`Identity`]: Opaque 32-byte public identifier of a wallet or program
//! - [`Address`]: Deterministic account address of one entry
//! - [`Entry`]: The record a user manages (owner, title, message)
//! - [`ConfirmationToken`]: Receipt of an accepted submission
//! - [`Cluster`] / [`Commitment`]: Network selection and confirmation level

pub mod address;
pub mod cluster;
pub mod entry;
pub mod error;
mod hex_serde;
pub mod identity;
pub mod token;

pub use address::Address;
pub use cluster::{Cluster, Commitment};
pub use entry::{validate_message, validate_title, Entry, MAX_MESSAGE_LEN, MAX_TITLE_LEN};
pub use error::TypeError;
pub use identity::Identity;
pub use token::ConfirmationToken;
