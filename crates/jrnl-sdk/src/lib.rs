//! Journal entry data access.
//!
//! [`EntryRepository`] is the single entry point a presentation layer needs:
//! it validates input, derives entry addresses, submits mutations through a
//! [`LedgerClient`](jrnl_ledger::LedgerClient), and serves reads from a typed
//! cache with single-flight fetches.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use jrnl_ledger::{SimulatedConfig, SimulatedLedgerClient};
//! use jrnl_sdk::{EntryRepository, DEFAULT_PROGRAM_ID};
//! use jrnl_types::Identity;
//!
//! # async fn demo() -> Result<(), jrnl_sdk::RepoError> {
//! let ledger = Arc::new(SimulatedLedgerClient::new(DEFAULT_PROGRAM_ID, SimulatedConfig::instant()));
//! let repo = EntryRepository::new(ledger, DEFAULT_PROGRAM_ID);
//! let owner = Identity::ephemeral();
//!
//! repo.create("Day 1", "Hello", Some(&owner)).await?;
//! let address = repo.address_of("Day 1", &owner)?;
//! assert_eq!(repo.get(&address).await?.message, "Hello");
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod connect;
pub mod error;
pub mod operation;
pub mod repository;

pub use cache::{CacheEntry, CacheEvent, CacheKey, CacheStatus, Listing};
pub use config::{Backend, ConfigError, JournalConfig};
pub use connect::connect;
pub use error::{RepoError, RepoResult};
pub use jrnl_ledger::DEFAULT_PROGRAM_ID;
pub use operation::{OperationRecord, OperationStatus};
pub use repository::EntryRepository;
