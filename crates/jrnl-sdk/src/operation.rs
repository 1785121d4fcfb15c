use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use jrnl_ledger::OperationKind;
use jrnl_types::{Address, ConfirmationToken, Identity};

/// Lifecycle of one submitted mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Succeeded(ConfirmationToken),
    Failed(String),
}

impl OperationStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Latest mutation of one kind against one address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationRecord {
    pub kind: OperationKind,
    pub address: Address,
    pub owner: Identity,
    pub status: OperationStatus,
    pub submitted_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Completed records kept before the oldest ones are dropped.
const DEFAULT_CAPACITY: usize = 1024;

/// Keeps the most recent [`OperationRecord`] per `(kind, address)`.
#[derive(Debug)]
pub(crate) struct OperationLog {
    records: Mutex<HashMap<(OperationKind, Address), OperationRecord>>,
    capacity: usize,
}

impl Default for OperationLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl OperationLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn begin(&self, kind: OperationKind, address: Address, owner: Identity) {
        let record = OperationRecord {
            kind,
            address,
            owner,
            status: OperationStatus::Pending,
            submitted_at: Utc::now(),
            completed_at: None,
        };
        let mut records = self.lock();
        records.insert((kind, address), record);
        while records.len() > self.capacity {
            // pending records are never dropped
            let oldest = records
                .iter()
                .filter_map(|(key, record)| record.completed_at.map(|at| (at, *key)))
                .min();
            match oldest {
                Some((_, key)) => {
                    records.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Drop the create and update records of an entry that no longer exists.
    pub fn forget_entry(&self, address: &Address) {
        let mut records = self.lock();
        records.remove(&(OperationKind::Create, *address));
        records.remove(&(OperationKind::Update, *address));
    }

    pub fn complete(&self, kind: OperationKind, address: Address, status: OperationStatus) {
        if let Some(record) = self.lock().get_mut(&(kind, address)) {
            record.status = status;
            record.completed_at = Some(Utc::now());
        }
    }

    pub fn get(&self, kind: OperationKind, address: &Address) -> Option<OperationRecord> {
        self.lock().get(&(kind, *address)).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(OperationKind, Address), OperationRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
