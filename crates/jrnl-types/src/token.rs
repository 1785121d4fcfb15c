use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque receipt returned when the ledger accepts a submission.
///
/// For a live ledger this is the hex transaction signature; the simulated
/// ledger issues `sim-` prefixed identifiers. Callers only display or log it.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationToken(String);

impl ConfirmationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 16 characters, for log lines and toasts.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(16) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Debug for ConfirmationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfirmationToken({})", self.short())
    }
}

impl fmt::Display for ConfirmationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
