use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::identity::Identity;

/// Maximum title length in bytes.
pub const MAX_TITLE_LEN: usize = 280;

/// Maximum message length in bytes.
pub const MAX_MESSAGE_LEN: usize = 280;

/// A journal entry as stored by the ledger program.
///
/// `owner` and `title` are fixed at creation: together with the program they
/// determine the entry's address. Only `message` changes on update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub owner: Identity,
    pub title: String,
    pub message: String,
}

impl Entry {
    pub fn new(owner: Identity, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            owner,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Check both field limits.
    pub fn validate(&self) -> Result<(), TypeError> {
        validate_title(&self.title)?;
        validate_message(&self.message)
    }
}

/// A title must be 1..=280 bytes of UTF-8.
pub fn validate_title(title: &str) -> Result<(), TypeError> {
    if title.is_empty() {
        return Err(TypeError::EmptyTitle);
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(TypeError::TitleTooLong {
            len: title.len(),
            max: MAX_TITLE_LEN,
        });
    }
    Ok(())
}

/// A message may be empty but not longer than 280 bytes.
pub fn validate_message(message: &str) -> Result<(), TypeError> {
    if message.len() > MAX_MESSAGE_LEN {
        return Err(TypeError::MessageTooLong {
            len: message.len(),
            max: MAX_MESSAGE_LEN,
        });
    }
    Ok(())
}
