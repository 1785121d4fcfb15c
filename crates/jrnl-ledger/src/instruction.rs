use std::fmt;

use serde::{Deserialize, Serialize};

/// The three mutations the journal program accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named operation with its typed arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    Create { title: String, message: String },
    Update { title: String, message: String },
    Delete { title: String },
}

impl Instruction {
    pub fn create(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Create {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn update(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Update {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn delete(title: impl Into<String>) -> Self {
        Self::Delete {
            title: title.into(),
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Update { .. } => OperationKind::Update,
            Self::Delete { .. } => OperationKind::Delete,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Create { title, .. } | Self::Update { title, .. } | Self::Delete { title } => {
                title
            }
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Create { message, .. } | Self::Update { message, .. } => Some(message),
            Self::Delete { .. } => None,
        }
    }
}
