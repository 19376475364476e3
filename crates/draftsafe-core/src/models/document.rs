//! Document identity model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

const BACKUP_KEY_PREFIX: &str = "draft_backup:";

/// Stable identifier of a document in the remote store
///
/// A session without one is editing an unsaved-new document, for which
/// timer-driven saves stay disabled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Create an identifier, trimming surrounding whitespace
    pub fn new(value: impl AsRef<str>) -> Result<Self, Error> {
        let value = value.as_ref().trim();
        if value.is_empty() {
            return Err(Error::InvalidInput(
                "Document ID cannot be empty".to_string(),
            ));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which this document's local backup is stored
    pub fn backup_key(&self) -> String {
        format!("{BACKUP_KEY_PREFIX}{}", self.0)
    }

    /// Recover the document identity from a backup key
    pub fn from_backup_key(key: &str) -> Option<Self> {
        key.strip_prefix(BACKUP_KEY_PREFIX)
            .and_then(|id| Self::new(id).ok())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DocumentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DocumentId> for String {
    fn from(value: DocumentId) -> Self {
        value.0
    }
}
