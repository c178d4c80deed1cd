//! Follow-up notes kept outside the spreadsheet

use serde::{Deserialize, Serialize};

use super::identity::CustomerIdentity;

/// Opaque reference to a stored note record
///
/// Present when a note already exists, so the next edit updates that
/// record instead of inserting a new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteRef(String);

impl NoteRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A free-text follow-up note for one customer of one branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpNote {
    pub identity: CustomerIdentity,
    pub text: String,
    pub record_ref: NoteRef,
}
