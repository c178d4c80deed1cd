//! Follow-up note store port

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::{CustomerIdentity, FollowUpNote, NoteRef};

/// Persistent follow-up notes, scoped per branch and keyed by identity
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// All notes stored for a branch
    async fn get_notes(&self, branch: &str) -> Result<Vec<FollowUpNote>>;

    /// Insert a note when `existing` is `None`, otherwise update that record
    ///
    /// Returns the reference to pass as `existing` on the next edit.
    async fn upsert_note(
        &self,
        branch: &str,
        identity: &CustomerIdentity,
        text: &str,
        existing: Option<&NoteRef>,
    ) -> Result<NoteRef>;
}
