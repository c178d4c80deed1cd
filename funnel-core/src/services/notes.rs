//! Note service - read and write follow-up notes for a branch

use std::sync::Arc;

use crate::domain::result::{Error, Result};
use crate::domain::{CustomerIdentity, FollowUpNote, NoteRef, PendingFollowUp};
use crate::ports::NoteStore;
use crate::services::logging::{events, LogEvent, LoggingService};

pub struct NoteService {
    store: Arc<dyn NoteStore>,
    logger: Option<Arc<LoggingService>>,
}

impl NoteService {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self { store, logger: None }
    }

    pub fn with_logger(mut self, logger: Arc<LoggingService>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Store a note for a customer
    ///
    /// Pass the row's existing reference when there is one so the record
    /// is updated in place.
    pub async fn save_note(
        &self,
        branch: &str,
        identity: &CustomerIdentity,
        text: &str,
        existing: Option<&NoteRef>,
    ) -> Result<NoteRef> {
        if branch.trim().is_empty() {
            return Err(Error::validation("Branch is required"));
        }
        let note_ref = self
            .store
            .upsert_note(branch, identity, text.trim(), existing)
            .await?;

        if let Some(logger) = &self.logger {
            let _ = logger.log(LogEvent::new(events::NOTE_SAVED).with_branch(branch));
        }
        Ok(note_ref)
    }

    /// Store a note against a pending report row, reusing its reference
    pub async fn save_for_row(
        &self,
        branch: &str,
        row: &PendingFollowUp,
        text: &str,
    ) -> Result<NoteRef> {
        self.save_note(branch, &row.identity, text, row.note_ref.as_ref())
            .await
    }

    pub async fn list_notes(&self, branch: &str) -> Result<Vec<FollowUpNote>> {
        self.store.get_notes(branch).await
    }
}
