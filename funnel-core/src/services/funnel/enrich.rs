//! Note enricher - attaches stored follow-up notes to pending rows

use std::collections::HashMap;

use crate::domain::{CustomerIdentity, FollowUpNote, PendingFollowUp};

/// Notes of one branch keyed by customer
pub type NoteBook = HashMap<CustomerIdentity, FollowUpNote>;

/// Index notes by identity; a later note for the same customer wins
pub fn index_notes(notes: impl IntoIterator<Item = FollowUpNote>) -> NoteBook {
    notes
        .into_iter()
        .map(|note| (note.identity.clone(), note))
        .collect()
}

/// Left-join notes onto pending rows
///
/// Rows without a stored note get an empty note and no record reference.
pub fn enrich(pending: Vec<PendingFollowUp>, notes: &NoteBook) -> Vec<PendingFollowUp> {
    pending
        .into_iter()
        .map(|mut row| {
            match notes.get(&row.identity) {
                Some(note) => {
                    row.note = note.text.clone();
                    row.note_ref = Some(note.record_ref.clone());
                }
                None => {
                    row.note = String::new();
                    row.note_ref = None;
                }
            }
            row
        })
        .collect()
}
