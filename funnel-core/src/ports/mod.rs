//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The funnel
//! engine never sees them; the report and note services drive them.

mod note_store;
mod sheet_source;

pub use note_store::NoteStore;
pub use sheet_source::SheetSource;
