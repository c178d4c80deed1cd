//! Core domain entities
//!
//! Plain data for the funnel engine: raw rows, customer identities,
//! date windows, follow-up notes and the report a run produces.
//! No I/O lives here.

pub mod identity;
mod note;
mod record;
pub mod report;
pub mod result;
mod window;

pub use identity::{CustomerIdentity, DedupKey, DedupSet};
pub use note::{FollowUpNote, NoteRef};
pub use record::RawRecord;
pub use report::{
    ConversionStats, FunnelReport, OutcomeKind, OutcomeShare, PendingFollowUp, PrimaryConversion,
    ServiceDate, UpgradeBill,
};
pub use window::{local_today, DateWindow};
