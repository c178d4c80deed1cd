//! Funnel engine
//!
//! A pure pipeline from raw sheet rows to a [`FunnelReport`]:
//! normalize, group by customer, classify, aggregate, then attach notes.
//! Nothing in here performs I/O or fails; malformed rows only shrink
//! the counts.

mod aggregate;
mod classify;
mod enrich;
mod grouping;
mod normalize;

pub use aggregate::aggregate;
pub use classify::{Classifier, FunnelEvent, Outcome};
pub use enrich::{enrich, index_notes, NoteBook};
pub use grouping::{group_by_identity, CustomerTimeline, Grouping, TimelineEntry};
pub use normalize::{parse_amount, parse_local_date, resolve_field};

use crate::config::FunnelSettings;
use crate::domain::{DateWindow, FunnelReport, RawRecord};

/// Run the whole pipeline over one branch's rows
pub fn compute_report(
    rows: &[RawRecord],
    window: DateWindow,
    notes: &NoteBook,
    settings: &FunnelSettings,
) -> FunnelReport {
    let grouping = group_by_identity(rows, settings);
    let mut report = aggregate(&grouping, window, settings);
    report.pending = enrich(std::mem::take(&mut report.pending), notes);
    report
}
