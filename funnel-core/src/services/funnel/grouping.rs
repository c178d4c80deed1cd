//! Identity grouper - per-customer, date-ordered timelines

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::FunnelSettings;
use crate::domain::{CustomerIdentity, RawRecord};

use super::normalize::{parse_amount, parse_local_date, resolve_field};

/// One dated row of a customer's history
#[derive(Debug, Clone)]
pub struct TimelineEntry<'r> {
    /// Position of the row in the input
    pub row: usize,
    pub record: &'r RawRecord,
    pub date: NaiveDate,
    /// Status note, trimmed and upper-cased
    pub status: String,
}

impl<'r> TimelineEntry<'r> {
    /// Trimmed value of a logical field, `""` when absent
    pub fn field(&self, label: &str) -> &'r str {
        resolve_field(self.record, label).trim()
    }

    pub fn amount(&self, label: &str) -> Decimal {
        parse_amount(resolve_field(self.record, label))
    }
}

/// All dated rows of one customer, oldest first
#[derive(Debug, Clone)]
pub struct CustomerTimeline<'r> {
    pub identity: CustomerIdentity,
    pub entries: Vec<TimelineEntry<'r>>,
}

/// Result of grouping a row set
#[derive(Debug, Clone, Default)]
pub struct Grouping<'r> {
    /// Timelines in order of each customer's first row in the input
    pub timelines: Vec<CustomerTimeline<'r>>,
    /// Rows dropped because their date could not be parsed
    pub skipped_rows: usize,
}

/// Partition rows into per-customer timelines
///
/// Rows whose date cannot be parsed are dropped. Entries within a
/// timeline are sorted by date; rows sharing a date keep input order.
pub fn group_by_identity<'r>(rows: &'r [RawRecord], settings: &FunnelSettings) -> Grouping<'r> {
    let fields = &settings.fields;
    let mut slots: HashMap<CustomerIdentity, usize> = HashMap::new();
    let mut grouping = Grouping::default();

    for (row, record) in rows.iter().enumerate() {
        let Some(date) = parse_local_date(resolve_field(record, &fields.date), settings.date_order) else {
            grouping.skipped_rows += 1;
            continue;
        };

        let identity = CustomerIdentity::new(
            resolve_field(record, &fields.phone),
            resolve_field(record, &fields.name),
        );
        let timelines = &mut grouping.timelines;
        let slot = *slots.entry(identity.clone()).or_insert_with(|| {
            timelines.push(CustomerTimeline {
                identity,
                entries: Vec::new(),
            });
            timelines.len() - 1
        });

        grouping.timelines[slot].entries.push(TimelineEntry {
            row,
            record,
            date,
            status: resolve_field(record, &fields.status).trim().to_uppercase(),
        });
    }

    for timeline in &mut grouping.timelines {
        timeline.entries.sort_by_key(|entry| entry.date);
    }

    grouping
}
