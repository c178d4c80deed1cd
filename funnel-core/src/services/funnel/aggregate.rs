//! Aggregator - folds classified timelines into a report

use crate::config::{DateOrder, FunnelSettings};
use crate::domain::report::PLACEHOLDER;
use crate::domain::{
    DateWindow, DedupSet, FunnelReport, PendingFollowUp, PrimaryConversion, ServiceDate,
    UpgradeBill,
};

use super::classify::{Classifier, Outcome};
use super::grouping::{CustomerTimeline, Grouping, TimelineEntry};
use super::normalize::parse_local_date;

/// Build the report for one window
///
/// Upgrade bills are tallied over every timeline first, then funnel
/// entries are classified. Each pass owns its dedup set.
pub fn aggregate(grouping: &Grouping<'_>, window: DateWindow, settings: &FunnelSettings) -> FunnelReport {
    let classifier = Classifier::new(settings);
    let mut report = FunnelReport {
        window,
        skipped_rows: grouping.skipped_rows,
        ..Default::default()
    };

    let mut upgrade_seen = DedupSet::new();
    for timeline in &grouping.timelines {
        for at in classifier.tally_upgrade_bills(timeline, &window, &mut upgrade_seen) {
            let entry = &timeline.entries[at];
            let amount = classifier.upgrade_amount(entry);
            report.stats.total_upgrade_bill_count += 1;
            report.stats.total_revenue += amount;
            report.upgrade_bills.push(UpgradeBill {
                identity: timeline.identity.clone(),
                status: settings.markers.upgrade.clone(),
                amount,
                date: entry.date,
                salesperson: entry.field(&settings.fields.salesperson).to_string(),
                interest: entry.field(&settings.fields.interest).to_string(),
            });
        }
    }

    let mut funnel_seen = DedupSet::new();
    for timeline in &grouping.timelines {
        for event in classifier.classify_timeline(timeline, &window, &mut funnel_seen) {
            report.stats.target_count += 1;
            let entry = &timeline.entries[event.entry];
            match event.outcome {
                Outcome::ConvertedPrimary { at } => {
                    report.stats.primary_conversion_count += 1;
                    let converted = &timeline.entries[at];
                    report.primary_conversions.push(PrimaryConversion {
                        identity: timeline.identity.clone(),
                        amount: classifier.primary_amount(converted),
                        date: converted.date,
                        salesperson: converted.field(&settings.fields.salesperson).to_string(),
                        interest: converted.field(&settings.fields.interest).to_string(),
                        funnel_entry_date: entry.date,
                    });
                }
                Outcome::ConvertedSecondary { .. } => {
                    report.stats.secondary_conversion_count += 1;
                }
                Outcome::Pending => {
                    report.pending.push(pending_row(timeline, entry, settings));
                }
            }
        }
    }

    report.stats.derive_pending();
    report
}

fn pending_row(
    timeline: &CustomerTimeline<'_>,
    entry: &TimelineEntry<'_>,
    settings: &FunnelSettings,
) -> PendingFollowUp {
    let fields = &settings.fields;
    PendingFollowUp {
        identity: timeline.identity.clone(),
        funnel_entry_date: entry.date,
        salesperson: or_placeholder(entry.field(&fields.salesperson)),
        interest: or_placeholder(entry.field(&fields.interest)),
        service_date: service_date(entry.field(&fields.service_date), settings.date_order),
        note: String::new(),
        note_ref: None,
    }
}

/// Parsed date, else the raw text, else the placeholder
fn service_date(raw: &str, order: DateOrder) -> ServiceDate {
    if raw.is_empty() {
        return ServiceDate::missing();
    }
    match parse_local_date(raw, order) {
        Some(date) => ServiceDate::Date(date),
        None => ServiceDate::Text(raw.to_string()),
    }
}

fn or_placeholder(value: &str) -> String {
    if value.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        value.to_string()
    }
}
