//! Funnel classifier - upgrade tally and funnel-entry outcomes
//!
//! Each customer's timeline is walked once per pass. Counting is
//! deduplicated per identity per calendar day through a [`DedupSet`]
//! owned by the caller, one set per event kind.

use rust_decimal::Decimal;

use crate::config::{FunnelSettings, Markers};
use crate::domain::{DateWindow, DedupSet};

use super::grouping::{CustomerTimeline, TimelineEntry};

/// How a funnel-entry event was settled
///
/// `at` is the index, within the same timeline, of the entry that
/// settled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    ConvertedPrimary { at: usize },
    ConvertedSecondary { at: usize },
    Pending,
}

/// A counted funnel-entry event and its outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunnelEvent {
    /// Index of the funnel-entry row in its timeline
    pub entry: usize,
    pub outcome: Outcome,
}

/// Marker and amount rules for one run
#[derive(Debug, Clone)]
pub struct Classifier<'s> {
    settings: &'s FunnelSettings,
    markers: Markers,
}

impl<'s> Classifier<'s> {
    pub fn new(settings: &'s FunnelSettings) -> Self {
        Self {
            settings,
            markers: settings.markers.normalized(),
        }
    }

    pub fn primary_amount(&self, entry: &TimelineEntry<'_>) -> Decimal {
        entry.amount(&self.settings.fields.primary_amount)
    }

    pub fn upgrade_amount(&self, entry: &TimelineEntry<'_>) -> Decimal {
        entry.amount(&self.settings.fields.upgrade_amount)
    }

    fn is_funnel_entry(&self, entry: &TimelineEntry<'_>) -> bool {
        entry.status == self.markers.funnel_entry
    }

    fn is_primary(&self, entry: &TimelineEntry<'_>) -> bool {
        entry.status == self.markers.primary || self.primary_amount(entry) > Decimal::ZERO
    }

    fn is_upgrade(&self, entry: &TimelineEntry<'_>) -> bool {
        entry.status == self.markers.upgrade || self.upgrade_amount(entry) > Decimal::ZERO
    }

    /// Indexes of in-window upgrade bills not yet claimed in `seen`
    pub fn tally_upgrade_bills(
        &self,
        timeline: &CustomerTimeline<'_>,
        window: &DateWindow,
        seen: &mut DedupSet,
    ) -> Vec<usize> {
        timeline
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| window.contains(entry.date) && self.is_upgrade(entry))
            .filter(|(_, entry)| seen.claim(&timeline.identity, entry.date))
            .map(|(at, _)| at)
            .collect()
    }

    /// Funnel-entry events in the window, each with its outcome
    ///
    /// An event is only counted the first time its identity and day are
    /// claimed in `seen`.
    pub fn classify_timeline(
        &self,
        timeline: &CustomerTimeline<'_>,
        window: &DateWindow,
        seen: &mut DedupSet,
    ) -> Vec<FunnelEvent> {
        let mut events = Vec::new();
        for (at, entry) in timeline.entries.iter().enumerate() {
            if !window.contains(entry.date) || !self.is_funnel_entry(entry) {
                continue;
            }
            if !seen.claim(&timeline.identity, entry.date) {
                continue;
            }
            let outcome = self
                .settle_in_place(at, entry)
                .unwrap_or_else(|| self.scan_forward(timeline, at));
            events.push(FunnelEvent { entry: at, outcome });
        }
        events
    }

    /// Conversion logged on the funnel-entry row itself
    fn settle_in_place(&self, at: usize, entry: &TimelineEntry<'_>) -> Option<Outcome> {
        if self.primary_amount(entry) > Decimal::ZERO || entry.status == self.markers.primary {
            Some(Outcome::ConvertedPrimary { at })
        } else if self.upgrade_amount(entry) > Decimal::ZERO {
            Some(Outcome::ConvertedSecondary { at })
        } else {
            None
        }
    }

    /// First later row of the same customer that converts, in or out of the window
    fn scan_forward(&self, timeline: &CustomerTimeline<'_>, from: usize) -> Outcome {
        for (at, entry) in timeline.entries.iter().enumerate().skip(from + 1) {
            if self.is_primary(entry) {
                return Outcome::ConvertedPrimary { at };
            }
            if self.is_upgrade(entry) {
                return Outcome::ConvertedSecondary { at };
            }
        }
        Outcome::Pending
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::RawRecord;
    use crate::services::funnel::grouping::group_by_identity;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn row(name: &str, day: u32, status: &str, p1: &str, p2: &str) -> RawRecord {
        RawRecord::new()
            .with("ชื่อลูกค้า", name)
            .with("เบอร์ติดต่อ", "0810000000")
            .with("วันที่", format!("3/{}/2025", day))
            .with("หมายเหตุ", status)
            .with("ยอดอัพ P1", p1)
            .with("ยอดอัพ P2", p2)
    }

    fn classify(rows: &[RawRecord], window: DateWindow) -> Vec<FunnelEvent> {
        let settings = FunnelSettings::default();
        let classifier = Classifier::new(&settings);
        let grouping = group_by_identity(rows, &settings);
        let mut seen = DedupSet::new();
        grouping
            .timelines
            .iter()
            .flat_map(|t| classifier.classify_timeline(t, &window, &mut seen))
            .collect()
    }

    fn march() -> DateWindow {
        DateWindow::between(d(1), d(31))
    }

    #[test]
    fn test_later_primary_row_converts() {
        let rows = vec![row("A", 1, "P2", "", ""), row("A", 10, "P1", "500", "")];
        let events = classify(&rows, march());
        assert_eq!(
            events,
            vec![FunnelEvent {
                entry: 0,
                outcome: Outcome::ConvertedPrimary { at: 1 }
            }]
        );
    }

    #[test]
    fn test_lone_funnel_entry_is_pending() {
        let events = classify(&[row("A", 1, "P2", "", "")], march());
        assert_eq!(events[0].outcome, Outcome::Pending);
    }

    #[test]
    fn test_same_row_conversion() {
        let primary = classify(&[row("A", 1, "P2", "1,000", "")], march());
        assert_eq!(primary[0].outcome, Outcome::ConvertedPrimary { at: 0 });

        let secondary = classify(&[row("A", 1, "p2", "", "300")], march());
        assert_eq!(secondary[0].outcome, Outcome::ConvertedSecondary { at: 0 });
    }

    #[test]
    fn test_forward_scan_takes_earliest_terminal_row() {
        let rows = vec![
            row("A", 1, "P2", "", ""),
            row("A", 5, "P1", "", ""),
            row("A", 3, "UP P2", "", ""),
        ];
        let events = classify(&rows, march());
        // timeline order is day 1, day 3, day 5
        assert_eq!(events[0].outcome, Outcome::ConvertedSecondary { at: 1 });

        let rows = vec![
            row("A", 1, "P2", "", ""),
            row("A", 3, "P1", "", ""),
            row("A", 5, "UP P2", "", ""),
        ];
        let events = classify(&rows, march());
        assert_eq!(events[0].outcome, Outcome::ConvertedPrimary { at: 1 });
    }

    #[test]
    fn test_forward_scan_skips_neutral_rows_and_ignores_window() {
        let rows = vec![
            row("A", 1, "P2", "", ""),
            row("A", 2, "walk-in", "", ""),
            row("A", 20, "", "", "900"),
        ];
        let events = classify(&rows, DateWindow::between(d(1), d(5)));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome, Outcome::ConvertedSecondary { at: 2 });
    }

    #[test]
    fn test_one_target_per_identity_per_day() {
        let rows = vec![
            row("A", 1, "P2", "", ""),
            row("A", 1, "P2", "", ""),
            row("A", 2, "P2", "", ""),
            row("B", 1, "P2", "", ""),
        ];
        let events = classify(&rows, march());
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let rows = vec![
            row("A", 4, "P2", "", ""),
            row("B", 5, "P2", "", ""),
            row("C", 10, "P2", "", ""),
            row("D", 11, "P2", "", ""),
        ];
        let events = classify(&rows, DateWindow::between(d(5), d(10)));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_upgrade_tally_dedups_per_day() {
        let rows = vec![
            row("A", 2, "UP P2", "", "100"),
            row("A", 2, "", "", "200"),
            row("A", 3, "up p2", "", ""),
            row("A", 4, "P1", "", ""),
            row("A", 30, "UP P2", "", "50"),
        ];
        let settings = FunnelSettings::default();
        let classifier = Classifier::new(&settings);
        let grouping = group_by_identity(&rows, &settings);
        let mut seen = DedupSet::new();

        let bills = classifier.tally_upgrade_bills(
            &grouping.timelines[0],
            &DateWindow::between(d(1), d(10)),
            &mut seen,
        );
        assert_eq!(bills, vec![0, 2]);
        let timeline = &grouping.timelines[0];
        assert!(!seen.claim(&timeline.identity, timeline.entries[0].date));
        assert!(!seen.claim(&timeline.identity, timeline.entries[2].date));
    }
}
