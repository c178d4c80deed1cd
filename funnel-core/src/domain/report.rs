//! Funnel report - counters and detail lists produced by one run

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::identity::CustomerIdentity;
use super::note::NoteRef;
use super::window::DateWindow;

/// Placeholder shown for blank text cells in detail lists
pub const PLACEHOLDER: &str = "-";

/// Summary counters of a funnel run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Funnel-entry events (one per customer per day)
    pub target_count: u64,
    /// Targets that progressed to the primary plan
    pub primary_conversion_count: u64,
    /// Targets that bought the upgrade instead
    pub secondary_conversion_count: u64,
    /// Targets with no outcome yet
    pub pending_count: u64,
    /// Upgrade bills in the window, independent of targets
    pub total_upgrade_bill_count: u64,
    /// Sum of upgrade amounts over counted upgrade bills
    pub total_revenue: Decimal,
}

impl ConversionStats {
    /// Recompute `pending_count`, never below zero
    pub fn derive_pending(&mut self) {
        let converted = self.primary_conversion_count + self.secondary_conversion_count;
        self.pending_count = self.target_count.saturating_sub(converted);
    }

    /// `count` as a percentage of targets, `None` when there are no targets
    pub fn rate(&self, count: u64) -> Option<f64> {
        if self.target_count == 0 {
            return None;
        }
        Some(count as f64 / self.target_count as f64 * 100.0)
    }

    /// Percentage with one decimal, `0%` when there are no targets
    pub fn format_rate(&self, count: u64) -> String {
        match self.rate(count) {
            Some(rate) => format!("{:.1}%", rate),
            None => "0%".to_string(),
        }
    }

    /// Non-empty outcome slices, in display order
    pub fn breakdown(&self) -> Vec<OutcomeShare> {
        [
            (OutcomeKind::ConvertedPrimary, self.primary_conversion_count),
            (OutcomeKind::ConvertedSecondary, self.secondary_conversion_count),
            (OutcomeKind::Pending, self.pending_count),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(kind, count)| OutcomeShare {
            kind,
            count,
            percent: self.rate(count).unwrap_or(0.0),
        })
        .collect()
    }
}

/// Outcome of one funnel-entry event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    ConvertedPrimary,
    ConvertedSecondary,
    Pending,
}

impl OutcomeKind {
    pub fn label(&self) -> &'static str {
        match self {
            OutcomeKind::ConvertedPrimary => "Converted to P1",
            OutcomeKind::ConvertedSecondary => "Upgraded UP P2",
            OutcomeKind::Pending => "Pending follow-up",
        }
    }
}

/// One slice of the outcome breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeShare {
    pub kind: OutcomeKind,
    pub count: u64,
    pub percent: f64,
}

/// An upgrade bill counted in the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeBill {
    #[serde(flatten)]
    pub identity: CustomerIdentity,
    pub status: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub salesperson: String,
    pub interest: String,
}

/// A funnel target that progressed to the primary plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryConversion {
    #[serde(flatten)]
    pub identity: CustomerIdentity,
    pub amount: Decimal,
    /// Date of the converting row
    pub date: NaiveDate,
    pub salesperson: String,
    pub interest: String,
    /// Date of the funnel-entry row that started the funnel
    pub funnel_entry_date: NaiveDate,
}

/// Service / arrival date of a pending customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceDate {
    Date(NaiveDate),
    Text(String),
}

impl ServiceDate {
    pub fn missing() -> Self {
        ServiceDate::Text(PLACEHOLDER.to_string())
    }
}

impl std::fmt::Display for ServiceDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceDate::Date(date) => write!(f, "{}", date),
            ServiceDate::Text(text) => f.write_str(text),
        }
    }
}

/// A funnel target still waiting for an outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingFollowUp {
    #[serde(flatten)]
    pub identity: CustomerIdentity,
    pub funnel_entry_date: NaiveDate,
    pub salesperson: String,
    pub interest: String,
    pub service_date: ServiceDate,
    /// Stored follow-up note, empty when none
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub note_ref: Option<NoteRef>,
}

/// Everything one funnel run produces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunnelReport {
    pub window: DateWindow,
    pub stats: ConversionStats,
    pub upgrade_bills: Vec<UpgradeBill>,
    pub primary_conversions: Vec<PrimaryConversion>,
    pub pending: Vec<PendingFollowUp>,
    /// Rows dropped because their date could not be read
    pub skipped_rows: usize,
}

impl FunnelReport {
    /// Keep only list rows matching `term` in any text column
    ///
    /// Case-insensitive substring match over name, salesperson, phone and
    /// note. Counters are left as computed.
    pub fn search(&self, term: &str) -> FunnelReport {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.clone();
        }
        let hit = |fields: &[&str]| fields.iter().any(|f| f.to_lowercase().contains(&needle));

        FunnelReport {
            window: self.window,
            stats: self.stats.clone(),
            upgrade_bills: self
                .upgrade_bills
                .iter()
                .filter(|b| hit(&[b.identity.name.as_str(), b.salesperson.as_str(), b.identity.phone.as_str()]))
                .cloned()
                .collect(),
            primary_conversions: self
                .primary_conversions
                .iter()
                .filter(|c| hit(&[c.identity.name.as_str(), c.salesperson.as_str(), c.identity.phone.as_str()]))
                .cloned()
                .collect(),
            pending: self
                .pending
                .iter()
                .filter(|p| hit(&[
                        p.identity.name.as_str(),
                        p.salesperson.as_str(),
                        p.identity.phone.as_str(),
                        p.note.as_str(),
                    ]))
                .cloned()
                .collect(),
            skipped_rows: self.skipped_rows,
        }
    }
}
