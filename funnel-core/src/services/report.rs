//! Report service - fetch, compute and keep the latest branch report
//!
//! Each refresh fetches the branch sheet and its follow-up notes at the
//! same time, then runs the funnel engine. Refreshes are ticketed: a
//! refresh that finishes after a newer one was started is discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::adapters::csv_text::parse_records;
use crate::config::FunnelSettings;
use crate::domain::result::{Error, Result};
use crate::domain::{DateWindow, FunnelReport};
use crate::ports::{NoteStore, SheetSource};
use crate::services::funnel::{compute_report, index_notes, NoteBook};
use crate::services::logging::{events, LogEvent, LoggingService};

/// A computed report for one branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchReport {
    pub branch: String,
    pub report: FunnelReport,
    /// Degradations that did not stop the run (notes offline, skipped rows)
    pub warnings: Vec<String>,
}

/// Outcome of a refresh
#[derive(Debug, Clone, PartialEq)]
pub enum Refresh {
    /// This refresh is the latest one and its report is now current
    Current(BranchReport),
    /// A newer refresh was started meanwhile; this result was dropped
    Superseded,
}

/// Service computing branch reports from the sheet source and note store
pub struct ReportService {
    source: Arc<dyn SheetSource>,
    notes: Arc<dyn NoteStore>,
    settings: FunnelSettings,
    logger: Option<Arc<LoggingService>>,
    generation: AtomicU64,
    latest: Mutex<Option<BranchReport>>,
}

impl ReportService {
    pub fn new(
        source: Arc<dyn SheetSource>,
        notes: Arc<dyn NoteStore>,
        settings: FunnelSettings,
    ) -> Self {
        Self {
            source,
            notes,
            settings,
            logger: None,
            generation: AtomicU64::new(0),
            latest: Mutex::new(None),
        }
    }

    /// Record run events in the structured log
    pub fn with_logger(mut self, logger: Arc<LoggingService>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Compute the report for `branch` over `window`
    ///
    /// Fails only when the sheet cannot be fetched or read. A note store
    /// failure becomes a warning and the report is built without notes.
    pub async fn refresh(&self, branch: &str, window: DateWindow) -> Result<Refresh> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let (sheet, notes) = tokio::join!(
            self.source.fetch_csv(branch),
            self.notes.get_notes(branch)
        );

        if !self.is_current(ticket) {
            return Ok(Refresh::Superseded);
        }

        let csv = match sheet {
            Ok(csv) => csv,
            Err(e) => {
                self.log(
                    LogEvent::new(events::SOURCE_FETCH_FAILED)
                        .with_branch(branch)
                        .with_error(e.to_string()),
                );
                return Err(e);
            }
        };
        let rows = parse_records(&csv).map_err(|e| {
            Error::sheet(format!("Could not read the sheet of branch '{}': {}", branch, e))
        })?;

        let mut warnings = Vec::new();
        let book = match notes {
            Ok(notes) => index_notes(notes),
            Err(e) => {
                self.log(
                    LogEvent::new(events::NOTES_UNAVAILABLE)
                        .with_branch(branch)
                        .with_error(e.to_string()),
                );
                warnings.push(format!("Follow-up notes unavailable: {}", e));
                NoteBook::new()
            }
        };

        let report = compute_report(&rows, window, &book, &self.settings);
        if report.skipped_rows > 0 {
            warnings.push(format!(
                "{} row(s) skipped because their date could not be read",
                report.skipped_rows
            ));
        }

        let result = BranchReport {
            branch: branch.to_string(),
            report,
            warnings,
        };

        {
            let mut latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
            // Re-checked under the lock so an older run can never overwrite a newer one
            if !self.is_current(ticket) {
                return Ok(Refresh::Superseded);
            }
            *latest = Some(result.clone());
        }

        self.log(LogEvent::new(events::REPORT_COMPUTED).with_branch(branch));
        Ok(Refresh::Current(result))
    }

    /// The most recent current report, if any refresh has completed
    pub fn latest(&self) -> Option<BranchReport> {
        self.latest.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    fn log(&self, event: LogEvent) {
        if let Some(logger) = &self.logger {
            let _ = logger.log(event);
        }
    }
}
