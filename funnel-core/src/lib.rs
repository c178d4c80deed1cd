//! Funnel Core - sales conversion funnel engine
//!
//! This crate follows a hexagonal layout:
//!
//! - **domain**: Plain data (raw rows, identities, windows, notes, reports)
//! - **ports**: Traits for the spreadsheet source and the note store
//! - **services**: The pure funnel engine plus report, note, demo and logging services
//! - **adapters**: Google Sheets, demo sheets, DuckDB notes and CSV parsing

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use adapters::demo::{demo_branches, DemoSheetSource};
use adapters::duckdb::DuckDbNoteStore;
use adapters::gsheet::GoogleSheetSource;
use config::{BranchSheet, Config};
use ports::SheetSource;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult};
pub use domain::{
    ConversionStats, CustomerIdentity, DateWindow, FollowUpNote, FunnelReport, NoteRef,
    PendingFollowUp, RawRecord,
};
pub use services::funnel::compute_report;
pub use services::{EntryPoint, LogEvent, LoggingService};

/// Main context for funnel operations
///
/// Holds the configuration, the note store and the services wired to
/// the right spreadsheet source (real sheets, or generated ones in demo
/// mode).
pub struct FunnelContext {
    pub config: Config,
    pub funnel_dir: PathBuf,
    pub note_store: Arc<DuckDbNoteStore>,
    pub report_service: ReportService,
    pub note_service: NoteService,
}

impl FunnelContext {
    pub fn new(funnel_dir: &Path) -> Result<Self> {
        Self::with_logger(funnel_dir, None)
    }

    /// Create a context whose services record events in `logger`
    pub fn with_logger(funnel_dir: &Path, logger: Option<Arc<LoggingService>>) -> Result<Self> {
        let config = Config::load(funnel_dir)?;

        let notes_db = if config.demo_mode {
            DEMO_NOTES_DB
        } else {
            "notes.duckdb"
        };
        let note_store = Arc::new(DuckDbNoteStore::new(&funnel_dir.join(notes_db))?);

        let source: Arc<dyn SheetSource> = if config.demo_mode {
            Arc::new(DemoSheetSource::new(config.funnel.fields.clone()))
        } else {
            Arc::new(GoogleSheetSource::new(config.branches.clone())?)
        };

        let mut report_service =
            ReportService::new(source, note_store.clone(), config.funnel.clone());
        let mut note_service = NoteService::new(note_store.clone());
        if let Some(logger) = logger {
            report_service = report_service.with_logger(logger.clone());
            note_service = note_service.with_logger(logger);
        }

        Ok(Self {
            config,
            funnel_dir: funnel_dir.to_path_buf(),
            note_store,
            report_service,
            note_service,
        })
    }

    /// Branches reports can be run for
    pub fn branches(&self) -> Vec<(String, BranchSheet)> {
        if self.config.demo_mode {
            demo_branches()
        } else {
            self.config
                .branches
                .iter()
                .map(|(id, sheet)| (id.clone(), sheet.clone()))
                .collect()
        }
    }

    /// Pick the requested branch, else the default, else the first one
    pub fn resolve_branch(&self, requested: Option<&str>) -> std::result::Result<String, Error> {
        let branches = self.branches();
        if let Some(id) = requested {
            return if branches.iter().any(|(b, _)| b == id) {
                Ok(id.to_string())
            } else {
                Err(Error::not_found(format!("Branch '{}'", id)))
            };
        }

        let default = self
            .config
            .default_branch
            .as_deref()
            .filter(|_| !self.config.demo_mode)
            .filter(|d| branches.iter().any(|(b, _)| b == d));
        default
            .map(str::to_string)
            .or_else(|| branches.first().map(|(id, _)| id.clone()))
            .ok_or_else(|| {
                Error::config("No branch configured. Add one with 'funnel branch add'.")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_branch() {
        let dir = tempdir().unwrap();
        let mut config = Config::load(dir.path()).unwrap();
        config.add_branch("Bangyai", BranchSheet::new("a"));
        config.add_branch("Ram", BranchSheet::new("b"));
        config.default_branch = Some("Ram".to_string());
        config.save(dir.path()).unwrap();

        let context = FunnelContext::new(dir.path()).unwrap();
        assert_eq!(context.resolve_branch(None).unwrap(), "Ram");
        assert_eq!(context.resolve_branch(Some("Bangyai")).unwrap(), "Bangyai");
        assert!(matches!(
            context.resolve_branch(Some("Choc")),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_no_branches() {
        let dir = tempdir().unwrap();
        let context = FunnelContext::new(dir.path()).unwrap();
        assert!(matches!(context.resolve_branch(None), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_demo_mode_report() {
        let dir = tempdir().unwrap();
        DemoService::new(dir.path()).enable().unwrap();

        let context = FunnelContext::new(dir.path()).unwrap();
        assert_eq!(context.report_service.source_name(), "demo");
        let branch = context.resolve_branch(None).unwrap();
        assert_eq!(branch, "demo-bangkok");

        let refresh = context
            .report_service
            .refresh(&branch, DateWindow::unbounded())
            .await
            .unwrap();
        let Refresh::Current(result) = refresh else {
            panic!("expected a current report");
        };
        assert!(result.report.stats.target_count > 0);
        assert_eq!(result.report.skipped_rows, 1);
    }
}
