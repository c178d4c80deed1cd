//! Service layer - business logic orchestration
//!
//! Services coordinate the funnel engine and port interactions. Each
//! service focuses on a specific use case.

mod demo;
pub mod funnel;
pub mod logging;
pub mod migration;
mod notes;
mod report;

pub use demo::{DemoService, DEMO_NOTES_DB};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use notes::NoteService;
pub use report::{BranchReport, Refresh, ReportService};
