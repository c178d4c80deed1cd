//! Spreadsheet source port
//!
//! Fetches a branch's transaction log as CSV text (header row first).

use async_trait::async_trait;

use crate::domain::result::Result;

/// Where branch transaction logs come from (Google Sheets, demo data, ...)
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Source name (e.g., "gsheet", "demo")
    fn name(&self) -> &str;

    /// Fetch the branch's sheet as CSV text
    ///
    /// Fails with a single user-facing [`crate::Error::Source`]; partial
    /// data is never returned.
    async fn fetch_csv(&self, branch: &str) -> Result<String>;
}
