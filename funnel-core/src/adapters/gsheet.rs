//! Google Sheets CSV export client
//!
//! Each branch keeps its transaction log in a shared spreadsheet. The
//! gviz endpoint exports one tab as CSV without authentication as long
//! as the sheet is shared by link.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::config::BranchSheet;
use crate::domain::result::{Error as DomainError, Result as DomainResult};
use crate::ports::SheetSource;

/// Default Google Docs host
const GOOGLE_DOCS_URL: &str = "https://docs.google.com";

/// Environment variable to override the spreadsheet host (mock servers, proxies)
pub const SHEETS_BASE_URL_ENV: &str = "FUNNEL_SHEETS_BASE_URL";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Get the spreadsheet base URL, checking environment variable first
pub fn get_base_url() -> String {
    std::env::var(SHEETS_BASE_URL_ENV).unwrap_or_else(|_| GOOGLE_DOCS_URL.to_string())
}

/// Spreadsheet source backed by Google Sheets
#[derive(Debug)]
pub struct GoogleSheetSource {
    client: Client,
    base_url: String,
    branches: BTreeMap<String, BranchSheet>,
}

impl GoogleSheetSource {
    /// Create a source for the configured branches
    ///
    /// Uses `FUNNEL_SHEETS_BASE_URL` if set, otherwise Google Docs.
    pub fn new(branches: BTreeMap<String, BranchSheet>) -> Result<Self> {
        Self::new_with_base_url(branches, &get_base_url())
    }

    pub fn new_with_base_url(branches: BTreeMap<String, BranchSheet>, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            branches,
        })
    }

    /// CSV export URL of a branch's sheet tab
    pub fn export_url(&self, sheet: &BranchSheet) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/spreadsheets/d/{}/gviz/tq",
            self.base_url, sheet.sheet_id
        ))
        .with_context(|| format!("Invalid spreadsheet URL for sheet '{}'", sheet.sheet_id))?;
        url.query_pairs_mut()
            .append_pair("tqx", "out:csv")
            .append_pair("sheet", &sheet.sheet_name);
        Ok(url)
    }

    async fn download(&self, sheet: &BranchSheet) -> Result<String> {
        let url = self.export_url(sheet)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_request_error)?;

        check_response_status(&response)?;

        // A sheet that is not shared by link answers with a sign-in page
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/html"));
        if is_html {
            anyhow::bail!("Spreadsheet is not shared. Share it as 'Anyone with the link can view'.");
        }

        response
            .text()
            .await
            .context("Failed to read spreadsheet export")
    }
}

fn map_request_error(error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        anyhow::anyhow!("Connection timed out after {} seconds", REQUEST_TIMEOUT_SECS)
    } else if error.is_connect() {
        anyhow::anyhow!("Unable to connect to the spreadsheet server")
    } else {
        anyhow::anyhow!("Spreadsheet request failed: {}", error)
    }
}

fn check_response_status(response: &reqwest::Response) -> Result<()> {
    match response.status().as_u16() {
        200 => Ok(()),
        401 | 403 => anyhow::bail!("Access to the spreadsheet was denied. Check that it is shared."),
        404 => anyhow::bail!("Spreadsheet not found. Check the sheet id."),
        429 => anyhow::bail!("Too many requests to the spreadsheet server. Please try again shortly."),
        status => anyhow::bail!("Spreadsheet server error: HTTP {}", status),
    }
}

#[async_trait]
impl SheetSource for GoogleSheetSource {
    fn name(&self) -> &str {
        "gsheet"
    }

    async fn fetch_csv(&self, branch: &str) -> DomainResult<String> {
        let sheet = self
            .branches
            .get(branch)
            .ok_or_else(|| DomainError::config(format!("Unknown branch '{}'", branch)))?;

        self.download(sheet).await.map_err(|e| {
            DomainError::sheet(format!("Could not load data for branch '{}': {:#}", branch, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::gsheet_mock::MockSheetServer;

    fn branches() -> BTreeMap<String, BranchSheet> {
        let mut branches = BTreeMap::new();
        branches.insert("Bangyai".to_string(), BranchSheet::new("sheet-ok"));
        branches.insert("Ram".to_string(), BranchSheet::new("sheet-missing"));
        branches.insert("Choc".to_string(), BranchSheet::new("sheet-private"));
        branches
    }

    #[test]
    fn test_export_url() {
        let mut sheet = BranchSheet::new("abc123");
        sheet.sheet_name = "สรุป Sum".to_string();
        let source = GoogleSheetSource::new_with_base_url(BTreeMap::new(), "https://docs.google.com/").unwrap();

        let url = source.export_url(&sheet).unwrap();
        assert_eq!(url.path(), "/spreadsheets/d/abc123/gviz/tq");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("tqx".to_string(), "out:csv".to_string()));
        assert_eq!(pairs[1], ("sheet".to_string(), "สรุป Sum".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_csv() {
        let server = MockSheetServer::start("sheet-ok", "a,b\n1,2\n").unwrap();
        let source = GoogleSheetSource::new_with_base_url(branches(), &server.base_url()).unwrap();

        let text = source.fetch_csv("Bangyai").await.unwrap();
        assert_eq!(text, "a,b\n1,2\n");
        assert!(server.requests()[0].contains("tqx=out%3Acsv"));
    }

    #[tokio::test]
    async fn test_missing_sheet_is_source_error() {
        let server = MockSheetServer::start("sheet-ok", "a,b\n").unwrap();
        let source = GoogleSheetSource::new_with_base_url(branches(), &server.base_url()).unwrap();

        let err = source.fetch_csv("Ram").await.unwrap_err();
        assert!(matches!(err, DomainError::Source(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_unshared_sheet() {
        let server = MockSheetServer::start("sheet-ok", "a,b\n").unwrap();
        let source = GoogleSheetSource::new_with_base_url(branches(), &server.base_url()).unwrap();

        let err = source.fetch_csv("Choc").await.unwrap_err();
        assert!(err.to_string().contains("not shared"));
    }

    #[tokio::test]
    async fn test_unknown_branch() {
        let source = GoogleSheetSource::new_with_base_url(branches(), "http://127.0.0.1:9").unwrap();
        let err = source.fetch_csv("Nowhere").await.unwrap_err();
        assert!(matches!(err, DomainError::Config(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let server = MockSheetServer::start("sheet-ok", "").unwrap();
        let base_url = server.base_url();
        drop(server);

        let source = GoogleSheetSource::new_with_base_url(branches(), &base_url).unwrap();
        assert!(matches!(
            source.fetch_csv("Bangyai").await,
            Err(DomainError::Source(_))
        ));
    }
}
