//! CLI command implementations

pub mod branch;
pub mod demo;
pub mod logs;
pub mod note;
pub mod report;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use funnel_core::services::logging::events;
use funnel_core::{EntryPoint, FunnelContext, LoggingService};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<Arc<LoggingService>> {
    let funnel_dir = get_funnel_dir().ok()?;
    std::fs::create_dir_all(&funnel_dir).ok()?;
    LoggingService::new(&funnel_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
        .ok()
        .map(Arc::new)
}

/// Record that a command ran, ignoring any errors
pub fn log_command(logger: &Option<Arc<LoggingService>>, command: &str) {
    if let Some(l) = logger {
        let _ = l.log_command(command);
    }
}

/// Record a failed command with its error chain, ignoring any errors
pub fn record_failure(logger: &Option<Arc<LoggingService>>, error: &anyhow::Error) {
    if let Some(l) = logger {
        let message = format!("{:#}", error);
        let details = format!("{:?}", error);
        let _ = l.log_error(events::COMMAND_FAILED, &message, Some(&details));
    }
}

/// Get the funnel directory from environment or default
pub fn get_funnel_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("FUNNEL_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".funnel"))
        .ok_or_else(|| anyhow!("Could not find home directory"))
}

/// Get the funnel directory, creating it if needed
pub fn ensure_funnel_dir() -> Result<PathBuf> {
    let funnel_dir = get_funnel_dir()?;
    std::fs::create_dir_all(&funnel_dir)
        .with_context(|| format!("Failed to create funnel directory: {:?}", funnel_dir))?;
    Ok(funnel_dir)
}

/// Build the context, with services logging to `logger`
pub fn get_context(logger: Option<Arc<LoggingService>>) -> Result<FunnelContext> {
    let funnel_dir = ensure_funnel_dir()?;
    FunnelContext::with_logger(&funnel_dir, logger).context("Failed to initialize funnel context")
}

/// Drive an async core operation to completion
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    Ok(runtime.block_on(future))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_record_failure_keeps_error_chain() {
        let dir = tempdir().unwrap();
        let service = LoggingService::new(dir.path(), EntryPoint::Cli, "test").unwrap();
        let logger = Some(Arc::new(service));

        let error = anyhow!("HTTP 404").context("Could not load data for branch 'Choc'");
        record_failure(&logger, &error);

        let errors = logger.as_ref().unwrap().get_errors(10).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].event, "command_failed");
        assert_eq!(
            errors[0].error_message.as_deref(),
            Some("Could not load data for branch 'Choc': HTTP 404")
        );
    }

    #[test]
    fn test_record_failure_without_logger() {
        record_failure(&None, &anyhow!("boom"));
    }
}
