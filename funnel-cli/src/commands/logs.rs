//! Logs command - inspect and prune the event log

use anyhow::Result;
use chrono::{Duration, TimeZone, Utc};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;

use super::ensure_funnel_dir;
use crate::output::{create_table, info, success};
use funnel_core::services::LogEntry;
use funnel_core::{EntryPoint, LoggingService};

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent log entries
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Show only failures
        #[arg(long)]
        errors: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete old log entries
    Clear {
        /// Keep entries from the last N days
        #[arg(long, default_value = "30")]
        older_than_days: i64,
        /// Delete every entry
        #[arg(long, conflicts_with = "older_than_days")]
        all: bool,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show entry counts and where the log lives
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: LogsCommands) -> Result<()> {
    let funnel_dir = ensure_funnel_dir()?;
    let service = LoggingService::new(&funnel_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))?;

    match command {
        LogsCommands::List { limit, errors, json } => list(&service, limit, errors, json),
        LogsCommands::Clear {
            older_than_days,
            all,
            force,
            json,
        } => clear(&service, older_than_days, all, force, json),
        LogsCommands::Stats { json } => stats(&service, json),
    }
}

fn list(service: &LoggingService, limit: usize, errors: bool, json: bool) -> Result<()> {
    let entries = if errors {
        service.get_errors(limit)?
    } else {
        service.get_recent(limit)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        info("The log is empty.");
        return Ok(());
    }

    let mut table = create_table();
    table.set_header(vec!["When", "Event", "Branch", "Command", "Detail"]);
    for entry in &entries {
        table.add_row(vec![
            local_time(entry.timestamp),
            event_cell(entry),
            entry.branch.clone().unwrap_or_default(),
            entry.command.clone().unwrap_or_default(),
            entry.error_message.clone().unwrap_or_default(),
        ]);
    }
    println!("{}", table);
    Ok(())
}

fn clear(service: &LoggingService, days: i64, all: bool, force: bool, json: bool) -> Result<()> {
    let prompt = if all {
        "Delete the whole event log?".to_string()
    } else {
        format!("Delete entries older than {} days?", days)
    };
    if !force && !json && !Confirm::new().with_prompt(prompt).default(false).interact()? {
        println!("Cancelled.");
        return Ok(());
    }

    let deleted = if all {
        service.clear()?
    } else {
        service.delete_before((Utc::now() - Duration::days(days)).timestamp_millis())?
    };

    if json {
        println!("{}", serde_json::json!({ "deleted": deleted }));
    } else {
        success(&format!("Removed {} entries", deleted));
    }
    Ok(())
}

fn stats(service: &LoggingService, json: bool) -> Result<()> {
    let total = service.count()?;
    let failures = service.get_errors(usize::MAX >> 1)?.len();
    let path = service.db_path();
    let bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    if json {
        let summary = serde_json::json!({
            "entries": total,
            "failures": failures,
            "path": path.to_string_lossy(),
            "bytes": bytes,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let mut table = create_table();
    table.add_row(vec!["Entries".to_string(), total.to_string()]);
    table.add_row(vec!["Failures".to_string(), failures.to_string()]);
    table.add_row(vec!["File".to_string(), path.display().to_string()]);
    table.add_row(vec!["Size".to_string(), format!("{} bytes", bytes)]);
    println!("{}", table);
    Ok(())
}

/// Event name, red when the entry carries an error
fn event_cell(entry: &LogEntry) -> String {
    if entry.error_message.is_some() {
        entry.event.red().to_string()
    } else {
        entry.event.clone()
    }
}

fn local_time(timestamp_ms: i64) -> String {
    match Utc.timestamp_millis_opt(timestamp_ms).single() {
        Some(at) => at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => timestamp_ms.to_string(),
    }
}
