//! Report command - compute and print a branch funnel report

use std::time::Duration;

use anyhow::{bail, Result};
use clap::ValueEnum;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use funnel_core::services::{BranchReport, Refresh};
use funnel_core::{DateWindow, FunnelReport, OperationResult};

use super::{block_on, get_context, get_logger, log_command};
use crate::output::{create_table, format_amount, info, warning};

/// Detail lists the report can print
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Section {
    All,
    Upgrades,
    Conversions,
    Pending,
}

pub struct ReportArgs {
    pub branch: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub all_time: bool,
    pub search: Option<String>,
    pub section: Section,
    pub json: bool,
}

fn window(args: &ReportArgs) -> Result<DateWindow> {
    if args.all_time {
        return Ok(DateWindow::unbounded());
    }
    if args.start.is_none() && args.end.is_none() {
        return Ok(DateWindow::current_month());
    }
    Ok(DateWindow::parse(args.start.as_deref(), args.end.as_deref())?)
}

fn spinner(branch: &str) -> Option<ProgressBar> {
    if !atty::is(atty::Stream::Stdout) {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(format!("Loading branch '{}'...", branch));
    bar.enable_steady_tick(Duration::from_millis(100));
    Some(bar)
}

pub fn run(args: ReportArgs) -> Result<()> {
    let logger = get_logger();
    log_command(&logger, "report");

    let window = window(&args)?;
    let ctx = get_context(logger)?;
    let branch = ctx.resolve_branch(args.branch.as_deref())?;

    let progress = if args.json { None } else { spinner(&branch) };
    let refresh = block_on(ctx.report_service.refresh(&branch, window))?;
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    let mut result = match refresh {
        Ok(Refresh::Current(result)) => result,
        Ok(Refresh::Superseded) => bail!("Report for '{}' was superseded by a newer run", branch),
        Err(e) => {
            if args.json {
                let failed: OperationResult<BranchReport> = OperationResult::fail(e.to_string());
                println!("{}", serde_json::to_string_pretty(&failed)?);
            }
            return Err(e.into());
        }
    };

    if let Some(term) = args.search.as_deref() {
        result.report = result.report.search(term);
    }

    if args.json {
        let envelope = OperationResult::ok_with_warnings(&result, &result.warnings);
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        return Ok(());
    }

    print_report(&result, args.section);
    Ok(())
}

fn print_report(result: &BranchReport, section: Section) {
    let report = &result.report;
    println!(
        "{} {}",
        format!("Funnel report: {}", result.branch).bold(),
        describe_window(&report.window).dimmed()
    );
    println!();

    print_summary(report);

    if matches!(section, Section::All | Section::Upgrades) {
        print_upgrades(report);
    }
    if matches!(section, Section::All | Section::Conversions) {
        print_conversions(report);
    }
    if matches!(section, Section::All | Section::Pending) {
        print_pending(report);
    }

    for w in &result.warnings {
        warning(&format!("Warning: {}", w));
    }
}

fn describe_window(window: &DateWindow) -> String {
    match (window.start, window.end) {
        (Some(start), Some(end)) => format!("({} to {})", start, end),
        (Some(start), None) => format!("(from {})", start),
        (None, Some(end)) => format!("(until {})", end),
        (None, None) => "(all time)".to_string(),
    }
}

fn print_summary(report: &FunnelReport) {
    let stats = &report.stats;

    let mut table = create_table();
    table.set_header(vec!["Metric", "Count", "Rate"]);
    table.add_row(vec!["Targets (P2)".to_string(), stats.target_count.to_string(), String::new()]);
    table.add_row(vec![
        "Converted to P1".to_string(),
        stats.primary_conversion_count.to_string(),
        stats.format_rate(stats.primary_conversion_count),
    ]);
    table.add_row(vec![
        "Upgraded UP P2".to_string(),
        stats.secondary_conversion_count.to_string(),
        stats.format_rate(stats.secondary_conversion_count),
    ]);
    table.add_row(vec![
        "Pending follow-up".to_string(),
        stats.pending_count.to_string(),
        stats.format_rate(stats.pending_count),
    ]);
    table.add_row(vec![
        "Upgrade bills".to_string(),
        stats.total_upgrade_bill_count.to_string(),
        String::new(),
    ]);
    table.add_row(vec![
        "Upgrade revenue".to_string(),
        format_amount(stats.total_revenue),
        String::new(),
    ]);
    println!("{}", table);

    let breakdown = stats.breakdown();
    if !breakdown.is_empty() {
        let line = breakdown
            .iter()
            .map(|share| format!("{} {:.1}%", share.kind.label(), share.percent))
            .collect::<Vec<_>>()
            .join("  |  ");
        println!("{}", line.dimmed());
    }
    println!();
}

fn print_upgrades(report: &FunnelReport) {
    println!("{}", "Upgrade bills".bold());
    if report.upgrade_bills.is_empty() {
        info("  No upgrade bills in this window");
        println!();
        return;
    }

    let mut table = create_table();
    table.set_header(vec!["Date", "Name", "Phone", "Amount", "Salesperson", "Interest"]);
    for bill in &report.upgrade_bills {
        table.add_row(vec![
            bill.date.to_string(),
            bill.identity.name.clone(),
            bill.identity.phone.clone(),
            format_amount(bill.amount),
            bill.salesperson.clone(),
            bill.interest.clone(),
        ]);
    }
    println!("{}", table);
    println!();
}

fn print_conversions(report: &FunnelReport) {
    println!("{}", "Converted to P1".bold());
    if report.primary_conversions.is_empty() {
        info("  No conversions in this window");
        println!();
        return;
    }

    let mut table = create_table();
    table.set_header(vec!["Entered", "Converted", "Name", "Phone", "Amount", "Salesperson", "Interest"]);
    for conversion in &report.primary_conversions {
        table.add_row(vec![
            conversion.funnel_entry_date.to_string(),
            conversion.date.to_string(),
            conversion.identity.name.clone(),
            conversion.identity.phone.clone(),
            format_amount(conversion.amount),
            conversion.salesperson.clone(),
            conversion.interest.clone(),
        ]);
    }
    println!("{}", table);
    println!();
}

fn print_pending(report: &FunnelReport) {
    println!("{}", "Pending follow-up".bold());
    if report.pending.is_empty() {
        info("  Nobody is waiting for a follow-up");
        println!();
        return;
    }

    let mut table = create_table();
    table.set_header(vec!["Entered", "Name", "Phone", "Salesperson", "Interest", "Service date", "Note"]);
    for row in &report.pending {
        table.add_row(vec![
            row.funnel_entry_date.to_string(),
            row.identity.name.clone(),
            row.identity.phone.clone(),
            row.salesperson.clone(),
            row.interest.clone(),
            row.service_date.to_string(),
            row.note.clone(),
        ]);
    }
    println!("{}", table);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn args(start: Option<&str>, end: Option<&str>, all_time: bool) -> ReportArgs {
        ReportArgs {
            branch: None,
            start: start.map(str::to_string),
            end: end.map(str::to_string),
            all_time,
            search: None,
            section: Section::All,
            json: false,
        }
    }

    #[test]
    fn test_window_from_flags() {
        let w = window(&args(Some("2025-03-01"), Some("2025-03-31"), false)).unwrap();
        assert_eq!(w.start, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(w.end, NaiveDate::from_ymd_opt(2025, 3, 31));

        assert_eq!(window(&args(None, None, true)).unwrap(), DateWindow::unbounded());
        assert!(window(&args(Some("31/03/2025"), None, false)).is_err());
    }

    #[test]
    fn test_default_window_is_month_to_date() {
        let w = window(&args(None, None, false)).unwrap();
        let today = funnel_core::domain::local_today();
        assert_eq!(w.end, Some(today));
        assert!(w.start.is_some_and(|start| start <= today));
    }

    #[test]
    fn test_describe_window() {
        assert_eq!(describe_window(&DateWindow::unbounded()), "(all time)");
        let from = DateWindow::new(NaiveDate::from_ymd_opt(2025, 3, 1), None);
        assert_eq!(describe_window(&from), "(from 2025-03-01)");
    }
}
