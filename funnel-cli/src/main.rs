//! Funnel CLI - sales conversion funnel reports in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;
mod output;

use commands::{branch, demo, logs, note, report};

/// Funnel - follow customers from first visit to purchase
#[derive(Parser)]
#[command(name = "funnel", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the conversion report for a branch
    Report {
        /// Branch id (defaults to the configured default branch)
        #[arg(short, long)]
        branch: Option<String>,
        /// First day of the window (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        /// Last day of the window (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
        /// Report over every dated row instead of month to date
        #[arg(long, conflicts_with_all = ["start", "end"])]
        all_time: bool,
        /// Only list rows whose name, salesperson, phone or note matches
        #[arg(short, long)]
        search: Option<String>,
        /// Which detail list to print
        #[arg(long, value_enum, default_value = "all")]
        section: report::Section,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read and write follow-up notes
    Note {
        #[command(subcommand)]
        command: note::NoteCommands,
    },

    /// Manage branch spreadsheets
    Branch {
        #[command(subcommand)]
        command: branch::BranchCommands,
    },

    /// Manage demo mode
    Demo {
        #[command(subcommand)]
        command: Option<demo::DemoCommands>,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            commands::record_failure(&commands::get_logger(), &e);
            eprintln!("{}", format!("{:#}", e).red());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Report {
            branch,
            start,
            end,
            all_time,
            search,
            section,
            json,
        } => report::run(report::ReportArgs {
            branch,
            start,
            end,
            all_time,
            search,
            section,
            json,
        }),
        Commands::Note { command } => note::run(command),
        Commands::Branch { command } => branch::run(command),
        Commands::Demo { command } => demo::run(command),
        Commands::Logs { command } => logs::run(command),
    }
}
