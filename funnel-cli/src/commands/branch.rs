//! Branch command - manage branch spreadsheets

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;

use funnel_core::adapters::demo::demo_branches;
use funnel_core::config::{BranchSheet, Config};

use super::{ensure_funnel_dir, get_logger, log_command};
use crate::output::{create_table, info, success};

#[derive(Subcommand)]
pub enum BranchCommands {
    /// List configured branches
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add or replace a branch
    Add {
        /// Branch id used on the command line
        id: String,
        /// Google Sheets spreadsheet id
        #[arg(long)]
        sheet_id: String,
        /// Display name
        #[arg(long)]
        name: Option<String>,
        /// Tab holding the visit rows
        #[arg(long)]
        sheet_name: Option<String>,
        /// Make this the default branch
        #[arg(long)]
        default: bool,
    },
    /// Remove a branch
    Remove {
        /// Branch id
        id: String,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },
}

pub fn run(command: BranchCommands) -> Result<()> {
    let logger = get_logger();
    let funnel_dir = ensure_funnel_dir()?;
    let mut config = Config::load(&funnel_dir)?;

    match command {
        BranchCommands::List { json } => {
            log_command(&logger, "branch list");
            let branches: Vec<(String, BranchSheet)> = if config.demo_mode {
                demo_branches()
            } else {
                config.branches.clone().into_iter().collect()
            };

            if json {
                let listed: Vec<_> = branches
                    .iter()
                    .map(|(id, sheet)| {
                        serde_json::json!({
                            "id": id,
                            "sheetId": sheet.sheet_id,
                            "displayName": sheet.display_name,
                            "sheetName": sheet.sheet_name,
                            "default": config.default_branch.as_deref() == Some(id.as_str()),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&listed)?);
                return Ok(());
            }

            if config.demo_mode {
                info("Demo mode is on; showing demo branches");
            }
            if branches.is_empty() {
                println!("No branches configured. Add one with 'funnel branch add'.");
                return Ok(());
            }

            let mut table = create_table();
            table.set_header(vec!["", "Branch", "Name", "Sheet", "Tab"]);
            for (id, sheet) in &branches {
                let marker = if !config.demo_mode && config.default_branch.as_deref() == Some(id.as_str()) {
                    "*".green().to_string()
                } else {
                    String::new()
                };
                table.add_row(vec![
                    marker,
                    id.clone(),
                    sheet.display_name.clone().unwrap_or_default(),
                    sheet.sheet_id.clone(),
                    sheet.sheet_name.clone(),
                ]);
            }
            println!("{}", table);
        }
        BranchCommands::Add {
            id,
            sheet_id,
            name,
            sheet_name,
            default,
        } => {
            log_command(&logger, "branch add");
            let id = id.trim().to_string();
            if id.is_empty() || sheet_id.trim().is_empty() {
                bail!("Branch id and sheet id are required");
            }

            let mut sheet = BranchSheet::new(sheet_id.trim());
            sheet.display_name = name;
            if let Some(tab) = sheet_name {
                sheet.sheet_name = tab;
            }

            config.add_branch(id.clone(), sheet);
            if default {
                config.default_branch = Some(id.clone());
            }
            config.save(&funnel_dir)?;
            success(&format!("Branch '{}' saved", id));
        }
        BranchCommands::Remove { id, force } => {
            log_command(&logger, "branch remove");
            if config.branch(&id).is_none() {
                bail!("Branch '{}' not found", id);
            }

            if !force {
                println!("\n{}", format!("This will remove the '{}' branch.", id).yellow());
                println!("{}\n", "Its follow-up notes stay in the notes database.".dimmed());

                if !Confirm::new()
                    .with_prompt("Are you sure?")
                    .default(false)
                    .interact()?
                {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            config.remove_branch(&id);
            config.save(&funnel_dir)?;
            success(&format!("Branch '{}' removed", id));
        }
    }

    Ok(())
}
