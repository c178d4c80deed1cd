//! Note command - read and write follow-up notes

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use funnel_core::{CustomerIdentity, NoteRef, OperationResult};

use super::{block_on, get_context, get_logger, log_command};
use crate::output::{create_table, success};

#[derive(Subcommand)]
pub enum NoteCommands {
    /// Write the follow-up note of a customer
    Set {
        /// Customer phone as written in the sheet
        #[arg(long)]
        phone: String,
        /// Customer name as written in the sheet
        #[arg(long)]
        name: String,
        /// Note text
        text: String,
        /// Branch id (defaults to the configured default branch)
        #[arg(short, long)]
        branch: Option<String>,
        /// Reference of the record to update
        #[arg(long = "ref")]
        note_ref: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the stored notes of a branch
    List {
        /// Branch id (defaults to the configured default branch)
        #[arg(short, long)]
        branch: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: NoteCommands) -> Result<()> {
    let logger = get_logger();

    match command {
        NoteCommands::Set {
            phone,
            name,
            text,
            branch,
            note_ref,
            json,
        } => {
            log_command(&logger, "note set");
            let ctx = get_context(logger)?;
            let branch = ctx.resolve_branch(branch.as_deref())?;
            let identity = CustomerIdentity::new(&phone, &name);
            let existing = note_ref.map(NoteRef::new);

            let saved = block_on(ctx.note_service.save_note(
                &branch,
                &identity,
                &text,
                existing.as_ref(),
            ))??;

            if json {
                println!("{}", serde_json::to_string_pretty(&OperationResult::ok(&saved))?);
            } else {
                success(&format!(
                    "Saved note for {} ({}) in '{}'",
                    identity.name, identity.phone, branch
                ));
                println!("{}", format!("Reference: {}", saved.as_str()).dimmed());
            }
        }
        NoteCommands::List { branch, json } => {
            log_command(&logger, "note list");
            let ctx = get_context(logger)?;
            let branch = ctx.resolve_branch(branch.as_deref())?;
            let notes = block_on(ctx.note_service.list_notes(&branch))??;

            if json {
                println!("{}", serde_json::to_string_pretty(&OperationResult::ok(&notes))?);
                return Ok(());
            }

            if notes.is_empty() {
                println!("No notes stored for '{}'.", branch);
                return Ok(());
            }

            let mut table = create_table();
            table.set_header(vec!["Name", "Phone", "Note", "Reference"]);
            for note in &notes {
                table.add_row(vec![
                    note.identity.name.clone(),
                    note.identity.phone.clone(),
                    note.text.clone(),
                    note.record_ref.as_str().to_string(),
                ]);
            }
            println!("{}", table);
        }
    }

    Ok(())
}
