//! DuckDB note store
//!
//! Follow-up notes live in notes.duckdb, one row per branch and customer.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use duckdb::{params, Connection};
use uuid::Uuid;

use crate::domain::result::{Error as DomainError, Result as DomainResult};
use crate::domain::{CustomerIdentity, FollowUpNote, NoteRef};
use crate::migrations::MIGRATIONS;
use crate::ports::NoteStore;
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// DuckDB-backed [`NoteStore`]
pub struct DuckDbNoteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbNoteStore {
    /// Open (or create) the notes database and apply migrations
    ///
    /// Opening retries with exponential backoff while another process
    /// holds the file lock.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    let store = Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    };
                    store.run_migrations()?;
                    return Ok(store);
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[funnel] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("Failed to open database after {} retries", MAX_RETRIES)))
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Extension autoloading stays off; nothing here needs extensions
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    /// Apply pending notes migrations
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.lock()?;
        MigrationService::new(&conn, MIGRATIONS).run_pending()
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))
    }

    /// Notes of one branch, oldest edit first
    pub fn list_notes(&self, branch: &str) -> Result<Vec<FollowUpNote>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT note_id, phone, customer_name, note_text
            FROM follow_up_notes
            WHERE branch = ?
            ORDER BY updated_at, note_id
            "#,
        )?;

        let notes = stmt
            .query_map([branch], |row| {
                Ok(FollowUpNote {
                    record_ref: NoteRef::new(row.get::<_, String>(0)?),
                    identity: CustomerIdentity {
                        phone: row.get(1)?,
                        name: row.get(2)?,
                    },
                    text: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(notes)
    }

    /// Update note text by reference; `false` when the record is gone
    pub fn update_note(&self, branch: &str, note_ref: &NoteRef, text: &str) -> Result<bool> {
        let conn = self.lock()?;
        let updated = conn.execute(
            r#"
            UPDATE follow_up_notes
            SET note_text = ?, updated_at = CURRENT_TIMESTAMP
            WHERE note_id = ? AND branch = ?
            "#,
            params![text, note_ref.as_str(), branch],
        )?;
        Ok(updated > 0)
    }

    /// Insert a note, or update the customer's existing one
    pub fn insert_note(&self, branch: &str, identity: &CustomerIdentity, text: &str) -> Result<NoteRef> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT note_id FROM follow_up_notes
            WHERE branch = ? AND phone = ? AND customer_name = ?
            "#,
        )?;
        let existing: Option<String> = stmt
            .query_map(params![branch, &identity.phone, &identity.name], |row| row.get(0))?
            .next()
            .transpose()?;

        if let Some(note_id) = existing {
            conn.execute(
                "UPDATE follow_up_notes SET note_text = ?, updated_at = CURRENT_TIMESTAMP WHERE note_id = ?",
                params![text, &note_id],
            )?;
            return Ok(NoteRef::new(note_id));
        }

        let note_id = Uuid::new_v4().to_string();
        conn.execute(
            r#"
            INSERT INTO follow_up_notes (note_id, branch, phone, customer_name, note_text)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![&note_id, branch, &identity.phone, &identity.name, text],
        )?;
        Ok(NoteRef::new(note_id))
    }
}

#[async_trait]
impl NoteStore for DuckDbNoteStore {
    async fn get_notes(&self, branch: &str) -> DomainResult<Vec<FollowUpNote>> {
        self.list_notes(branch)
            .map_err(|e| DomainError::note_store(format!("{:#}", e)))
    }

    async fn upsert_note(
        &self,
        branch: &str,
        identity: &CustomerIdentity,
        text: &str,
        existing: Option<&NoteRef>,
    ) -> DomainResult<NoteRef> {
        match existing {
            Some(note_ref) => {
                let updated = self
                    .update_note(branch, note_ref, text)
                    .map_err(|e| DomainError::note_store(format!("{:#}", e)))?;
                if !updated {
                    return Err(DomainError::not_found(format!("Note {}", note_ref.as_str())));
                }
                Ok(note_ref.clone())
            }
            None => self
                .insert_note(branch, identity, text)
                .map_err(|e| DomainError::note_store(format!("{:#}", e))),
        }
    }
}
