//! Schema migrations for the notes and log databases
//!
//! Each database ships an ordered list of SQL scripts compiled into the
//! binary. Applied script names live in `sys_migrations`, which the
//! `000_migrations.sql` script itself creates.

use std::collections::HashSet;

use anyhow::{Context, Result};
use duckdb::Connection;

/// Embedded migrations as (filename, sql_content), in apply order
pub type Migrations = &'static [(&'static str, &'static str)];

const BOOTSTRAP: &str = "000_migrations.sql";

/// What one `run_pending` call did
#[derive(Debug)]
pub struct MigrationResult {
    /// Scripts applied by this call, in order
    pub applied: Vec<String>,
    /// Scripts that were already recorded before this call
    pub already_applied: usize,
}

/// Applies one migration list to one connection
pub struct MigrationService<'a> {
    conn: &'a Connection,
    migrations: Migrations,
}

impl<'a> MigrationService<'a> {
    pub fn new(conn: &'a Connection, migrations: Migrations) -> Self {
        Self { conn, migrations }
    }

    /// Apply every script not yet recorded, bootstrap first
    pub fn run_pending(&self) -> Result<MigrationResult> {
        let recorded = if self.has_tracking_table() {
            self.recorded()?
        } else {
            HashSet::new()
        };

        let mut applied = Vec::new();
        let bootstrap_first = self
            .migrations
            .iter()
            .filter(|(name, _)| *name == BOOTSTRAP)
            .chain(self.migrations.iter().filter(|(name, _)| *name != BOOTSTRAP));

        for (name, sql) in bootstrap_first {
            if recorded.contains(*name) {
                continue;
            }
            self.conn
                .execute_batch(sql)
                .with_context(|| format!("Migration {} failed", name))?;
            self.conn
                .execute("INSERT INTO sys_migrations (migration_name) VALUES (?)", [*name])?;
            applied.push(name.to_string());
        }

        Ok(MigrationResult {
            applied,
            already_applied: recorded.len(),
        })
    }

    fn has_tracking_table(&self) -> bool {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'sys_migrations'",
                [],
                |row| row.get::<_, i64>(0),
            )
            .map(|count| count > 0)
            .unwrap_or(false)
    }

    fn recorded(&self) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT migration_name FROM sys_migrations")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<duckdb::Result<HashSet<String>>>()?;
        Ok(names)
    }
}
