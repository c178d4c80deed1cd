//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Google Sheets CSV export for SheetSource
//! - Generated demo sheets for SheetSource
//! - DuckDB for NoteStore
//! - The csv crate for turning sheet exports into raw records

pub mod csv_text;
pub mod demo;
pub mod duckdb;
pub mod gsheet;

#[cfg(test)]
pub mod gsheet_mock;
