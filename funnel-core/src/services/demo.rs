//! Demo service - manage demo mode
//!
//! Demo mode swaps the spreadsheet source for generated sheets and keeps
//! notes in a separate database, so trying the tool never touches real
//! branch notes.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::Config;

/// Notes database used while demo mode is on
pub const DEMO_NOTES_DB: &str = "demo_notes.duckdb";

pub struct DemoService {
    funnel_dir: PathBuf,
}

impl DemoService {
    pub fn new(funnel_dir: &Path) -> Self {
        Self {
            funnel_dir: funnel_dir.to_path_buf(),
        }
    }

    pub fn is_enabled(&self) -> Result<bool> {
        Ok(Config::load(&self.funnel_dir)?.demo_mode)
    }

    /// Enable demo mode with a fresh demo notes database
    pub fn enable(&self) -> Result<()> {
        self.remove_demo_notes()?;

        let mut config = Config::load(&self.funnel_dir).unwrap_or_default();
        config.enable_demo_mode();
        config.save(&self.funnel_dir)?;
        Ok(())
    }

    /// Disable demo mode and drop the demo notes
    pub fn disable(&self) -> Result<()> {
        let mut config = Config::load(&self.funnel_dir).unwrap_or_default();
        config.disable_demo_mode();
        config.save(&self.funnel_dir)?;

        self.remove_demo_notes()
    }

    fn remove_demo_notes(&self) -> Result<()> {
        let demo_db = self.funnel_dir.join(DEMO_NOTES_DB);
        let demo_wal = self.funnel_dir.join(format!("{}.wal", DEMO_NOTES_DB));
        if demo_db.exists() {
            std::fs::remove_file(&demo_db)?;
        }
        if demo_wal.exists() {
            std::fs::remove_file(&demo_wal)?;
        }
        Ok(())
    }
}
