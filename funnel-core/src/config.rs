//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "app": { "demoMode": false, "defaultBranch": "Bangyai", ... },
//!   "branches": { "Bangyai": { "sheetId": "...", "displayName": "...", "sheetName": "Sum" } },
//!   "funnel": { "fields": { ... }, "markers": { ... }, "dateOrder": "monthFirst" }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(default)]
    branches: BTreeMap<String, BranchSheet>,
    #[serde(default)]
    funnel: FunnelSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default)]
    demo_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_branch: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Where a branch's transaction log lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchSheet {
    pub sheet_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
}

fn default_sheet_name() -> String {
    "Sum".to_string()
}

impl BranchSheet {
    pub fn new(sheet_id: impl Into<String>) -> Self {
        Self {
            sheet_id: sheet_id.into(),
            display_name: None,
            sheet_name: default_sheet_name(),
        }
    }
}

/// How to read an ambiguous `a/b/yyyy` date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateOrder {
    /// `month/day/year`, what the branch sheets export
    #[default]
    MonthFirst,
    /// `day/month/year`
    DayFirst,
}

impl std::str::FromStr for DateOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "monthfirst" | "mdy" => Ok(DateOrder::MonthFirst),
            "dayfirst" | "dmy" => Ok(DateOrder::DayFirst),
            other => Err(format!("Unknown date order: {}", other)),
        }
    }
}

/// Sheet column labels for each logical field
///
/// Labels are matched tolerantly (whitespace and case are ignored).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldMap {
    pub name: String,
    pub phone: String,
    pub date: String,
    pub status: String,
    pub primary_amount: String,
    pub upgrade_amount: String,
    pub salesperson: String,
    pub interest: String,
    pub service_date: String,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            name: "ชื่อลูกค้า".to_string(),
            phone: "เบอร์ติดต่อ".to_string(),
            date: "วันที่".to_string(),
            status: "หมายเหตุ".to_string(),
            primary_amount: "ยอดอัพ P1".to_string(),
            upgrade_amount: "ยอดอัพ P2".to_string(),
            salesperson: "Sale".to_string(),
            interest: "รายการที่สนใจ".to_string(),
            service_date: "วันที่เข้าใช้บริการ".to_string(),
        }
    }
}

/// Status-note values that drive the funnel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Markers {
    /// Customer entered the tracked stage
    pub funnel_entry: String,
    /// Customer progressed to the primary plan
    pub primary: String,
    /// Customer bought the upgrade
    pub upgrade: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            funnel_entry: "P2".to_string(),
            primary: "P1".to_string(),
            upgrade: "UP P2".to_string(),
        }
    }
}

impl Markers {
    /// Markers compared against an already upper-cased status note
    pub fn normalized(&self) -> Markers {
        Markers {
            funnel_entry: self.funnel_entry.trim().to_uppercase(),
            primary: self.primary.trim().to_uppercase(),
            upgrade: self.upgrade.trim().to_uppercase(),
        }
    }
}

/// Everything the funnel engine needs besides the rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FunnelSettings {
    pub fields: FieldMap,
    pub markers: Markers,
    pub date_order: DateOrder,
}

/// Funnel configuration (simplified view of settings)
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub demo_mode: bool,
    pub default_branch: Option<String>,
    pub branches: BTreeMap<String, BranchSheet>,
    pub funnel: FunnelSettings,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Config {
    /// Load config from the data directory
    ///
    /// Environment overrides (for CI/testing):
    /// - `FUNNEL_DEMO_MODE` toggles demo mode
    /// - `FUNNEL_DATE_ORDER` picks `monthFirst` or `dayFirst`
    pub fn load(funnel_dir: &Path) -> Result<Self> {
        let settings_path = funnel_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        let demo_mode = match std::env::var("FUNNEL_DEMO_MODE").ok().as_deref() {
            Some("true" | "1" | "yes" | "TRUE" | "YES") => true,
            Some("false" | "0" | "no" | "FALSE" | "NO") => false,
            _ => raw.app.demo_mode,
        };

        let mut funnel = raw.funnel.clone();
        if let Some(order) = std::env::var("FUNNEL_DATE_ORDER")
            .ok()
            .and_then(|v| v.parse::<DateOrder>().ok())
        {
            funnel.date_order = order;
        }

        Ok(Self {
            demo_mode,
            default_branch: raw.app.default_branch.clone(),
            branches: raw.branches.clone(),
            funnel,
            _raw_settings: raw,
        })
    }

    /// Save config to the data directory
    /// Preserves app settings the CLI doesn't manage
    pub fn save(&self, funnel_dir: &Path) -> Result<()> {
        let settings_path = funnel_dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        settings.app.demo_mode = self.demo_mode;
        settings.app.default_branch = self.default_branch.clone();
        settings.branches = self.branches.clone();
        settings.funnel = self.funnel.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    /// Look up a configured branch
    pub fn branch(&self, id: &str) -> Option<&BranchSheet> {
        self.branches.get(id)
    }

    /// Add or replace a branch; the first branch becomes the default
    pub fn add_branch(&mut self, id: impl Into<String>, sheet: BranchSheet) {
        let id = id.into();
        if self.default_branch.is_none() {
            self.default_branch = Some(id.clone());
        }
        self.branches.insert(id, sheet);
    }

    /// Remove a branch, returning it if it existed
    pub fn remove_branch(&mut self, id: &str) -> Option<BranchSheet> {
        let removed = self.branches.remove(id);
        if self.default_branch.as_deref() == Some(id) {
            self.default_branch = self.branches.keys().next().cloned();
        }
        removed
    }

    /// Enable demo mode
    pub fn enable_demo_mode(&mut self) {
        self.demo_mode = true;
    }

    /// Disable demo mode
    pub fn disable_demo_mode(&mut self) {
        self.demo_mode = false;
    }
}
