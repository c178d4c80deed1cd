//! Customer identity and per-day dedup keys

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder phone for rows without a contact number
pub const NO_PHONE: &str = "NoPhone";

/// Placeholder name for rows without a customer name
pub const NO_NAME: &str = "NoName";

/// A customer, keyed by trimmed phone and trimmed name
///
/// Two rows belong to the same customer iff both fields are byte-equal
/// after trimming. Distinct spellings of one person's name are distinct
/// identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerIdentity {
    pub phone: String,
    pub name: String,
}

impl CustomerIdentity {
    /// Build an identity from raw cell values, applying sentinels for blanks
    pub fn new(phone: &str, name: &str) -> Self {
        let phone = phone.trim();
        let name = name.trim();
        Self {
            phone: if phone.is_empty() { NO_PHONE } else { phone }.to_string(),
            name: if name.is_empty() { NO_NAME } else { name }.to_string(),
        }
    }
}

impl fmt::Display for CustomerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.phone, self.name)
    }
}

/// One identity on one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub identity: CustomerIdentity,
    pub day: NaiveDate,
}

/// Keys already counted for one event kind during a single run
#[derive(Debug, Clone, Default)]
pub struct DedupSet {
    seen: HashSet<DedupKey>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the key; returns `false` if it was already counted
    pub fn claim(&mut self, identity: &CustomerIdentity, day: NaiveDate) -> bool {
        self.seen.insert(DedupKey {
            identity: identity.clone(),
            day,
        })
    }
}
