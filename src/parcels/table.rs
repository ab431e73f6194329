//! In-memory parcel table with by-name column access.
//!
//! A [`ParcelTable`] holds one entity's parcels: the stable parcel key, a
//! fixed set of retained descriptive attributes copied once from the source
//! snapshot, and a growing set of requirement/exemption columns holding
//! nullable small integers. All lookups are by column name; there is no
//! positional field arithmetic.
//!
//! The wide table is persisted per entity as a YAML document using the
//! write-to-temp-then-rename pattern, so an interrupted run never leaves a
//! half-written file behind.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::error::{Result, SitecheckError};

/// Storage engines in the original deployment cap attribute names at 31
/// characters; longer names go through the alias path.
pub const MAX_FIELD_NAME_LEN: usize = 31;

/// Compute the storage name for a column.
///
/// Names within the length bound are used as-is. Longer names are shortened
/// while preserving the trailing requirement-code suffix (e.g. `_3_14`), so
/// the code stays recognizable in the output schema.
pub fn storage_name(field: &str) -> String {
    if field.len() <= MAX_FIELD_NAME_LEN {
        return field.to_string();
    }
    let parts: Vec<&str> = field.rsplitn(3, '_').collect();
    if parts.len() == 3 {
        // parts are reversed: [minor, major, prefix]
        let suffix = format!("_{}_{}", parts[1], parts[0]);
        let keep = MAX_FIELD_NAME_LEN.saturating_sub(suffix.len());
        let prefix: String = parts[2].chars().take(keep).collect();
        format!("{}{}", prefix, suffix)
    } else {
        field.chars().take(MAX_FIELD_NAME_LEN).collect()
    }
}

/// One parcel row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parcel {
    /// Stable unique key (`parcel_id_field` in the source).
    pub key: String,

    /// Retained descriptive attributes, copied once from the snapshot.
    #[serde(default)]
    pub descriptive: BTreeMap<String, String>,

    /// Requirement and exemption values. Only columns listed in the table
    /// schema are meaningful here.
    #[serde(default)]
    pub values: BTreeMap<String, Option<i16>>,
}

/// One entity's wide parcel table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParcelTable {
    /// Schema version for migration.
    pub version: u32,

    /// Entity (administrative unit) identifier, lower-case.
    pub entity: String,

    /// Name of the parcel key field in the source data.
    pub key_field: String,

    /// Descriptive fields retained from the source.
    pub descriptive_fields: Vec<String>,

    /// Requirement/exemption columns present, in insertion order.
    pub columns: Vec<String>,

    /// Storage aliases assigned to over-long column names
    /// (original name -> stored name).
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,

    /// Parcel rows.
    pub parcels: Vec<Parcel>,
}

impl ParcelTable {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Create an empty table for an entity.
    pub fn new(entity: &str, key_field: &str, descriptive_fields: &[String]) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            entity: entity.to_string(),
            key_field: key_field.to_string(),
            descriptive_fields: descriptive_fields.to_vec(),
            columns: Vec::new(),
            aliases: BTreeMap::new(),
            parcels: Vec::new(),
        }
    }

    /// Number of parcels.
    pub fn len(&self) -> usize {
        self.parcels.len()
    }

    /// Whether the table has no parcels.
    pub fn is_empty(&self) -> bool {
        self.parcels.is_empty()
    }

    /// Whether a value column exists in the schema.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Ensure a value column exists, returning the storage name actually used.
    ///
    /// Adding is idempotent. Names over the length bound go through the alias
    /// path; if the alias is already claimed by a different original name the
    /// column is kept under its original long name instead and flagged for
    /// manual follow-up (non-fatal). Assignments are recorded per original
    /// name, so repeated calls always return the same storage name.
    pub fn ensure_column(&mut self, name: &str) -> String {
        let stored = storage_name(name);
        if stored == name {
            self.add_column(&stored);
            return stored;
        }
        if let Some(existing) = self.aliases.get(name) {
            return existing.clone();
        }
        if self.has_column(name) {
            // A previous pass already kept the long name after a collision.
            self.aliases.insert(name.to_string(), name.to_string());
            return name.to_string();
        }
        let claimed = self
            .aliases
            .iter()
            .any(|(original, alias)| alias == &stored && original != name);
        if claimed {
            let kept = self.keep_unaliased(name);
            self.aliases.insert(name.to_string(), kept.clone());
            return kept;
        }
        self.aliases.insert(name.to_string(), stored.clone());
        self.add_column(&stored);
        stored
    }

    /// Keep an over-long name as a column when its alias is already taken by
    /// a different field. The original is kept whole so no data is lost.
    fn keep_unaliased(&mut self, name: &str) -> String {
        warn!(
            column = name,
            "column name exceeds {} chars and its alias collides; keeping original name",
            MAX_FIELD_NAME_LEN
        );
        self.add_column(name);
        name.to_string()
    }

    fn add_column(&mut self, name: &str) {
        if !self.has_column(name) {
            self.columns.push(name.to_string());
            for parcel in &mut self.parcels {
                parcel.values.entry(name.to_string()).or_insert(None);
            }
        }
    }

    /// Get a value by parcel index and column name.
    ///
    /// Outer `None` means the column is absent from the schema, which callers
    /// in the exemption sweep treat as fatal. Inner `None` is a stored null.
    pub fn get(&self, parcel: usize, column: &str) -> Option<Option<i16>> {
        if !self.has_column(column) {
            return None;
        }
        Some(
            self.parcels
                .get(parcel)
                .and_then(|p| p.values.get(column).copied())
                .flatten(),
        )
    }

    /// Set a value by parcel index and column name.
    pub fn set(&mut self, parcel: usize, column: &str, value: Option<i16>) {
        if let Some(p) = self.parcels.get_mut(parcel) {
            p.values.insert(column.to_string(), value);
        }
    }

    /// Set every parcel's value in a column.
    pub fn fill_column(&mut self, column: &str, value: Option<i16>) {
        for parcel in &mut self.parcels {
            parcel.values.insert(column.to_string(), value);
        }
    }

    /// Load a wide table from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let table: Self = serde_yaml::from_str(&content).map_err(|e| SitecheckError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(table)
    }

    /// Save the wide table to disk using atomic write.
    ///
    /// Uses the write-to-temp-then-rename pattern to prevent corruption if
    /// the process is killed mid-write.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content =
            serde_yaml::to_string(self).map_err(|e| SitecheckError::ConfigValidationError {
                message: format!("Failed to serialize parcel table: {}", e),
            })?;
        let temp_path = path.with_extension("yml.tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}
