//! Shared result table materialization.
//!
//! Two narrow tables accumulate across the whole run: "requirements" and
//! "exemptions", each keyed by (parcel key, entity id) with at most one row
//! per parcel. Materializing an entity is purge-then-append: any rows left
//! from an earlier run of the same entity are deleted before the fresh rows
//! go in, so re-running an entity is idempotent even though the store is
//! append-only at the row level.
//!
//! When the source table carries a column the destination has not seen yet
//! (a requirement added to the registry after the destination was created),
//! the destination schema is reconciled first: the column is added as a
//! nullable small integer, existing rows read as null for it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, SitecheckError};
use crate::exemptions::{ExemptionRegistry, COUNT_FIELD};
use crate::parcels::{storage_name, ParcelTable};
use crate::requirements::RequirementRegistry;

/// Which shared table to materialize into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Requirements,
    Exemptions,
}

impl TableKind {
    /// Stable table name, also the file stem on disk.
    pub fn name(self) -> &'static str {
        match self {
            TableKind::Requirements => "requirements",
            TableKind::Exemptions => "exemptions",
        }
    }
}

/// One row of a shared result table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRow {
    /// Stable parcel key.
    pub parcel_key: String,
    /// Entity the parcel belongs to.
    pub entity: String,
    /// Column values; absent columns read as null.
    #[serde(default)]
    pub values: BTreeMap<String, Option<i16>>,
}

/// A shared result table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultTable {
    /// Schema version for migration.
    pub version: u32,
    /// Value columns, in the order they were first seen.
    pub columns: Vec<String>,
    /// Rows, at most one per parcel key.
    pub rows: Vec<ResultRow>,
}

impl ResultTable {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    fn new(columns: Vec<String>) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            columns,
            rows: Vec::new(),
        }
    }

    /// Rows belonging to one entity.
    pub fn rows_for_entity(&self, entity: &str) -> Vec<&ResultRow> {
        self.rows.iter().filter(|r| r.entity == entity).collect()
    }
}

/// Directory-backed store for the two shared tables.
#[derive(Debug, Clone)]
pub struct TableStore {
    dir: PathBuf,
}

impl TableStore {
    /// Create a store rooted at a directory.
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Path of a table on disk.
    pub fn path(&self, kind: TableKind) -> PathBuf {
        self.dir.join(format!("{}.yml", kind.name()))
    }

    /// Whether a table exists yet.
    pub fn exists(&self, kind: TableKind) -> bool {
        self.path(kind).exists()
    }

    /// Load a table, or `None` if it has not been created.
    pub fn load(&self, kind: TableKind) -> Result<Option<ResultTable>> {
        let path = self.path(kind);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let table = serde_yaml::from_str(&content).map_err(|e| SitecheckError::ParseError {
            path,
            message: e.to_string(),
        })?;
        Ok(Some(table))
    }

    /// Delete a table if present. Used when the operator opts to rebuild
    /// everything before a process-all run.
    pub fn delete(&self, kind: TableKind) -> Result<()> {
        let path = self.path(kind);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn save(&self, kind: TableKind, table: &ResultTable) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(kind);
        let content =
            serde_yaml::to_string(table).map_err(|e| SitecheckError::ConfigValidationError {
                message: format!("Failed to serialize {} table: {}", kind.name(), e),
            })?;
        let temp_path = path.with_extension("yml.tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    /// Materialize one entity's rows into a shared table.
    ///
    /// Creates the table from a column projection of the parcel table if it
    /// does not exist. Otherwise reconciles the schema, purges the entity's
    /// prior rows, and appends.
    pub fn materialize(
        &self,
        kind: TableKind,
        parcels: &ParcelTable,
        requirements: &RequirementRegistry,
        exemptions: &ExemptionRegistry,
    ) -> Result<()> {
        let projection = projected_columns(kind, parcels, requirements, exemptions);

        let mut table = match self.load(kind)? {
            Some(table) => table,
            None => {
                info!(table = kind.name(), "creating {} table", kind.name());
                ResultTable::new(projection.clone())
            }
        };

        // Schema reconcile: new source columns join the destination schema.
        for column in &projection {
            if !table.columns.contains(column) {
                debug!(table = kind.name(), column = %column, "adding column to destination");
                table.columns.push(column.clone());
            }
        }

        // Purge: drop any rows from a previous run of this entity.
        let before = table.rows.len();
        table.rows.retain(|row| row.entity != parcels.entity);
        let purged = before - table.rows.len();
        if purged > 0 {
            info!(
                table = kind.name(),
                entity = %parcels.entity,
                "purged {} rows from a previous run",
                purged
            );
        }

        // Append the entity's fresh rows.
        for (i, parcel) in parcels.parcels.iter().enumerate() {
            let values = table
                .columns
                .iter()
                .map(|c| (c.clone(), parcels.get(i, c).flatten()))
                .collect();
            table.rows.push(ResultRow {
                parcel_key: parcel.key.clone(),
                entity: parcels.entity.clone(),
                values,
            });
        }

        self.save(kind, &table)
    }
}

/// The columns a table kind projects out of the wide parcel table.
fn projected_columns(
    kind: TableKind,
    parcels: &ParcelTable,
    requirements: &RequirementRegistry,
    exemptions: &ExemptionRegistry,
) -> Vec<String> {
    match kind {
        TableKind::Requirements => requirements
            .field_names()
            .into_iter()
            .map(|field| {
                // Respect the table's alias assignments, including long
                // names kept whole after an alias collision.
                parcels
                    .aliases
                    .get(field)
                    .cloned()
                    .unwrap_or_else(|| storage_name(field))
            })
            .filter(|c| parcels.has_column(c))
            .collect(),
        TableKind::Exemptions => {
            let mut columns: Vec<String> = exemptions
                .field_names()
                .into_iter()
                .map(String::from)
                .filter(|c| parcels.has_column(c))
                .collect();
            if parcels.has_column(COUNT_FIELD) {
                columns.push(COUNT_FIELD.to_string());
            }
            columns
        }
    }
}
