//! Parcel snapshot source.
//!
//! The administrative-unit source is a directory of per-unit parcel
//! snapshots (`<NAME>_Parcels.yml`, one row per parcel). The entity
//! identifier derives deterministically from the snapshot name: the
//! lower-cased leading token before the first underscore, so
//! `SANBENITO_Parcels` becomes `sanbenito`.
//!
//! Loading a snapshot projects each row down to the parcel key plus the
//! retained descriptive fields. That projection happens once per entity;
//! requirement and exemption columns are added later by the evaluators.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SitecheckError};
use crate::parcels::table::{Parcel, ParcelTable};

/// Derive the entity identifier from a snapshot file stem.
pub fn entity_id_from_snapshot_name(name: &str) -> String {
    name.split('_').next().unwrap_or(name).to_lowercase()
}

/// A discovered snapshot, not yet loaded.
#[derive(Debug, Clone)]
pub struct SnapshotRef {
    /// Derived entity identifier (lower-case).
    pub entity: String,
    /// Snapshot file stem (e.g. `SANBENITO_Parcels`).
    pub name: String,
    /// Full path to the snapshot file.
    pub path: PathBuf,
}

/// Directory of per-entity parcel snapshots.
#[derive(Debug, Clone)]
pub struct ParcelSource {
    dir: PathBuf,
}

impl ParcelSource {
    /// Create a source over a snapshot directory.
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Discover all snapshots, sorted by entity identifier.
    pub fn discover(&self) -> Result<Vec<SnapshotRef>> {
        let mut snapshots = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yml") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            snapshots.push(SnapshotRef {
                entity: entity_id_from_snapshot_name(stem),
                name: stem.to_string(),
                path,
            });
        }
        snapshots.sort_by(|a, b| a.entity.cmp(&b.entity));
        Ok(snapshots)
    }

    /// Find the snapshot for a specific entity.
    pub fn find(&self, entity: &str) -> Result<SnapshotRef> {
        self.discover()?
            .into_iter()
            .find(|s| s.entity == entity)
            .ok_or_else(|| SitecheckError::UnknownEntity {
                id: entity.to_string(),
            })
    }

    /// Load a snapshot into a fresh parcel table.
    ///
    /// Only the key field and the retained descriptive fields survive the
    /// projection. A row without the key field is a malformed snapshot.
    pub fn load(
        &self,
        snapshot: &SnapshotRef,
        key_field: &str,
        retained_fields: &[String],
    ) -> Result<ParcelTable> {
        let content = fs::read_to_string(&snapshot.path)?;
        let rows: Vec<BTreeMap<String, String>> =
            serde_yaml::from_str(&content).map_err(|e| SitecheckError::ParseError {
                path: snapshot.path.clone(),
                message: e.to_string(),
            })?;

        let mut table = ParcelTable::new(&snapshot.entity, key_field, retained_fields);
        for (i, row) in rows.iter().enumerate() {
            let key = row
                .get(key_field)
                .ok_or_else(|| SitecheckError::SnapshotError {
                    entity: snapshot.entity.clone(),
                    message: format!("row {} is missing the key field '{}'", i, key_field),
                })?;
            let descriptive = retained_fields
                .iter()
                .filter_map(|f| row.get(f).map(|v| (f.clone(), v.clone())))
                .collect();
            table.parcels.push(Parcel {
                key: key.clone(),
                descriptive,
                values: BTreeMap::new(),
            });
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_lowercases_leading_token() {
        assert_eq!(entity_id_from_snapshot_name("SANBENITO_Parcels"), "sanbenito");
        assert_eq!(entity_id_from_snapshot_name("Kern_Parcels"), "kern");
    }

    #[test]
    fn entity_id_without_separator_uses_whole_name() {
        assert_eq!(entity_id_from_snapshot_name("Alameda"), "alameda");
    }

    fn write_snapshot(dir: &Path, name: &str, yaml: &str) {
        fs::write(dir.join(name), yaml).unwrap();
    }

    #[test]
    fn discover_sorts_by_entity() {
        let dir = tempfile::tempdir().unwrap();
        write_snapshot(dir.path(), "YUBA_Parcels.yml", "[]");
        write_snapshot(dir.path(), "BUTTE_Parcels.yml", "[]");
        write_snapshot(dir.path(), "notes.txt", "ignore me");

        let source = ParcelSource::new(dir.path());
        let found = source.discover().unwrap();
        let entities: Vec<&str> = found.iter().map(|s| s.entity.as_str()).collect();
        assert_eq!(entities, vec!["butte", "yuba"]);
    }

    #[test]
    fn find_unknown_entity_errors() {
        let dir = tempfile::tempdir().unwrap();
        let source = ParcelSource::new(dir.path());
        let err = source.find("atlantis").unwrap_err();
        assert!(err.to_string().contains("atlantis"));
    }

    #[test]
    fn load_projects_key_and_retained_fields() {
        let dir = tempfile::tempdir().unwrap();
        write_snapshot(
            dir.path(),
            "BUTTE_Parcels.yml",
            "- cbi_parcel_id_fips_apn_oid: '06007-001'\n  county_name: butte\n  apn: '001'\n  unrelated: dropme\n",
        );
        let source = ParcelSource::new(dir.path());
        let snapshot = source.find("butte").unwrap();
        let table = source
            .load(
                &snapshot,
                "cbi_parcel_id_fips_apn_oid",
                &["county_name".to_string(), "apn".to_string()],
            )
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.parcels[0].key, "06007-001");
        assert_eq!(
            table.parcels[0].descriptive.get("county_name"),
            Some(&"butte".to_string())
        );
        assert!(!table.parcels[0].descriptive.contains_key("unrelated"));
    }

    #[test]
    fn load_missing_key_field_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_snapshot(dir.path(), "KERN_Parcels.yml", "- county_name: kern\n");
        let source = ParcelSource::new(dir.path());
        let snapshot = source.find("kern").unwrap();
        let err = source
            .load(&snapshot, "cbi_parcel_id_fips_apn_oid", &[])
            .unwrap_err();
        assert!(err.to_string().contains("key field"));
    }
}
