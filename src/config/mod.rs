//! Run configuration loading and schema.
//!
//! A run is described by a YAML file: where the parcel snapshots live,
//! where outputs go, which entities and requirements to process, and any
//! operator overrides for the no-data mask and parcel field layout.
//! Everything except the two directories has statewide defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SitecheckError};
use crate::requirements::AvailabilityMask;

/// Default parcel key field in the statewide source data.
pub const DEFAULT_KEY_FIELD: &str = "cbi_parcel_id_fips_apn_oid";

fn default_key_field() -> String {
    DEFAULT_KEY_FIELD.to_string()
}

fn default_retained_fields() -> Vec<String> {
    [
        "fips",
        "county_name",
        "fips_apn",
        "apn",
        "apn_d",
        "s_city",
        "s_addr_d",
        "state_name",
        "latitude",
        "longitude",
        "zip_code",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_selector() -> SelectorSpec {
    SelectorSpec::Wildcard(String::from("*"))
}

/// A selection parameter: `"*"` for everything, or an explicit list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectorSpec {
    /// `"*"` — process everything known.
    Wildcard(String),
    /// Explicit identifiers; invalid entries are rejected at startup.
    List(Vec<String>),
}

impl SelectorSpec {
    /// Whether this selector is the wildcard.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, SelectorSpec::Wildcard(s) if s == "*")
    }
}

/// Operator overrides for the no-data mask.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoDataSpec {
    /// Requirements with no data anywhere.
    #[serde(default)]
    pub all: Vec<String>,

    /// Per-entity no-data requirement lists.
    #[serde(default, flatten)]
    pub by_entity: BTreeMap<String, Vec<String>>,
}

/// Parsed run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory of per-entity parcel snapshots.
    pub source_dir: PathBuf,

    /// Directory receiving the wide tables and the two shared tables.
    pub output_dir: PathBuf,

    /// Entity selection.
    #[serde(default = "default_selector")]
    pub entities: SelectorSpec,

    /// Requirement selection.
    #[serde(default = "default_selector")]
    pub requirements: SelectorSpec,

    /// Parcel key field in the source snapshots.
    #[serde(default = "default_key_field")]
    pub parcel_key_field: String,

    /// Descriptive fields retained from the source.
    #[serde(default = "default_retained_fields")]
    pub retained_fields: Vec<String>,

    /// No-data mask override. When present it replaces the built-in
    /// statewide table wholesale; the mask is operator-maintained advisory
    /// data, so merging would hide removals.
    #[serde(default)]
    pub no_data: Option<NoDataSpec>,
}

impl RunConfig {
    /// Load a run configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SitecheckError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| SitecheckError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Structural validation beyond what serde enforces.
    pub fn validate(&self) -> Result<()> {
        for (name, selector) in [("entities", &self.entities), ("requirements", &self.requirements)]
        {
            if let SelectorSpec::Wildcard(s) = selector {
                if s != "*" {
                    return Err(SitecheckError::ConfigValidationError {
                        message: format!(
                            "'{}' must be \"*\" or a list, got \"{}\"",
                            name, s
                        ),
                    });
                }
            }
        }
        if self.parcel_key_field.is_empty() {
            return Err(SitecheckError::ConfigValidationError {
                message: "parcel_key_field must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// The availability mask for this run: the override if supplied,
    /// otherwise the built-in statewide table.
    pub fn availability_mask(&self) -> AvailabilityMask {
        match &self.no_data {
            Some(spec) => AvailabilityMask::from_parts(
                spec.all.iter().cloned(),
                spec.by_entity
                    .iter()
                    .map(|(e, reqs)| (e.clone(), reqs.clone())),
            ),
            None => AvailabilityMask::statewide(),
        }
    }
}
