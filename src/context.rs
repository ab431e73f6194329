//! Run context.
//!
//! All per-run state lives in one explicit [`RunContext`] constructed at
//! startup and borrowed by every component: the parcel source, the output
//! locations, and the immutable registries and mask. There is no module
//! global anywhere; components that need less take less.

use std::path::PathBuf;

use crate::config::RunConfig;
use crate::error::Result;
use crate::exemptions::ExemptionRegistry;
use crate::materializer::TableStore;
use crate::parcels::ParcelSource;
use crate::requirements::{AvailabilityMask, RequirementRegistry};

/// Everything a run needs, assembled once.
#[derive(Debug)]
pub struct RunContext {
    /// Parcel snapshot source.
    pub source: ParcelSource,
    /// Store holding the two shared result tables.
    pub store: TableStore,
    /// Directory for per-entity wide tables.
    pub wide_dir: PathBuf,
    /// Requirement registry (read-only after startup).
    pub requirements: RequirementRegistry,
    /// Exemption registry (read-only after startup).
    pub exemptions: ExemptionRegistry,
    /// Data availability mask.
    pub mask: AvailabilityMask,
    /// Parcel key field in the source snapshots.
    pub key_field: String,
    /// Descriptive fields retained from the source.
    pub retained_fields: Vec<String>,
}

impl RunContext {
    /// Build a context from configuration and the built-in registries,
    /// validating both registries up front.
    pub fn from_config(config: &RunConfig) -> Result<Self> {
        Self::with_registries(
            config,
            RequirementRegistry::statewide(),
            ExemptionRegistry::statewide(),
        )
    }

    /// Build a context with explicit registries. Validation fails fast on
    /// duplicate columns or dangling requirement references.
    pub fn with_registries(
        config: &RunConfig,
        requirements: RequirementRegistry,
        exemptions: ExemptionRegistry,
    ) -> Result<Self> {
        requirements.validate()?;
        exemptions.validate(&requirements)?;
        Ok(Self {
            source: ParcelSource::new(&config.source_dir),
            store: TableStore::new(&config.output_dir),
            wide_dir: config.output_dir.join("wide"),
            requirements,
            exemptions,
            mask: config.availability_mask(),
            key_field: config.parcel_key_field.clone(),
            retained_fields: config.retained_fields.clone(),
        })
    }

    /// Path of one entity's wide table.
    pub fn wide_table_path(&self, entity: &str) -> PathBuf {
        self.wide_dir
            .join(format!("{}_requirements_and_exemptions.yml", entity))
    }
}
