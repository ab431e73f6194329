//! External collaborator interfaces.
//!
//! Requirement values ultimately come from spatial analysis or from named
//! external procedural models. Both run outside this crate; here they are
//! typed seams: [`GeometryEngine`] evaluates a described spatial predicate
//! against a parcel table, [`ModelEngine`] runs an opaque model by its
//! stable identifier. Either way the collaborator writes 1, 0, or null into
//! the target column for every parcel and returns.
//!
//! Collaborators never write "unknown" on their own; nulls in final output
//! come from the availability mask or from absent reference data upstream.

pub mod stub;

use serde::{Deserialize, Serialize};

use crate::parcels::ParcelTable;

/// How a parcel must relate to the reference dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpatialRelation {
    /// Parcel centroid falls within the reference polygons.
    CenterWithin,
    /// Parcel geometry intersects the reference polygons.
    Intersects,
    /// At least this percentage of the parcel area is covered by the
    /// reference raster class.
    RasterFractionAtLeast { threshold_percent: f64 },
}

/// A described spatial predicate, resolved against a named reference dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialPredicate {
    /// Name of the external reference dataset or query.
    pub dataset: String,

    /// Spatial relation to test.
    pub relation: SpatialRelation,

    /// Optional attribute filter applied to the reference dataset first
    /// (e.g. `HAZ_CLASS IN ('High', 'Very High')`).
    pub filter: Option<String>,

    /// When true, matching parcels score 0 and non-matching parcels score 1.
    /// Hazard and limitation layers are encoded this way: touching the layer
    /// disqualifies the parcel.
    pub invert: bool,
}

impl SpatialPredicate {
    /// Centroid-within predicate, non-inverted.
    pub fn center_within(dataset: &str) -> Self {
        Self {
            dataset: dataset.to_string(),
            relation: SpatialRelation::CenterWithin,
            filter: None,
            invert: false,
        }
    }

    /// Intersection predicate where intersecting disqualifies (scores 0).
    pub fn intersects_disqualifies(dataset: &str) -> Self {
        Self {
            dataset: dataset.to_string(),
            relation: SpatialRelation::Intersects,
            filter: None,
            invert: true,
        }
    }

    /// Add an attribute filter on the reference dataset.
    pub fn with_filter(mut self, filter: &str) -> Self {
        self.filter = Some(filter.to_string());
        self
    }
}

/// Evaluates spatial predicates against a parcel table.
///
/// Implementations must fill the target column with 0 or 1 for every parcel
/// before returning. Errors are opaque; the caller treats any failure as
/// fatal for the current entity.
pub trait GeometryEngine {
    fn apply_predicate(
        &self,
        table: &mut ParcelTable,
        predicate: &SpatialPredicate,
        field: &str,
    ) -> anyhow::Result<()>;
}

/// Runs external procedural models by stable identifier.
///
/// The model contract is a black box: it must populate the target column
/// with 0, 1, or null for every parcel and terminate.
pub trait ModelEngine {
    fn run_model(&self, table: &mut ParcelTable, model_id: &str, field: &str)
        -> anyhow::Result<()>;
}

/// A collaborator that is not configured.
///
/// Every call fails, which exercises the entity-fatal error path: the entity
/// is left unfinished and a later run with a real engine retries it.
#[derive(Debug, Default)]
pub struct NullEngine;

impl GeometryEngine for NullEngine {
    fn apply_predicate(
        &self,
        _table: &mut ParcelTable,
        predicate: &SpatialPredicate,
        _field: &str,
    ) -> anyhow::Result<()> {
        anyhow::bail!(
            "no geometry engine configured (predicate against '{}')",
            predicate.dataset
        )
    }
}

impl ModelEngine for NullEngine {
    fn run_model(
        &self,
        _table: &mut ParcelTable,
        model_id: &str,
        _field: &str,
    ) -> anyhow::Result<()> {
        anyhow::bail!("no model engine configured (model '{}')", model_id)
    }
}
