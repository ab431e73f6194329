//! Programmable stand-in collaborator for tests.
//!
//! `StubEngine` writes a configured constant into the target column for
//! every parcel, and can be told to fail for specific columns to drive the
//! entity-fatal error path. Both engine traits are implemented so one stub
//! serves a whole pipeline run.

use std::collections::{BTreeMap, BTreeSet};

use crate::collaborators::{GeometryEngine, ModelEngine, SpatialPredicate};
use crate::parcels::ParcelTable;

/// Collaborator double that fills columns with fixed values.
#[derive(Debug, Default, Clone)]
pub struct StubEngine {
    values: BTreeMap<String, Option<i16>>,
    failing: BTreeSet<String>,
    default_value: Option<i16>,
}

impl StubEngine {
    /// Stub that writes `default_value` for any column not configured.
    pub fn new(default_value: Option<i16>) -> Self {
        Self {
            values: BTreeMap::new(),
            failing: BTreeSet::new(),
            default_value,
        }
    }

    /// Configure the value written into one column.
    pub fn with_value(mut self, field: &str, value: Option<i16>) -> Self {
        self.values.insert(field.to_string(), value);
        self
    }

    /// Make calls targeting this column fail.
    pub fn failing_on(mut self, field: &str) -> Self {
        self.failing.insert(field.to_string());
        self
    }

    fn fill(&self, table: &mut ParcelTable, field: &str) -> anyhow::Result<()> {
        if self.failing.contains(field) {
            anyhow::bail!("stub collaborator configured to fail on '{}'", field);
        }
        let value = self.values.get(field).copied().unwrap_or(self.default_value);
        table.fill_column(field, value);
        Ok(())
    }
}

impl GeometryEngine for StubEngine {
    fn apply_predicate(
        &self,
        table: &mut ParcelTable,
        _predicate: &SpatialPredicate,
        field: &str,
    ) -> anyhow::Result<()> {
        self.fill(table, field)
    }
}

impl ModelEngine for StubEngine {
    fn run_model(
        &self,
        table: &mut ParcelTable,
        _model_id: &str,
        field: &str,
    ) -> anyhow::Result<()> {
        self.fill(table, field)
    }
}
