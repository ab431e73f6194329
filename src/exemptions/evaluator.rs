//! Exemption evaluation sweep.
//!
//! Consumes the requirement columns of one entity's table and derives every
//! exemption for every parcel in a single pass, maintaining the
//! satisfied-exemption count as it goes.
//!
//! Clause semantics are strict three-valued logic: 1 dominates inside an
//! OR-group, 0 dominates across the AND of clauses, and unknown absorbs
//! everywhere else. A requirement column that is missing entirely aborts
//! the whole run — it means exemptions ran before their requirements.

use tracing::debug;

use crate::error::{Result, SitecheckError};
use crate::exemptions::registry::{Clause, ExemptionDef, ExemptionRegistry, COUNT_FIELD};
use crate::parcels::{storage_name, ParcelTable};
use crate::requirements::RequirementRegistry;
use crate::tristate::TriState;

/// Runs the exemption sweep for entities.
pub struct ExemptionEvaluator<'a> {
    requirements: &'a RequirementRegistry,
    exemptions: &'a ExemptionRegistry,
}

impl<'a> ExemptionEvaluator<'a> {
    /// Create an evaluator over the run's registries.
    pub fn new(requirements: &'a RequirementRegistry, exemptions: &'a ExemptionRegistry) -> Self {
        Self {
            requirements,
            exemptions,
        }
    }

    /// Evaluate every exemption for every parcel of the entity.
    ///
    /// The count column is reset to zero first, so repeated sweeps never
    /// accumulate. Always runs over the full exemption set; exemptions are
    /// not subset-selectable.
    pub fn evaluate(&self, table: &mut ParcelTable) -> Result<()> {
        debug!(entity = %table.entity, "calculating exemptions");

        table.ensure_column(COUNT_FIELD);
        table.fill_column(COUNT_FIELD, Some(0));
        for def in self.exemptions.definitions() {
            table.ensure_column(&def.field_name);
        }

        for parcel in 0..table.len() {
            let mut count: i16 = 0;
            for def in self.exemptions.definitions() {
                let value = self.evaluate_one(table, parcel, def)?;
                if value.is_yes() {
                    count += 1;
                }
                table.set(parcel, &def.field_name, value.to_stored());
            }
            table.set(parcel, COUNT_FIELD, Some(count));
        }
        Ok(())
    }

    /// Evaluate a single exemption for a single parcel.
    pub fn evaluate_one(
        &self,
        table: &ParcelTable,
        parcel: usize,
        def: &ExemptionDef,
    ) -> Result<TriState> {
        let mut clause_values = Vec::with_capacity(def.clauses.len());
        for clause in &def.clauses {
            let value = match clause {
                Clause::Requires(id) => self.requirement_value(table, parcel, id, &def.id)?,
                Clause::AnyOf(ids) => {
                    let mut members = Vec::with_capacity(ids.len());
                    for id in ids {
                        members.push(self.requirement_value(table, parcel, id, &def.id)?);
                    }
                    TriState::any(members)
                }
            };
            clause_values.push(value);
        }
        Ok(TriState::all(clause_values))
    }

    fn requirement_value(
        &self,
        table: &ParcelTable,
        parcel: usize,
        requirement_id: &str,
        exemption_id: &str,
    ) -> Result<TriState> {
        let field = self.requirements.resolve_field(requirement_id)?;
        // The column normally lives under its storage alias; after an alias
        // collision the table records the original long name instead.
        let stored_name = table
            .aliases
            .get(field)
            .cloned()
            .unwrap_or_else(|| storage_name(field));
        let value = table
            .get(parcel, &stored_name)
            .ok_or_else(|| SitecheckError::MissingRequirementField {
                field: field.to_string(),
                exemption: exemption_id.to_string(),
                entity: table.entity.clone(),
            })?;
        Ok(TriState::from_stored(value))
    }
}
