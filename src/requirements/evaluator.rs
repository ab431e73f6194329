//! Requirement evaluation pass.
//!
//! For one entity and a selected set of requirement identifiers, ensures
//! every requirement column exists, forces masked requirements to null
//! without touching a collaborator, and dispatches the rest to the typed
//! strategy registered for them.
//!
//! A collaborator failure aborts the current entity's pass (the entity is
//! retried wholesale on a later run); it never aborts the whole run here.

use tracing::{debug, info, warn};

use crate::collaborators::{GeometryEngine, ModelEngine};
use crate::error::{Result, SitecheckError};
use crate::parcels::ParcelTable;
use crate::requirements::mask::AvailabilityMask;
use crate::requirements::registry::{RequirementRegistry, Strategy};

/// Runs the requirement pass for entities.
pub struct RequirementEvaluator<'a> {
    registry: &'a RequirementRegistry,
    mask: &'a AvailabilityMask,
    geometry: &'a dyn GeometryEngine,
    models: &'a dyn ModelEngine,
}

impl<'a> RequirementEvaluator<'a> {
    /// Create an evaluator over the run's registries and collaborators.
    pub fn new(
        registry: &'a RequirementRegistry,
        mask: &'a AvailabilityMask,
        geometry: &'a dyn GeometryEngine,
        models: &'a dyn ModelEngine,
    ) -> Self {
        Self {
            registry,
            mask,
            geometry,
            models,
        }
    }

    /// Evaluate the selected requirements for one entity's table.
    ///
    /// Masked requirements that are not in the selection still get their
    /// column forced to null, so a narrowed requirement run can never leave
    /// stale values behind for no-data requirements.
    pub fn evaluate(&self, table: &mut ParcelTable, selection: &[String]) -> Result<()> {
        let entity = table.entity.clone();

        // Force every masked requirement to null first, selection or not.
        for masked_id in self.mask.masked_for(&entity) {
            if let Some(def) = self.registry.get(&masked_id) {
                let column = table.ensure_column(&def.field_name);
                table.fill_column(&column, None);
            }
        }

        let total = selection.len();
        for (i, id) in selection.iter().enumerate() {
            let def = self
                .registry
                .get(id)
                .ok_or_else(|| SitecheckError::UnknownRequirement { id: id.clone() })?;
            info!(
                entity = %entity,
                requirement = %id,
                "processing requirement ({}/{})",
                i + 1,
                total
            );

            let column = table.ensure_column(&def.field_name);

            if self.mask.is_masked(&entity, id) {
                // Already nulled above; just don't call the collaborator.
                info!(entity = %entity, requirement = %id, "no data for this requirement; column left null");
                continue;
            }

            match &def.strategy {
                Strategy::Predicate(predicate) => {
                    debug!(requirement = %id, dataset = %predicate.dataset, "dispatching spatial predicate");
                    self.geometry
                        .apply_predicate(table, predicate, &column)
                        .map_err(|e| SitecheckError::CollaboratorFailure {
                            entity: entity.clone(),
                            requirement: id.clone(),
                            message: e.to_string(),
                        })?;
                }
                Strategy::Model { model_id } => {
                    debug!(requirement = %id, model = %model_id, "dispatching external model");
                    self.models
                        .run_model(table, model_id, &column)
                        .map_err(|e| SitecheckError::CollaboratorFailure {
                            entity: entity.clone(),
                            requirement: id.clone(),
                            message: e.to_string(),
                        })?;
                }
                Strategy::Unimplemented => {
                    warn!(
                        requirement = %id,
                        "no evaluation logic registered; values will not be calculated"
                    );
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::stub::StubEngine;
    use crate::parcels::Parcel;
    use crate::requirements::registry::RequirementDef;

    fn table(entity: &str, n: usize) -> ParcelTable {
        let mut table = ParcelTable::new(entity, "key", &[]);
        for i in 0..n {
            table.parcels.push(Parcel {
                key: format!("p{}", i),
                descriptive: Default::default(),
                values: Default::default(),
            });
        }
        table
    }

    fn selection(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unmasked_requirement_dispatches_to_collaborator() {
        let registry = RequirementRegistry::statewide();
        let mask = AvailabilityMask::new();
        let engine = StubEngine::new(Some(1));
        let evaluator = RequirementEvaluator::new(&registry, &mask, &engine, &engine);

        let mut t = table("butte", 2);
        evaluator.evaluate(&mut t, &selection(&["2.3"])).unwrap();
        assert_eq!(t.get(0, "within_city_limits_2_3"), Some(Some(1)));
        assert_eq!(t.get(1, "within_city_limits_2_3"), Some(Some(1)));
    }

    #[test]
    fn masked_requirement_is_forced_null_and_skips_collaborator() {
        let registry = RequirementRegistry::statewide();
        let mut mask = AvailabilityMask::new();
        mask.mask_for("kern", "9.5");
        // A stub that would write 1 and would fail if called for 9.5: proves
        // the collaborator is never invoked for a masked requirement.
        let engine = StubEngine::new(Some(1)).failing_on("landslide_hazard_9_5");
        let evaluator = RequirementEvaluator::new(&registry, &mask, &engine, &engine);

        let mut t = table("kern", 3);
        evaluator.evaluate(&mut t, &selection(&["9.5"])).unwrap();
        for i in 0..3 {
            assert_eq!(t.get(i, "landslide_hazard_9_5"), Some(None));
        }
    }

    #[test]
    fn masking_overrides_previous_values() {
        let registry = RequirementRegistry::statewide();
        let engine = StubEngine::new(Some(1));

        let mut t = table("kern", 1);
        // First pass with no mask writes a 1.
        let empty_mask = AvailabilityMask::new();
        RequirementEvaluator::new(&registry, &empty_mask, &engine, &engine)
            .evaluate(&mut t, &selection(&["9.5"]))
            .unwrap();
        assert_eq!(t.get(0, "landslide_hazard_9_5"), Some(Some(1)));

        // Operator later marks 9.5 as no-data: the stale 1 must be nulled
        // even when 9.5 is not in the selection.
        let mut mask = AvailabilityMask::new();
        mask.mask_for("kern", "9.5");
        RequirementEvaluator::new(&registry, &mask, &engine, &engine)
            .evaluate(&mut t, &selection(&["2.3"]))
            .unwrap();
        assert_eq!(t.get(0, "landslide_hazard_9_5"), Some(None));
    }

    #[test]
    fn unimplemented_strategy_leaves_null_without_error() {
        let mut registry = RequirementRegistry::statewide();
        registry.insert(RequirementDef {
            id: "9.9".into(),
            field_name: "future_requirement_9_9".into(),
            strategy: Strategy::Unimplemented,
        });
        let mask = AvailabilityMask::new();
        let engine = StubEngine::new(Some(1));
        let evaluator = RequirementEvaluator::new(&registry, &mask, &engine, &engine);

        let mut t = table("butte", 1);
        evaluator.evaluate(&mut t, &selection(&["9.9"])).unwrap();
        assert_eq!(t.get(0, "future_requirement_9_9"), Some(None));
    }

    #[test]
    fn unknown_identifier_is_an_error() {
        let registry = RequirementRegistry::statewide();
        let mask = AvailabilityMask::new();
        let engine = StubEngine::new(Some(1));
        let evaluator = RequirementEvaluator::new(&registry, &mask, &engine, &engine);

        let mut t = table("butte", 1);
        let err = evaluator.evaluate(&mut t, &selection(&["42.1"])).unwrap_err();
        assert!(matches!(err, SitecheckError::UnknownRequirement { .. }));
    }

    #[test]
    fn collaborator_failure_is_entity_fatal() {
        let registry = RequirementRegistry::statewide();
        let mask = AvailabilityMask::new();
        let engine = StubEngine::new(Some(1)).failing_on("wetlands_8_1");
        let evaluator = RequirementEvaluator::new(&registry, &mask, &engine, &engine);

        let mut t = table("butte", 1);
        let err = evaluator
            .evaluate(&mut t, &selection(&["8.1"]))
            .unwrap_err();
        match err {
            SitecheckError::CollaboratorFailure {
                entity, requirement, ..
            } => {
                assert_eq!(entity, "butte");
                assert_eq!(requirement, "8.1");
            }
            other => panic!("expected CollaboratorFailure, got {:?}", other),
        }
    }
}
