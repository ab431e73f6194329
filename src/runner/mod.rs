//! Run controller.
//!
//! Resolves the two selection parameters (entities, requirements), iterates
//! entities in sorted order, and drives the requirement pass, the exemption
//! sweep, and materialization for each one.
//!
//! Failure granularity: a collaborator failure marks the entity failed and
//! the run moves on (the entity's outputs are not written, so a later run
//! picks it up again); a missing requirement column during the exemption
//! sweep aborts the whole run.

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::collaborators::{GeometryEngine, ModelEngine};
use crate::config::SelectorSpec;
use crate::context::RunContext;
use crate::error::{Result, SitecheckError};
use crate::exemptions::ExemptionEvaluator;
use crate::materializer::TableKind;
use crate::parcels::ParcelTable;
use crate::requirements::RequirementEvaluator;

/// Options for a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Skip entities whose wide output already exists.
    pub resume: bool,
}

/// How one entity ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityStatus {
    /// Both tables materialized.
    Completed,
    /// Skipped because its output already existed (resume).
    Skipped,
    /// Collaborator failure; nothing was written for this entity.
    Failed(String),
}

/// Per-entity outcome in a run summary.
#[derive(Debug, Clone)]
pub struct EntityOutcome {
    pub entity: String,
    pub status: EntityStatus,
}

/// What a run did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub outcomes: Vec<EntityOutcome>,
}

impl RunSummary {
    /// Wall-clock duration of the run.
    pub fn duration(&self) -> chrono::Duration {
        self.finished - self.started
    }

    /// Entities that completed.
    pub fn completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == EntityStatus::Completed)
            .count()
    }

    /// Entities that failed.
    pub fn failed(&self) -> Vec<&EntityOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, EntityStatus::Failed(_)))
            .collect()
    }
}

/// Drives a full run over the selected entities.
pub struct RunController<'a> {
    ctx: &'a RunContext,
    geometry: &'a dyn GeometryEngine,
    models: &'a dyn ModelEngine,
}

impl<'a> RunController<'a> {
    /// Create a controller over a run context and collaborators.
    pub fn new(
        ctx: &'a RunContext,
        geometry: &'a dyn GeometryEngine,
        models: &'a dyn ModelEngine,
    ) -> Self {
        Self {
            ctx,
            geometry,
            models,
        }
    }

    /// Resolve the entity selection against the source, sorted by entity
    /// identifier. Invalid explicit entries are rejected before any work.
    pub fn resolve_entities(&self, spec: &SelectorSpec) -> Result<Vec<String>> {
        let known: Vec<String> = self
            .ctx
            .source
            .discover()?
            .into_iter()
            .map(|s| s.entity)
            .collect();
        match spec {
            SelectorSpec::Wildcard(_) => Ok(known),
            SelectorSpec::List(list) => {
                for entity in list {
                    if !known.contains(entity) {
                        return Err(SitecheckError::UnknownEntity {
                            id: entity.clone(),
                        });
                    }
                }
                let mut selected = list.clone();
                selected.sort();
                selected.dedup();
                Ok(selected)
            }
        }
    }

    /// Resolve the requirement selection against the registry. The wildcard
    /// yields all identifiers in sorted order; an explicit list keeps its
    /// given order.
    pub fn resolve_requirements(&self, spec: &SelectorSpec) -> Result<Vec<String>> {
        match spec {
            SelectorSpec::Wildcard(_) => Ok(self
                .ctx
                .requirements
                .ids()
                .into_iter()
                .map(String::from)
                .collect()),
            SelectorSpec::List(list) => {
                for id in list {
                    self.ctx.requirements.resolve_field(id)?;
                }
                Ok(list.clone())
            }
        }
    }

    /// Run the pipeline over resolved selections.
    pub fn run(
        &self,
        entities: &[String],
        requirements: &[String],
        options: RunOptions,
    ) -> Result<RunSummary> {
        self.run_with_progress(entities, requirements, options, &mut |_, _, _| {})
    }

    /// Run the pipeline, reporting per-entity progress.
    pub fn run_with_progress(
        &self,
        entities: &[String],
        requirements: &[String],
        options: RunOptions,
        progress: &mut dyn FnMut(usize, usize, &str),
    ) -> Result<RunSummary> {
        let started = Utc::now();
        let total = entities.len();
        let mut outcomes = Vec::with_capacity(total);

        for (i, entity) in entities.iter().enumerate() {
            progress(i + 1, total, entity);
            info!(entity = %entity, "processing parcels ({}/{})", i + 1, total);

            let status = self.process_entity(entity, requirements, options)?;
            if let EntityStatus::Failed(message) = &status {
                error!(entity = %entity, "entity failed: {}", message);
            }
            outcomes.push(EntityOutcome {
                entity: entity.clone(),
                status,
            });
        }

        let summary = RunSummary {
            started,
            finished: Utc::now(),
            outcomes,
        };
        info!(
            completed = summary.completed(),
            failed = summary.failed().len(),
            "run finished in {}s",
            summary.duration().num_seconds()
        );
        Ok(summary)
    }

    /// Process one entity end to end.
    ///
    /// Returns `Ok(Failed(..))` for entity-granular failures and `Err` only
    /// for run-fatal conditions.
    fn process_entity(
        &self,
        entity: &str,
        requirements: &[String],
        options: RunOptions,
    ) -> Result<EntityStatus> {
        let wide_path = self.ctx.wide_table_path(entity);

        if options.resume && wide_path.exists() {
            info!(entity = %entity, "output exists; skipping (resume)");
            return Ok(EntityStatus::Skipped);
        }

        // The wide table is created once from the snapshot and reused on
        // later passes so retained fields are never recomputed.
        let mut table = if wide_path.exists() {
            ParcelTable::load(&wide_path)?
        } else {
            let snapshot = self.ctx.source.find(entity)?;
            self.ctx
                .source
                .load(&snapshot, &self.ctx.key_field, &self.ctx.retained_fields)?
        };

        let evaluator = RequirementEvaluator::new(
            &self.ctx.requirements,
            &self.ctx.mask,
            self.geometry,
            self.models,
        );
        match evaluator.evaluate(&mut table, requirements) {
            Ok(()) => {}
            Err(SitecheckError::CollaboratorFailure {
                entity,
                requirement,
                message,
            }) => {
                // Entity-fatal: leave its outputs untouched so a rerun
                // retries the whole entity.
                return Ok(EntityStatus::Failed(format!(
                    "requirement '{}' failed for '{}': {}",
                    requirement, entity, message
                )));
            }
            Err(other) => return Err(other),
        }

        // Exemptions always re-derive over the full set.
        ExemptionEvaluator::new(&self.ctx.requirements, &self.ctx.exemptions)
            .evaluate(&mut table)?;

        table.save(&wide_path)?;
        self.ctx.store.materialize(
            TableKind::Requirements,
            &table,
            &self.ctx.requirements,
            &self.ctx.exemptions,
        )?;
        self.ctx.store.materialize(
            TableKind::Exemptions,
            &table,
            &self.ctx.requirements,
            &self.ctx.exemptions,
        )?;

        Ok(EntityStatus::Completed)
    }
}
